mod annotator;

pub use annotator::ClaudeAnnotator;
