mod digest;
mod render;

pub use digest::{compile, week_of_year, Digest, WeekConvention, WEEK_CONVENTION};
pub use render::render_markdown;
