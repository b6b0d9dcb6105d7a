mod content_fetcher;
mod listing_fetcher;

pub use content_fetcher::HttpContentFetcher;
pub use listing_fetcher::HttpListingFetcher;
