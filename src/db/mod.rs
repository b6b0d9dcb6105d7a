mod schema;
mod store;

pub use store::{parse_article_date, ArticleStore};
