mod article;
mod category;

pub use article::{
    Annotation, Article, ArticleStatus, FetchedContent, FieldEdit, Reference, ReviewDecision,
    ReviewEdits,
};
pub use category::{display_name, is_valid_category, CATEGORIES, CATEGORY_OTHER};
