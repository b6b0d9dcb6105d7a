use thiserror::Error;

use crate::pipeline::CollaboratorError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("article not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
