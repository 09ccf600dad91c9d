use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Subscription [{title}]({link}) exists.")]
    AlreadySubscribed { title: String, link: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch feed: {0}")]
    FetchFailed(String),

    #[error("Store error: {0}")]
    StoreFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

// HTTP transport and status errors are indistinguishable from parse errors to callers.
impl From<reqwest::Error> for NotifierError {
    fn from(e: reqwest::Error) -> Self {
        NotifierError::FetchFailed(e.to_string())
    }
}

impl From<rusqlite::Error> for NotifierError {
    fn from(e: rusqlite::Error) -> Self {
        NotifierError::StoreFailed(e.to_string())
    }
}

impl From<rusqlite_migration::Error> for NotifierError {
    fn from(e: rusqlite_migration::Error) -> Self {
        NotifierError::StoreFailed(format!("migration failed: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, NotifierError>;
