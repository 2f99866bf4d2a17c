use thiserror::Error;

#[derive(Error, Debug)]
pub enum SesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl SesError {
    /// Whether the error means the persistence collaborator failed
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, SesError::Storage(_) | SesError::Database(_))
    }
}

pub type Result<T> = std::result::Result<T, SesError>;
