use thiserror::Error;

/// Main error type for Sepia operations
#[derive(Error, Debug)]
pub enum SepiaError {
    #[error("bad document: {0}")]
    BadDocument(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for Sepia operations
pub type Result<T> = std::result::Result<T, SepiaError>;

impl SepiaError {
    /// Check if this error left collection state untouched
    pub fn is_rejection(&self) -> bool {
        matches!(self, SepiaError::BadDocument(_) | SepiaError::NotFound(_))
    }
}
