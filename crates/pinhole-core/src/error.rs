use crate::link::ShortLink;
use thiserror::Error;

/// Errors raised by repository implementations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("an active link already exists for {}", .0.target_url)]
    ActiveUrlExists(Box<ShortLink>),
    #[error("short link not found: {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    /// The backend aborted a transaction on a deadlock or lock wait timeout.
    #[error("storage transaction aborted by lock contention: {0}")]
    Contention(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

/// Errors surfaced by the shortening, resolution and administrative services.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid alias: {0}")]
    InvalidAlias(String),
    #[error("alias already taken: {0}")]
    AliasTaken(String),
    #[error("generated short code collided: {0}")]
    DuplicateCode(String),
    #[error("short link not found: {0}")]
    NotFound(String),
    #[error("short link expired: {0}")]
    Expired(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("no unused short code found after {0} attempts")]
    CodeSpaceExhausted(u32),
}

impl ShortenerError {
    /// Returns `true` when the caller may retry the same request with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::DuplicateCode(_))
    }
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Conflict(code) => Self::DuplicateCode(code),
            StorageError::ActiveUrlExists(link) => Self::DuplicateCode(link.code.to_string()),
            StorageError::NotFound(code) => Self::NotFound(code),
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}
