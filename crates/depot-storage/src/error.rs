pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors produced by storage backends.
///
/// The synchronizer treats every variant as fatal for the regeneration attempt
/// in flight; retries are the caller's concern.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object not found: {path}")]
    ObjectNotFound { path: String },

    #[error("storage backend error: {message}")]
    Backend { message: String },
}

impl StorageError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
