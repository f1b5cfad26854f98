use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocsError>;

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("File exceeds allowed size ({size} bytes > {limit} bytes).")]
    TooLarge { size: u64, limit: u64 },

    #[error("Unable to decode file as UTF-8 text.")]
    NotUtf8,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
