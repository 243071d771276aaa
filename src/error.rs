use thiserror::Error;

/// A non-success answer from the DNS provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct ProviderError {
    pub status: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed zone text. `line` is 1-based, 0 when the error is not tied to a line.
    #[error("zone format error (line {line}): {message}")]
    Format { line: usize, message: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("snapshot parse error at '{}': {}", .0.path(), .0.inner())]
    Snapshot(#[from] serde_path_to_error::Error<serde_json::Error>),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Error::Format {
            line,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
