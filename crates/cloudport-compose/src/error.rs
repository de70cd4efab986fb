use thiserror::Error;

pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors producing or writing the output bundle
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsafe output path: {0}")]
    UnsafePath(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<serde_yaml::Error> for ComposeError {
    fn from(err: serde_yaml::Error) -> Self {
        ComposeError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ComposeError {
    fn from(err: std::io::Error) -> Self {
        ComposeError::Io(err.to_string())
    }
}
