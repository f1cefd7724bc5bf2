use thiserror::Error;

#[derive(Error, Debug)]
pub enum MfrError {
    #[error("no such entry: {path}")]
    NotFound { path: String },

    #[error("stat {path}: {source}")]
    Stat {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("seek failed in {path}: wanted offset {expected}, handle reported {got}")]
    Seek { path: String, expected: u64, got: u64 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MfrError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        MfrError::InvalidArgument(msg.into())
    }
}

impl From<MfrError> for std::io::Error {
    fn from(e: MfrError) -> Self {
        use std::io::ErrorKind;
        match e {
            MfrError::Io(inner) => inner,
            MfrError::NotFound { .. } => std::io::Error::new(ErrorKind::NotFound, e),
            MfrError::InvalidArgument(_) => std::io::Error::new(ErrorKind::InvalidInput, e),
            other => std::io::Error::new(ErrorKind::Other, other),
        }
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, MfrError>;
