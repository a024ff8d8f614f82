use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("missing operand{0}")]
    MissingOperand(String),

    #[error("{0} is not supported")]
    Unsupported(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: Is a directory", path.display())]
    IsDirectory { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Status a command exits with when this error stops it.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Io { .. } | Error::IsDirectory { .. } => 1,
            Error::InvalidPattern { .. }
            | Error::InvalidArgument(_)
            | Error::MissingOperand(_)
            | Error::Unsupported(_) => 2,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported(_))
    }
}
