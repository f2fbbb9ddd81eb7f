use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid object header: {0}")]
    InvalidHeader(String),

    #[error("size mismatch: declared {declared} bytes, stream had {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
