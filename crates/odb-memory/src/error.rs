use odb_codec::CodecError;
use odb_types::{ObjectId, TypeError};

/// Errors from object database operations.
#[derive(Debug, thiserror::Error)]
pub enum OdbError {
    /// An id argument could not be decoded into a 20-byte hash.
    #[error("malformed object id: {0}")]
    MalformedHash(#[from] TypeError),

    /// The requested object is not in the database.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The database deliberately does not provide this capability.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A copied object hashed to a different id in the target database.
    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: ObjectId, actual: ObjectId },

    /// Framing or decompression failure.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error from the source stream or the compression transform.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias for object database operations.
pub type OdbResult<T> = Result<T, OdbError>;
