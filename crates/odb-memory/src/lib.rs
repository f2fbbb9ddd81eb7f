//! Volatile, in-memory content-addressed object cache.
//!
//! [`MemoryDb`] is a staging area: objects are written to it, hashed and kept
//! zstd-compressed in memory, so a pipeline can ask "do I already have this?"
//! and deduplicate before committing anything to slower durable storage.
//! [`MemoryDb::stream_copy`] performs that commit into any other database.
//!
//! # Design Rules
//!
//! 1. Keys are always content hashes. There is no way to store under a
//!    caller-chosen key.
//! 2. Storing the same content twice is idempotent.
//! 3. Every stream handed out starts at offset 0 and is independent of every
//!    other stream.
//! 4. Nothing is evicted and nothing is persisted; contents live exactly as
//!    long as the `MemoryDb` value.
//! 5. Single-threaded: writes take `&mut self` and asynchronous writes are
//!    rejected with [`OdbError::Unsupported`].
//! 6. A failed store leaves the database unchanged.

pub mod config;
pub mod error;
pub mod memory;
pub mod stream;
pub mod traits;

pub use config::MemoryDbConfig;
pub use error::{OdbError, OdbResult};
pub use memory::MemoryDb;
pub use stream::{IStream, OStream};
pub use traits::{ObjectDbRead, ObjectDbWrite, ShaIter};

pub use odb_types::{IntoObjectId, ObjectId, ObjectInfo, ObjectType};
