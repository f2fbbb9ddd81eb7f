//! Foundation types for the in-memory object database (ODB).
//!
//! Every other ODB crate depends on `odb-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] — 20-byte SHA-1 content hash, the sole key of every database
//! - [`IntoObjectId`] — binary or hex forms accepted at API boundaries
//! - [`ObjectType`] — `blob`, `tree`, `commit` or `tag`
//! - [`ObjectInfo`] — canonical `{id, type, size}` header of a stored object

pub mod error;
pub mod info;
pub mod object;

pub use error::TypeError;
pub use info::{ObjectInfo, ObjectType};
pub use object::{IntoObjectId, ObjectId};
