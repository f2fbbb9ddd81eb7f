use std::io::{Read, Write};

use odb_types::{IntoObjectId, ObjectId, ObjectInfo};

use crate::error::OdbResult;
use crate::stream::{IStream, OStream};

/// Snapshot of the ids held by a database at the time it was requested.
pub type ShaIter = std::vec::IntoIter<ObjectId>;

/// Read access to a content-addressed object database.
///
/// Every method accepting an id takes it in binary or hex form; malformed hex
/// fails with [`OdbError::MalformedHash`](crate::OdbError::MalformedHash)
/// before any lookup.
pub trait ObjectDbRead {
    /// Whether the object exists. Never fails for a well-formed id.
    fn has_object(&self, id: impl IntoObjectId) -> OdbResult<bool>;

    /// Canonical header of an object.
    ///
    /// Fails with [`OdbError::NotFound`](crate::OdbError::NotFound) if absent.
    fn info(&self, id: impl IntoObjectId) -> OdbResult<ObjectInfo>;

    /// Header and content stream of an object, positioned at offset 0.
    ///
    /// Fails with [`OdbError::NotFound`](crate::OdbError::NotFound) if absent.
    fn stream(&self, id: impl IntoObjectId) -> OdbResult<OStream>;

    /// Number of distinct objects held.
    fn size(&self) -> usize;

    /// Ids of every object held, in no particular order.
    ///
    /// The ids are copied when this is called, so the database may be
    /// modified while the iterator is in use.
    fn sha_iter(&self) -> ShaIter;
}

/// Write access to a content-addressed object database.
pub trait ObjectDbWrite {
    /// Consume `istream`, store it under its content hash and return its
    /// canonical header.
    ///
    /// Storing content that is already present is idempotent.
    fn store<R: Read>(&mut self, istream: IStream<R>) -> OdbResult<ObjectInfo>;

    /// Store from a reader on a background worker.
    fn store_async<R: Read>(&mut self, reader: R) -> OdbResult<ObjectInfo>;

    /// Redirect compressed output into `sink` instead of the database's own
    /// storage.
    fn set_ostream<W: Write>(&mut self, sink: W) -> OdbResult<()>;
}
