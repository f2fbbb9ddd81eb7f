use std::collections::HashMap;
use std::io::{Read, Write};

use odb_codec::{frame, DecompressReader, ZstdWriter};
use odb_types::{IntoObjectId, ObjectId, ObjectInfo};
use tracing::{debug, trace};

use crate::config::MemoryDbConfig;
use crate::error::{OdbError, OdbResult};
use crate::stream::{IStream, OStream};
use crate::traits::{ObjectDbRead, ObjectDbWrite, ShaIter};

/// One cached object: its header and an idle reader over its compressed
/// framed bytes. The reader is never handed out directly, only rewound copies
/// of it, so it never allocates a decoder.
struct StoredObject {
    info: ObjectInfo,
    reader: DecompressReader,
}

/// In-memory, HashMap-based object database.
///
/// Stores everything zstd-compressed in memory, providing fast IO and object
/// retrieval. Use it to buffer objects and obtain their ids before writing
/// them to durable storage, which allows querying whether an object already
/// exists without introducing actual IO.
///
/// Not thread-safe: writes take `&mut self` and there is no locking, so the
/// asynchronous write path is rejected.
pub struct MemoryDb {
    config: MemoryDbConfig,
    objects: HashMap<ObjectId, StoredObject>,
}

impl MemoryDb {
    /// Create a new empty database with the default configuration.
    pub fn new() -> Self {
        Self {
            config: MemoryDbConfig::default(),
            objects: HashMap::new(),
        }
    }

    /// Create a new empty database after validating `config`.
    pub fn with_config(config: MemoryDbConfig) -> OdbResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            objects: HashMap::new(),
        })
    }

    pub fn config(&self) -> &MemoryDbConfig {
        &self.config
    }

    /// Returns `true` if the database holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Total compressed bytes across all stored objects.
    pub fn compressed_bytes(&self) -> u64 {
        self.objects
            .values()
            .map(|obj| obj.reader.compressed_len() as u64)
            .sum()
    }

    /// Copy the objects named by `ids` into `target`.
    ///
    /// Objects the target already has are skipped. Returns the number of
    /// objects actually written.
    pub fn stream_copy<I, T>(&self, ids: I, target: &mut T) -> OdbResult<usize>
    where
        I: IntoIterator,
        I::Item: IntoObjectId,
        T: ObjectDbRead + ObjectDbWrite,
    {
        let mut copied = 0;
        for id in ids {
            let id = id.into_object_id()?;
            if target.has_object(id)? {
                trace!(%id, "target already has object");
                continue;
            }
            let ostream = self.stream(id)?;
            let info = ostream.info;
            let written = target.store(IStream::new(info.kind, info.size, ostream))?;
            if written.id != id {
                return Err(OdbError::HashMismatch {
                    expected: id,
                    actual: written.id,
                });
            }
            copied += 1;
        }
        debug!(copied, "stream copy complete");
        Ok(copied)
    }

    fn lookup(&self, id: impl IntoObjectId) -> OdbResult<&StoredObject> {
        let id = id.into_object_id()?;
        self.objects.get(&id).ok_or(OdbError::NotFound(id))
    }
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectDbRead for MemoryDb {
    fn has_object(&self, id: impl IntoObjectId) -> OdbResult<bool> {
        Ok(self.objects.contains_key(&id.into_object_id()?))
    }

    // Entries always carry their full stream, so the header comes from the
    // same lookup as `stream`.
    fn info(&self, id: impl IntoObjectId) -> OdbResult<ObjectInfo> {
        self.lookup(id).map(|obj| obj.info)
    }

    fn stream(&self, id: impl IntoObjectId) -> OdbResult<OStream> {
        let obj = self.lookup(id)?;
        Ok(OStream {
            info: obj.info,
            reader: obj.reader.rewound(),
        })
    }

    fn size(&self) -> usize {
        self.objects.len()
    }

    fn sha_iter(&self) -> ShaIter {
        self.objects.keys().copied().collect::<Vec<_>>().into_iter()
    }
}

impl ObjectDbWrite for MemoryDb {
    fn store<R: Read>(&mut self, istream: IStream<R>) -> OdbResult<ObjectInfo> {
        let framed = frame::frame(istream.kind, istream.size, istream.reader)?;

        let mut zstream = ZstdWriter::new(self.config.compression_level)?;
        zstream.write_all(&framed.canonical)?;
        let framed_len = zstream.bytes_in();
        // The encoder buffers internally; the frame is only complete after close.
        let compressed = zstream.close()?;

        // The header is inside the compressed frame, so no size hint is given.
        let reader = DecompressReader::open(compressed)?;
        let info = framed.info;
        let compressed_len = reader.compressed_len();
        let replaced = self
            .objects
            .insert(info.id, StoredObject { info, reader })
            .is_some();

        debug!(
            id = %info.id,
            kind = %info.kind,
            size = info.size,
            framed_len,
            compressed_len,
            replaced,
            "stored object"
        );
        Ok(info)
    }

    fn store_async<R: Read>(&mut self, _reader: R) -> OdbResult<ObjectInfo> {
        Err(OdbError::Unsupported(
            "MemoryDb cannot be used for async write access",
        ))
    }

    fn set_ostream<W: Write>(&mut self, _sink: W) -> OdbResult<()> {
        Err(OdbError::Unsupported("MemoryDb always streams into memory"))
    }
}

impl std::fmt::Debug for MemoryDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDb")
            .field("object_count", &self.objects.len())
            .field("compression_level", &self.config.compression_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odb_codec::{hash_object, CodecError};
    use odb_types::{ObjectType, TypeError};
    use std::io::{self, Cursor, Seek, SeekFrom};

    fn store_blob(db: &mut MemoryDb, content: &[u8]) -> ObjectInfo {
        db.store(IStream::from_bytes(ObjectType::Blob, content))
            .unwrap()
    }

    fn read_content(db: &MemoryDb, id: ObjectId) -> Vec<u8> {
        db.stream(id).unwrap().read_to_vec().unwrap()
    }

    // -----------------------------------------------------------------------
    // Store / read back
    // -----------------------------------------------------------------------

    #[test]
    fn hello_world_scenario() {
        let mut db = MemoryDb::new();
        let info = store_blob(&mut db, b"hello world");
        assert_eq!(info.id.to_hex(), "95d09f2b10159347eece71399a7e2e907ea3df4f");

        assert!(db.has_object(info.id).unwrap());
        assert_eq!(db.size(), 1);
        assert_eq!(read_content(&db, info.id), b"hello world");
        assert_eq!(db.info(info.id).unwrap().size, 11);
    }

    #[test]
    fn store_returns_canonical_info() {
        let mut db = MemoryDb::new();
        let info = db
            .store(IStream::new(ObjectType::Commit, 4, Cursor::new(b"tree")))
            .unwrap();
        assert_eq!(info.kind, ObjectType::Commit);
        assert_eq!(info.size, 4);
        assert_eq!(info.id, hash_object(ObjectType::Commit, b"tree"));
    }

    #[test]
    fn input_of_unknown_size_is_measured() {
        let mut db = MemoryDb::new();
        let info = db
            .store(IStream::unknown_size(ObjectType::Blob, &b"no size given"[..]))
            .unwrap();
        assert_eq!(info.size, 13);
        let ostream = db.stream(info.id).unwrap();
        assert_eq!(ostream.size(), 13);
        assert_eq!(ostream.kind(), ObjectType::Blob);
        assert_eq!(ostream.id(), info.id);
    }

    #[test]
    fn stream_is_rewound_for_every_call() {
        let mut db = MemoryDb::new();
        let id = store_blob(&mut db, b"0123456789").id;

        let mut first = db.stream(id).unwrap();
        let mut head = [0u8; 6];
        first.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"012345");

        let mut second = db.stream(id).unwrap();
        assert_eq!(second.read_to_vec().unwrap(), b"0123456789");
        assert_eq!(first.read_to_vec().unwrap(), b"6789");
    }

    #[test]
    fn stored_readers_stay_idle() {
        let mut db = MemoryDb::new();
        let ids: Vec<_> = (0..1000)
            .map(|i| store_blob(&mut db, format!("object number {i}").as_bytes()).id)
            .collect();
        assert_eq!(db.size(), 1000);
        assert!(db.objects.values().all(|obj| !obj.reader.is_decoding()));

        let mut ostream = db.stream(ids[17]).unwrap();
        assert!(!ostream.reader.is_decoding());
        assert_eq!(ostream.read_to_vec().unwrap(), b"object number 17");
        assert!(ostream.reader.is_decoding());
        assert!(!db.objects[&ids[17]].reader.is_decoding());
    }

    #[test]
    fn ostream_seeks() {
        let mut db = MemoryDb::new();
        let id = store_blob(&mut db, b"abcdef").id;
        let mut ostream = db.stream(id).unwrap();
        ostream.seek(SeekFrom::End(-2)).unwrap();
        assert_eq!(ostream.read_to_vec().unwrap(), b"ef");
        ostream.rewind().unwrap();
        assert_eq!(ostream.read_to_vec().unwrap(), b"abcdef");
    }

    // -----------------------------------------------------------------------
    // Content addressing
    // -----------------------------------------------------------------------

    #[test]
    fn same_content_is_stored_once() {
        let mut db = MemoryDb::new();
        let id1 = store_blob(&mut db, b"identical content").id;
        let id2 = store_blob(&mut db, b"identical content").id;
        assert_eq!(id1, id2);
        assert_eq!(db.size(), 1);
        assert_eq!(read_content(&db, id1), b"identical content");
    }

    #[test]
    fn distinct_content_gets_distinct_ids() {
        let mut db = MemoryDb::new();
        let a = store_blob(&mut db, b"aaa").id;
        let b = store_blob(&mut db, b"bbb").id;
        assert_ne!(a, b);
        assert_eq!(db.size(), 2);

        let mut ids: Vec<_> = db.sha_iter().collect();
        ids.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn same_bytes_different_type() {
        let mut db = MemoryDb::new();
        let blob = store_blob(&mut db, b"payload").id;
        let tag = db
            .store(IStream::from_bytes(ObjectType::Tag, b"payload"))
            .unwrap()
            .id;
        assert_ne!(blob, tag);
        assert_eq!(db.info(tag).unwrap().kind, ObjectType::Tag);
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    #[test]
    fn hex_and_binary_ids_are_equivalent() {
        let mut db = MemoryDb::new();
        let id = store_blob(&mut db, b"hex").id;
        let hex = id.to_hex();
        assert!(db.has_object(hex.as_str()).unwrap());
        assert!(db.has_object(&hex.to_uppercase()).unwrap());
        assert!(db.has_object(*id.as_bytes()).unwrap());
        assert!(db.has_object(id.as_bytes().as_slice()).unwrap());
        assert_eq!(db.info(hex).unwrap().id, id);
    }

    #[test]
    fn missing_object_is_not_found() {
        let mut db = MemoryDb::new();
        store_blob(&mut db, b"something else");
        let missing = hash_object(ObjectType::Blob, b"never stored");

        assert!(!db.has_object(missing).unwrap());
        assert!(matches!(db.info(missing), Err(OdbError::NotFound(id)) if id == missing));
        assert!(matches!(db.stream(missing), Err(OdbError::NotFound(_))));
        assert!(matches!(
            db.stream(missing.to_hex()),
            Err(OdbError::NotFound(_))
        ));
    }

    #[test]
    fn malformed_hex_is_rejected_before_lookup() {
        let db = MemoryDb::new();
        assert!(matches!(
            db.has_object("not-a-hash"),
            Err(OdbError::MalformedHash(TypeError::InvalidLength { .. }))
        ));
        let bad = "g".repeat(40);
        assert!(matches!(
            db.stream(bad.as_str()),
            Err(OdbError::MalformedHash(TypeError::InvalidHex(_)))
        ));
        assert!(matches!(
            db.info(&[1u8, 2, 3][..]),
            Err(OdbError::MalformedHash(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Failed stores leave nothing behind
    // -----------------------------------------------------------------------

    #[test]
    fn size_mismatch_leaves_no_entry() {
        let mut db = MemoryDb::new();
        let err = db
            .store(IStream::new(ObjectType::Blob, 100, &b"short"[..]))
            .unwrap_err();
        assert!(matches!(err, OdbError::Codec(CodecError::SizeMismatch { .. })));
        assert!(db.is_empty());
        assert!(!db
            .has_object(hash_object(ObjectType::Blob, b"short"))
            .unwrap());
    }

    #[test]
    fn source_io_error_leaves_no_entry() {
        struct FailsHalfway(usize);
        impl Read for FailsHalfway {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0 == 0 {
                    return Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone"));
                }
                self.0 -= 1;
                buf[0] = b'x';
                Ok(1)
            }
        }

        let mut db = MemoryDb::new();
        store_blob(&mut db, b"kept");
        let err = db
            .store(IStream::unknown_size(ObjectType::Blob, FailsHalfway(3)))
            .unwrap_err();
        assert!(matches!(err, OdbError::Codec(CodecError::Io(_))));
        assert_eq!(db.size(), 1);
    }

    // -----------------------------------------------------------------------
    // Rejected capabilities
    // -----------------------------------------------------------------------

    #[test]
    fn store_async_is_unsupported() {
        let mut db = MemoryDb::new();
        assert!(matches!(
            db.store_async(&b"data"[..]),
            Err(OdbError::Unsupported(_))
        ));
        store_blob(&mut db, b"populated");
        assert!(matches!(
            db.store_async(io::empty()),
            Err(OdbError::Unsupported(_))
        ));
        assert_eq!(db.size(), 1);
    }

    #[test]
    fn set_ostream_is_unsupported() {
        let mut db = MemoryDb::new();
        assert!(matches!(
            db.set_ostream(Vec::new()),
            Err(OdbError::Unsupported(_))
        ));
        assert!(matches!(
            db.set_ostream(io::sink()),
            Err(OdbError::Unsupported(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Iteration
    // -----------------------------------------------------------------------

    #[test]
    fn sha_iter_is_a_snapshot() {
        let mut db = MemoryDb::new();
        store_blob(&mut db, b"one");
        let iter = db.sha_iter();
        store_blob(&mut db, b"two");
        assert_eq!(iter.count(), 1);
        assert_eq!(db.sha_iter().count(), 2);
        assert_eq!(db.sha_iter().count(), 2);
    }

    #[test]
    fn empty_db() {
        let db = MemoryDb::default();
        assert!(db.is_empty());
        assert_eq!(db.size(), 0);
        assert_eq!(db.sha_iter().next(), None);
        assert_eq!(db.compressed_bytes(), 0);
    }

    // -----------------------------------------------------------------------
    // Stream copy
    // -----------------------------------------------------------------------

    #[test]
    fn stream_copy_skips_existing() {
        let mut staging = MemoryDb::new();
        let a = store_blob(&mut staging, b"alpha").id;
        let b = store_blob(&mut staging, b"beta").id;

        let mut target = MemoryDb::new();
        store_blob(&mut target, b"alpha");

        let copied = staging.stream_copy(staging.sha_iter(), &mut target).unwrap();
        assert_eq!(copied, 1);
        assert_eq!(target.size(), 2);
        assert_eq!(read_content(&target, b), b"beta");
        assert_eq!(read_content(&target, a), b"alpha");

        assert_eq!(staging.stream_copy([a, b], &mut target).unwrap(), 0);
    }

    #[test]
    fn stream_copy_unknown_id_fails() {
        let staging = MemoryDb::new();
        let mut target = MemoryDb::new();
        let missing = hash_object(ObjectType::Blob, b"absent");
        let err = staging.stream_copy([missing], &mut target).unwrap_err();
        assert!(matches!(err, OdbError::NotFound(id) if id == missing));
        assert!(target.is_empty());
    }

    // -----------------------------------------------------------------------
    // Configuration / introspection
    // -----------------------------------------------------------------------

    #[test]
    fn with_config_validates() {
        let db = MemoryDb::with_config(MemoryDbConfig {
            compression_level: 19,
        })
        .unwrap();
        assert_eq!(db.config().compression_level, 19);

        let err = MemoryDb::with_config(MemoryDbConfig {
            compression_level: 500,
        })
        .unwrap_err();
        assert!(matches!(err, OdbError::Config(_)));
    }

    #[test]
    fn compressed_bytes_smaller_than_content() {
        let mut db = MemoryDb::new();
        store_blob(&mut db, &vec![b'z'; 64 * 1024]);
        let compressed = db.compressed_bytes();
        assert!(compressed > 0);
        assert!(compressed < 64 * 1024);
    }

    #[test]
    fn debug_format() {
        let mut db = MemoryDb::new();
        store_blob(&mut db, b"x");
        let debug = format!("{db:?}");
        assert!(debug.contains("MemoryDb"));
        assert!(debug.contains("object_count: 1"));
    }
}
