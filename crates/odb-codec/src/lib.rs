//! Object codec for the in-memory object database.
//!
//! Two collaborators live here, both free of any storage state:
//!
//! - [`frame`] turns a raw byte stream into its canonical framed form
//!   (`"<type> <size>\0" || content`) and hashes it with SHA-1. The resulting
//!   ids are identical to git's loose object ids.
//! - [`zstream`] compresses framed bytes with zstd ([`ZstdWriter`]) and reads
//!   them back as a seekable content stream ([`DecompressReader`]) that finds
//!   its own end from the zstd frame.

pub mod error;
pub mod frame;
pub mod zstream;

pub use error::{CodecError, CodecResult};
pub use frame::{frame, hash_object, header, parse_header, FramedObject, Header, MAX_HEADER_LEN};
pub use zstream::{level_range, DecompressReader, ZstdWriter, DEFAULT_LEVEL};
