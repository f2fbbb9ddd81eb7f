use std::io::{self, Read, Seek, SeekFrom};

use odb_codec::DecompressReader;
use odb_types::{ObjectId, ObjectInfo, ObjectType};

/// An object to be written: its type, optionally its size, and its content.
#[derive(Debug)]
pub struct IStream<R> {
    pub kind: ObjectType,
    /// Declared content size. When set, the reader must yield exactly this
    /// many bytes.
    pub size: Option<u64>,
    pub reader: R,
}

impl<R: Read> IStream<R> {
    pub fn new(kind: ObjectType, size: u64, reader: R) -> Self {
        Self {
            kind,
            size: Some(size),
            reader,
        }
    }

    /// An input whose length is only known once the reader is exhausted.
    pub fn unknown_size(kind: ObjectType, reader: R) -> Self {
        Self {
            kind,
            size: None,
            reader,
        }
    }
}

impl<'a> IStream<&'a [u8]> {
    pub fn from_bytes(kind: ObjectType, data: &'a [u8]) -> Self {
        Self::new(kind, data.len() as u64, data)
    }
}

/// A stored object as returned to callers: its canonical header plus a
/// reader over its content, positioned at offset 0.
#[derive(Debug)]
pub struct OStream {
    pub info: ObjectInfo,
    pub reader: DecompressReader,
}

impl OStream {
    pub fn id(&self) -> ObjectId {
        self.info.id
    }

    pub fn kind(&self) -> ObjectType {
        self.info.kind
    }

    pub fn size(&self) -> u64 {
        self.info.size
    }

    /// Read the remaining content into a vector.
    pub fn read_to_vec(&mut self) -> io::Result<Vec<u8>> {
        let remaining = self.info.size.saturating_sub(self.reader.position());
        let mut out = Vec::with_capacity(remaining as usize);
        self.reader.read_to_end(&mut out)?;
        Ok(out)
    }
}

impl Read for OStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Seek for OStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.reader.seek(pos)
    }
}
