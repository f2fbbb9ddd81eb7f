use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::ops::RangeInclusive;

use bytes::Bytes;
use odb_types::ObjectType;
use zstd::stream::read::Decoder;
use zstd::stream::write::Encoder;

use crate::error::{CodecError, CodecResult};
use crate::frame::{self, Header, MAX_HEADER_LEN};

/// Default zstd compression level.
pub const DEFAULT_LEVEL: i32 = 3;

type FrameDecoder = Decoder<'static, Cursor<Bytes>>;

/// Compression levels accepted by [`ZstdWriter::new`].
pub fn level_range() -> RangeInclusive<i32> {
    zstd::compression_level_range()
}

/// Write side of the compression transform.
///
/// Bytes written are compressed into an in-memory buffer. The buffer is only
/// complete once [`close`](Self::close) has finished the zstd frame.
pub struct ZstdWriter {
    encoder: Encoder<'static, Vec<u8>>,
    bytes_in: u64,
}

impl ZstdWriter {
    pub fn new(level: i32) -> io::Result<Self> {
        Ok(Self {
            encoder: Encoder::new(Vec::new(), level)?,
            bytes_in: 0,
        })
    }

    /// Uncompressed bytes accepted so far.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Finish the frame and hand back the compressed buffer.
    pub fn close(self) -> io::Result<Bytes> {
        let buf = self.encoder.finish()?;
        Ok(Bytes::from(buf))
    }
}

impl Write for ZstdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.encoder.write(buf)?;
        self.bytes_in += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

impl fmt::Debug for ZstdWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZstdWriter")
            .field("bytes_in", &self.bytes_in)
            .finish()
    }
}

/// Read side of the compression transform.
///
/// Wraps a compressed framed object and yields its content, header stripped.
/// The end of the content is taken from the zstd frame, not from the size in
/// the header; the two are cross-checked while reading.
///
/// The zstd decoder is only allocated once content is read and is released
/// again on rewind, so an idle reader holds nothing but the shared buffer.
///
/// Seeking is supported in both directions. Seeking backwards restarts
/// decompression from the beginning of the buffer.
pub struct DecompressReader {
    buffer: Bytes,
    decoder: Option<FrameDecoder>,
    kind: ObjectType,
    size: u64,
    pos: u64,
}

impl DecompressReader {
    /// Open a reader over `buffer`, validating the object header eagerly.
    pub fn open(buffer: Bytes) -> CodecResult<Self> {
        let header = read_header(&mut new_decoder(&buffer)?)?;
        Ok(Self {
            buffer,
            decoder: None,
            kind: header.kind,
            size: header.size,
            pos: 0,
        })
    }

    /// A new reader at offset 0 sharing this reader's buffer.
    pub fn rewound(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            decoder: None,
            kind: self.kind,
            size: self.size,
            pos: 0,
        }
    }

    pub fn kind(&self) -> ObjectType {
        self.kind
    }

    /// Content size declared by the object header.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current offset into the content.
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn compressed_len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether a decoder is currently allocated for this reader.
    pub fn is_decoding(&self) -> bool {
        self.decoder.is_some()
    }

    fn restart(&mut self) {
        self.decoder = None;
        self.pos = 0;
    }

    fn decoder(&mut self) -> io::Result<&mut FrameDecoder> {
        let decoder = match self.decoder.take() {
            Some(decoder) => decoder,
            None => {
                let mut decoder = new_decoder(&self.buffer)?;
                read_header(&mut decoder)?;
                decoder
            }
        };
        Ok(self.decoder.insert(decoder))
    }
}

fn new_decoder(buffer: &Bytes) -> io::Result<FrameDecoder> {
    Ok(Decoder::with_buffer(Cursor::new(buffer.clone()))?.single_frame())
}

fn read_header(decoder: &mut FrameDecoder) -> CodecResult<Header> {
    let mut head = Vec::with_capacity(MAX_HEADER_LEN);
    let mut byte = [0u8; 1];
    loop {
        if head.len() == MAX_HEADER_LEN {
            return Err(CodecError::InvalidHeader(format!(
                "no NUL terminator in first {MAX_HEADER_LEN} bytes"
            )));
        }
        if decoder.read(&mut byte)? == 0 {
            return Err(CodecError::InvalidHeader("stream ended inside header".into()));
        }
        head.push(byte[0]);
        if byte[0] == 0 {
            break;
        }
    }
    frame::parse_header(&head)
}

impl Read for DecompressReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.decoder()?.read(buf)?;
        if n == 0 {
            if self.pos < self.size {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("object stream ended after {} of {} bytes", self.pos, self.size),
                ));
            }
            return Ok(0);
        }
        self.pos += n as u64;
        if self.pos > self.size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("object stream longer than declared size {}", self.size),
            ));
        }
        Ok(n)
    }
}

impl Seek for DecompressReader {
    /// Seeking past the end stops at the end of the content.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
            SeekFrom::End(delta) => self.size.checked_add_signed(delta),
        }
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;

        if target < self.pos {
            self.restart();
        }
        let skip = target - self.pos;
        if skip > 0 {
            io::copy(&mut self.by_ref().take(skip), &mut io::sink())?;
        }
        Ok(self.pos)
    }
}

impl fmt::Debug for DecompressReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecompressReader")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("pos", &self.pos)
            .field("compressed_len", &self.buffer.len())
            .field("decoding", &self.is_decoding())
            .finish()
    }
}
