use std::io::Read;

use odb_types::{ObjectId, ObjectInfo, ObjectType};
use sha1::{Digest, Sha1};

use crate::error::{CodecError, CodecResult};

/// Upper bound on the length of a canonical header, terminator included.
///
/// `"commit " + u64::MAX + "\0"` is 28 bytes.
pub const MAX_HEADER_LEN: usize = 32;

/// Parsed canonical header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub kind: ObjectType,
    pub size: u64,
    /// Length of the header in bytes, including the NUL terminator.
    pub len: usize,
}

/// An object in canonical form, ready to be compressed and stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramedObject {
    pub info: ObjectInfo,
    /// `header || content`; the bytes the id was computed from.
    pub canonical: Vec<u8>,
}

/// Canonical header for an object of `kind` with `size` content bytes.
pub fn header(kind: ObjectType, size: u64) -> Vec<u8> {
    format!("{kind} {size}\0").into_bytes()
}

/// Parse a canonical header from the start of `data`.
pub fn parse_header(data: &[u8]) -> CodecResult<Header> {
    let window = &data[..data.len().min(MAX_HEADER_LEN)];
    let nul = window.iter().position(|&b| b == 0).ok_or_else(|| {
        CodecError::InvalidHeader(format!("no NUL terminator in first {MAX_HEADER_LEN} bytes"))
    })?;
    let text = std::str::from_utf8(&window[..nul])
        .map_err(|_| CodecError::InvalidHeader("header is not ASCII".into()))?;
    let (name, size) = text
        .split_once(' ')
        .ok_or_else(|| CodecError::InvalidHeader(format!("missing size in {text:?}")))?;
    let kind = name
        .parse::<ObjectType>()
        .map_err(|e| CodecError::InvalidHeader(e.to_string()))?;
    // u64::from_str accepts a leading '+', the canonical form does not.
    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidHeader(format!("bad size {size:?}")));
    }
    let size = size
        .parse::<u64>()
        .map_err(|e| CodecError::InvalidHeader(format!("bad size {size:?}: {e}")))?;
    Ok(Header {
        kind,
        size,
        len: nul + 1,
    })
}

/// Consume `reader` and produce the canonical framed object.
///
/// When `declared_size` is given, the stream must contain exactly that many
/// bytes.
pub fn frame<R: Read>(
    kind: ObjectType,
    declared_size: Option<u64>,
    mut reader: R,
) -> CodecResult<FramedObject> {
    let mut content = Vec::new();
    reader.read_to_end(&mut content)?;
    let actual = content.len() as u64;
    if let Some(declared) = declared_size {
        if declared != actual {
            return Err(CodecError::SizeMismatch { declared, actual });
        }
    }

    let mut canonical = header(kind, actual);
    canonical.extend_from_slice(&content);

    let id = digest(&[canonical.as_slice()]);
    tracing::trace!(%id, %kind, size = actual, "framed object");
    Ok(FramedObject {
        info: ObjectInfo::new(id, kind, actual),
        canonical,
    })
}

/// Id of `data` as an object of `kind`, without building the framed buffer.
pub fn hash_object(kind: ObjectType, data: &[u8]) -> ObjectId {
    let head = header(kind, data.len() as u64);
    digest(&[head.as_slice(), data])
}

fn digest(parts: &[&[u8]]) -> ObjectId {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(&hasher.finalize());
    ObjectId::from_hash(out)
}
