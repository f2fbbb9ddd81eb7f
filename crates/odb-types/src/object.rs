use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Content-addressed identifier for any stored object.
///
/// An `ObjectId` is the 20-byte SHA-1 digest of an object's canonical framed
/// bytes. Identical content always produces the same `ObjectId`, making
/// objects deduplicatable and verifiable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    /// Length of the binary form in bytes.
    pub const LEN: usize = 20;

    /// Length of the hex form in characters.
    pub const HEX_LEN: usize = 40;

    /// The null object ID (all zeros). Represents "no object".
    pub const NULL: Self = Self([0u8; 20]);

    /// Create an `ObjectId` from a pre-computed digest.
    pub const fn from_hash(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// Returns `true` if this is the null object ID.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 40-character hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != Self::HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::HEX_LEN,
                actual: s.len(),
            });
        }
        let mut arr = [0u8; 20];
        hex::decode_to_slice(s, &mut arr).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(arr))
    }

    /// Parse from a binary slice, which must be exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 20]> for ObjectId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<ObjectId> for [u8; 20] {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl TryFrom<&[u8]> for ObjectId {
    type Error = TypeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl AsRef<[u8]> for ObjectId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// Serialized as a hex string so ids read naturally in JSON and TOML.
impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Conversion from any accepted id representation into a binary [`ObjectId`].
///
/// Database APIs take `impl IntoObjectId` so callers can pass either the
/// binary digest or its hex encoding. Textual forms are validated here,
/// before any lookup happens.
pub trait IntoObjectId {
    fn into_object_id(self) -> Result<ObjectId, TypeError>;
}

impl IntoObjectId for ObjectId {
    fn into_object_id(self) -> Result<ObjectId, TypeError> {
        Ok(self)
    }
}

impl IntoObjectId for &ObjectId {
    fn into_object_id(self) -> Result<ObjectId, TypeError> {
        Ok(*self)
    }
}

impl IntoObjectId for [u8; 20] {
    fn into_object_id(self) -> Result<ObjectId, TypeError> {
        Ok(ObjectId(self))
    }
}

impl IntoObjectId for &[u8; 20] {
    fn into_object_id(self) -> Result<ObjectId, TypeError> {
        Ok(ObjectId(*self))
    }
}

impl IntoObjectId for &[u8] {
    fn into_object_id(self) -> Result<ObjectId, TypeError> {
        ObjectId::from_slice(self)
    }
}

impl IntoObjectId for &str {
    fn into_object_id(self) -> Result<ObjectId, TypeError> {
        ObjectId::from_hex(self)
    }
}

impl IntoObjectId for &String {
    fn into_object_id(self) -> Result<ObjectId, TypeError> {
        ObjectId::from_hex(self)
    }
}

impl IntoObjectId for String {
    fn into_object_id(self) -> Result<ObjectId, TypeError> {
        ObjectId::from_hex(&self)
    }
}
