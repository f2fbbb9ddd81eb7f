use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::object::ObjectId;

/// The type of a stored object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    /// Raw content (file contents, arbitrary data).
    Blob,
    /// Directory listing.
    Tree,
    /// Commit record.
    Commit,
    /// Annotated tag.
    Tag,
}

impl ObjectType {
    /// Every object type, in canonical order.
    pub const ALL: [ObjectType; 4] = [Self::Blob, Self::Tree, Self::Commit, Self::Tag];

    /// The canonical name used in object headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            "tag" => Ok(Self::Tag),
            other => Err(TypeError::UnknownObjectType(other.to_string())),
        }
    }
}

/// Canonical header of an object: its id, type and content size.
///
/// `size` is the length of the original content, not of any compressed or
/// framed representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub kind: ObjectType,
    pub size: u64,
}

impl ObjectInfo {
    pub fn new(id: ObjectId, kind: ObjectType, size: u64) -> Self {
        Self { id, kind, size }
    }
}
