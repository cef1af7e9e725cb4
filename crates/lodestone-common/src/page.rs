//! Page identifiers for LodestoneDB storage.

use serde::{Deserialize, Serialize};

/// Page size in bytes (4 KB).
pub const PAGE_SIZE: usize = 4096;

/// Unique identifier for a page within the data file.
///
/// Valid page ids are non-negative; `PageId::INVALID` (-1) is the
/// sentinel for "no page". Page 0 is reserved for the header page that
/// records index roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageId(pub i32);

impl PageId {
    /// Sentinel for the absence of a page.
    pub const INVALID: PageId = PageId(-1);

    /// The reserved header page.
    pub const HEADER: PageId = PageId(0);

    /// Creates a new page id.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns true if this id refers to an actual page.
    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }

    /// Serializes the id to little-endian bytes.
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Deserializes an id from little-endian bytes.
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(i32::from_le_bytes(bytes))
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page:{}", self.0)
    }
}
