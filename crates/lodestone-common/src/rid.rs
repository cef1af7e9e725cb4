//! Row identifiers.

use crate::page::PageId;
use serde::{Deserialize, Serialize};

/// Unique identifier for a tuple within the database.
///
/// Combines a heap page id with a slot number to locate where a tuple
/// is stored. The B+ tree stores `Rid`s as its leaf values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rid {
    /// Page containing the tuple.
    pub page_id: PageId,
    /// Slot number within the page.
    pub slot: u32,
}

impl Rid {
    /// Invalid row id.
    pub const INVALID: Rid = Rid {
        page_id: PageId::INVALID,
        slot: u32::MAX,
    };

    /// Creates a new row id.
    pub fn new(page_id: PageId, slot: u32) -> Self {
        Self { page_id, slot }
    }

    /// Builds a row id from a packed 64-bit key: the page id comes from
    /// the high 32 bits, the slot from the low 32. Used by the
    /// file-driven index test helpers.
    pub fn from_key(key: i64) -> Self {
        Self {
            page_id: PageId((key >> 32) as i32),
            slot: key as u32,
        }
    }

    /// Returns true if this is a valid row id.
    pub fn is_valid(&self) -> bool {
        self.page_id.is_valid()
    }
}

impl std::fmt::Display for Rid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.page_id, self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rid_new() {
        let rid = Rid::new(PageId(3), 7);
        assert_eq!(rid.page_id, PageId(3));
        assert_eq!(rid.slot, 7);
        assert!(rid.is_valid());
    }

    #[test]
    fn test_rid_invalid() {
        assert!(!Rid::INVALID.is_valid());
    }

    #[test]
    fn test_rid_from_key() {
        let rid = Rid::from_key((5i64 << 32) | 9);
        assert_eq!(rid.page_id, PageId(5));
        assert_eq!(rid.slot, 9);

        let rid = Rid::from_key(42);
        assert_eq!(rid.page_id, PageId(0));
        assert_eq!(rid.slot, 42);
    }

    #[test]
    fn test_rid_display() {
        assert_eq!(Rid::new(PageId(1), 2).to_string(), "page:1:2");
    }
}
