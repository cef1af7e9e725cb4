//! B+ tree secondary index.
//!
//! Nodes are persisted as pages through the buffer pool. Leaves store
//! sorted `(key, Rid)` entries and are chained left to right for range
//! scans; internal nodes store sorted separator keys with child page
//! ids, with the slot-0 key unused. The tree is generic over a
//! fixed-width `IndexKey` and monomorphized per instantiation.

pub mod iterator;
pub mod key;
pub(crate) mod node;
pub mod tree;

pub use iterator::TreeIter;
pub use key::{GenericKey, IndexKey};
pub use tree::{max_internal_entries, max_leaf_entries, BPlusTree};
