//! Storage engine for LodestoneDB.
//!
//! This crate provides:
//! - A file-backed disk manager for page-level I/O
//! - The header page registry mapping index names to root page ids
//! - A B+ tree index built on the buffer pool
//! - A small engine facade wiring disk manager and buffer pool to an
//!   explicit open/close lifecycle

pub mod btree;
pub mod disk;
pub mod engine;
pub mod header;

pub use btree::{BPlusTree, GenericKey, IndexKey, TreeIter};
pub use disk::{DiskManagerConfig, FileDiskManager};
pub use engine::StorageEngine;
pub use header::{HeaderPage, HEADER_PAGE_ID, MAX_INDEX_NAME_LEN};
