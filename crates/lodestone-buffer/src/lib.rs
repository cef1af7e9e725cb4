//! Buffer pool management for LodestoneDB.
//!
//! This crate provides the in-memory side of the storage engine:
//! - `BufferFrame`: a pool slot holding one page's bytes and metadata
//! - `ExtendibleHashTable`: the page id to frame id directory
//! - `LruKReplacer`: the eviction policy
//! - `BufferPoolManager`: pin/unpin/new/delete/flush over a fixed set
//!   of frames backed by a disk manager

pub mod frame;
pub mod hash_table;
pub mod pool;
pub mod replacer;

pub use frame::{BufferFrame, FrameId};
pub use hash_table::ExtendibleHashTable;
pub use pool::{BufferPoolConfig, BufferPoolManager, BufferPoolStats, PageReadGuard, PageWriteGuard};
pub use replacer::{LruKReplacer, Replacer};
