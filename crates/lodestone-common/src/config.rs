//! Configuration structures for LodestoneDB.

use crate::page::PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration for the database engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the data file.
    pub data_path: PathBuf,
    /// Buffer pool size in number of frames.
    pub buffer_pool_pages: usize,
    /// K parameter of the LRU-K replacer.
    pub replacer_k: usize,
    /// Bucket capacity of the extendible hash page table.
    pub hash_bucket_size: usize,
    /// Enable fsync after every page write.
    pub fsync_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./lodestone.db"),
            buffer_pool_pages: 1024, // 4 MB with 4 KB pages
            replacer_k: 2,
            hash_bucket_size: 4,
            fsync_enabled: true,
        }
    }
}

impl StorageConfig {
    /// Returns the total buffer pool size in bytes.
    pub fn buffer_pool_size_bytes(&self) -> usize {
        self.buffer_pool_pages * PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.buffer_pool_pages, 1024);
        assert_eq!(config.replacer_k, 2);
        assert_eq!(config.hash_bucket_size, 4);
        assert!(config.fsync_enabled);
    }

    #[test]
    fn test_buffer_pool_size_bytes() {
        let config = StorageConfig {
            buffer_pool_pages: 16,
            ..Default::default()
        };
        assert_eq!(config.buffer_pool_size_bytes(), 16 * PAGE_SIZE);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let original = StorageConfig {
            data_path: PathBuf::from("/tmp/test.db"),
            buffer_pool_pages: 64,
            replacer_k: 3,
            hash_bucket_size: 8,
            fsync_enabled: false,
        };
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: StorageConfig = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.data_path, original.data_path);
        assert_eq!(deserialized.buffer_pool_pages, 64);
        assert_eq!(deserialized.replacer_k, 3);
        assert_eq!(deserialized.hash_bucket_size, 8);
        assert!(!deserialized.fsync_enabled);
    }
}
