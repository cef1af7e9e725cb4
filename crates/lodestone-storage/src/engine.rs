//! Engine facade: wires the disk manager and buffer pool to an
//! explicit open/close lifecycle.

use crate::disk::{DiskManagerConfig, FileDiskManager};
use lodestone_buffer::{BufferPoolConfig, BufferPoolManager};
use lodestone_common::{Result, StorageConfig};
use std::sync::Arc;

/// An opened storage engine.
///
/// Opening builds the file disk manager (reserving the header page on
/// a fresh file) and the buffer pool over it. Closing flushes every
/// resident page and syncs the data file; until then, a page is
/// durable only after an explicit flush.
pub struct StorageEngine {
    disk: Arc<FileDiskManager>,
    pool: Arc<BufferPoolManager>,
}

impl StorageEngine {
    /// Opens the engine over the configured data file.
    pub fn open(config: StorageConfig) -> Result<Self> {
        let disk = Arc::new(FileDiskManager::open(DiskManagerConfig {
            path: config.data_path.clone(),
            fsync_enabled: config.fsync_enabled,
        })?);
        let pool = Arc::new(BufferPoolManager::new(
            BufferPoolConfig {
                pool_size: config.buffer_pool_pages,
                replacer_k: config.replacer_k,
                bucket_size: config.hash_bucket_size,
            },
            Arc::clone(&disk) as Arc<dyn lodestone_common::DiskManager>,
        ));
        tracing::debug!(path = %config.data_path.display(), frames = config.buffer_pool_pages, "storage engine opened");
        Ok(Self { disk, pool })
    }

    /// Returns the buffer pool.
    pub fn buffer_pool(&self) -> Arc<BufferPoolManager> {
        Arc::clone(&self.pool)
    }

    /// Returns the disk manager.
    pub fn disk(&self) -> Arc<FileDiskManager> {
        Arc::clone(&self.disk)
    }

    /// Flushes all resident pages and syncs the data file.
    pub fn close(self) -> Result<()> {
        use lodestone_common::DiskManager;

        self.pool.flush_all()?;
        self.disk.sync()?;
        tracing::debug!("storage engine closed");
        Ok(())
    }
}
