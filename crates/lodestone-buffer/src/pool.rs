//! Buffer pool manager.

use crate::frame::{BufferFrame, FrameId};
use crate::hash_table::ExtendibleHashTable;
use crate::replacer::{LruKReplacer, Replacer};
use lodestone_common::page::{PageId, PAGE_SIZE};
use lodestone_common::{DiskManager, LodestoneError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use sysinfo::System;

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub pool_size: usize,
    /// K parameter of the LRU-K replacer.
    pub replacer_k: usize,
    /// Bucket capacity of the extendible hash page table.
    pub bucket_size: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 1024,
            replacer_k: 2,
            bucket_size: 4,
        }
    }
}

/// Buffer pool manager.
///
/// Owns a fixed array of page frames and mediates between callers and
/// the disk manager:
/// - an extendible hash page table maps resident page ids to frames
/// - a free list hands out never-used frames (LIFO)
/// - an LRU-K replacer picks victims once the free list drains
/// - pin counts keep frames stable while callers hold them
///
/// A pool-level mutex serializes the public operations; the page
/// table, replacer, and free list each keep their own lock and are
/// only ever taken under the pool latch.
pub struct BufferPoolManager {
    pool_size: usize,
    frames: Vec<BufferFrame>,
    page_table: ExtendibleHashTable<PageId, FrameId>,
    replacer: LruKReplacer,
    free_list: Mutex<Vec<FrameId>>,
    disk: Arc<dyn DiskManager>,
    latch: Mutex<()>,
}

impl BufferPoolManager {
    /// Creates a new buffer pool over the given disk manager.
    pub fn new(config: BufferPoolConfig, disk: Arc<dyn DiskManager>) -> Self {
        let pool_size = config.pool_size;
        let frames: Vec<_> = (0..pool_size)
            .map(|i| BufferFrame::new(FrameId(i as u32)))
            .collect();

        // free list pops from the back, so push in reverse to hand out
        // frame 0 first
        let free_list: Vec<_> = (0..pool_size).rev().map(|i| FrameId(i as u32)).collect();

        Self {
            pool_size,
            frames,
            page_table: ExtendibleHashTable::new(config.bucket_size),
            replacer: LruKReplacer::new(pool_size, config.replacer_k),
            free_list: Mutex::new(free_list),
            disk,
            latch: Mutex::new(()),
        }
    }

    /// Creates a buffer pool sized to a quarter of available system
    /// RAM, with a floor of 1024 frames for small machines.
    pub fn auto_sized(config: BufferPoolConfig, disk: Arc<dyn DiskManager>) -> Self {
        let mut sys = System::new_all();
        sys.refresh_memory();

        let target_bytes = sys.available_memory() as usize / 4;
        let pool_size = (target_bytes / PAGE_SIZE).max(1024);

        Self::new(
            BufferPoolConfig {
                pool_size,
                ..config
            },
            disk,
        )
    }

    /// Returns the number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns the number of free frames.
    pub fn free_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Returns true if the page is resident.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.page_table.find(&page_id).is_some()
    }

    /// Acquires a frame for a new resident page: free list first, then
    /// eviction. A dirty victim is written back before reuse and its
    /// page table entry removed.
    fn acquire_frame(&self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.lock().pop() {
            return Ok(frame_id);
        }

        let victim = self.replacer.evict().ok_or(LodestoneError::PoolExhausted)?;
        let frame = &self.frames[victim.0 as usize];
        if let Some(old_page_id) = frame.page_id() {
            if frame.is_dirty() {
                tracing::trace!(page_id = %old_page_id, frame = %victim, "writing back dirty victim");
                let data = frame.read_data();
                self.disk.write_page(old_page_id, &data)?;
            }
            self.page_table.remove(&old_page_id);
        }
        Ok(victim)
    }

    /// Allocates a new page on disk and pins it in a frame.
    ///
    /// The frame comes back zeroed, clean, with a pin count of one.
    /// Fails with `PoolExhausted` when every frame is pinned.
    pub fn new_page(&self) -> Result<(PageId, &BufferFrame)> {
        let _guard = self.latch.lock();

        let page_id = self.disk.allocate_page()?;
        let frame_id = self.acquire_frame()?;
        let frame = &self.frames[frame_id.0 as usize];

        frame.reset();
        frame.set_page_id(Some(page_id));
        frame.pin();

        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);

        Ok((page_id, frame))
    }

    /// Fetches a page, pinning it. Loads from disk on a miss.
    ///
    /// Fails with `PoolExhausted` when the page is not resident and
    /// every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> Result<&BufferFrame> {
        let _guard = self.latch.lock();

        if let Some(frame_id) = self.page_table.find(&page_id) {
            let frame = &self.frames[frame_id.0 as usize];
            frame.pin();
            self.replacer.set_evictable(frame_id, false);
            self.replacer.record_access(frame_id);
            return Ok(frame);
        }

        let frame_id = self.acquire_frame()?;
        let frame = &self.frames[frame_id.0 as usize];
        frame.reset();

        let read_result = {
            let mut data = frame.write_data();
            self.disk.read_page(page_id, &mut data)
        };
        if let Err(e) = read_result {
            frame.reset();
            self.free_list.lock().push(frame_id);
            return Err(e);
        }

        frame.set_page_id(Some(page_id));
        frame.pin();
        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);

        Ok(frame)
    }

    /// Drops one pin on the page, optionally marking it dirty.
    ///
    /// Returns false if the page is not resident or was not pinned.
    /// The dirty flag is only ever raised here, never cleared.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let _guard = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id.0 as usize];
        if frame.pin_count() == 0 {
            return false;
        }

        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Writes the page to disk and clears its dirty flag, regardless
    /// of pin state. Returns false if the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let _guard = self.latch.lock();
        self.flush_page_locked(page_id)
    }

    fn flush_page_locked(&self, page_id: PageId) -> Result<bool> {
        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(false);
        };
        let frame = &self.frames[frame_id.0 as usize];
        {
            let data = frame.read_data();
            self.disk.write_page(page_id, &data)?;
        }
        frame.set_dirty(false);
        Ok(true)
    }

    /// Flushes every resident page. Returns the number flushed.
    pub fn flush_all(&self) -> Result<usize> {
        let _guard = self.latch.lock();

        let mut flushed = 0;
        for frame in &self.frames {
            if let Some(page_id) = frame.page_id() {
                let data = frame.read_data();
                self.disk.write_page(page_id, &data)?;
                frame.set_dirty(false);
                flushed += 1;
            }
        }
        tracing::debug!(flushed, "flushed all resident pages");
        Ok(flushed)
    }

    /// Evicts the page from the pool, returning its frame to the free
    /// list. The disk id is not reclaimed.
    ///
    /// Returns true if the page is absent (nothing to do) or was
    /// removed; false if it is pinned. Dirty pages are written back
    /// before removal.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let _guard = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return Ok(true);
        };
        let frame = &self.frames[frame_id.0 as usize];
        if frame.pin_count() > 0 {
            return Ok(false);
        }

        if frame.is_dirty() {
            let data = frame.read_data();
            self.disk.write_page(page_id, &data)?;
        }

        self.page_table.remove(&page_id);
        self.replacer.remove(frame_id);
        frame.reset();
        self.free_list.lock().push(frame_id);
        Ok(true)
    }

    /// Fetches a page behind a read guard that unpins on drop.
    pub fn read_page(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        Ok(PageReadGuard {
            pool: self,
            page_id,
            frame,
        })
    }

    /// Fetches a page behind a write guard that marks it dirty and
    /// unpins on drop.
    pub fn write_page(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        Ok(PageWriteGuard {
            pool: self,
            page_id,
            frame,
        })
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let mut used = 0;
        let mut pinned = 0;
        let mut dirty = 0;
        for frame in &self.frames {
            if frame.page_id().is_some() {
                used += 1;
                if frame.is_pinned() {
                    pinned += 1;
                }
                if frame.is_dirty() {
                    dirty += 1;
                }
            }
        }
        BufferPoolStats {
            total_frames: self.pool_size,
            free_frames: self.free_count(),
            used_frames: used,
            pinned_frames: pinned,
            dirty_frames: dirty,
        }
    }
}

impl std::fmt::Debug for BufferPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPoolManager")
            .field("pool_size", &self.pool_size)
            .field("free_frames", &self.free_count())
            .finish()
    }
}

/// Statistics about the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolStats {
    /// Total number of frames.
    pub total_frames: usize,
    /// Number of frames on the free list.
    pub free_frames: usize,
    /// Number of frames holding a page.
    pub used_frames: usize,
    /// Number of pinned frames.
    pub pinned_frames: usize,
    /// Number of dirty frames.
    pub dirty_frames: usize,
}

/// RAII guard for reading a page. Holds one pin.
pub struct PageReadGuard<'a> {
    pool: &'a BufferPoolManager,
    page_id: PageId,
    frame: &'a BufferFrame,
}

impl<'a> PageReadGuard<'a> {
    /// Returns the page id.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the page data.
    pub fn data(&self) -> parking_lot::RwLockReadGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.frame.read_data()
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        self.pool.unpin_page(self.page_id, false);
    }
}

/// RAII guard for writing a page. Holds one pin and unpins dirty.
pub struct PageWriteGuard<'a> {
    pool: &'a BufferPoolManager,
    page_id: PageId,
    frame: &'a BufferFrame,
}

impl<'a> PageWriteGuard<'a> {
    /// Returns the page id.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns mutable access to the page data.
    pub fn data_mut(&self) -> parking_lot::RwLockWriteGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.frame.write_data()
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        self.pool.unpin_page(self.page_id, true);
    }
}
