//! File-backed disk manager for page-level I/O.

use lodestone_common::page::{PageId, PAGE_SIZE};
use lodestone_common::{DiskManager, LodestoneError, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Configuration for the file disk manager.
#[derive(Debug, Clone)]
pub struct DiskManagerConfig {
    /// Path of the data file.
    pub path: PathBuf,
    /// Enable fsync after writes.
    pub fsync_enabled: bool,
}

impl Default for DiskManagerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./lodestone.db"),
            fsync_enabled: true,
        }
    }
}

/// Manages reading and writing pages in a single data file.
///
/// Page `n` lives at byte offset `n * PAGE_SIZE`. Page 0 is reserved
/// for the header page at open time, so allocation starts at 1 and the
/// monotonic page counter re-derives from the file length on reopen.
/// Reads past the end of the file yield zeroed bytes, which is what an
/// allocated-but-never-written page reads as.
pub struct FileDiskManager {
    fsync_enabled: bool,
    path: PathBuf,
    state: Mutex<FileState>,
}

struct FileState {
    file: File,
    /// Pages handed out so far, including the reserved header page.
    num_pages: u32,
}

impl FileDiskManager {
    /// Opens (or creates) the data file.
    pub fn open(config: DiskManagerConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&config.path)?;

        let file_size = file.metadata()?.len();
        // reserve page 0 for the header page on a fresh file
        let num_pages = ((file_size / PAGE_SIZE as u64) as u32).max(1);

        Ok(Self {
            fsync_enabled: config.fsync_enabled,
            path: config.path,
            state: Mutex::new(FileState { file, num_pages }),
        })
    }

    /// Returns the data file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_page_id(page_id: PageId) -> Result<u64> {
        if !page_id.is_valid() {
            return Err(LodestoneError::InvalidPageId { page_id });
        }
        Ok(page_id.0 as u64 * PAGE_SIZE as u64)
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        let offset = Self::check_page_id(page_id)?;
        let mut state = self.state.lock();

        let file_size = state.file.metadata()?.len();
        if offset + PAGE_SIZE as u64 > file_size {
            // unallocated or never-written page
            buf.fill(0);
            return Ok(());
        }

        state.file.seek(SeekFrom::Start(offset))?;
        state.file.read_exact(buf)?;
        Ok(())
    }

    fn write_page(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()> {
        let offset = Self::check_page_id(page_id)?;
        let mut state = self.state.lock();

        state.file.seek(SeekFrom::Start(offset))?;
        state.file.write_all(data)?;
        if self.fsync_enabled {
            state.file.sync_all()?;
        }

        if page_id.0 as u32 >= state.num_pages {
            state.num_pages = page_id.0 as u32 + 1;
        }
        Ok(())
    }

    fn allocate_page(&self) -> Result<PageId> {
        let mut state = self.state.lock();
        let page_num = state.num_pages;

        // zero-extend the file so the allocation survives a reopen
        let offset = page_num as u64 * PAGE_SIZE as u64;
        state.file.seek(SeekFrom::Start(offset))?;
        state.file.write_all(&[0u8; PAGE_SIZE])?;
        if self.fsync_enabled {
            state.file.sync_all()?;
        }

        state.num_pages = page_num + 1;
        Ok(PageId(page_num as i32))
    }

    fn num_pages(&self) -> u32 {
        self.state.lock().num_pages
    }

    fn sync(&self) -> Result<()> {
        self.state.lock().file.sync_all()?;
        Ok(())
    }
}

impl Drop for FileDiskManager {
    fn drop(&mut self) {
        let _ = self.state.lock().file.sync_all();
    }
}
