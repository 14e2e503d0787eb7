//! Disk manager for page-level file I/O.

use log::debug;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use granite_common::page::{PageId, PAGE_SIZE};
use granite_common::Result;

/// Manages reading and writing fixed-size pages against a single file.
///
/// Page ids are handed out by a monotonically increasing counter. Reads
/// past the end of the file are not an error: the page simply has not
/// been written yet and comes back zero-filled.
pub struct DiskManager {
    /// Path to the database file.
    path: PathBuf,
    /// The open file handle.
    file: Mutex<File>,
    /// Next page id to hand out.
    next_page_id: AtomicI32,
    /// Call sync_all after each write.
    fsync_enabled: bool,
}

impl DiskManager {
    /// Opens (or creates) the database file at `path`.
    ///
    /// The allocator resumes after the last whole page already present in
    /// the file, so re-opening an existing database never re-allocates a
    /// live page id.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, false)
    }

    /// Opens the database file with an explicit fsync setting.
    pub fn open_with(path: impl AsRef<Path>, fsync_enabled: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let file_size = file.metadata()?.len();
        let num_pages = (file_size / PAGE_SIZE as u64) as i32;

        Ok(Self {
            path,
            file: Mutex::new(file),
            next_page_id: AtomicI32::new(num_pages),
            fsync_enabled,
        })
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a page into `buf`, zero-filling anything past end of file.
    pub fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        debug_assert!(page_id.is_valid());
        debug_assert_eq!(buf.len(), PAGE_SIZE);

        let mut file = self.file.lock();
        let offset = page_id.file_offset();
        let file_size = file.metadata()?.len();

        if offset >= file_size {
            // Page was allocated but never written; normal signal.
            debug!("read of page {} beyond end of file, zero-filling", page_id);
            buf.fill(0);
            return Ok(());
        }

        file.seek(SeekFrom::Start(offset))?;
        let available = ((file_size - offset) as usize).min(PAGE_SIZE);
        file.read_exact(&mut buf[..available])?;
        if available < PAGE_SIZE {
            debug!("short read of page {}, zero-filling {} bytes", page_id, PAGE_SIZE - available);
            buf[available..].fill(0);
        }

        Ok(())
    }

    /// Writes a page and flushes it to the OS.
    pub fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<()> {
        debug_assert!(page_id.is_valid());
        debug_assert_eq!(buf.len(), PAGE_SIZE);

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_id.file_offset()))?;
        file.write_all(buf)?;
        file.flush()?;

        if self.fsync_enabled {
            file.sync_all()?;
        }

        Ok(())
    }

    /// Allocates a new page id.
    pub fn allocate_page(&self) -> PageId {
        PageId(self.next_page_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Deallocates a page id.
    ///
    /// The counter never rewinds; freed ids are not reused.
    pub fn deallocate_page(&self, _page_id: PageId) {}

    /// Number of page ids handed out so far.
    pub fn num_allocated_pages(&self) -> i32 {
        self.next_page_id.load(Ordering::SeqCst)
    }
}
