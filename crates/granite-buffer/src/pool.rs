//! Buffer pool manager.

use crate::disk::DiskManager;
use crate::frame::{BufferFrame, FrameId};
use crate::hash::{ExtendibleHashTable, DEFAULT_BUCKET_CAPACITY};
use crate::replacer::{LruReplacer, Replacer};
use log::{debug, error};
use parking_lot::Mutex;
use std::cell::Cell;
use granite_common::page::{PageId, PAGE_SIZE};
use granite_common::{GraniteError, Result, StorageConfig};

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub num_frames: usize,
    /// Bucket capacity of the extendible-hash page table.
    pub hash_bucket_capacity: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            num_frames: 1024,
            hash_bucket_capacity: DEFAULT_BUCKET_CAPACITY,
        }
    }
}

/// Buffer pool manager.
///
/// Manages a fixed-size pool of page frames with:
/// - Extendible-hash page table mapping page ids to frames
/// - Free frame list consulted before eviction
/// - LRU replacement over unpinned frames
/// - Pin counting for concurrent access
///
/// The pool latch serializes page-table, free-list, and replacer
/// mutations; disk I/O happens while holding it. Frames carry their own
/// reader/writer data latch, acquired by callers (through the RAII page
/// guards), never by the pool bookkeeping — except on a victim frame,
/// whose pin count is already zero.
pub struct BufferPoolManager {
    /// Array of buffer frames.
    frames: Vec<BufferFrame>,
    /// Page id to frame id mapping.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// Frames holding no page.
    free_list: Mutex<Vec<FrameId>>,
    /// Eviction policy over unpinned resident frames.
    replacer: LruReplacer<FrameId>,
    /// Page file underneath the pool.
    disk: DiskManager,
    /// Pool latch.
    latch: Mutex<()>,
}

impl BufferPoolManager {
    /// Creates a buffer pool over an open disk manager.
    pub fn new(config: BufferPoolConfig, disk: DiskManager) -> Self {
        let num_frames = config.num_frames;

        let frames: Vec<_> = (0..num_frames)
            .map(|i| BufferFrame::new(FrameId(i as u32)))
            .collect();

        // All frames start in the free list.
        let free_list: Vec<_> = (0..num_frames).rev().map(|i| FrameId(i as u32)).collect();

        Self {
            frames,
            page_table: ExtendibleHashTable::new(config.hash_bucket_capacity),
            free_list: Mutex::new(free_list),
            replacer: LruReplacer::new(),
            disk,
            latch: Mutex::new(()),
        }
    }

    /// Opens the database file named by `config` and builds a pool over it.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let disk = DiskManager::open_with(&config.db_file, config.fsync_enabled)?;
        Ok(Self::new(
            BufferPoolConfig {
                num_frames: config.buffer_pool_frames,
                hash_bucket_capacity: config.hash_bucket_capacity,
            },
            disk,
        ))
    }

    /// Returns the number of frames in the pool.
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Returns the disk manager underneath the pool.
    pub fn disk(&self) -> &DiskManager {
        &self.disk
    }

    /// Checks whether a page is resident.
    pub fn contains_page(&self, page_id: PageId) -> bool {
        self.page_table.contains(&page_id)
    }

    /// Fetches a page, pinning its frame.
    ///
    /// A resident page is pinned and returned directly. Otherwise a frame
    /// is reclaimed (free list first, then LRU victim), a dirty victim is
    /// written back, and the page bytes are read from disk.
    ///
    /// Returns `BufferPoolFull` when every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> Result<&BufferFrame> {
        if !page_id.is_valid() {
            return Err(GraniteError::InvalidPageId(page_id.0));
        }
        let _guard = self.latch.lock();

        if let Some(frame_id) = self.page_table.find(&page_id) {
            let frame = &self.frames[frame_id.0 as usize];
            if frame.pin() == 0 {
                // Was unpinned; no longer an eviction candidate.
                self.replacer.erase(&frame_id);
            }
            return Ok(frame);
        }

        let frame_id = self.reclaim_frame()?;
        let frame = &self.frames[frame_id.0 as usize];
        frame.reset();
        frame.set_page_id(page_id);
        frame.pin();
        {
            let mut data = frame.write_data();
            if let Err(e) = self.disk.read_page(page_id, &mut data[..]) {
                // Reads are best-effort; the frame stays zero-filled.
                error!("failed to read {}: {}", page_id, e);
            }
        }
        self.page_table.insert(page_id, frame_id);

        Ok(frame)
    }

    /// Allocates a fresh page id and a zeroed, pinned frame for it.
    pub fn new_page(&self) -> Result<(PageId, &BufferFrame)> {
        let _guard = self.latch.lock();

        let frame_id = self.reclaim_frame()?;
        let page_id = self.disk.allocate_page();

        let frame = &self.frames[frame_id.0 as usize];
        frame.reset();
        frame.set_page_id(page_id);
        frame.pin();
        self.page_table.insert(page_id, frame_id);

        Ok((page_id, frame))
    }

    /// Picks a frame for reuse: free list first, then the LRU victim.
    ///
    /// A dirty victim is written back; its old page-table entry is
    /// removed. Must be called with the pool latch held.
    fn reclaim_frame(&self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.lock().pop() {
            return Ok(frame_id);
        }

        let frame_id = self.replacer.victim().ok_or(GraniteError::BufferPoolFull)?;
        let frame = &self.frames[frame_id.0 as usize];
        debug_assert_eq!(frame.pin_count(), 0);

        let old_page_id = frame.page_id();
        if frame.is_dirty() {
            let data = frame.read_data();
            if let Err(e) = self.disk.write_page(old_page_id, &data[..]) {
                error!("failed to write back {}: {}", old_page_id, e);
            }
            drop(data);
            frame.set_dirty(false);
        }
        if old_page_id.is_valid() {
            self.page_table.remove(&old_page_id);
        }

        Ok(frame_id)
    }

    /// Releases one pin on a page.
    ///
    /// When the pin count reaches zero the frame becomes an eviction
    /// candidate. `is_dirty` is OR-ed into the frame's dirty flag.
    /// Returns false if the page is not resident or was not pinned.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let _guard = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            debug!("unpin of non-resident {}", page_id);
            return false;
        };
        let frame = &self.frames[frame_id.0 as usize];
        if frame.pin_count() == 0 {
            debug!("unpin of {} with zero pin count", page_id);
            return false;
        }

        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            self.replacer.insert(frame_id);
        }
        true
    }

    /// Deletes a page from the pool and hands its id back to the disk
    /// allocator.
    ///
    /// Refuses (returns false) while the page is pinned. Returns true
    /// when the page was not resident; the disk call still happens.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let _guard = self.latch.lock();

        if let Some(frame_id) = self.page_table.find(&page_id) {
            let frame = &self.frames[frame_id.0 as usize];
            if frame.is_pinned() {
                return false;
            }

            self.page_table.remove(&page_id);
            self.replacer.erase(&frame_id);
            frame.reset();
            self.free_list.lock().push(frame_id);
        }
        self.disk.deallocate_page(page_id);
        true
    }

    /// Writes a resident page to disk and clears its dirty flag.
    ///
    /// Returns false for `PageId::INVALID` or a non-resident page.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        if !page_id.is_valid() {
            return false;
        }
        let _guard = self.latch.lock();

        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id.0 as usize];
        {
            let data = frame.read_data();
            if let Err(e) = self.disk.write_page(page_id, &data[..]) {
                error!("failed to flush {}: {}", page_id, e);
            }
        }
        frame.set_dirty(false);
        true
    }

    /// Flushes every resident dirty frame.
    pub fn flush_all_pages(&self) {
        let _guard = self.latch.lock();

        for frame in &self.frames {
            let page_id = frame.page_id();
            if page_id.is_valid() && frame.is_dirty() {
                let data = frame.read_data();
                if let Err(e) = self.disk.write_page(page_id, &data[..]) {
                    error!("failed to flush {}: {}", page_id, e);
                }
                drop(data);
                frame.set_dirty(false);
            }
        }
    }

    /// Fetches a page and read-latches it, returning an RAII guard that
    /// unpins and unlatches on drop.
    pub fn read_page(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        let data = frame.read_data();
        Ok(PageReadGuard {
            pool: self,
            page_id,
            data,
        })
    }

    /// Fetches a page and write-latches it.
    pub fn write_page(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame = self.fetch_page(page_id)?;
        let data = frame.write_data();
        Ok(PageWriteGuard {
            pool: self,
            page_id,
            dirty: Cell::new(false),
            data,
        })
    }

    /// Allocates a fresh page and write-latches it. The guard starts
    /// dirty: a new page always needs writing back.
    pub fn new_page_write(&self) -> Result<PageWriteGuard<'_>> {
        let (page_id, frame) = self.new_page()?;
        let data = frame.write_data();
        Ok(PageWriteGuard {
            pool: self,
            page_id,
            dirty: Cell::new(true),
            data,
        })
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let mut resident = 0;
        let mut pinned = 0;
        let mut dirty = 0;

        for frame in &self.frames {
            if frame.page_id().is_valid() {
                resident += 1;
                if frame.is_pinned() {
                    pinned += 1;
                }
                if frame.is_dirty() {
                    dirty += 1;
                }
            }
        }

        BufferPoolStats {
            total_frames: self.frames.len(),
            free_frames: self.free_list.lock().len(),
            resident_frames: resident,
            pinned_frames: pinned,
            dirty_frames: dirty,
            evictable_frames: self.replacer.size(),
        }
    }
}

impl Drop for BufferPoolManager {
    fn drop(&mut self) {
        self.flush_all_pages();
    }
}

/// Statistics about the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolStats {
    /// Total number of frames.
    pub total_frames: usize,
    /// Number of frames in the free list.
    pub free_frames: usize,
    /// Number of frames holding a page.
    pub resident_frames: usize,
    /// Number of pinned frames.
    pub pinned_frames: usize,
    /// Number of dirty frames.
    pub dirty_frames: usize,
    /// Number of frames tracked by the replacer.
    pub evictable_frames: usize,
}

/// RAII guard for a read-latched, pinned page.
///
/// Dropping the guard unpins the page and then releases the data latch.
pub struct PageReadGuard<'a> {
    pool: &'a BufferPoolManager,
    page_id: PageId,
    data: parking_lot::RwLockReadGuard<'a, Box<[u8; PAGE_SIZE]>>,
}

impl<'a> PageReadGuard<'a> {
    /// Returns the page id.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the page bytes.
    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        // Unpin first; the latch (the `data` field) releases afterwards,
        // so a writer acquiring the latch observes the pin already gone.
        self.pool.unpin_page(self.page_id, false);
    }
}

/// RAII guard for a write-latched, pinned page.
///
/// Any call to `data_mut` marks the page dirty; the drop handler passes
/// the accumulated dirty flag to `unpin_page`.
pub struct PageWriteGuard<'a> {
    pool: &'a BufferPoolManager,
    page_id: PageId,
    dirty: Cell<bool>,
    data: parking_lot::RwLockWriteGuard<'a, Box<[u8; PAGE_SIZE]>>,
}

impl<'a> PageWriteGuard<'a> {
    /// Returns the page id.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the page bytes.
    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    /// Returns the page bytes mutably, marking the page dirty.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.dirty.set(true);
        &mut self.data[..]
    }

    /// Unpins the page and deletes it from the pool.
    ///
    /// The caller must guarantee no other thread still reaches this page;
    /// deletion refuses if someone else holds a pin.
    pub fn delete(self) -> bool {
        let pool = self.pool;
        let page_id = self.page_id;
        drop(self);
        pool.delete_page(page_id)
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        self.pool.unpin_page(self.page_id, self.dirty.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_pool(num_frames: usize) -> (BufferPoolManager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let disk = DiskManager::open(dir.path().join("pool.db")).unwrap();
        (
            BufferPoolManager::new(BufferPoolConfig { num_frames, ..Default::default() }, disk),
            dir,
        )
    }

    #[test]
    fn test_buffer_pool_new() {
        let (pool, _dir) = create_test_pool(10);

        let stats = pool.stats();
        assert_eq!(stats.total_frames, 10);
        assert_eq!(stats.free_frames, 10);
        assert_eq!(stats.resident_frames, 0);
    }

    #[test]
    fn test_buffer_pool_new_page() {
        let (pool, _dir) = create_test_pool(10);

        let (page_id, frame) = pool.new_page().unwrap();
        assert_eq!(page_id, PageId::new(0));
        assert_eq!(frame.page_id(), page_id);
        assert!(frame.is_pinned());
        assert!(pool.contains_page(page_id));

        let stats = pool.stats();
        assert_eq!(stats.free_frames, 9);
        assert_eq!(stats.resident_frames, 1);
        assert_eq!(stats.pinned_frames, 1);
    }

    #[test]
    fn test_buffer_pool_fetch_resident() {
        let (pool, _dir) = create_test_pool(10);

        let (page_id, _) = pool.new_page().unwrap();
        pool.unpin_page(page_id, false);

        let frame = pool.fetch_page(page_id).unwrap();
        assert_eq!(frame.page_id(), page_id);
        assert_eq!(frame.pin_count(), 1);
    }

    #[test]
    fn test_buffer_pool_fetch_reads_from_disk() {
        let (pool, _dir) = create_test_pool(2);

        let (page_id, frame) = pool.new_page().unwrap();
        frame.write_data()[0] = 0x5A;
        pool.unpin_page(page_id, true);

        // Push the page out by filling the pool with new pages.
        let (p1, _) = pool.new_page().unwrap();
        let (p2, _) = pool.new_page().unwrap();
        pool.unpin_page(p1, false);
        pool.unpin_page(p2, false);
        assert!(!pool.contains_page(page_id));

        // Fetch reloads the written bytes.
        let frame = pool.fetch_page(page_id).unwrap();
        assert_eq!(frame.read_data()[0], 0x5A);
    }

    #[test]
    fn test_buffer_pool_fetch_never_written_is_zero_filled() {
        let (pool, _dir) = create_test_pool(2);

        let page_id = pool.disk().allocate_page();
        let frame = pool.fetch_page(page_id).unwrap();
        assert!(frame.read_data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_buffer_pool_fetch_invalid() {
        let (pool, _dir) = create_test_pool(2);
        assert!(matches!(
            pool.fetch_page(PageId::INVALID),
            Err(GraniteError::InvalidPageId(_))
        ));
    }

    #[test]
    fn test_buffer_pool_unpin_misuse() {
        let (pool, _dir) = create_test_pool(10);

        // Not resident.
        assert!(!pool.unpin_page(PageId::new(7), false));

        // Double unpin.
        let (page_id, _) = pool.new_page().unwrap();
        assert!(pool.unpin_page(page_id, false));
        assert!(!pool.unpin_page(page_id, false));
    }

    #[test]
    fn test_buffer_pool_dirty_tracking() {
        let (pool, _dir) = create_test_pool(10);

        let (page_id, _) = pool.new_page().unwrap();
        pool.unpin_page(page_id, true);

        let frame = pool.fetch_page(page_id).unwrap();
        assert!(frame.is_dirty());

        // Unpinning clean keeps the accumulated dirty flag.
        pool.unpin_page(page_id, false);
        let frame = pool.fetch_page(page_id).unwrap();
        assert!(frame.is_dirty());
    }

    #[test]
    fn test_buffer_pool_lru_eviction_order() {
        // Access A, B, C in order; the next miss evicts A, the least
        // recently used; B remains a cache hit.
        let (pool, _dir) = create_test_pool(3);

        let (a, _) = pool.new_page().unwrap();
        pool.unpin_page(a, false);
        let (b, _) = pool.new_page().unwrap();
        pool.unpin_page(b, false);
        let (c, _) = pool.new_page().unwrap();
        pool.unpin_page(c, false);

        let (d, _) = pool.new_page().unwrap();
        pool.unpin_page(d, false);

        assert!(!pool.contains_page(a));
        assert!(pool.contains_page(b));
        assert!(pool.contains_page(c));

        // B is still resident: fetching it is a hit, no disk read.
        let frame = pool.fetch_page(b).unwrap();
        assert_eq!(frame.page_id(), b);
        pool.unpin_page(b, false);
    }

    #[test]
    fn test_buffer_pool_pin_prevents_eviction() {
        let (pool, _dir) = create_test_pool(2);

        pool.new_page().unwrap();
        pool.new_page().unwrap();

        // Both pinned: no frame can be reclaimed.
        assert!(matches!(
            pool.new_page(),
            Err(GraniteError::BufferPoolFull)
        ));
    }

    #[test]
    fn test_buffer_pool_eviction_writes_back_dirty() {
        let (pool, _dir) = create_test_pool(1);

        let (page_id, frame) = pool.new_page().unwrap();
        frame.write_data()[0] = 0xAB;
        pool.unpin_page(page_id, true);

        // Evict by allocating another page.
        let (p2, _) = pool.new_page().unwrap();
        pool.unpin_page(p2, false);

        // The dirty page reached disk.
        let mut buf = [0u8; PAGE_SIZE];
        pool.disk().read_page(page_id, &mut buf).unwrap();
        assert_eq!(buf[0], 0xAB);
    }

    #[test]
    fn test_buffer_pool_delete_page() {
        let (pool, _dir) = create_test_pool(10);

        let (page_id, _) = pool.new_page().unwrap();
        pool.unpin_page(page_id, false);

        assert!(pool.contains_page(page_id));
        assert!(pool.delete_page(page_id));
        assert!(!pool.contains_page(page_id));
        assert_eq!(pool.stats().free_frames, 10);

        // Deleting a non-resident page still succeeds.
        assert!(pool.delete_page(PageId::new(99)));
    }

    #[test]
    fn test_buffer_pool_delete_pinned_page() {
        let (pool, _dir) = create_test_pool(10);

        let (page_id, _) = pool.new_page().unwrap();
        assert!(!pool.delete_page(page_id));
        assert!(pool.contains_page(page_id));
    }

    #[test]
    fn test_buffer_pool_flush_page() {
        let (pool, _dir) = create_test_pool(10);

        let (page_id, frame) = pool.new_page().unwrap();
        frame.write_data()[9] = 9;
        pool.unpin_page(page_id, true);

        assert!(pool.flush_page(page_id));
        let frame = pool.fetch_page(page_id).unwrap();
        assert!(!frame.is_dirty());
        pool.unpin_page(page_id, false);

        let mut buf = [0u8; PAGE_SIZE];
        pool.disk().read_page(page_id, &mut buf).unwrap();
        assert_eq!(buf[9], 9);

        assert!(!pool.flush_page(PageId::INVALID));
        assert!(!pool.flush_page(PageId::new(1234)));
    }

    #[test]
    fn test_buffer_pool_flush_all() {
        let (pool, _dir) = create_test_pool(10);

        let mut ids = Vec::new();
        for i in 0..5 {
            let (page_id, frame) = pool.new_page().unwrap();
            frame.write_data()[0] = i as u8 + 1;
            pool.unpin_page(page_id, true);
            ids.push(page_id);
        }

        pool.flush_all_pages();
        assert_eq!(pool.stats().dirty_frames, 0);

        for (i, page_id) in ids.iter().enumerate() {
            let mut buf = [0u8; PAGE_SIZE];
            pool.disk().read_page(*page_id, &mut buf).unwrap();
            assert_eq!(buf[0], i as u8 + 1);
        }
    }

    #[test]
    fn test_buffer_pool_replacer_invariant() {
        // A frame is in the replacer iff it is resident and unpinned.
        let (pool, _dir) = create_test_pool(8);

        let mut ids = Vec::new();
        for _ in 0..6 {
            let (page_id, _) = pool.new_page().unwrap();
            ids.push(page_id);
        }
        for page_id in &ids[..3] {
            pool.unpin_page(*page_id, false);
        }

        let stats = pool.stats();
        assert_eq!(stats.resident_frames, 6);
        assert_eq!(stats.pinned_frames, 3);
        assert_eq!(stats.evictable_frames, 3);

        // Re-fetching an unpinned page removes it from the replacer.
        pool.fetch_page(ids[0]).unwrap();
        assert_eq!(pool.stats().evictable_frames, 2);
    }

    #[test]
    fn test_buffer_pool_read_guard() {
        let (pool, _dir) = create_test_pool(10);

        let (page_id, _) = pool.new_page().unwrap();
        pool.unpin_page(page_id, false);

        {
            let guard = pool.read_page(page_id).unwrap();
            assert_eq!(guard.page_id(), page_id);
            assert_eq!(pool.stats().pinned_frames, 1);
        }
        assert_eq!(pool.stats().pinned_frames, 0);
    }

    #[test]
    fn test_buffer_pool_write_guard() {
        let (pool, _dir) = create_test_pool(10);

        let (page_id, _) = pool.new_page().unwrap();
        pool.unpin_page(page_id, true);
        pool.flush_page(page_id);

        {
            let mut guard = pool.write_page(page_id).unwrap();
            guard.data_mut()[0] = 0xFF;
        }

        let frame = pool.fetch_page(page_id).unwrap();
        assert!(frame.is_dirty());
        assert_eq!(frame.read_data()[0], 0xFF);
        pool.unpin_page(page_id, false);
    }

    #[test]
    fn test_buffer_pool_write_guard_clean_when_untouched() {
        let (pool, _dir) = create_test_pool(10);

        let (page_id, _) = pool.new_page().unwrap();
        pool.unpin_page(page_id, true);
        pool.flush_page(page_id);

        {
            let guard = pool.write_page(page_id).unwrap();
            let _ = guard.data();
        }
        let frame = pool.fetch_page(page_id).unwrap();
        assert!(!frame.is_dirty());
        pool.unpin_page(page_id, false);
    }

    #[test]
    fn test_buffer_pool_guard_delete() {
        let (pool, _dir) = create_test_pool(10);

        let guard = pool.new_page_write().unwrap();
        let page_id = guard.page_id();
        assert!(guard.delete());
        assert!(!pool.contains_page(page_id));
        assert_eq!(pool.stats().pinned_frames, 0);
    }

    #[test]
    fn test_buffer_pool_concurrent_fetch_unpin() {
        use std::sync::Arc;

        let dir = tempdir().unwrap();
        let disk = DiskManager::open(dir.path().join("conc.db")).unwrap();
        let pool = Arc::new(BufferPoolManager::new(
            BufferPoolConfig { num_frames: 16, ..Default::default() },
            disk,
        ));

        let mut ids = Vec::new();
        for _ in 0..8 {
            let (page_id, _) = pool.new_page().unwrap();
            pool.unpin_page(page_id, false);
            ids.push(page_id);
        }

        let mut handles = Vec::new();
        for t in 0..4 {
            let pool = Arc::clone(&pool);
            let ids = ids.clone();
            handles.push(std::thread::spawn(move || {
                for round in 0..200 {
                    let page_id = ids[(t + round) % ids.len()];
                    let frame = pool.fetch_page(page_id).unwrap();
                    assert_eq!(frame.page_id(), page_id);
                    pool.unpin_page(page_id, false);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(pool.stats().pinned_frames, 0);
    }
}
