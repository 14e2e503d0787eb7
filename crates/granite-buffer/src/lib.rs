//! Buffer pool management for GraniteDB.
//!
//! This crate provides the page-cache layer of the storage kernel:
//! - Disk manager for fixed-size page I/O against a single file
//! - Fixed-size pool of page frames with pin counting and dirty tracking
//! - Extendible-hash table used as the page table
//! - LRU eviction policy
//! - Buffer pool manager coordinating all of the above, with RAII page
//!   guards that release latches and pins automatically

mod disk;
mod frame;
mod hash;
mod pool;
mod replacer;

pub use disk::DiskManager;
pub use frame::{BufferFrame, FrameId};
pub use hash::ExtendibleHashTable;
pub use pool::{
    BufferPoolConfig, BufferPoolManager, BufferPoolStats, PageReadGuard, PageWriteGuard,
};
pub use replacer::{LruReplacer, Replacer};
