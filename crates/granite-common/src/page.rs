//! Page identifiers and size constants for GraniteDB storage.

use serde::{Deserialize, Serialize};

/// Size of a data page in bytes (4 KB).
pub const PAGE_SIZE: usize = 4096;

/// Page id of the header page holding index-name-to-root records.
pub const HEADER_PAGE_ID: PageId = PageId(0);

/// Unique identifier for a page within the database file.
///
/// Page ids are allocated monotonically and never reused. Page `k`
/// occupies bytes `[k * PAGE_SIZE, (k + 1) * PAGE_SIZE)` of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub i32);

impl PageId {
    /// Sentinel meaning "no page".
    pub const INVALID: PageId = PageId(-1);

    /// Creates a new PageId.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns true if this is a valid page id.
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Byte offset of this page within the database file.
    pub fn file_offset(&self) -> u64 {
        debug_assert!(self.is_valid());
        self.0 as u64 * PAGE_SIZE as u64
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page:{}", self.0)
    }
}
