//! Record identifiers pointing into heap pages.

use crate::page::PageId;
use serde::{Deserialize, Serialize};

/// Identifies a single record: the page holding it plus a slot number.
///
/// B+ tree leaves map keys to `RecordId` values. The heap page format
/// itself is outside this crate; the id is an opaque fixed-width token
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    /// Page holding the record.
    pub page_id: PageId,
    /// Slot number within the page.
    pub slot_num: u32,
}

impl RecordId {
    /// Encoded size in bytes (page_id: 4, slot_num: 4).
    pub const ENCODED_SIZE: usize = 8;

    /// Creates a new RecordId.
    pub fn new(page_id: PageId, slot_num: u32) -> Self {
        Self { page_id, slot_num }
    }

    /// Writes the 8-byte little-endian encoding into `buf`.
    pub fn write_to(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.page_id.0.to_le_bytes());
        buf[4..8].copy_from_slice(&self.slot_num.to_le_bytes());
    }

    /// Reads a RecordId from its 8-byte encoding.
    pub fn read_from(buf: &[u8]) -> Self {
        let page_id = PageId(i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]));
        let slot_num = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        Self { page_id, slot_num }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.page_id.0, self.slot_num)
    }
}
