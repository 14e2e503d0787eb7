//! Configuration structures for GraniteDB.

use crate::page::PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration for the database kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the single database file.
    pub db_file: PathBuf,
    /// Page size in bytes.
    pub page_size: usize,
    /// Buffer pool size in number of frames.
    pub buffer_pool_frames: usize,
    /// Capacity of an extendible-hash bucket before it splits.
    pub hash_bucket_capacity: usize,
    /// Enable fsync after page writes.
    pub fsync_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_file: PathBuf::from("./granite.db"),
            page_size: PAGE_SIZE,
            buffer_pool_frames: 1024, // 4 MB with 4 KB pages
            hash_bucket_capacity: 50,
            fsync_enabled: false,
        }
    }
}

impl StorageConfig {
    /// Returns the total buffer pool size in bytes.
    pub fn buffer_pool_size_bytes(&self) -> usize {
        self.buffer_pool_frames * self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.db_file, PathBuf::from("./granite.db"));
        assert_eq!(config.page_size, PAGE_SIZE);
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.buffer_pool_frames, 1024);
        assert_eq!(config.hash_bucket_capacity, 50);
        assert!(!config.fsync_enabled);
    }

    #[test]
    fn test_buffer_pool_size_bytes() {
        let config = StorageConfig::default();
        assert_eq!(config.buffer_pool_size_bytes(), 1024 * 4096);
        assert_eq!(config.buffer_pool_size_bytes(), 4_194_304); // 4 MB
    }

    #[test]
    fn test_storage_config_custom() {
        let config = StorageConfig {
            db_file: PathBuf::from("/var/lib/granite/data.db"),
            buffer_pool_frames: 64,
            fsync_enabled: true,
            ..Default::default()
        };

        assert_eq!(config.db_file, PathBuf::from("/var/lib/granite/data.db"));
        assert_eq!(config.buffer_pool_frames, 64);
        assert!(config.fsync_enabled);
    }

    #[test]
    fn test_storage_config_serde_roundtrip() {
        let original = StorageConfig::default();
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: StorageConfig = serde_json::from_str(&serialized).unwrap();

        assert_eq!(original.db_file, deserialized.db_file);
        assert_eq!(original.page_size, deserialized.page_size);
        assert_eq!(original.buffer_pool_frames, deserialized.buffer_pool_frames);
        assert_eq!(original.fsync_enabled, deserialized.fsync_enabled);
    }
}
