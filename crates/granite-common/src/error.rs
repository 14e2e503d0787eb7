//! Error types for GraniteDB.

use thiserror::Error;

/// Result type alias using GraniteError.
pub type Result<T> = std::result::Result<T, GraniteError>;

/// Errors that can occur in GraniteDB storage operations.
#[derive(Debug, Error)]
pub enum GraniteError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Buffer pool errors
    #[error("Buffer pool full, every frame is pinned")]
    BufferPoolFull,

    #[error("Invalid page id: {0}")]
    InvalidPageId(i32),

    #[error("Page {page_id} is pinned")]
    PagePinned { page_id: i32 },

    // B+ tree errors
    #[error("Duplicate key")]
    DuplicateKey,

    #[error("Key not found")]
    KeyNotFound,

    #[error("Invalid node type on page {page_id}")]
    InvalidNodeType { page_id: i32 },

    #[error("Index corrupted: {0}")]
    IndexCorrupted(String),

    #[error("Index name too long: {0} bytes (max {1})")]
    IndexNameTooLong(usize, usize),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}
