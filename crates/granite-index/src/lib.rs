//! Concurrent B+ tree index for GraniteDB.
//!
//! This crate builds the ordered index of the storage kernel on top of
//! the buffer pool:
//! - Leaf and internal node page layouts as typed views over frame bytes
//! - A latch-crabbing B+ tree supporting point lookup, ordered scan,
//!   insert, and delete under multi-threaded access
//! - A forward iterator over the leaf sibling list
//! - The header record page persisting index roots

pub mod header;
pub mod iterator;
pub mod key;
pub mod node;
pub mod tree;

pub use header::{HeaderPage, MAX_HEADER_RECORDS};
pub use iterator::TreeIterator;
pub use key::{GenericComparator, GenericKey, KeyComparator, NodeKey};
pub use node::{InternalNode, LeafNode, NodeType};
pub use tree::BPlusTree;
