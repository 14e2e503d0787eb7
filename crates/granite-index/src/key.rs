//! Fixed-width index keys and key comparison.

use std::cmp::Ordering;

/// A key type storable inline in B+ tree node pages.
///
/// Keys are fixed-width byte tokens; the width decides node fan-out.
pub trait NodeKey: Copy + Eq + Send + Sync + std::fmt::Debug + 'static {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// A key whose bytes are all zero, used for unused key slots.
    fn zeroed() -> Self;

    /// Writes the encoding into the first `WIDTH` bytes of `buf`.
    fn write_to(&self, buf: &mut [u8]);

    /// Reads a key from the first `WIDTH` bytes of `buf`.
    fn read_from(buf: &[u8]) -> Self;
}

/// Fixed-width key token of `N` bytes.
///
/// Supported widths are 4, 8, 16, 32, and 64 bytes. Integer keys encode
/// big-endian so byte order equals numeric order for non-negative values.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericKey<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> GenericKey<N> {
    /// Builds a key from up to `N` bytes, zero-padding the tail.
    pub fn from_slice(src: &[u8]) -> Self {
        let mut bytes = [0u8; N];
        let len = src.len().min(N);
        bytes[..len].copy_from_slice(&src[..len]);
        Self { bytes }
    }

    /// Builds a key from a non-negative integer, big-endian.
    pub fn from_i64(value: i64) -> Self {
        let be = value.to_be_bytes();
        let mut bytes = [0u8; N];
        if N >= 8 {
            bytes[..8].copy_from_slice(&be);
        } else {
            bytes.copy_from_slice(&be[8 - N..]);
        }
        Self { bytes }
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<const N: usize> Default for GenericKey<N> {
    fn default() -> Self {
        Self { bytes: [0u8; N] }
    }
}

impl<const N: usize> std::fmt::Debug for GenericKey<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "key:")?;
        for b in &self.bytes {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl<const N: usize> NodeKey for GenericKey<N> {
    const WIDTH: usize = N;

    fn zeroed() -> Self {
        Self::default()
    }

    fn write_to(&self, buf: &mut [u8]) {
        buf[..N].copy_from_slice(&self.bytes);
    }

    fn read_from(buf: &[u8]) -> Self {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&buf[..N]);
        Self { bytes }
    }
}

/// Three-way key comparison.
pub trait KeyComparator<K>: Clone + Send + Sync + 'static {
    /// Compares `a` against `b`.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Byte-order comparator for `GenericKey`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GenericComparator<const N: usize>;

impl<const N: usize> KeyComparator<GenericKey<N>> for GenericComparator<N> {
    fn compare(&self, a: &GenericKey<N>, b: &GenericKey<N>) -> Ordering {
        a.bytes.cmp(&b.bytes)
    }
}
