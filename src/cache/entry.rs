//! Cache Entry Module
//!
//! Defines one live key-value binding and the handle that addresses it
//! inside the access-order list.

// == Node Handle ==
/// Stable handle to a slot in the access-order list arena.
///
/// Handles stay valid until the entry they address is removed. The entry
/// table stores these instead of references, so removing a node never
/// leaves a dangling pointer behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

// == Entry ==
/// A key-value binding plus its links in the recency order.
#[derive(Debug, Clone)]
pub struct Entry<K, V> {
    /// The key this entry is stored under
    pub key: K,
    /// The stored value
    pub value: V,
    /// Neighbour closer to the head (more recently used)
    pub(crate) prev: Option<NodeHandle>,
    /// Neighbour closer to the tail (less recently used)
    pub(crate) next: Option<NodeHandle>,
}

impl<K, V> Entry<K, V> {
    // == Constructor ==
    /// Creates an unlinked entry.
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            prev: None,
            next: None,
        }
    }

    /// Consumes the entry, returning the key-value pair.
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}
