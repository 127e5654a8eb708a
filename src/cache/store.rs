//! LRU Cache Module
//!
//! Bounded cache combining a HashMap entry table with the access-order list.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::{AccessOrderList, NodeHandle};
use crate::error::{CacheError, Result};

// == LRU Cache ==
/// Fixed-capacity cache with least-recently-used eviction.
///
/// The entry table maps each key to the handle of its node, so lookup,
/// promotion and eviction are all constant time.
#[derive(Debug)]
pub struct LruCache<K, V> {
    /// Entry table: key -> node handle
    table: HashMap<K, NodeHandle>,
    /// Recency order, head = most recently used
    order: AccessOrderList<K, V>,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// Fails with `InvalidCapacity` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        Ok(Self {
            table: HashMap::with_capacity(capacity),
            order: AccessOrderList::with_capacity(capacity),
            capacity,
        })
    }

    // == Get ==
    /// Returns the value for `key`, promoting it to most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.table.get(key)?;
        self.order.move_to_front(handle);
        self.order.get(handle).map(|entry| &entry.value)
    }

    // == Peek ==
    /// Returns the value for `key` without touching the recency order.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.table.get(key)?;
        self.order.get(handle).map(|entry| &entry.value)
    }

    // == Put ==
    /// Inserts or replaces a value and promotes the key to most recently used.
    ///
    /// When a new key arrives at a full cache, the least recently used entry
    /// is evicted first and returned.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&handle) = self.table.get(&key) {
            if let Some(entry) = self.order.get_mut(handle) {
                entry.value = value;
            }
            self.order.move_to_front(handle);
            return None;
        }

        let evicted = if self.table.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let handle = self.order.push_front(key.clone(), value);
        self.table.insert(key, handle);
        evicted
    }

    // == Remove ==
    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.table.remove(key)?;
        self.order.remove(handle).map(|entry| entry.value)
    }

    // == Contains ==
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.contains_key(key)
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Keys ==
    /// Returns the keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.order.iter().map(|entry| entry.key.clone()).collect()
    }

    /// Returns the entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order.iter().map(|entry| (&entry.key, &entry.value))
    }

    /// Returns the key that the next insertion of a new key would evict.
    pub fn peek_lru(&self) -> Option<&K> {
        self.order.peek_back().map(|entry| &entry.key)
    }

    /// Drops the tail entry and its table slot.
    fn evict(&mut self) -> Option<(K, V)> {
        let entry = self.order.pop_back()?;
        self.table.remove(&entry.key);
        Some(entry.into_pair())
    }

    /// Checks that the table and the list describe the same set of keys.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.table.len(), self.order.len());
        assert!(self.table.len() <= self.capacity);
        for entry in self.order.iter() {
            let handle = self
                .table
                .get(&entry.key)
                .expect("list node without a table slot");
            let node = self.order.get(*handle).expect("table slot without a node");
            assert!(node.key == entry.key);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> LruCache<String, String> {
        LruCache::new(capacity).unwrap()
    }

    fn put(
        cache: &mut LruCache<String, String>,
        key: &str,
        value: &str,
    ) -> Option<(String, String)> {
        cache.put(key.to_string(), value.to_string())
    }

    #[test]
    fn test_cache_new() {
        let cache = cache(10);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 10);
    }

    #[test]
    fn test_cache_zero_capacity() {
        let result: Result<LruCache<String, String>> = LruCache::new(0);
        assert!(matches!(result, Err(CacheError::InvalidCapacity(0))));
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = cache(10);

        put(&mut cache, "key1", "value1");

        assert_eq!(cache.get("key1").map(String::as_str), Some("value1"));
        assert_eq!(cache.len(), 1);
        cache.assert_consistent();
    }

    #[test]
    fn test_get_missing() {
        let mut cache = cache(10);
        assert!(cache.get("nonexistent").is_none());
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let mut cache = cache(10);

        put(&mut cache, "key1", "value1");
        let evicted = put(&mut cache, "key1", "value2");

        assert!(evicted.is_none());
        assert_eq!(cache.get("key1").map(String::as_str), Some("value2"));
        assert_eq!(cache.len(), 1);
        cache.assert_consistent();
    }

    #[test]
    fn test_remove() {
        let mut cache = cache(10);

        put(&mut cache, "key1", "value1");

        assert_eq!(cache.remove("key1"), Some("value1".to_string()));
        assert!(cache.remove("key1").is_none());
        assert!(cache.is_empty());
        cache.assert_consistent();
    }

    #[test]
    fn test_eviction_of_first_inserted() {
        let mut cache = cache(3);

        put(&mut cache, "key1", "value1");
        put(&mut cache, "key2", "value2");
        put(&mut cache, "key3", "value3");
        let evicted = put(&mut cache, "key4", "value4");

        assert_eq!(evicted, Some(("key1".to_string(), "value1".to_string())));
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains_key("key1"));
        cache.assert_consistent();
    }

    #[test]
    fn test_get_prevents_eviction() {
        let mut cache = cache(2);

        put(&mut cache, "a", "1");
        put(&mut cache, "b", "2");
        cache.get("a");
        let evicted = put(&mut cache, "c", "3");

        assert_eq!(evicted.map(|(k, _)| k), Some("b".to_string()));
        assert_eq!(cache.keys(), vec!["c".to_string(), "a".to_string()]);
        assert_eq!(cache.peek("a").map(String::as_str), Some("1"));
        assert_eq!(cache.peek("c").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_overwrite_promotes() {
        let mut cache = cache(2);

        put(&mut cache, "a", "1");
        put(&mut cache, "b", "2");
        put(&mut cache, "a", "10");
        put(&mut cache, "c", "3");

        assert!(!cache.contains_key("b"));
        assert_eq!(cache.peek("a").map(String::as_str), Some("10"));
    }

    #[test]
    fn test_peek_does_not_promote() {
        let mut cache = cache(2);

        put(&mut cache, "a", "1");
        put(&mut cache, "b", "2");
        cache.peek("a");

        assert_eq!(cache.peek_lru().map(String::as_str), Some("a"));
    }

    #[test]
    fn test_removed_key_frees_capacity() {
        let mut cache = cache(2);

        put(&mut cache, "a", "1");
        put(&mut cache, "b", "2");
        cache.remove("a");
        let evicted = put(&mut cache, "c", "3");

        assert!(evicted.is_none());
        assert_eq!(cache.len(), 2);
        cache.assert_consistent();
    }

    #[test]
    fn test_capacity_one() {
        let mut cache = cache(1);

        put(&mut cache, "a", "1");
        let evicted = put(&mut cache, "b", "2");

        assert_eq!(evicted.map(|(k, _)| k), Some("a".to_string()));
        assert_eq!(cache.keys(), vec!["b".to_string()]);
        cache.assert_consistent();
    }

    #[test]
    fn test_iter_mru_to_lru() {
        let mut cache = cache(3);

        put(&mut cache, "a", "1");
        put(&mut cache, "b", "2");
        put(&mut cache, "c", "3");
        cache.get("b");

        let pairs: Vec<(&str, &str)> = cache
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(pairs, vec![("b", "2"), ("c", "3"), ("a", "1")]);
    }
}
