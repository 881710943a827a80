use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Bounded map with first-in-first-out eviction.
///
/// Insertion order is tracked separately from the map; once the cache is at
/// capacity, inserting a new key evicts the oldest one. Re-inserting an
/// existing key updates the value without touching its age.
#[derive(Clone, Debug)]
pub struct FifoCache<K, V> {
    map: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V> FifoCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            map: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    /// Insert, returning the evicted (key, value) pair if capacity was hit.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.map.insert(key.clone(), value).is_some() {
            return None;
        }
        self.order.push_back(key);

        if self.map.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                let evicted = self.map.remove(&oldest);
                return evicted.map(|v| (oldest, v));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_cache_evicts_oldest() {
        let mut cache = FifoCache::new(2);
        assert!(cache.is_empty());

        assert!(cache.insert("a", 1).is_none());
        assert!(cache.insert("b", 2).is_none());
        assert_eq!(cache.len(), 2);

        let evicted = cache.insert("c", 3);
        assert_eq!(evicted, Some(("a", 1)));
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn reinsert_updates_without_eviction() {
        let mut cache = FifoCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert!(cache.insert("a", 10).is_none());
        assert_eq!(cache.get(&"a"), Some(&10));
        assert_eq!(cache.len(), 2);
    }
}
