use crate::common::{validate_capacity, OpResult, SlotIndexer, DEFAULT_CAPACITY};
use crate::MapError;

#[derive(Debug, Clone)]
struct Node {
    key: u64,
    value: u64,
    next: Option<Box<Node>>,
}

/// Separate chaining over a fixed bucket array.
///
/// Each bucket owns a singly linked overflow list; every node exclusively
/// owns its successor, so there is no sharing and no cycles. Inserts never
/// fail (chains grow without bound).
#[derive(Debug, Clone)]
pub struct ChainingMap {
    buckets: Vec<Option<Box<Node>>>,
    indexer: SlotIndexer,
    capacity: usize,
    size: usize,
}

impl ChainingMap {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::try_with_capacity(capacity).expect("capacity must be a nonzero power of two")
    }

    pub fn try_with_capacity(capacity: usize) -> Result<Self, MapError> {
        validate_capacity(capacity)?;
        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, || None);
        Ok(Self {
            buckets,
            indexer: SlotIndexer::new(capacity),
            capacity,
            size: 0,
        })
    }

    // Scan for an existing key first; a new key is prepended at the chain
    // head, counted as one more probe.
    pub fn insert(&mut self, key: u64, value: u64) -> OpResult {
        let mut result = OpResult::default();
        let index = self.indexer.home_slot(key);

        let mut cur = self.buckets[index].as_deref_mut();
        while let Some(node) = cur {
            result.probe_count += 1;
            if node.key == key {
                node.value = value;
                result.success = true;
                return result;
            }
            cur = node.next.as_deref_mut();
        }

        let next = self.buckets[index].take();
        self.buckets[index] = Some(Box::new(Node { key, value, next }));
        self.size += 1;
        result.probe_count += 1;
        result.success = true;
        result
    }

    pub fn lookup(&self, key: u64) -> (OpResult, Option<u64>) {
        let mut result = OpResult::default();
        let index = self.indexer.home_slot(key);

        let mut cur = self.buckets[index].as_deref();
        while let Some(node) = cur {
            result.probe_count += 1;
            if node.key == key {
                result.success = true;
                return (result, Some(node.value));
            }
            cur = node.next.as_deref();
        }
        (result, None)
    }

    pub fn delete(&mut self, key: u64) -> OpResult {
        let mut result = OpResult::default();
        let index = self.indexer.home_slot(key);

        let mut cur = &mut self.buckets[index];
        loop {
            if cur.is_none() {
                return result;
            }
            if cur.as_ref().unwrap().key == key {
                break;
            }
            result.probe_count += 1;
            cur = &mut cur.as_mut().unwrap().next;
        }

        result.probe_count += 1;
        if let Some(node) = cur.take() {
            *cur = node.next;
            self.size -= 1;
            result.success = true;
        }
        result
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.capacity as f64
    }

    // ---------------- chain-length metrics ----------------

    /// Number of nodes in the chain at the given bucket index.
    pub fn chain_length(&self, index: usize) -> usize {
        let mut len = 0;
        let mut cur = self.buckets[index].as_deref();
        while let Some(node) = cur {
            len += 1;
            cur = node.next.as_deref();
        }
        len
    }

    /// Mean chain length over non-empty buckets only; 0.0 when every
    /// bucket is empty.
    pub fn avg_chain_length(&self) -> f64 {
        let mut non_empty = 0usize;
        let mut total = 0usize;
        for index in 0..self.capacity {
            let len = self.chain_length(index);
            if len > 0 {
                non_empty += 1;
                total += len;
            }
        }
        if non_empty == 0 {
            return 0.0;
        }
        total as f64 / non_empty as f64
    }

    /// Longest chain in the table.
    pub fn max_chain_length(&self) -> usize {
        (0..self.capacity)
            .map(|index| self.chain_length(index))
            .max()
            .unwrap_or(0)
    }
}

impl Default for ChainingMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colliding_keys(capacity: usize, home: usize, count: usize) -> Vec<u64> {
        let indexer = SlotIndexer::new(capacity);
        (0u64..)
            .filter(|&k| indexer.home_slot(k) == home)
            .take(count)
            .collect()
    }

    #[test]
    fn test_round_trip() {
        let mut map = ChainingMap::with_capacity(16);
        let r = map.insert(3, 300);
        assert!(r.success);
        assert_eq!(r.probe_count, 1);

        let (r, value) = map.lookup(3);
        assert!(r.success);
        assert_eq!(value, Some(300));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_update_keeps_size() {
        let mut map = ChainingMap::with_capacity(16);
        map.insert(3, 300);
        let r = map.insert(3, 301);
        assert!(r.success);
        assert_eq!(r.probe_count, 1);
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup(3).1, Some(301));
    }

    #[test]
    fn test_collision_chain_of_three() {
        let keys = colliding_keys(16, 6, 3);
        let mut map = ChainingMap::with_capacity(16);
        for (i, &key) in keys.iter().enumerate() {
            assert!(map.insert(key, i as u64).success);
        }

        assert_eq!(map.chain_length(6), 3);
        assert_eq!(map.max_chain_length(), 3);
        // Only the one non-empty bucket counts toward the average.
        assert!((map.avg_chain_length() - 3.0).abs() < 1e-9);

        for (i, &key) in keys.iter().enumerate() {
            let (r, value) = map.lookup(key);
            assert!(r.success);
            assert_eq!(value, Some(i as u64));
        }
    }

    #[test]
    fn test_avg_over_non_empty_buckets_only() {
        let chain = colliding_keys(16, 2, 3);
        let lone = colliding_keys(16, 9, 1);
        let mut map = ChainingMap::with_capacity(16);
        for &key in chain.iter().chain(lone.iter()) {
            map.insert(key, 0);
        }

        // Two non-empty buckets of lengths 3 and 1.
        assert!((map.avg_chain_length() - 2.0).abs() < 1e-9);
        assert_eq!(map.max_chain_length(), 3);
    }

    #[test]
    fn test_delete_head() {
        let keys = colliding_keys(16, 6, 3);
        let mut map = ChainingMap::with_capacity(16);
        for (i, &key) in keys.iter().enumerate() {
            map.insert(key, i as u64);
        }

        // Prepend order puts keys[2] at the head.
        let r = map.delete(keys[2]);
        assert!(r.success);
        assert_eq!(r.probe_count, 1);
        assert_eq!(map.chain_length(6), 2);
        assert!(!map.lookup(keys[2]).0.success);
        assert!(map.lookup(keys[0]).0.success);
        assert!(map.lookup(keys[1]).0.success);
    }

    #[test]
    fn test_delete_interior_relinks() {
        let keys = colliding_keys(16, 6, 3);
        let mut map = ChainingMap::with_capacity(16);
        for (i, &key) in keys.iter().enumerate() {
            map.insert(key, i as u64);
        }

        // Chain is keys[2] -> keys[1] -> keys[0]; remove the middle node.
        let r = map.delete(keys[1]);
        assert!(r.success);
        assert_eq!(r.probe_count, 2);
        assert_eq!(map.chain_length(6), 2);
        assert_eq!(map.lookup(keys[0]).1, Some(0));
        assert_eq!(map.lookup(keys[2]).1, Some(2));
    }

    #[test]
    fn test_delete_tail() {
        let keys = colliding_keys(16, 6, 3);
        let mut map = ChainingMap::with_capacity(16);
        for (i, &key) in keys.iter().enumerate() {
            map.insert(key, i as u64);
        }

        let r = map.delete(keys[0]);
        assert!(r.success);
        assert_eq!(r.probe_count, 3);
        assert_eq!(map.chain_length(6), 2);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_delete_missing_key() {
        let keys = colliding_keys(16, 6, 2);
        let mut map = ChainingMap::with_capacity(16);
        map.insert(keys[0], 0);

        let r = map.delete(keys[1]);
        assert!(!r.success);
        assert_eq!(r.probe_count, 1);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_lookup_empty_bucket() {
        let map = ChainingMap::with_capacity(16);
        let (r, value) = map.lookup(123);
        assert!(!r.success);
        assert_eq!(r.probe_count, 0);
        assert_eq!(value, None);
        assert_eq!(map.avg_chain_length(), 0.0);
    }

    #[test]
    fn test_bulk_random_workload() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(11);
        let keys: Vec<u64> = (0..2000).map(|_| rng.gen()).collect();

        let mut map = ChainingMap::with_capacity(256);
        for (i, &key) in keys.iter().enumerate() {
            assert!(map.insert(key, i as u64).success);
        }
        assert_eq!(map.len(), keys.len());
        assert!(map.load_factor() > 1.0); // chains absorb overflow

        for &key in keys.iter().step_by(4) {
            assert!(map.delete(key).success);
        }

        for (i, &key) in keys.iter().enumerate() {
            let (r, value) = map.lookup(key);
            if i % 4 == 0 {
                assert!(!r.success);
            } else {
                assert_eq!(value, Some(i as u64));
            }
        }
    }
}
