use std::collections::HashMap;

use parking_lot::RwLock;

use crate::hashing::hash32;

/// A keyword -> value map striped into a fixed number of segments, each
/// guarded by its own read-write lock. The hot path is concurrent
/// keyword writes; a single global lock would collapse throughput, so
/// contention is bounded to keys that collide on a segment.
pub struct SegmentedMap<V> {
    segments: Vec<RwLock<HashMap<String, V>>>,
}

impl<V: Clone> SegmentedMap<V> {
    pub fn new(num_segments: usize, capacity_hint: usize) -> Self {
        let num_segments = num_segments.max(1);
        let per_segment = capacity_hint / num_segments;
        let segments = (0..num_segments)
            .map(|_| RwLock::new(HashMap::with_capacity(per_segment)))
            .collect();
        Self { segments }
    }

    fn segment_index(&self, key: &str) -> usize {
        hash32(key) as usize % self.segments.len()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let idx = self.segment_index(key);
        self.segments[idx].read().get(key).cloned()
    }

    pub fn set(&self, key: String, value: V) {
        let idx = self.segment_index(&key);
        self.segments[idx].write().insert(key, value);
    }

    /// Snapshots the key sets per segment now; values are looked up
    /// lazily on `next()`, so a value may be stale relative to the
    /// snapshot (or gone entirely) but is always a consistent read of
    /// the map at lookup time. Order is segment-major, then insertion
    /// order within a segment -- not sorted.
    pub fn iter(&self) -> SegmentedMapIter<'_, V> {
        let keys = self
            .segments
            .iter()
            .map(|seg| seg.read().keys().cloned().collect::<Vec<_>>())
            .collect();
        SegmentedMapIter {
            map: self,
            keys,
            row: 0,
            col: 0,
        }
    }
}

pub struct SegmentedMapIter<'a, V> {
    map: &'a SegmentedMap<V>,
    keys: Vec<Vec<String>>,
    row: usize,
    col: usize,
}

impl<'a, V: Clone> Iterator for SegmentedMapIter<'a, V> {
    /// `None` in the value slot means the key was present at snapshot
    /// time but has since been removed from the map.
    type Item = (String, Option<V>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.row >= self.keys.len() {
                return None;
            }
            let row_len = self.keys[self.row].len();
            if row_len == 0 {
                self.row += 1;
                continue;
            }
            let key = self.keys[self.row][self.col].clone();
            let value = self.map.get(&key);
            if self.col >= row_len - 1 {
                self.row += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
            return Some((key, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_roundtrip() {
        let map = SegmentedMap::new(4, 16);
        map.set("a".to_string(), 1);
        map.set("b".to_string(), 2);
        assert_eq!(map.get("a"), Some(1));
        assert_eq!(map.get("b"), Some(2));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn iterator_visits_every_inserted_key() {
        let map = SegmentedMap::new(4, 64);
        for i in 0..50 {
            map.set(format!("k{i}"), i);
        }
        let mut seen: Vec<_> = map.iter().filter_map(|(k, v)| v.map(|v| (k, v))).collect();
        seen.sort();
        let mut expected: Vec<_> = (0..50).map(|i| (format!("k{i}"), i)).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn single_segment_degenerates_to_one_lock() {
        let map: SegmentedMap<i32> = SegmentedMap::new(0, 10);
        map.set("x".into(), 1);
        assert_eq!(map.get("x"), Some(1));
    }
}
