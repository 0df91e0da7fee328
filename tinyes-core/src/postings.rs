use std::collections::{BTreeMap, HashSet};

/// The metadata carried alongside a document's `IntId` in a posting
/// list: its user-facing `Id` and its bitmask feature.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingEntry {
    pub id: String,
    pub bits_feature: u64,
}

/// An ordered set of `(IntId, PostingEntry)`, at most one entry per
/// `IntId`. Backed by a `BTreeMap` so ascending order is a structural
/// guarantee rather than something callers must remember to maintain.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    entries: BTreeMap<u64, PostingEntry>,
}

impl PostingList {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, int_id: u64, entry: PostingEntry) {
        debug_assert!(int_id > 0, "IntId must be strictly positive");
        self.entries.insert(int_id, entry);
    }

    pub fn remove(&mut self, int_id: u64) {
        self.entries.remove(&int_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &PostingEntry)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.values().map(|e| e.id.clone()).collect()
    }

    #[cfg(test)]
    pub fn from_ids(ids: &[u64]) -> Self {
        let mut list = Self::new();
        for &id in ids {
            list.insert(
                id,
                PostingEntry {
                    id: id.to_string(),
                    bits_feature: 0,
                },
            );
        }
        list
    }
}

/// Sorted merge intersection over N posting lists. Zero lists -> empty;
/// one list -> returned unchanged; any empty input -> empty.
pub fn intersect(lists: &[&PostingList]) -> PostingList {
    match lists.len() {
        0 => return PostingList::new(),
        1 => return lists[0].clone(),
        _ => {}
    }
    if lists.iter().any(|l| l.is_empty()) {
        return PostingList::new();
    }

    let mut cursors: Vec<_> = lists.iter().map(|l| l.entries.iter().peekable()).collect();
    let mut result = PostingList::new();
    loop {
        let mut max_key: Option<u64> = None;
        for cursor in cursors.iter_mut() {
            match cursor.peek() {
                Some((&k, _)) => max_key = Some(max_key.map_or(k, |m| m.max(k))),
                None => return result,
            }
        }
        let max_key = max_key.expect("cursors non-empty after the loop above");

        let all_at_max = cursors
            .iter_mut()
            .all(|cursor| cursor.peek().map(|(&k, _)| k) == Some(max_key));

        if all_at_max {
            let (_, entry) = *cursors[0].peek().expect("checked above");
            result.insert(max_key, entry.clone());
            for cursor in cursors.iter_mut() {
                cursor.next();
            }
        } else {
            for cursor in cursors.iter_mut() {
                if let Some((&k, _)) = cursor.peek() {
                    if k < max_key {
                        cursor.next();
                    }
                }
            }
        }
    }
}

/// Union over N posting lists. Zero lists -> empty; one -> returned
/// unchanged. The value for a key is taken from whichever list first
/// contributes it.
pub fn union(lists: &[&PostingList]) -> PostingList {
    match lists.len() {
        0 => return PostingList::new(),
        1 => return lists[0].clone(),
        _ => {}
    }
    let mut seen = HashSet::new();
    let mut result = PostingList::new();
    for list in lists {
        for (k, entry) in list.entries.iter() {
            if seen.insert(*k) {
                result.insert(*k, entry.clone());
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_edge_cases() {
        let l = PostingList::from_ids(&[1, 2, 3]);
        let empty = PostingList::new();
        assert_eq!(intersect(&[]).len(), 0);
        assert_eq!(intersect(&[&l]).ids(), l.ids());
        assert_eq!(intersect(&[&l, &empty]).len(), 0);
    }

    #[test]
    fn union_edge_cases() {
        let l = PostingList::from_ids(&[1, 2, 3]);
        let empty = PostingList::new();
        assert_eq!(union(&[]).len(), 0);
        assert_eq!(union(&[&l]).ids(), l.ids());
        assert_eq!(union(&[&l, &empty]).ids(), l.ids());
    }

    #[test]
    fn scenario_three_way_intersect_and_union() {
        let l1 = PostingList::from_ids(&[1, 4, 5, 7, 9, 11]);
        let l2 = PostingList::from_ids(&[2, 4, 5, 8, 9]);
        let l3 = PostingList::from_ids(&[3, 5, 7, 9]);

        let inter = intersect(&[&l1, &l2, &l3]);
        let inter_keys: Vec<u64> = inter.iter().map(|(k, _)| k).collect();
        assert_eq!(inter_keys, vec![5, 9]);

        let uni = union(&[&l1, &l2, &l3]);
        let uni_keys: Vec<u64> = uni.iter().map(|(k, _)| k).collect();
        assert_eq!(uni_keys, vec![1, 2, 3, 4, 5, 7, 8, 9, 11]);
    }

    #[test]
    fn union_has_no_duplicate_keys_and_is_sorted() {
        let l1 = PostingList::from_ids(&[5, 1, 3]);
        let l2 = PostingList::from_ids(&[3, 2, 5]);
        let uni = union(&[&l1, &l2]);
        let keys: Vec<u64> = uni.iter().map(|(k, _)| k).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        let unique: HashSet<u64> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len());
    }
}
