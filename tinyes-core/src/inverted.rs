use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::document::{Document, TermQuery};
use crate::hashing::hash32;
use crate::postings::{intersect, union, PostingEntry, PostingList};
use crate::segmap::SegmentedMap;

/// Size of the striped per-keyword mutation lock pool. Keywords whose
/// hash collides into the same slot serialize against each other --
/// false-sharing of locks is tolerated, false-sharing of data is not.
const LOCK_POOL_SIZE: usize = 1024;

type SharedPostingList = Arc<RwLock<PostingList>>;

/// In-memory mapping from keyword to posting list, with no I/O and no
/// failure modes of its own. Owns a segmented concurrent map (guards
/// the map's *shape*) and a separate pool of per-keyword mutation locks
/// (guards a posting list's *contents* across the create-or-update
/// decision). These are deliberately not merged: one protects map
/// shape, the other protects list contents.
pub struct InvertedIndex {
    table: SegmentedMap<SharedPostingList>,
    key_locks: Vec<Mutex<()>>,
}

impl InvertedIndex {
    pub fn new(doc_num_estimate: usize) -> Self {
        let segments = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            table: SegmentedMap::new(segments, doc_num_estimate),
            key_locks: (0..LOCK_POOL_SIZE).map(|_| Mutex::new(())).collect(),
        }
    }

    fn lock_for(&self, key: &str) -> &Mutex<()> {
        &self.key_locks[hash32(key) as usize % self.key_locks.len()]
    }

    pub fn add(&self, doc: &Document) {
        for keyword in &doc.keywords {
            let key = keyword.canonical();
            let _guard = self.lock_for(&key).lock();
            let entry = PostingEntry {
                id: doc.id.clone(),
                bits_feature: doc.bits_feature,
            };
            match self.table.get(&key) {
                Some(list) => list.write().insert(doc.int_id, entry),
                None => {
                    let mut list = PostingList::new();
                    list.insert(doc.int_id, entry);
                    self.table.set(key, Arc::new(RwLock::new(list)));
                }
            }
        }
    }

    pub fn delete(&self, int_id: u64, keyword_canonical: &str) {
        let _guard = self.lock_for(keyword_canonical).lock();
        if let Some(list) = self.table.get(keyword_canonical) {
            list.write().remove(int_id);
        }
    }

    /// Evaluates the bitmask predicate used by every leaf during search:
    /// `on_flag` bits must all be set, `off_flag` bits must all be
    /// clear, and for every non-zero entry in `or_flags` at least one
    /// must be set.
    pub fn matches_bits(bits: u64, on_flag: u64, off_flag: u64, or_flags: &[u64]) -> bool {
        if bits & on_flag != on_flag {
            return false;
        }
        if bits & off_flag != 0 {
            return false;
        }
        for &flag in or_flags {
            if flag != 0 && bits & flag == 0 {
                return false;
            }
        }
        true
    }

    fn eval(&self, query: &TermQuery, on_flag: u64, off_flag: u64, or_flags: &[u64]) -> PostingList {
        match query {
            TermQuery::Empty => PostingList::new(),
            TermQuery::Leaf(keyword) => {
                let key = keyword.canonical();
                match self.table.get(&key) {
                    None => PostingList::new(),
                    Some(list) => {
                        let guard = list.read();
                        let mut filtered = PostingList::new();
                        for (int_id, entry) in guard.iter() {
                            if int_id > 0
                                && Self::matches_bits(entry.bits_feature, on_flag, off_flag, or_flags)
                            {
                                filtered.insert(int_id, entry.clone());
                            }
                        }
                        filtered
                    }
                }
            }
            TermQuery::Must(children) => {
                let lists: Vec<PostingList> = children
                    .iter()
                    .map(|c| self.eval(c, on_flag, off_flag, or_flags))
                    .collect();
                let refs: Vec<&PostingList> = lists.iter().collect();
                intersect(&refs)
            }
            TermQuery::Should(children) => {
                let lists: Vec<PostingList> = children
                    .iter()
                    .map(|c| self.eval(c, on_flag, off_flag, or_flags))
                    .collect();
                let refs: Vec<&PostingList> = lists.iter().collect();
                union(&refs)
            }
        }
    }

    /// Evaluates `query` and projects the result to `Id` strings in
    /// ascending `IntId` order.
    pub fn search(&self, query: &TermQuery, on_flag: u64, off_flag: u64, or_flags: &[u64]) -> Vec<String> {
        self.eval(query, on_flag, off_flag, or_flags).ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Keyword;

    fn doc(id: &str, int_id: u64, bits: u64, keywords: &[(&str, &str)]) -> Document {
        Document {
            id: id.to_string(),
            int_id,
            bits_feature: bits,
            keywords: keywords
                .iter()
                .map(|(f, w)| Keyword::new(*f, *w))
                .collect(),
            bytes: bytes::Bytes::new(),
        }
    }

    #[test]
    fn add_then_search_leaf_finds_doc() {
        let idx = InvertedIndex::new(16);
        let d = doc("d1", 1, 0, &[("content", "a"), ("content", "b")]);
        idx.add(&d);
        let q = TermQuery::leaf("content", "a").and(&[TermQuery::leaf("content", "b")]);
        let result = idx.search(&q, 0, 0, &[]);
        assert_eq!(result, vec!["d1".to_string()]);
    }

    #[test]
    fn delete_removes_posting_entry() {
        let idx = InvertedIndex::new(16);
        let d = doc("d1", 1, 0, &[("content", "a")]);
        idx.add(&d);
        idx.delete(1, &Keyword::new("content", "a").canonical());
        let result = idx.search(&TermQuery::leaf("content", "a"), 0, 0, &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn bitmask_filter_on_flag() {
        let idx = InvertedIndex::new(16);
        let d = doc("d1", 1, 0b10011, &[("content", "a")]);
        idx.add(&d);
        assert_eq!(
            idx.search(&TermQuery::leaf("content", "a"), 0b10000, 0, &[]),
            vec!["d1".to_string()]
        );
        assert!(idx
            .search(&TermQuery::leaf("content", "a"), 0b01000, 0, &[])
            .is_empty());
    }

    #[test]
    fn missing_keyword_is_empty() {
        let idx = InvertedIndex::new(16);
        assert!(idx
            .search(&TermQuery::leaf("content", "nope"), 0, 0, &[])
            .is_empty());
    }

    #[test]
    fn empty_query_matches_nothing() {
        let idx = InvertedIndex::new(16);
        idx.add(&doc("d1", 1, 0, &[("content", "a")]));
        assert!(idx.search(&TermQuery::empty(), 0, 0, &[]).is_empty());
    }
}
