use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use crate::document::{Document, TermQuery};
use crate::error::CoreResult;
use crate::forward::ForwardStore;
use crate::inverted::InvertedIndex;

/// Composes one forward store and one inverted index behind the
/// document-level surface shared by a single worker and, transitively,
/// a cluster facade that fans out to many of these.
pub struct Indexer {
    forward: Box<dyn ForwardStore>,
    inverted: InvertedIndex,
    max_int_id: AtomicU64,
    stale_posting_entries: AtomicU64,
}

impl Indexer {
    pub fn new(forward: Box<dyn ForwardStore>, doc_num_estimate: usize) -> Self {
        Self {
            forward,
            inverted: InvertedIndex::new(doc_num_estimate),
            max_int_id: AtomicU64::new(0),
            stale_posting_entries: AtomicU64::new(0),
        }
    }

    /// Rebuilds the in-memory inverted index from the forward store's
    /// current contents, re-using each document's stored `IntId`.
    /// `max_int_id` is deliberately *not* advanced to the highest
    /// restored `IntId` here: a fresh `Indexer` always starts allocating
    /// from 1 again, which is safe only because `IntId` is a
    /// process-local handle, not a persistent identity. A post-reload
    /// `AddDoc` can therefore allocate an `IntId` that collides with one
    /// already carrying live posting entries from a loaded document.
    pub fn load_from_index_file(&self) -> CoreResult<()> {
        let mut docs = Vec::new();
        self.forward.iter_db(&mut |_k, v| {
            match bincode::deserialize::<Document>(v) {
                Ok(doc) => docs.push(doc),
                Err(err) => {
                    warn!(error = %err, "failed to decode document during load");
                    self.stale_posting_entries.fetch_add(1, Ordering::Relaxed);
                }
            }
            true
        })?;
        for doc in &docs {
            self.inverted.add(doc);
        }
        Ok(())
    }

    /// Returns `(1, Ok)` on success, `(0, Ok)` for an empty/whitespace
    /// `Id`, `(0, Err)` if serialization fails. Idempotent with respect
    /// to `Id`: an existing document with the same `Id` is deleted
    /// first.
    pub fn add_doc(&self, mut doc: Document) -> CoreResult<u32> {
        doc.id = doc.id.trim().to_string();
        if doc.id.is_empty() {
            return Ok(0);
        }
        self.delete_doc(&doc.id)?;
        doc.int_id = self.max_int_id.fetch_add(1, Ordering::Relaxed) + 1;
        let encoded = bincode::serialize(&doc)?;
        self.forward.set(&doc.id, &encoded)?;
        self.inverted.add(&doc);
        Ok(1)
    }

    /// Returns `1` if a live entry existed, else `0`. Never errors: a
    /// decode failure on the existing entry is logged and counted, but
    /// the forward-store key is still removed, leaving the old
    /// document's posting-list entries stale (see diagnostics).
    pub fn delete_doc(&self, id: &str) -> CoreResult<u32> {
        let id = id.trim();
        let existing = self.forward.get(id)?;
        let found = existing.is_some();
        if let Some(bytes) = existing {
            match bincode::deserialize::<Document>(&bytes) {
                Ok(old) => {
                    for keyword in &old.keywords {
                        self.inverted.delete(old.int_id, &keyword.canonical());
                    }
                }
                Err(err) => {
                    warn!(error = %err, id, "failed to decode document on delete, posting entries left stale");
                    self.stale_posting_entries.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        self.forward.delete(id)?;
        Ok(found as u32)
    }

    pub fn search(&self, query: &TermQuery, on_flag: u64, off_flag: u64, or_flags: &[u64]) -> CoreResult<Vec<Document>> {
        let ids = self.inverted.search(query, on_flag, off_flag, or_flags);
        let entries = self.forward.batch_get(&ids)?;
        let mut results = Vec::with_capacity(entries.len());
        for entry in entries.into_iter().flatten() {
            if let Ok(doc) = bincode::deserialize::<Document>(&entry) {
                results.push(doc);
            }
        }
        Ok(results)
    }

    pub fn count(&self) -> CoreResult<u32> {
        let mut n = 0u32;
        self.forward.iter_db(&mut |_k, _v| {
            n += 1;
            true
        })?;
        Ok(n)
    }

    /// Number of documents whose posting-list entries could not be
    /// reconciled because their forward-store bytes failed to decode.
    pub fn diagnostics(&self) -> u64 {
        self.stale_posting_entries.load(Ordering::Relaxed)
    }

    pub fn close(&self) -> CoreResult<()> {
        self.forward.close()
    }
}
