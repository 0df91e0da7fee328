mod redb_store;
mod sled_store;

use std::path::{Path, PathBuf};

pub use redb_store::RedbForwardStore;
pub use sled_store::SledForwardStore;

use crate::error::CoreResult;

/// Durable key -> document-bytes store backing the forward index. One
/// key is one document's `Id`; the value is its `bincode`-encoded
/// [`crate::document::Document`].
pub trait ForwardStore: Send + Sync {
    fn set(&self, key: &str, value: &[u8]) -> CoreResult<()>;
    fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>>;
    fn delete(&self, key: &str) -> CoreResult<()>;
    fn has(&self, key: &str) -> CoreResult<bool>;

    fn batch_set(&self, entries: &[(String, Vec<u8>)]) -> CoreResult<()> {
        for (k, v) in entries {
            self.set(k, v)?;
        }
        Ok(())
    }

    fn batch_get(&self, keys: &[String]) -> CoreResult<Vec<Option<Vec<u8>>>> {
        keys.iter().map(|k| self.get(k)).collect()
    }

    fn batch_delete(&self, keys: &[String]) -> CoreResult<()> {
        for k in keys {
            self.delete(k)?;
        }
        Ok(())
    }

    /// Visits every stored `(key, value)` pair. Order is backend-defined.
    fn iter_db(&self, visit: &mut dyn FnMut(&str, &[u8]) -> bool) -> CoreResult<()>;

    fn close(&self) -> CoreResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// LSM-tree backend (`sled`), feature-parity with the original's Badger backend.
    Lsm,
    /// Single-file B-tree backend (`redb`), feature-parity with the original's Bolt backend.
    BTree,
}

/// Opens the on-disk forward store at `dir`, creating parent directories
/// as needed. If `dir`'s parent already exists as a regular file
/// (leftover from an earlier, incompatible run) it is removed first so
/// `create_dir_all` can succeed in its place.
pub struct ForwardStoreFactory;

impl ForwardStoreFactory {
    pub fn open(kind: BackendKind, dir: impl AsRef<Path>) -> CoreResult<Box<dyn ForwardStore>> {
        let dir: PathBuf = dir.as_ref().to_path_buf();
        if let Some(parent) = dir.parent() {
            if parent.is_file() {
                std::fs::remove_file(parent)?;
            }
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&dir)?;
        match kind {
            BackendKind::Lsm => Ok(Box::new(SledForwardStore::open(&dir)?)),
            BackendKind::BTree => {
                let file = dir.join("forward.redb");
                Ok(Box::new(RedbForwardStore::open(&file)?))
            }
        }
    }
}
