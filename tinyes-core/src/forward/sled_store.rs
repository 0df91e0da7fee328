use std::path::Path;

use super::ForwardStore;
use crate::error::CoreResult;

/// LSM-tree backed forward store, analogue of the Go original's Badger
/// backend. One `sled::Db` per directory.
pub struct SledForwardStore {
    db: sled::Db,
}

impl SledForwardStore {
    pub fn open(dir: impl AsRef<Path>) -> CoreResult<Self> {
        let db = sled::open(dir)?;
        Ok(Self { db })
    }
}

impl ForwardStore for SledForwardStore {
    fn set(&self, key: &str, value: &[u8]) -> CoreResult<()> {
        self.db.insert(key.as_bytes(), value)?;
        Ok(())
    }

    fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.db.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn delete(&self, key: &str) -> CoreResult<()> {
        self.db.remove(key.as_bytes())?;
        Ok(())
    }

    fn has(&self, key: &str) -> CoreResult<bool> {
        Ok(self.db.contains_key(key.as_bytes())?)
    }

    fn batch_set(&self, entries: &[(String, Vec<u8>)]) -> CoreResult<()> {
        let mut batch = sled::Batch::default();
        for (k, v) in entries {
            batch.insert(k.as_bytes(), v.as_slice());
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    fn batch_delete(&self, keys: &[String]) -> CoreResult<()> {
        let mut batch = sled::Batch::default();
        for k in keys {
            batch.remove(k.as_bytes());
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    fn iter_db(&self, visit: &mut dyn FnMut(&str, &[u8]) -> bool) -> CoreResult<()> {
        for item in self.db.iter() {
            let (k, v) = item?;
            let key = String::from_utf8_lossy(&k);
            if !visit(&key, &v) {
                break;
            }
        }
        Ok(())
    }

    fn close(&self) -> CoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledForwardStore::open(dir.path()).unwrap();
        store.set("a", b"hello").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"hello".to_vec()));
        assert!(store.has("a").unwrap());
        store.delete("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert!(!store.has("a").unwrap());
    }

    #[test]
    fn batch_ops_and_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledForwardStore::open(dir.path()).unwrap();
        let entries = vec![
            ("a".to_string(), b"1".to_vec()),
            ("b".to_string(), b"2".to_vec()),
        ];
        store.batch_set(&entries).unwrap();
        let mut seen = Vec::new();
        store
            .iter_db(&mut |k, v| {
                seen.push((k.to_string(), v.to_vec()));
                true
            })
            .unwrap();
        seen.sort();
        assert_eq!(
            seen,
            vec![("a".to_string(), b"1".to_vec()), ("b".to_string(), b"2".to_vec())]
        );
        store.batch_delete(&["a".to_string()]).unwrap();
        assert!(!store.has("a").unwrap());
        assert!(store.has("b").unwrap());
    }
}
