use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use super::ForwardStore;
use crate::error::CoreResult;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("forward");

/// Single-file B-tree backed forward store, analogue of the Go
/// original's Bolt/bbolt backend.
pub struct RedbForwardStore {
    db: Database,
}

impl RedbForwardStore {
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let db = Database::create(path)?;
        let txn = db.begin_write()?;
        {
            txn.open_table(TABLE)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }
}

impl ForwardStore for RedbForwardStore {
    fn set(&self, key: &str, value: &[u8]) -> CoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TABLE)?;
        let result = table.get(key)?.map(|v| v.value().to_vec());
        Ok(result)
    }

    fn delete(&self, key: &str) -> CoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn has(&self, key: &str) -> CoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn batch_set(&self, entries: &[(String, Vec<u8>)]) -> CoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE)?;
            for (k, v) in entries {
                table.insert(k.as_str(), v.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn batch_delete(&self, keys: &[String]) -> CoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE)?;
            for k in keys {
                table.remove(k.as_str())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn iter_db(&self, visit: &mut dyn FnMut(&str, &[u8]) -> bool) -> CoreResult<()> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TABLE)?;
        for item in table.iter()? {
            let (k, v) = item?;
            if !visit(k.value(), v.value()) {
                break;
            }
        }
        Ok(())
    }
}
