use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{Error, RecordId, RecordIter, Result, StagedRecord, StagingStore};

#[derive(Debug, Default)]
pub struct MemoryStagingStore {
    records: Mutex<BTreeMap<RecordId, Vec<u8>>>,
}

impl MemoryStagingStore {
    pub fn new() -> Self { Self::default() }
}

impl StagingStore for MemoryStagingStore {
    fn put(&self, id: &RecordId, payload: &[u8]) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| Error::LockPoisoned)?
            .insert(id.clone(), payload.to_vec());
        Ok(())
    }

    fn list_all(&self) -> Result<RecordIter<'_>> {
        // snapshot so the lock is not held while the caller iterates
        let snapshot: Vec<_> = self
            .records
            .lock()
            .map_err(|_| Error::LockPoisoned)?
            .iter()
            .map(|(id, payload)| StagedRecord {
                id:      id.clone(),
                payload: payload.clone(),
            })
            .collect();
        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }

    fn remove(&self, id: &RecordId) -> Result<bool> {
        Ok(self
            .records
            .lock()
            .map_err(|_| Error::LockPoisoned)?
            .remove(id)
            .is_some())
    }

    fn len(&self) -> Result<usize> { Ok(self.records.lock().map_err(|_| Error::LockPoisoned)?.len()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_idempotent_put() {
        let store = MemoryStagingStore::new();
        let id = RecordId::new("x").unwrap();
        store.put(&id, b"1").unwrap();
        store.put(&id, b"2").unwrap();
        assert_eq!(store.len().unwrap(), 1);
        let record = store.list_all().unwrap().next().unwrap().unwrap();
        assert_eq!(record.payload, b"2");
    }
}
