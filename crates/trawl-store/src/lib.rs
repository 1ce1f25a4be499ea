//! Identity-addressed staging of fetched records.
//!
//! Each record fetched from the remote API is kept as its own entry keyed by a
//! [`RecordId`] derived from the record itself. Re-fetching a record overwrites its
//! entry, so the store is a growing cache that survives across runs and makes an
//! interrupted fetch safe to repeat.
//!
//! Consumers must treat [`StagingStore::list_all`] as unordered.

mod dir;
mod error;
mod id;
mod memory;

pub use dir::DirStagingStore;
pub use error::{Error, Result};
pub use id::{IdentityStrategy, RecordId};
pub use memory::MemoryStagingStore;

/// One staged record as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRecord {
    pub id:      RecordId,
    pub payload: Vec<u8>,
}

pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<StagedRecord>> + 'a>;

pub trait StagingStore: Send + Sync {
    /// Write or overwrite the entry for `id`.
    fn put(&self, id: &RecordId, payload: &[u8]) -> Result<()>;

    /// Lazily enumerate every staged record, in no particular order.
    fn list_all(&self) -> Result<RecordIter<'_>>;

    /// Delete the entry for `id`. Returns whether it existed.
    fn remove(&self, id: &RecordId) -> Result<bool>;

    fn len(&self) -> Result<usize> {
        let mut n = 0;
        for record in self.list_all()? {
            record?;
            n += 1;
        }
        Ok(n)
    }

    fn is_empty(&self) -> Result<bool> { Ok(self.len()? == 0) }
}

impl<T: StagingStore + ?Sized> StagingStore for &T {
    fn put(&self, id: &RecordId, payload: &[u8]) -> Result<()> { (**self).put(id, payload) }

    fn list_all(&self) -> Result<RecordIter<'_>> { (**self).list_all() }

    fn remove(&self, id: &RecordId) -> Result<bool> { (**self).remove(id) }

    fn len(&self) -> Result<usize> { (**self).len() }
}
