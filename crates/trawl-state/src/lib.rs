//! Durable watermark checkpoints.
//!
//! A checkpoint is the modification timestamp of the last record of the last fully
//! staged page. The fetch loop reads it once per run and writes it after every page.
//! Storage sits behind [`CheckpointStore`] so the JSON file can be swapped for another
//! backend without touching the loop.

mod error;
mod json;
mod memory;
mod watermark;

pub use error::{Error, Result};
pub use json::JsonCheckpointStore;
pub use memory::MemoryCheckpointStore;
pub use watermark::{CheckpointKey, Watermark};

/// Storage contract for per-resource watermarks.
pub trait CheckpointStore: Send + Sync {
    /// Read the watermark stored under `key`.
    ///
    /// Fails soft: a missing backing file or an absent/null entry yields
    /// [`Watermark::beginning`].
    fn load(&self, key: &CheckpointKey) -> Result<Watermark>;

    /// Replace the watermark stored under `key`.
    ///
    /// A subsequent [`load`](CheckpointStore::load) sees either the previous value or
    /// this one, never a partial write.
    fn save(&self, key: &CheckpointKey, watermark: &Watermark) -> Result<()>;
}

impl<T: CheckpointStore + ?Sized> CheckpointStore for &T {
    fn load(&self, key: &CheckpointKey) -> Result<Watermark> { (**self).load(key) }

    fn save(&self, key: &CheckpointKey, watermark: &Watermark) -> Result<()> { (**self).save(key, watermark) }
}
