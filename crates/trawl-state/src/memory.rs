use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{CheckpointKey, CheckpointStore, Error, Result, Watermark};

/// In-process checkpoint store. Keeps every save so callers can inspect the sequence.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    current: Mutex<BTreeMap<CheckpointKey, Watermark>>,
    history: Mutex<Vec<(CheckpointKey, Watermark)>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self { Self::default() }

    pub fn with(self, key: CheckpointKey, watermark: Watermark) -> Self {
        if let Ok(mut current) = self.current.lock() {
            current.insert(key, watermark);
        }
        self
    }

    /// Every watermark passed to `save`, oldest first.
    pub fn history(&self) -> Result<Vec<(CheckpointKey, Watermark)>> {
        Ok(self.history.lock().map_err(|_| Error::LockPoisoned)?.clone())
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, key: &CheckpointKey) -> Result<Watermark> {
        let current = self.current.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(current.get(key).cloned().unwrap_or_default())
    }

    fn save(&self, key: &CheckpointKey, watermark: &Watermark) -> Result<()> {
        self.current
            .lock()
            .map_err(|_| Error::LockPoisoned)?
            .insert(key.clone(), watermark.clone());
        self.history
            .lock()
            .map_err(|_| Error::LockPoisoned)?
            .push((key.clone(), watermark.clone()));
        Ok(())
    }
}
