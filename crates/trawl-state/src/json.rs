use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::{Map, Value};
use trawl_fs::AtomicWriteOptions;

use crate::{CheckpointKey, CheckpointStore, Error, Result, Watermark};

type Record = Map<String, Value>;

/// Checkpoints kept as one JSON object on disk, one field per resource.
///
/// ```json
/// { "contacts.v2": "2021-06-01T10:00:00+00:00", "companies.v1": null }
/// ```
///
/// A key may also be given a legacy field name. When the key itself holds nothing,
/// `load` falls back to the legacy field; `save` only ever writes the key.
#[derive(Debug)]
pub struct JsonCheckpointStore {
    path:   PathBuf,
    legacy: BTreeMap<CheckpointKey, String>,
    // serializes the read-modify-write in `save`
    lock:   Mutex<()>,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:   path.into(),
            legacy: BTreeMap::new(),
            lock:   Mutex::new(()),
        }
    }

    /// Resume `key` from `field` when a state file written under an older layout has it.
    pub fn with_legacy_field(mut self, key: CheckpointKey, field: impl Into<String>) -> Self {
        self.legacy.insert(key, field.into());
        self
    }

    pub fn path(&self) -> &Path { &self.path }

    /// All entries currently on disk, in key order.
    pub fn entries(&self) -> Result<Vec<(CheckpointKey, Option<Watermark>)>> {
        let record = self.read_record()?;
        record
            .iter()
            .map(|(key, value)| Ok((CheckpointKey::from(key.as_str()), self.decode(key, value)?)))
            .collect()
    }

    fn read_record(&self) -> Result<Record> {
        let bytes = match trawl_fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Ok(Record::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|source| Error::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn lookup(&self, record: &Record, field: &str) -> Result<Option<Watermark>> {
        match record.get(field) {
            Some(value) => self.decode(field, value),
            None => Ok(None),
        }
    }

    /// `null` and `""` both mean "nothing checkpointed yet".
    fn decode(&self, key: &str, value: &Value) -> Result<Option<Watermark>> {
        let watermark = Option::<Watermark>::deserialize(value).map_err(|_| Error::InvalidEntry {
            path: self.path.clone(),
            key:  key.to_string(),
        })?;
        Ok(watermark.filter(|w| !w.as_str().is_empty()))
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self, key: &CheckpointKey) -> Result<Watermark> {
        let record = self.read_record()?;
        if let Some(watermark) = self.lookup(&record, key.as_str())? {
            return Ok(watermark);
        }
        if let Some(field) = self.legacy.get(key) {
            if let Some(watermark) = self.lookup(&record, field)? {
                tracing::info!(key = %key, legacy = %field, %watermark, "resuming from legacy checkpoint field");
                return Ok(watermark);
            }
        }
        Ok(Watermark::beginning())
    }

    fn save(&self, key: &CheckpointKey, watermark: &Watermark) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| Error::LockPoisoned)?;

        let mut record = self.read_record()?;
        let value = serde_json::to_value(watermark).map_err(Error::Encode)?;
        record.insert(key.to_string(), value);
        let bytes = serde_json::to_vec_pretty(&record).map_err(Error::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            trawl_fs::ensure_dir(parent)?;
        }
        trawl_fs::atomic_write(&self.path, &bytes, AtomicWriteOptions::new().sync(true))?;

        tracing::debug!(key = %key, watermark = %watermark, path = %self.path.display(), "checkpoint saved");
        Ok(())
    }
}
