use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use trawl_fs::AtomicWriteOptions;

use crate::{Error, RecordId, RecordIter, Result, StagedRecord, StagingStore};

const EXTENSION: &str = "json";

/// One `<id>.json` file per record under a single directory.
#[derive(Debug, Clone)]
pub struct DirStagingStore {
    dir: PathBuf,
}

impl DirStagingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    /// `<root>/<resource>-v<version>`, one directory per identity-strategy version.
    pub fn for_resource(root: impl AsRef<Path>, resource: &str, version: u32) -> Self {
        Self::new(root.as_ref().join(format!("{resource}-v{version}")))
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn path_of(&self, id: &RecordId) -> PathBuf { self.dir.join(format!("{id}.{EXTENSION}")) }

    fn list_err(&self) -> impl Fn(io::Error) -> Error + '_ {
        move |source| Error::List {
            path: self.dir.clone(),
            source,
        }
    }

    fn entries(&self) -> Result<Option<fs::ReadDir>> {
        match fs::read_dir(&self.dir) {
            Ok(rd) => Ok(Some(rd)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.list_err()(e)),
        }
    }

    fn staged_id(entry: &fs::DirEntry) -> Option<RecordId> {
        let path = entry.path();
        if path.extension() != Some(OsStr::new(EXTENSION)) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        match RecordId::new(stem) {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(path = %path.display(), "skipping staged file with invalid name");
                None
            }
        }
    }

    fn ids(&self) -> Result<impl Iterator<Item = Result<(RecordId, PathBuf)>> + '_> {
        let entries = self.entries()?.into_iter().flatten();
        Ok(entries.filter_map(move |entry| match entry {
            Err(e) => Some(Err(self.list_err()(e))),
            Ok(entry) => {
                let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
                if !is_file {
                    return None;
                }
                Self::staged_id(&entry).map(|id| Ok((id, entry.path())))
            }
        }))
    }
}

impl StagingStore for DirStagingStore {
    fn put(&self, id: &RecordId, payload: &[u8]) -> Result<()> {
        trawl_fs::ensure_dir(&self.dir)?;
        trawl_fs::atomic_write(self.path_of(id), payload, AtomicWriteOptions::new())?;
        Ok(())
    }

    fn list_all(&self) -> Result<RecordIter<'_>> {
        let records = self.ids()?.map(|item| -> Result<StagedRecord> {
            let (id, path) = item?;
            let payload = trawl_fs::read(&path)?;
            Ok(StagedRecord { id, payload })
        });
        Ok(Box::new(records))
    }

    fn remove(&self, id: &RecordId) -> Result<bool> {
        let path = self.path_of(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(trawl_fs::Error::Write { path, source }.into()),
        }
    }

    fn len(&self) -> Result<usize> {
        let mut n = 0;
        for item in self.ids()? {
            item?;
            n += 1;
        }
        Ok(n)
    }
}
