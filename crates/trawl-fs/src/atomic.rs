use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use crate::{Error, Result};

const TMP_PREFIX: &str = ".";
const TMP_SUFFIX: &str = ".tmp";

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    pub sync: bool,
}

impl AtomicWriteOptions {
    pub fn new() -> Self { Self::default() }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

fn parent_of(path: &Path) -> Result<&Path> {
    match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Ok(Path::new(".")),
        Some(p) => Ok(p),
        None => Err(Error::NoParent {
            path: path.to_path_buf(),
        }),
    }
}

fn staging_file(path: &Path) -> Result<NamedTempFile> {
    let parent = parent_of(path)?;
    Builder::new()
        .prefix(TMP_PREFIX)
        .suffix(TMP_SUFFIX)
        .tempfile_in(parent)
        .map_err(|source| Error::Write {
            path: parent.to_path_buf(),
            source,
        })
}

fn persist(tmp: NamedTempFile, path: &Path) -> Result<()> {
    // on failure the returned NamedTempFile is dropped, which unlinks it
    tmp.persist(path).map_err(|e| Error::Write {
        path:   path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Create `dir` and its parents if missing.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Replace `path` with `content` in one rename.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8], options: AtomicWriteOptions) -> Result<()> {
    let path = path.as_ref();
    let mut tmp = staging_file(path)?;
    let tmp_path = tmp.path().to_path_buf();
    let write_err = |source| Error::Write {
        path: tmp_path.clone(),
        source,
    };

    tmp.write_all(content).map_err(write_err)?;
    if options.sync {
        tmp.as_file().sync_all().map_err(write_err)?;
    }

    persist(tmp, path)
}

pub fn read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Streaming writer whose bytes only appear at `destination` after [`commit`].
///
/// Dropping an uncommitted `AtomicFile` removes the staging file and leaves
/// whatever was at the destination untouched.
///
/// [`commit`]: AtomicFile::commit
pub struct AtomicFile {
    inner:       BufWriter<NamedTempFile>,
    destination: PathBuf,
}

impl AtomicFile {
    pub fn create(destination: impl Into<PathBuf>) -> Result<Self> {
        let destination = destination.into();
        let tmp = staging_file(&destination)?;
        Ok(Self {
            inner: BufWriter::new(tmp),
            destination,
        })
    }

    pub fn destination(&self) -> &Path { &self.destination }

    pub fn commit(self) -> Result<()> {
        let destination = self.destination;
        let tmp = self.inner.into_inner().map_err(|e| Error::Write {
            path:   destination.clone(),
            source: e.into_error(),
        })?;
        tmp.as_file().sync_all().map_err(|source| Error::Write {
            path: tmp.path().to_path_buf(),
            source,
        })?;
        persist(tmp, &destination)
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.inner.write(buf) }

    fn flush(&mut self) -> io::Result<()> { self.inner.flush() }
}
