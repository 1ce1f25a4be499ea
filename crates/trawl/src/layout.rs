use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use trawl_fetch::Resource;
use trawl_state::JsonCheckpointStore;
use trawl_store::DirStagingStore;

const STATE_FILE: &str = "state.json";
const STAGING_DIR: &str = "sigparser-api-files";

/// On-disk locations shared by every command.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// `root` if given, else the current directory.
    pub fn resolve(root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(root) => root,
            None => env::current_dir().context("Failed to get current directory")?,
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn state_file(&self) -> PathBuf { self.root.join(STATE_FILE) }

    pub fn staging_root(&self) -> PathBuf { self.root.join(STAGING_DIR) }

    /// Checkpoint store that also resumes from the field older releases wrote.
    pub fn checkpoints(&self, resource: &Resource) -> JsonCheckpointStore {
        JsonCheckpointStore::new(self.state_file())
            .with_legacy_field(resource.checkpoint_key(), legacy_checkpoint_field(resource))
    }

    /// `<staging root>/<resource>-v<version>`, unless only the directory older releases
    /// used (`fetch-contactsV2`) exists, in which case that one is reused as is.
    pub fn staging(&self, resource: &Resource) -> DirStagingStore {
        let version = resource.identity.version();
        let current = DirStagingStore::for_resource(self.staging_root(), &resource.name, version);
        let legacy = self.staging_root().join(format!("fetch-{}V{version}", resource.name));
        if !current.dir().exists() && legacy.is_dir() {
            tracing::info!(dir = %legacy.display(), "reusing legacy staging directory");
            return DirStagingStore::new(legacy);
        }
        current
    }
}

/// `contacts` v2 was stored as `ContactsLastModifiedV2`.
fn legacy_checkpoint_field(resource: &Resource) -> String {
    let mut chars = resource.name.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("{capitalized}LastModifiedV{}", resource.identity.version())
}
