use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::debug;

use crate::error::RegistryError;
use crate::registry::{TriggerLoader, TriggerRegistry, validate_trigger_name};
use crate::trigger::Trigger;

const TRIGGER_FILE: &str = "trigger.json";

/// Filesystem-based trigger registry.
///
/// Triggers are stored in a directory structure:
/// ```text
/// {root}/
/// └── nightly/
///     └── trigger.json
/// ```
///
/// Each upload is written to its own temporary file and renamed into place,
/// so a concurrent `load` sees either the old or the new bytes and concurrent
/// uploads for one name never share a staging file.
pub struct FsTriggerRegistry {
  root: PathBuf,
  loader: Arc<dyn TriggerLoader>,
}

impl FsTriggerRegistry {
  /// Create a new filesystem registry at the given root path.
  pub fn new(root: impl Into<PathBuf>, loader: impl TriggerLoader + 'static) -> Self {
    Self {
      root: root.into(),
      loader: Arc::new(loader),
    }
  }

  /// Get the root directory of the registry.
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn trigger_dir(&self, name: &str) -> PathBuf {
    self.root.join(name)
  }

  /// Read the raw bytes stored under `name`.
  pub async fn read_bytes(&self, name: &str) -> Result<Vec<u8>, RegistryError> {
    validate_trigger_name(name)?;
    let path = self.trigger_dir(name).join(TRIGGER_FILE);

    fs::read(&path).await.map_err(|e| {
      if e.kind() == ErrorKind::NotFound {
        RegistryError::NotFound {
          name: name.to_string(),
        }
      } else {
        RegistryError::Io(e)
      }
    })
  }
}

#[async_trait]
impl TriggerRegistry for FsTriggerRegistry {
  async fn load(&self, name: &str) -> Result<Arc<dyn Trigger>, RegistryError> {
    let bytes = self.read_bytes(name).await?;
    self.loader.load(name, &bytes)
  }

  async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), RegistryError> {
    validate_trigger_name(name)?;
    let dir = self.trigger_dir(name);
    fs::create_dir_all(&dir).await?;

    let target = dir.join(TRIGGER_FILE);
    let bytes_len = bytes.len();
    let bytes = bytes.to_vec();
    tokio::task::spawn_blocking(move || -> io::Result<()> {
      let mut staged = NamedTempFile::new_in(&dir)?;
      staged.write_all(&bytes)?;
      staged.persist(&target).map_err(|e| e.error)?;
      Ok(())
    })
    .await
    .map_err(io::Error::other)??;

    debug!(trigger = name, bytes = bytes_len, "stored trigger");
    Ok(())
  }
}
