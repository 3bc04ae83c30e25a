use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::RegistryError;
use crate::registry::{TriggerLoader, TriggerRegistry, validate_trigger_name};
use crate::trigger::Trigger;

/// In-memory trigger registry, mostly useful for tests and embedding.
#[derive(Clone)]
pub struct MemoryTriggerRegistry {
  triggers: Arc<RwLock<HashMap<String, Vec<u8>>>>,
  loader: Arc<dyn TriggerLoader>,
}

impl MemoryTriggerRegistry {
  pub fn new(loader: impl TriggerLoader + 'static) -> Self {
    Self {
      triggers: Arc::new(RwLock::new(HashMap::new())),
      loader: Arc::new(loader),
    }
  }

  /// Whether anything is stored under `name`.
  pub fn contains(&self, name: &str) -> bool {
    let triggers = self.triggers.read().unwrap_or_else(PoisonError::into_inner);
    triggers.contains_key(name)
  }

  /// Raw bytes stored under `name`.
  pub fn bytes(&self, name: &str) -> Option<Vec<u8>> {
    let triggers = self.triggers.read().unwrap_or_else(PoisonError::into_inner);
    triggers.get(name).cloned()
  }

  /// Number of stored triggers.
  pub fn len(&self) -> usize {
    let triggers = self.triggers.read().unwrap_or_else(PoisonError::into_inner);
    triggers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[async_trait]
impl TriggerRegistry for MemoryTriggerRegistry {
  async fn load(&self, name: &str) -> Result<Arc<dyn Trigger>, RegistryError> {
    validate_trigger_name(name)?;
    let bytes = self.bytes(name).ok_or_else(|| RegistryError::NotFound {
      name: name.to_string(),
    })?;
    self.loader.load(name, &bytes)
  }

  async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), RegistryError> {
    validate_trigger_name(name)?;
    let mut triggers = self.triggers.write().unwrap_or_else(PoisonError::into_inner);
    triggers.insert(name.to_string(), bytes.to_vec());
    Ok(())
  }
}
