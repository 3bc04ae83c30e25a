use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RegistryError;
use crate::trigger::Trigger;

/// Registry of uploaded triggers.
#[async_trait]
pub trait TriggerRegistry: Send + Sync {
  /// Load the trigger stored under `name`.
  ///
  /// Returns [`RegistryError::NotFound`] when nothing was uploaded under that
  /// name.
  async fn load(&self, name: &str) -> Result<Arc<dyn Trigger>, RegistryError>;

  /// Store `bytes` under `name`, replacing any previous upload.
  async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), RegistryError>;
}

/// Turns stored trigger bytes into a runnable [`Trigger`].
pub trait TriggerLoader: Send + Sync {
  fn load(&self, name: &str, bytes: &[u8]) -> Result<Arc<dyn Trigger>, RegistryError>;
}

/// Check that `name` can be used as a storage key.
///
/// Names must be non-empty and must not contain path separators or be a
/// relative path component.
pub fn validate_trigger_name(name: &str) -> Result<(), RegistryError> {
  let invalid = name.trim().is_empty()
    || name == "."
    || name == ".."
    || name.contains(['/', '\\', '\0']);

  if invalid {
    return Err(RegistryError::InvalidName {
      name: name.to_string(),
    });
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_valid_names() {
    for name in ["nightly", "my-org.nightly_2", "Nightly Build"] {
      assert!(validate_trigger_name(name).is_ok(), "{name} should be valid");
    }
  }

  #[test]
  fn test_invalid_names() {
    for name in ["", "  ", ".", "..", "a/b", "a\\b", "../etc"] {
      assert!(
        matches!(
          validate_trigger_name(name),
          Err(RegistryError::InvalidName { .. })
        ),
        "{name:?} should be invalid"
      );
    }
  }
}
