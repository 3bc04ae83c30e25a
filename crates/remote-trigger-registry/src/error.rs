use thiserror::Error;

/// Errors that can occur when loading or storing triggers.
#[derive(Debug, Error)]
pub enum RegistryError {
  /// No trigger is stored under this name.
  #[error("trigger not found: {name}")]
  NotFound { name: String },

  /// The name cannot be used as a storage key.
  #[error("invalid trigger name: {name:?}")]
  InvalidName { name: String },

  /// IO error when reading/writing trigger files.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Stored bytes are not a valid trigger definition.
  #[error("invalid trigger definition: {0}")]
  InvalidDefinition(#[from] serde_json::Error),
}

/// Errors raised by a trigger while deciding on a build.
#[derive(Debug, Error)]
pub enum TriggerError {
  /// A property the trigger depends on has a value it cannot interpret.
  #[error("invalid value for property '{key}': {value:?}")]
  InvalidProperty { key: String, value: String },

  /// The trigger failed for its own reasons.
  #[error("{message}")]
  Failed { message: String },
}

impl TriggerError {
  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed {
      message: message.into(),
    }
  }
}
