//! Built-in trigger definitions.
//!
//! A definition is a small JSON document, for example:
//!
//! ```json
//! { "kind": "interval", "intervalMs": 3600000 }
//! ```

use std::sync::Arc;

use remote_trigger_protocol::TriggerBuildRequest;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, TriggerError};
use crate::registry::TriggerLoader;
use crate::trigger::Trigger;

/// A trigger described declaratively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TriggerDefinition {
  /// Start a build on every poll.
  Always,

  /// Never start a build.
  Never,

  /// Start a build once at least `interval_ms` have passed since the
  /// previous one.
  #[serde(rename_all = "camelCase")]
  Interval { interval_ms: i64 },

  /// Start a build while the poller property `key` is `"true"`.
  Property { key: String },
}

impl Trigger for TriggerDefinition {
  fn trigger_build(&self, request: &TriggerBuildRequest) -> Result<bool, TriggerError> {
    match self {
      TriggerDefinition::Always => Ok(true),
      TriggerDefinition::Never => Ok(false),
      TriggerDefinition::Interval { interval_ms } => Ok(match request.previous_call_time {
        Some(previous) => request.current_time.saturating_sub(previous) >= *interval_ms,
        None => true,
      }),
      TriggerDefinition::Property { key } => match request.properties.get(key).map(String::as_str) {
        Some("true") => Ok(true),
        Some("false") | None => Ok(false),
        Some(other) => Err(TriggerError::InvalidProperty {
          key: key.clone(),
          value: other.to_string(),
        }),
      },
    }
  }
}

/// Loads stored bytes as a JSON [`TriggerDefinition`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionLoader;

impl TriggerLoader for DefinitionLoader {
  fn load(&self, _name: &str, bytes: &[u8]) -> Result<Arc<dyn Trigger>, RegistryError> {
    let definition: TriggerDefinition = serde_json::from_slice(bytes)?;
    Ok(Arc::new(definition))
  }
}
