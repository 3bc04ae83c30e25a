use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

/// Property holding the name the remote host knows the trigger by.
pub const TRIGGER_NAME_PROPERTY: &str = "triggerName";

/// Property holding the local path of the trigger's uploadable bytes.
pub const TRIGGER_PATH_PROPERTY: &str = "triggerPath";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
  #[error("missing or blank trigger property '{0}'")]
  MissingProperty(&'static str),
}

/// One configured remote trigger instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDescriptor {
  /// Stable per poller instance; keys deduplicated calls.
  pub id: String,
  pub trigger_name: String,
  pub trigger_path: PathBuf,
}

impl TriggerDescriptor {
  pub fn new(
    id: impl Into<String>,
    trigger_name: impl Into<String>,
    trigger_path: impl Into<PathBuf>,
  ) -> Self {
    Self {
      id: id.into(),
      trigger_name: trigger_name.into(),
      trigger_path: trigger_path.into(),
    }
  }

  /// Build a descriptor from the host's trigger properties.
  pub fn from_properties(
    id: impl Into<String>,
    properties: &BTreeMap<String, String>,
  ) -> Result<Self, DescriptorError> {
    let trigger_name = required(properties, TRIGGER_NAME_PROPERTY)?;
    let trigger_path = required(properties, TRIGGER_PATH_PROPERTY)?;
    Ok(Self::new(id, trigger_name, trigger_path))
  }
}

fn required<'a>(
  properties: &'a BTreeMap<String, String>,
  key: &'static str,
) -> Result<&'a str, DescriptorError> {
  match properties.get(key).map(|value| value.trim()) {
    Some(value) if !value.is_empty() => Ok(value),
    _ => Err(DescriptorError::MissingProperty(key)),
  }
}
