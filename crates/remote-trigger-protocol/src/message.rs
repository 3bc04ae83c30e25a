use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body of `POST /trigger/{triggerName}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TriggerBuildRequest {
  /// Poller's current time (Unix millis).
  pub current_time: i64,

  /// When the trigger last started a build (Unix millis), if ever.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub previous_call_time: Option<i64>,

  /// Trigger properties configured on the build poller.
  #[serde(default)]
  pub properties: BTreeMap<String, String>,
}

/// Success body of `POST /trigger/{triggerName}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerBuildResponse {
  pub triggered: bool,
}

/// Body of `POST /trigger/{triggerName}/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UploadTriggerRequest {
  /// Raw trigger bytes, base64 encoded on the wire.
  #[serde(with = "base64_bytes")]
  pub trigger_body: Vec<u8>,
}

/// Success body of `POST /trigger/{triggerName}/upload`.
///
/// Carries no data; it serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadTriggerResponse {}

mod base64_bytes {
  use base64::Engine;
  use base64::engine::general_purpose::STANDARD;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD
      .decode(encoded.as_bytes())
      .map_err(serde::de::Error::custom)
  }
}
