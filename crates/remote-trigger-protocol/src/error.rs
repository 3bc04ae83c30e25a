//! Error taxonomy shared across the client/server boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed set of errors the server can report.
///
/// Each kind maps to exactly one HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
  /// Request body does not match the expected shape.
  ContentTypeMismatch,
  /// Required path parameter is absent.
  MissingTriggerName,
  /// Named trigger is not in the registry.
  TriggerDoesNotExist,
  /// Registry lookup failed unexpectedly.
  TriggerLoadingError,
  /// Trigger implementation failed while running.
  InternalTriggerError,
  /// Any other uncaught failure.
  UnknownInternalError,
}

impl ErrorKind {
  pub const ALL: [ErrorKind; 6] = [
    ErrorKind::ContentTypeMismatch,
    ErrorKind::MissingTriggerName,
    ErrorKind::TriggerDoesNotExist,
    ErrorKind::TriggerLoadingError,
    ErrorKind::InternalTriggerError,
    ErrorKind::UnknownInternalError,
  ];

  /// HTTP status code for this kind.
  pub fn status_code(self) -> u16 {
    match self {
      ErrorKind::ContentTypeMismatch | ErrorKind::MissingTriggerName => 400,
      ErrorKind::TriggerDoesNotExist => 404,
      ErrorKind::TriggerLoadingError
      | ErrorKind::InternalTriggerError
      | ErrorKind::UnknownInternalError => 500,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      ErrorKind::ContentTypeMismatch => "ContentTypeMismatch",
      ErrorKind::MissingTriggerName => "MissingTriggerName",
      ErrorKind::TriggerDoesNotExist => "TriggerDoesNotExist",
      ErrorKind::TriggerLoadingError => "TriggerLoadingError",
      ErrorKind::InternalTriggerError => "InternalTriggerError",
      ErrorKind::UnknownInternalError => "UnknownInternalError",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Error payload sent with every non-success response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorEnvelope {
  pub kind: ErrorKind,
  pub message: String,
}

impl ErrorEnvelope {
  /// HTTP status code the envelope travels with.
  pub fn status_code(&self) -> u16 {
    self.kind.status_code()
  }
}

/// A typed error reported by the remote server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
  pub kind: ErrorKind,
  pub message: String,
}

impl RemoteError {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
    }
  }

  pub fn content_type_mismatch(detail: impl fmt::Display) -> Self {
    Self::new(
      ErrorKind::ContentTypeMismatch,
      format!("request body does not match the expected type: {detail}"),
    )
  }

  pub fn missing_trigger_name() -> Self {
    Self::new(
      ErrorKind::MissingTriggerName,
      "trigger name was not specified in the request path",
    )
  }

  pub fn trigger_does_not_exist(trigger_name: &str) -> Self {
    Self::new(
      ErrorKind::TriggerDoesNotExist,
      format!("trigger '{trigger_name}' does not exist"),
    )
  }

  pub fn trigger_loading(detail: impl fmt::Display) -> Self {
    Self::new(
      ErrorKind::TriggerLoadingError,
      format!("failed to load trigger: {detail}"),
    )
  }

  pub fn internal_trigger(detail: impl fmt::Display) -> Self {
    Self::new(
      ErrorKind::InternalTriggerError,
      format!("trigger failed while deciding on a build: {detail}"),
    )
  }

  pub fn unknown_internal(detail: impl fmt::Display) -> Self {
    Self::new(
      ErrorKind::UnknownInternalError,
      format!("unknown internal server error: {detail}"),
    )
  }

  pub fn status_code(&self) -> u16 {
    self.kind.status_code()
  }

  pub fn to_envelope(&self) -> ErrorEnvelope {
    ErrorEnvelope {
      kind: self.kind,
      message: self.message.clone(),
    }
  }
}

impl From<ErrorEnvelope> for RemoteError {
  fn from(envelope: ErrorEnvelope) -> Self {
    Self {
      kind: envelope.kind,
      message: envelope.message,
    }
  }
}
