//! Handler errors and their conversion to error envelopes.

use std::any::Any;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use remote_trigger_protocol::{ErrorEnvelope, ErrorKind, RemoteError};
use remote_trigger_registry::RegistryError;
use tracing::{error, warn};

/// Errors raised while handling a request.
///
/// Each variant corresponds to one [`ErrorKind`] and is sent to the client as
/// an [`ErrorEnvelope`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// The body could not be decoded into the route's request type.
  #[error("request body does not match the expected type: {0}")]
  ContentTypeMismatch(String),

  /// The trigger name path parameter is absent or blank.
  #[error("trigger name was not specified in the request path")]
  MissingTriggerName,

  /// Nothing was uploaded under this name.
  #[error("trigger '{0}' does not exist")]
  TriggerDoesNotExist(String),

  /// The registry failed to produce the trigger.
  #[error("failed to load trigger '{name}': {source}")]
  TriggerLoading {
    name: String,
    #[source]
    source: RegistryError,
  },

  /// The trigger returned an error or panicked.
  #[error("trigger '{name}' failed: {message}")]
  InternalTrigger { name: String, message: String },

  /// Anything else.
  #[error("unknown internal server error: {message}")]
  UnknownInternal { message: String },
}

impl ApiError {
  pub fn unknown_internal(message: impl Into<String>) -> Self {
    Self::UnknownInternal {
      message: message.into(),
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      ApiError::ContentTypeMismatch(_) => ErrorKind::ContentTypeMismatch,
      ApiError::MissingTriggerName => ErrorKind::MissingTriggerName,
      ApiError::TriggerDoesNotExist(_) => ErrorKind::TriggerDoesNotExist,
      ApiError::TriggerLoading { .. } => ErrorKind::TriggerLoadingError,
      ApiError::InternalTrigger { .. } => ErrorKind::InternalTriggerError,
      ApiError::UnknownInternal { .. } => ErrorKind::UnknownInternalError,
    }
  }

  /// Wire representation of this error.
  pub fn to_envelope(&self) -> ErrorEnvelope {
    RemoteError::new(self.kind(), self.to_string()).to_envelope()
  }

  /// Map a registry failure during trigger lookup.
  pub(crate) fn from_load(name: &str, source: RegistryError) -> Self {
    match source {
      RegistryError::NotFound { .. } | RegistryError::InvalidName { .. } => {
        ApiError::TriggerDoesNotExist(name.to_string())
      }
      source => ApiError::TriggerLoading {
        name: name.to_string(),
        source,
      },
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::ContentTypeMismatch(rejection.body_text())
  }
}

impl From<PathRejection> for ApiError {
  fn from(_: PathRejection) -> Self {
    ApiError::MissingTriggerName
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    if kind == ErrorKind::UnknownInternalError {
      error!(kind = %kind, error = ?self, "unknown internal server error");
    } else {
      warn!(kind = %kind, error = %self, "request failed");
    }

    envelope_response(self.to_envelope())
  }
}

pub(crate) fn envelope_response(envelope: ErrorEnvelope) -> Response {
  let status =
    StatusCode::from_u16(envelope.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
  (status, Json(envelope)).into_response()
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "panic with a non-string payload".to_string()
  }
}

/// Errors that stop the server itself.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
  /// Failed to bind the listening socket.
  #[error("failed to bind {address}: {source}")]
  Bind {
    address: String,
    #[source]
    source: std::io::Error,
  },

  /// The server loop failed.
  #[error("server io error: {0}")]
  Io(#[from] std::io::Error),
}
