use remote_trigger_protocol::{ErrorKind, RemoteError};
use thiserror::Error;

/// Errors returned by [`TriggerClient`](crate::TriggerClient).
#[derive(Debug, Error)]
pub enum ClientError {
  /// The server answered with an error envelope.
  #[error("server responded with an error: {0}")]
  Remote(#[from] RemoteError),

  /// The request never produced a usable response.
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  /// The handle was closed.
  #[error("connection is closed")]
  Closed,

  /// Host/port do not form a valid URL.
  #[error("invalid server address {address}: {source}")]
  InvalidAddress {
    address: String,
    #[source]
    source: url::ParseError,
  },
}

impl ClientError {
  /// Taxonomy kind, when the server reported one.
  pub fn kind(&self) -> Option<ErrorKind> {
    match self {
      ClientError::Remote(e) => Some(e.kind),
      _ => None,
    }
  }

  /// Whether the server said the trigger has not been uploaded.
  pub fn is_trigger_missing(&self) -> bool {
    self.kind() == Some(ErrorKind::TriggerDoesNotExist)
  }
}
