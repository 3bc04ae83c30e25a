use std::fmt;
use std::path::PathBuf;

use remote_trigger_client::ClientError;
use thiserror::Error;

use crate::dedup::DedupError;

/// Failure of one remote action.
#[derive(Debug, Error)]
pub enum ActionError {
  #[error(transparent)]
  Client(#[from] ClientError),

  /// The trigger bytes could not be read for upload.
  #[error("failed to read trigger at {path}: {source}")]
  ReadTrigger {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The server answered the upload without acknowledging it.
  #[error("upload was not acknowledged")]
  NotAcknowledged,
}

/// Failures the state machine has a transition for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedFailure {
  /// The remote host has no trigger by that name.
  TriggerDoesNotExist,
  /// An earlier call for the same trigger is still in flight.
  NotComplete,
  /// The remote host did not acknowledge an upload.
  NotAcknowledged,
}

impl fmt::Display for ExpectedFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      ExpectedFailure::TriggerDoesNotExist => "trigger does not exist",
      ExpectedFailure::NotComplete => "previous call not complete",
      ExpectedFailure::NotAcknowledged => "upload not acknowledged",
    };
    f.write_str(text)
  }
}

/// Tagged result of a deduplicated remote call.
#[derive(Debug)]
pub enum CallOutcome<T> {
  Success(T),
  Expected(ExpectedFailure),
  Unexpected(ActionError),
}

impl<T> From<Result<T, DedupError<ActionError>>> for CallOutcome<T> {
  fn from(result: Result<T, DedupError<ActionError>>) -> Self {
    match result {
      Ok(value) => CallOutcome::Success(value),
      Err(DedupError::NotComplete { .. }) => CallOutcome::Expected(ExpectedFailure::NotComplete),
      Err(DedupError::Action(ActionError::NotAcknowledged)) => {
        CallOutcome::Expected(ExpectedFailure::NotAcknowledged)
      }
      Err(DedupError::Action(ActionError::Client(e))) if e.is_trigger_missing() => {
        CallOutcome::Expected(ExpectedFailure::TriggerDoesNotExist)
      }
      Err(DedupError::Action(e)) => CallOutcome::Unexpected(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use remote_trigger_protocol::RemoteError;

  use super::*;

  fn remote(error: RemoteError) -> Result<bool, DedupError<ActionError>> {
    Err(DedupError::Action(ActionError::Client(ClientError::Remote(error))))
  }

  #[test]
  fn test_success() {
    let outcome = CallOutcome::from(Ok::<_, DedupError<ActionError>>(true));
    assert!(matches!(outcome, CallOutcome::Success(true)));
  }

  #[test]
  fn test_missing_trigger_is_expected() {
    let outcome = CallOutcome::from(remote(RemoteError::trigger_does_not_exist("nightly")));
    assert!(matches!(
      outcome,
      CallOutcome::Expected(ExpectedFailure::TriggerDoesNotExist)
    ));
  }

  #[test]
  fn test_not_complete_is_expected() {
    let result: Result<bool, _> = Err(DedupError::NotComplete {
      id: "nightly".to_string(),
    });
    let outcome = CallOutcome::from(result);
    assert!(matches!(
      outcome,
      CallOutcome::Expected(ExpectedFailure::NotComplete)
    ));
  }

  #[test]
  fn test_not_acknowledged_is_expected() {
    let result: Result<(), _> = Err(DedupError::Action(ActionError::NotAcknowledged));
    let outcome = CallOutcome::from(result);
    assert!(matches!(
      outcome,
      CallOutcome::Expected(ExpectedFailure::NotAcknowledged)
    ));
  }

  #[test]
  fn test_other_remote_errors_are_unexpected() {
    let outcome = CallOutcome::from(remote(RemoteError::internal_trigger("boom")));
    assert!(matches!(
      outcome,
      CallOutcome::Unexpected(ActionError::Client(_))
    ));
  }
}
