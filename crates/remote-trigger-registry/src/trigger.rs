use remote_trigger_protocol::TriggerBuildRequest;

use crate::error::TriggerError;

/// A named decision unit that determines whether a build should be enqueued.
///
/// Implementations are synchronous; the server runs them on the blocking
/// thread pool so a slow or panicking trigger cannot stall request handling.
pub trait Trigger: Send + Sync {
  /// Decide whether a build should run for this poll.
  fn trigger_build(&self, request: &TriggerBuildRequest) -> Result<bool, TriggerError>;
}

impl<F> Trigger for F
where
  F: Fn(&TriggerBuildRequest) -> Result<bool, TriggerError> + Send + Sync,
{
  fn trigger_build(&self, request: &TriggerBuildRequest) -> Result<bool, TriggerError> {
    self(request)
  }
}
