use std::collections::BTreeMap;

use crate::descriptor::TriggerDescriptor;

/// Host build-server services available to one poll tick.
pub trait PolledTriggerContext: Send + Sync {
  /// The trigger instance being polled.
  fn descriptor(&self) -> &TriggerDescriptor;

  /// Trigger properties configured on the host, forwarded to the remote trigger.
  fn properties(&self) -> &BTreeMap<String, String>;

  /// Name of the build-trigger service, used in enqueue reasons.
  fn build_trigger_name(&self) -> &str;

  /// Epoch millis of the last call that enqueued a build.
  fn previous_call_time(&self) -> Option<i64>;

  fn set_previous_call_time(&mut self, millis: i64);

  /// Put a build on the host's queue.
  fn enqueue_build(&mut self, reason: String);
}

/// Source of the current time in epoch millis.
pub trait Clock: Send + Sync {
  fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_millis(&self) -> i64 {
    chrono::Utc::now().timestamp_millis()
  }
}
