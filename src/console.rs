//! Host context for running a poller from the command line.

use std::collections::BTreeMap;

use remote_trigger_poller::{PolledTriggerContext, TriggerDescriptor};
use tracing::info;

/// Keeps poller bookkeeping in memory and collects enqueued builds.
pub struct ConsoleContext {
  descriptor: TriggerDescriptor,
  properties: BTreeMap<String, String>,
  previous_call_time: Option<i64>,
  enqueued: Vec<String>,
}

impl ConsoleContext {
  pub fn new(descriptor: TriggerDescriptor, properties: BTreeMap<String, String>) -> Self {
    Self {
      descriptor,
      properties,
      previous_call_time: None,
      enqueued: Vec::new(),
    }
  }

  /// Drain the builds enqueued since the last call.
  pub fn take_enqueued(&mut self) -> Vec<String> {
    std::mem::take(&mut self.enqueued)
  }
}

impl PolledTriggerContext for ConsoleContext {
  fn descriptor(&self) -> &TriggerDescriptor {
    &self.descriptor
  }

  fn properties(&self) -> &BTreeMap<String, String> {
    &self.properties
  }

  fn build_trigger_name(&self) -> &str {
    env!("CARGO_PKG_NAME")
  }

  fn previous_call_time(&self) -> Option<i64> {
    self.previous_call_time
  }

  fn set_previous_call_time(&mut self, millis: i64) {
    self.previous_call_time = Some(millis);
  }

  fn enqueue_build(&mut self, reason: String) {
    info!(trigger = %self.descriptor.trigger_name, %reason, "build enqueued");
    self.enqueued.push(reason);
  }
}
