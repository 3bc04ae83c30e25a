//! Poll-tick state machine for one remote trigger.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use remote_trigger_client::{ClientConfig, ClientError, TriggerClient};
use remote_trigger_protocol::{TriggerBuildRequest, UploadTriggerRequest};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::context::{Clock, PolledTriggerContext, SystemClock};
use crate::dedup::Deduplicator;
use crate::descriptor::TriggerDescriptor;
use crate::outcome::{ActionError, CallOutcome, ExpectedFailure};

/// Fixed delay between poll ticks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Which action the next tick performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollState {
  #[default]
  TriggerBuild,
  UploadTrigger,
}

impl PollState {
  /// Label reported to the host as the tick's result.
  pub fn label(self) -> &'static str {
    match self {
      PollState::TriggerBuild => "TriggerBuild",
      PollState::UploadTrigger => "UploadTrigger",
    }
  }
}

impl fmt::Display for PollState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Why a new connection handle was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectReason {
  Activation,
  TriggerBuild,
  UploadTrigger,
}

type ConnectHook = Box<dyn Fn(ConnectReason) + Send + Sync>;

struct PolicyInner {
  state: PollState,
  connection: Option<TriggerClient>,
}

/// Drives one remote trigger through its build and upload cycle.
///
/// `activate`, `deactivate` and `poll` each hold the instance lock for their
/// whole duration, so ticks for one instance never interleave.
pub struct RemoteTriggerPolicy {
  config: ClientConfig,
  clock: Arc<dyn Clock>,
  on_connect: ConnectHook,
  trigger_builds: Deduplicator<bool>,
  uploads: Deduplicator<()>,
  inner: Mutex<PolicyInner>,
}

impl RemoteTriggerPolicy {
  pub fn new(config: ClientConfig) -> Self {
    Self {
      config,
      clock: Arc::new(SystemClock),
      on_connect: Box::new(|_| {}),
      trigger_builds: Deduplicator::new(),
      uploads: Deduplicator::new(),
      inner: Mutex::new(PolicyInner {
        state: PollState::default(),
        connection: None,
      }),
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Register a hook called whenever a connection handle is created.
  pub fn on_connect(mut self, hook: impl Fn(ConnectReason) + Send + Sync + 'static) -> Self {
    self.on_connect = Box::new(hook);
    self
  }

  pub fn poll_interval(&self) -> Duration {
    POLL_INTERVAL
  }

  pub async fn state(&self) -> PollState {
    self.inner.lock().await.state
  }

  /// Connect to the remote host and start over from [`PollState::TriggerBuild`].
  #[instrument(
    name = "remote_trigger_activate",
    skip_all,
    fields(trigger_id = %ctx.descriptor().id)
  )]
  pub async fn activate(&self, ctx: &dyn PolledTriggerContext) -> Result<(), ClientError> {
    let mut inner = self.inner.lock().await;
    let inner = &mut *inner;

    inner.state = PollState::TriggerBuild;
    let client = self.ensure_connected(&mut inner.connection, ConnectReason::Activation)?;

    info!(base_url = %client.base_url(), "remote trigger activated");
    Ok(())
  }

  /// Close the connection handle unless it is already outdated.
  #[instrument(
    name = "remote_trigger_deactivate",
    skip_all,
    fields(trigger_id = %ctx.descriptor().id)
  )]
  pub async fn deactivate(&self, ctx: &dyn PolledTriggerContext) {
    let mut inner = self.inner.lock().await;

    if let Some(client) = inner.connection.as_mut()
      && !client.is_outdated()
    {
      client.close();
    }
    info!("remote trigger deactivated");
  }

  /// Run one tick and return the resulting state's label.
  #[instrument(
    name = "remote_trigger_poll",
    skip_all,
    fields(trigger_id = %ctx.descriptor().id)
  )]
  pub async fn poll(
    &self,
    previous: Option<&str>,
    ctx: &mut dyn PolledTriggerContext,
  ) -> &'static str {
    let mut inner = self.inner.lock().await;
    let inner = &mut *inner;
    let descriptor = ctx.descriptor().clone();

    debug!(?previous, state = %inner.state, "poll tick");

    if inner.state == PollState::TriggerBuild {
      inner.state = self
        .trigger_build(&mut inner.connection, &descriptor, ctx)
        .await;
    }

    // A missing trigger is uploaded in the same tick.
    if inner.state == PollState::UploadTrigger {
      inner.state = self.upload_trigger(&mut inner.connection, &descriptor).await;
    }

    inner.state.label()
  }

  async fn trigger_build(
    &self,
    connection: &mut Option<TriggerClient>,
    descriptor: &TriggerDescriptor,
    ctx: &mut dyn PolledTriggerContext,
  ) -> PollState {
    let now = self.clock.now_millis();
    let request = TriggerBuildRequest {
      current_time: now,
      previous_call_time: ctx.previous_call_time(),
      properties: ctx.properties().clone(),
    };

    let trigger_name = descriptor.trigger_name.as_str();
    let request = &request;
    let result = self
      .trigger_builds
      .try_complete(&descriptor.id, move || {
        self.send_trigger_build(connection, trigger_name, request)
      })
      .await;

    match CallOutcome::from(result) {
      CallOutcome::Success(true) => {
        let reason = format!("{} {}", ctx.build_trigger_name(), now);
        info!(trigger = %descriptor.trigger_name, %reason, "enqueueing build");
        ctx.enqueue_build(reason);
        ctx.set_previous_call_time(now);
        PollState::TriggerBuild
      }
      CallOutcome::Success(false) => {
        debug!(trigger = %descriptor.trigger_name, "no build requested");
        PollState::TriggerBuild
      }
      CallOutcome::Expected(ExpectedFailure::TriggerDoesNotExist) => {
        warn!(
          trigger = %descriptor.trigger_name,
          "trigger does not exist on the remote host, uploading"
        );
        PollState::UploadTrigger
      }
      CallOutcome::Expected(
        failure @ (ExpectedFailure::NotComplete | ExpectedFailure::NotAcknowledged),
      ) => {
        debug!(trigger = %descriptor.trigger_name, %failure, "trigger build will retry");
        PollState::TriggerBuild
      }
      CallOutcome::Unexpected(e) => {
        error!(trigger = %descriptor.trigger_name, error = %e, "trigger build failed");
        PollState::TriggerBuild
      }
    }
  }

  async fn upload_trigger(
    &self,
    connection: &mut Option<TriggerClient>,
    descriptor: &TriggerDescriptor,
  ) -> PollState {
    let result = self
      .uploads
      .try_complete(&descriptor.id, move || self.send_upload(connection, descriptor))
      .await;

    match CallOutcome::from(result) {
      CallOutcome::Success(()) => {
        info!(trigger = %descriptor.trigger_name, "trigger uploaded");
        PollState::TriggerBuild
      }
      CallOutcome::Expected(failure) => {
        warn!(trigger = %descriptor.trigger_name, %failure, "trigger upload will retry");
        PollState::UploadTrigger
      }
      CallOutcome::Unexpected(e) => {
        error!(trigger = %descriptor.trigger_name, error = %e, "trigger upload failed");
        PollState::UploadTrigger
      }
    }
  }

  async fn send_trigger_build(
    &self,
    connection: &mut Option<TriggerClient>,
    trigger_name: &str,
    request: &TriggerBuildRequest,
  ) -> Result<bool, ActionError> {
    let client = self.ensure_connected(connection, ConnectReason::TriggerBuild)?;
    Ok(client.send_trigger_build(trigger_name, request).await?)
  }

  async fn send_upload(
    &self,
    connection: &mut Option<TriggerClient>,
    descriptor: &TriggerDescriptor,
  ) -> Result<(), ActionError> {
    let trigger_body = tokio::fs::read(&descriptor.trigger_path)
      .await
      .map_err(|source| ActionError::ReadTrigger {
        path: descriptor.trigger_path.clone(),
        source,
      })?;

    let client = self.ensure_connected(connection, ConnectReason::UploadTrigger)?;
    let request = UploadTriggerRequest { trigger_body };
    if client.upload_trigger(&descriptor.trigger_name, &request).await? {
      Ok(())
    } else {
      Err(ActionError::NotAcknowledged)
    }
  }

  /// Reuse the current handle, or create one when it is missing or outdated.
  fn ensure_connected<'a>(
    &self,
    connection: &'a mut Option<TriggerClient>,
    reason: ConnectReason,
  ) -> Result<&'a mut TriggerClient, ClientError> {
    match connection.take() {
      Some(client) if !client.is_outdated() => Ok(connection.insert(client)),
      _ => {
        let client = TriggerClient::connect(&self.config)?;
        debug!(?reason, base_url = %client.base_url(), "created connection handle");
        (self.on_connect)(reason);
        Ok(connection.insert(client))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_labels() {
    assert_eq!(PollState::TriggerBuild.label(), "TriggerBuild");
    assert_eq!(PollState::UploadTrigger.label(), "UploadTrigger");
    assert_eq!(PollState::default(), PollState::TriggerBuild);
  }

  #[tokio::test]
  async fn test_new_policy_state() {
    let policy = RemoteTriggerPolicy::new(ClientConfig::default());
    assert_eq!(policy.state().await, PollState::TriggerBuild);
    assert_eq!(policy.poll_interval(), Duration::from_secs(30));
  }
}
