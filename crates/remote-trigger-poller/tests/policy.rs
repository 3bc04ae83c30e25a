//! Poll-tick scenarios against a real remote trigger server.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use remote_trigger_client::ClientConfig;
use remote_trigger_poller::{
  Clock, ConnectReason, PollState, PolledTriggerContext, RemoteTriggerPolicy, TriggerDescriptor,
};
use remote_trigger_protocol::RemoteError;
use remote_trigger_registry::{DefinitionLoader, MemoryTriggerRegistry, TriggerRegistry};
use tempfile::TempDir;
use tokio::net::TcpListener;

const NOW: i64 = 1704067200000;

struct ManualClock(AtomicI64);

impl ManualClock {
  fn at(millis: i64) -> Arc<Self> {
    Arc::new(Self(AtomicI64::new(millis)))
  }

  fn advance(&self, millis: i64) {
    self.0.fetch_add(millis, Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  fn now_millis(&self) -> i64 {
    self.0.load(Ordering::SeqCst)
  }
}

struct RecordingContext {
  descriptor: TriggerDescriptor,
  properties: BTreeMap<String, String>,
  previous_call_time: Option<i64>,
  enqueued: Vec<String>,
}

impl RecordingContext {
  fn new(trigger_path: &Path) -> Self {
    Self {
      descriptor: TriggerDescriptor::new("bt-nightly", "nightly", trigger_path),
      properties: BTreeMap::new(),
      previous_call_time: None,
      enqueued: Vec::new(),
    }
  }
}

impl PolledTriggerContext for RecordingContext {
  fn descriptor(&self) -> &TriggerDescriptor {
    &self.descriptor
  }

  fn properties(&self) -> &BTreeMap<String, String> {
    &self.properties
  }

  fn build_trigger_name(&self) -> &str {
    "remote-trigger"
  }

  fn previous_call_time(&self) -> Option<i64> {
    self.previous_call_time
  }

  fn set_previous_call_time(&mut self, millis: i64) {
    self.previous_call_time = Some(millis);
  }

  fn enqueue_build(&mut self, reason: String) {
    self.enqueued.push(reason);
  }
}

/// Temp dir holding the local trigger file, if any.
struct Fixture {
  dir: TempDir,
}

impl Fixture {
  fn new() -> Self {
    Self {
      dir: tempfile::tempdir().unwrap(),
    }
  }

  fn trigger_path(&self) -> std::path::PathBuf {
    self.dir.path().join("nightly.json")
  }

  fn write_trigger(&self, body: &str) {
    std::fs::write(self.trigger_path(), body).unwrap();
  }
}

async fn spawn_server(registry: MemoryTriggerRegistry) -> ClientConfig {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let port = listener.local_addr().unwrap().port();

  tokio::spawn(remote_trigger_server::serve_listener(
    listener,
    Arc::new(registry),
    std::future::pending(),
  ));

  ClientConfig::new("127.0.0.1", port).with_timeout(Duration::from_secs(5))
}

/// A host that has never seen the trigger and accepts uploads without
/// acknowledging them.
async fn spawn_unacknowledging_host() -> ClientConfig {
  let router = Router::new()
    .route(
      "/trigger/{name}",
      post(|| async {
        let error = RemoteError::trigger_does_not_exist("nightly");
        (StatusCode::NOT_FOUND, Json(error.to_envelope()))
      }),
    )
    .route(
      "/trigger/{name}/upload",
      post(|| async { StatusCode::ACCEPTED }),
    );

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let port = listener.local_addr().unwrap().port();
  tokio::spawn(async move { axum::serve(listener, router).await });

  ClientConfig::new("127.0.0.1", port).with_timeout(Duration::from_secs(5))
}

fn recording_policy(
  config: ClientConfig,
  clock: Arc<ManualClock>,
) -> (RemoteTriggerPolicy, Arc<Mutex<Vec<ConnectReason>>>) {
  let connects = Arc::new(Mutex::new(Vec::new()));
  let hook_connects = connects.clone();
  let policy = RemoteTriggerPolicy::new(config)
    .with_clock(clock)
    .on_connect(move |reason| hook_connects.lock().unwrap().push(reason));
  (policy, connects)
}

#[tokio::test]
async fn test_missing_trigger_is_uploaded_in_same_tick() {
  let fixture = Fixture::new();
  fixture.write_trigger(r#"{"kind":"always"}"#);
  let registry = MemoryTriggerRegistry::new(DefinitionLoader);
  let config = spawn_server(registry.clone()).await;
  let (policy, _) = recording_policy(config, ManualClock::at(NOW));
  let mut ctx = RecordingContext::new(&fixture.trigger_path());

  policy.activate(&ctx).await.unwrap();
  let label = policy.poll(None, &mut ctx).await;

  assert_eq!(label, "TriggerBuild");
  assert_eq!(
    registry.bytes("nightly").unwrap(),
    br#"{"kind":"always"}"#.to_vec()
  );
  assert!(ctx.enqueued.is_empty());

  let label = policy.poll(Some(label), &mut ctx).await;

  assert_eq!(label, "TriggerBuild");
  assert_eq!(ctx.enqueued, vec![format!("remote-trigger {NOW}")]);
}

#[tokio::test]
async fn test_triggered_build_is_enqueued() {
  let fixture = Fixture::new();
  let registry = MemoryTriggerRegistry::new(DefinitionLoader);
  registry.save("nightly", br#"{"kind":"always"}"#).await.unwrap();
  let config = spawn_server(registry).await;
  let (policy, _) = recording_policy(config, ManualClock::at(NOW));
  let mut ctx = RecordingContext::new(&fixture.trigger_path());

  policy.activate(&ctx).await.unwrap();
  let label = policy.poll(None, &mut ctx).await;

  assert_eq!(label, "TriggerBuild");
  assert_eq!(ctx.enqueued, vec![format!("remote-trigger {NOW}")]);
  assert_eq!(ctx.previous_call_time, Some(NOW));
}

#[tokio::test]
async fn test_untriggered_build_enqueues_nothing() {
  let fixture = Fixture::new();
  let registry = MemoryTriggerRegistry::new(DefinitionLoader);
  registry.save("nightly", br#"{"kind":"never"}"#).await.unwrap();
  let config = spawn_server(registry).await;
  let (policy, _) = recording_policy(config, ManualClock::at(NOW));
  let mut ctx = RecordingContext::new(&fixture.trigger_path());

  let label = policy.poll(None, &mut ctx).await;

  assert_eq!(label, "TriggerBuild");
  assert!(ctx.enqueued.is_empty());
  assert_eq!(ctx.previous_call_time, None);
}

#[tokio::test]
async fn test_reactivation_creates_fresh_connection() {
  let fixture = Fixture::new();
  let config = spawn_server(MemoryTriggerRegistry::new(DefinitionLoader)).await;
  let (policy, connects) = recording_policy(config, ManualClock::at(NOW));
  let ctx = RecordingContext::new(&fixture.trigger_path());

  policy.activate(&ctx).await.unwrap();
  assert_eq!(*connects.lock().unwrap(), vec![ConnectReason::Activation]);

  policy.deactivate(&ctx).await;
  assert_eq!(connects.lock().unwrap().len(), 1);

  policy.activate(&ctx).await.unwrap();
  assert_eq!(
    *connects.lock().unwrap(),
    vec![ConnectReason::Activation, ConnectReason::Activation]
  );
}

#[tokio::test]
async fn test_live_connection_is_reused() {
  let fixture = Fixture::new();
  let registry = MemoryTriggerRegistry::new(DefinitionLoader);
  registry.save("nightly", br#"{"kind":"never"}"#).await.unwrap();
  let config = spawn_server(registry).await;
  let (policy, connects) = recording_policy(config, ManualClock::at(NOW));
  let mut ctx = RecordingContext::new(&fixture.trigger_path());

  policy.activate(&ctx).await.unwrap();
  policy.poll(None, &mut ctx).await;
  policy.poll(Some("TriggerBuild"), &mut ctx).await;

  assert_eq!(*connects.lock().unwrap(), vec![ConnectReason::Activation]);
}

#[tokio::test]
async fn test_poll_without_activation_connects_lazily() {
  let fixture = Fixture::new();
  let registry = MemoryTriggerRegistry::new(DefinitionLoader);
  registry.save("nightly", br#"{"kind":"never"}"#).await.unwrap();
  let config = spawn_server(registry).await;
  let (policy, connects) = recording_policy(config, ManualClock::at(NOW));
  let mut ctx = RecordingContext::new(&fixture.trigger_path());

  policy.poll(None, &mut ctx).await;

  assert_eq!(*connects.lock().unwrap(), vec![ConnectReason::TriggerBuild]);
}

#[tokio::test]
async fn test_failed_upload_retries_next_tick() {
  let fixture = Fixture::new();
  let registry = MemoryTriggerRegistry::new(DefinitionLoader);
  let config = spawn_server(registry.clone()).await;
  let (policy, _) = recording_policy(config, ManualClock::at(NOW));
  let mut ctx = RecordingContext::new(&fixture.trigger_path());

  let label = policy.poll(None, &mut ctx).await;

  assert_eq!(label, "UploadTrigger");
  assert_eq!(policy.state().await, PollState::UploadTrigger);
  assert!(registry.is_empty());

  fixture.write_trigger(r#"{"kind":"always"}"#);
  let label = policy.poll(Some(label), &mut ctx).await;

  assert_eq!(label, "TriggerBuild");
  assert!(registry.contains("nightly"));
  assert!(ctx.enqueued.is_empty());

  policy.poll(Some(label), &mut ctx).await;
  assert_eq!(ctx.enqueued.len(), 1);
}

#[tokio::test]
async fn test_activation_resets_to_trigger_build() {
  let fixture = Fixture::new();
  let config = spawn_server(MemoryTriggerRegistry::new(DefinitionLoader)).await;
  let (policy, _) = recording_policy(config, ManualClock::at(NOW));
  let mut ctx = RecordingContext::new(&fixture.trigger_path());

  assert_eq!(policy.poll(None, &mut ctx).await, "UploadTrigger");

  policy.activate(&ctx).await.unwrap();
  assert_eq!(policy.state().await, PollState::TriggerBuild);
}

#[tokio::test]
async fn test_unreachable_server_reconnects_on_next_tick() {
  let fixture = Fixture::new();
  let port = {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
  };
  let config = ClientConfig::new("127.0.0.1", port).with_timeout(Duration::from_secs(5));
  let (policy, connects) = recording_policy(config, ManualClock::at(NOW));
  let mut ctx = RecordingContext::new(&fixture.trigger_path());

  policy.activate(&ctx).await.unwrap();
  assert_eq!(policy.poll(None, &mut ctx).await, "TriggerBuild");
  assert_eq!(policy.poll(Some("TriggerBuild"), &mut ctx).await, "TriggerBuild");

  assert_eq!(
    *connects.lock().unwrap(),
    vec![ConnectReason::Activation, ConnectReason::TriggerBuild]
  );
  assert!(ctx.enqueued.is_empty());
}

#[tokio::test]
async fn test_interval_trigger_uses_previous_call_time() {
  let fixture = Fixture::new();
  let registry = MemoryTriggerRegistry::new(DefinitionLoader);
  registry
    .save("nightly", br#"{"kind":"interval","intervalMs":60000}"#)
    .await
    .unwrap();
  let config = spawn_server(registry).await;
  let clock = ManualClock::at(NOW);
  let (policy, _) = recording_policy(config, clock.clone());
  let mut ctx = RecordingContext::new(&fixture.trigger_path());

  policy.poll(None, &mut ctx).await;
  assert_eq!(ctx.enqueued.len(), 1);

  clock.advance(30_000);
  policy.poll(Some("TriggerBuild"), &mut ctx).await;
  assert_eq!(ctx.enqueued.len(), 1);

  clock.advance(30_000);
  policy.poll(Some("TriggerBuild"), &mut ctx).await;
  assert_eq!(ctx.enqueued.len(), 2);
  assert_eq!(ctx.previous_call_time, Some(NOW + 60_000));
}

#[tokio::test]
async fn test_properties_are_forwarded() {
  let fixture = Fixture::new();
  let registry = MemoryTriggerRegistry::new(DefinitionLoader);
  registry
    .save("nightly", br#"{"kind":"property","key":"release"}"#)
    .await
    .unwrap();
  let config = spawn_server(registry).await;
  let (policy, _) = recording_policy(config, ManualClock::at(NOW));
  let mut ctx = RecordingContext::new(&fixture.trigger_path());

  policy.poll(None, &mut ctx).await;
  assert!(ctx.enqueued.is_empty());

  ctx.properties.insert("release".to_string(), "true".to_string());
  policy.poll(Some("TriggerBuild"), &mut ctx).await;
  assert_eq!(ctx.enqueued.len(), 1);
}

#[tokio::test]
async fn test_unacknowledged_upload_stays_in_upload_state() {
  let fixture = Fixture::new();
  fixture.write_trigger(r#"{"kind":"always"}"#);
  let config = spawn_unacknowledging_host().await;
  let (policy, _) = recording_policy(config, ManualClock::at(NOW));
  let mut ctx = RecordingContext::new(&fixture.trigger_path());

  let label = policy.poll(None, &mut ctx).await;
  assert_eq!(label, "UploadTrigger");

  let label = policy.poll(Some(label), &mut ctx).await;
  assert_eq!(label, "UploadTrigger");
  assert_eq!(policy.state().await, PollState::UploadTrigger);
  assert!(ctx.enqueued.is_empty());
}
