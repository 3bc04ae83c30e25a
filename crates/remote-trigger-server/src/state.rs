use std::sync::Arc;

use remote_trigger_registry::TriggerRegistry;

/// Shared application state.
///
/// Passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
  registry: Arc<dyn TriggerRegistry>,
}

impl AppState {
  pub fn new(registry: Arc<dyn TriggerRegistry>) -> Self {
    Self { registry }
  }

  /// Registry used to resolve and store triggers.
  pub fn registry(&self) -> &dyn TriggerRegistry {
    self.registry.as_ref()
  }
}
