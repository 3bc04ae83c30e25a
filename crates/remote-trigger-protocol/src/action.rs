use url::Url;

/// Route for [`Action::TriggerBuild`], in axum path syntax.
pub const TRIGGER_BUILD_ROUTE: &str = "/trigger/{trigger_name}";

/// Route for [`Action::UploadTrigger`], in axum path syntax.
pub const UPLOAD_TRIGGER_ROUTE: &str = "/trigger/{trigger_name}/upload";

/// The remote actions a poller can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
  /// Ask the trigger whether a build should be enqueued.
  TriggerBuild,
  /// Upload the trigger's bytes.
  UploadTrigger,
}

impl Action {
  /// Server route template for this action.
  pub fn route(self) -> &'static str {
    match self {
      Action::TriggerBuild => TRIGGER_BUILD_ROUTE,
      Action::UploadTrigger => UPLOAD_TRIGGER_ROUTE,
    }
  }

  /// Build the request URL for `trigger_name` relative to `base`.
  ///
  /// The trigger name is pushed as a single path segment, so characters such
  /// as `/` or spaces are percent-encoded rather than changing the route.
  pub fn url(self, base: &Url, trigger_name: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.pop_if_empty().push("trigger").push(trigger_name);
      if self == Action::UploadTrigger {
        segments.push("upload");
      }
    }
    url
  }
}
