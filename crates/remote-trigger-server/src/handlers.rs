//! Route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use remote_trigger_protocol::{
  TriggerBuildRequest, TriggerBuildResponse, UploadTriggerRequest, UploadTriggerResponse,
};
use remote_trigger_registry::Trigger;
use tracing::info;

use crate::error::{ApiError, panic_message};
use crate::state::AppState;

/// `POST /trigger/{triggerName}`
pub async fn trigger_build(
  State(state): State<AppState>,
  path: Result<Path<String>, PathRejection>,
  body: Result<Json<TriggerBuildRequest>, JsonRejection>,
) -> Result<Json<TriggerBuildResponse>, ApiError> {
  let Json(request) = body?;
  let trigger_name = trigger_name(path)?;

  let trigger = state
    .registry()
    .load(&trigger_name)
    .await
    .map_err(|e| ApiError::from_load(&trigger_name, e))?;

  let triggered = run_trigger(&trigger_name, trigger, request).await?;

  info!(trigger = %trigger_name, triggered, "sending trigger build response");
  Ok(Json(TriggerBuildResponse { triggered }))
}

/// `POST /trigger/{triggerName}/upload`
pub async fn upload_trigger(
  State(state): State<AppState>,
  path: Result<Path<String>, PathRejection>,
  body: Result<Json<UploadTriggerRequest>, JsonRejection>,
) -> Result<Json<UploadTriggerResponse>, ApiError> {
  let Json(request) = body?;
  let trigger_name = trigger_name(path)?;

  state
    .registry()
    .save(&trigger_name, &request.trigger_body)
    .await
    .map_err(|e| ApiError::unknown_internal(format!("failed to store trigger '{trigger_name}': {e}")))?;

  info!(
    trigger = %trigger_name,
    bytes = request.trigger_body.len(),
    "trigger uploaded"
  );
  Ok(Json(UploadTriggerResponse {}))
}

/// `POST /trigger` and `POST /trigger/` carry no trigger name at all.
pub async fn missing_trigger_name() -> ApiError {
  ApiError::MissingTriggerName
}

/// `GET /health`
pub async fn health() -> (StatusCode, &'static str) {
  (StatusCode::OK, "OK")
}

fn trigger_name(path: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
  let Path(name) = path?;
  if name.trim().is_empty() {
    return Err(ApiError::MissingTriggerName);
  }
  Ok(name)
}

/// Run the trigger on the blocking pool; errors and panics both become
/// [`ApiError::InternalTrigger`].
async fn run_trigger(
  name: &str,
  trigger: Arc<dyn Trigger>,
  request: TriggerBuildRequest,
) -> Result<bool, ApiError> {
  let outcome = tokio::task::spawn_blocking(move || trigger.trigger_build(&request)).await;

  let message = match outcome {
    Ok(Ok(triggered)) => return Ok(triggered),
    Ok(Err(e)) => e.to_string(),
    Err(join_error) if join_error.is_panic() => {
      let payload = join_error.into_panic();
      format!("trigger panicked: {}", panic_message(payload.as_ref()))
    }
    Err(join_error) => join_error.to_string(),
  };

  Err(ApiError::InternalTrigger {
    name: name.to_string(),
    message,
  })
}
