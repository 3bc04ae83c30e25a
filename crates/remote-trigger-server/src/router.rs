//! Router setup.

use std::any::Any;

use axum::Router;
use axum::response::Response;
use axum::routing::{get, post};
use remote_trigger_protocol::{RemoteError, TRIGGER_BUILD_ROUTE, UPLOAD_TRIGGER_ROUTE};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::{envelope_response, panic_message};
use crate::handlers;
use crate::state::AppState;

/// Builds the axum Router with all endpoints.
pub fn build_router(state: AppState) -> Router {
  Router::new()
    .route(TRIGGER_BUILD_ROUTE, post(handlers::trigger_build))
    .route(UPLOAD_TRIGGER_ROUTE, post(handlers::upload_trigger))
    .route("/trigger", post(handlers::missing_trigger_name))
    .route("/trigger/", post(handlers::missing_trigger_name))
    .route("/health", get(handlers::health))
    .layer(CatchPanicLayer::custom(handle_panic))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// A panic escaping a handler still produces an envelope.
fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
  let message = panic_message(payload.as_ref());
  error!(panic = %message, "handler panicked");
  envelope_response(RemoteError::unknown_internal(message).to_envelope())
}
