//! Remote Trigger Server
//!
//! Hosts uploaded triggers behind HTTP.
//!
//! # Endpoints
//!
//! - `POST /trigger/{triggerName}` - Runs the named trigger and answers
//!   whether a build should start
//! - `POST /trigger/{triggerName}/upload` - Stores the trigger's bytes
//! - `GET /health` - Returns 200 if the server is running
//!
//! Every failure inside a handler is converted into an
//! [`ErrorEnvelope`](remote_trigger_protocol::ErrorEnvelope) with the status
//! code of its [`ErrorKind`](remote_trigger_protocol::ErrorKind).

mod config;
mod error;
mod handlers;
mod router;
mod serve;
mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError};
pub use router::build_router;
pub use serve::{serve, serve_listener};
pub use state::AppState;
