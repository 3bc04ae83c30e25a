//! Remote Trigger Protocol
//!
//! This crate contains the wire-level types exchanged between a build poller
//! and the remote trigger server. The schema is closed: every request and
//! response is a plain struct that rejects unknown fields, so a payload either
//! decodes into one of the known shapes or is refused before it reaches any
//! trigger logic.
//!
//! Two actions exist:
//! - [`Action::TriggerBuild`] asks a named trigger whether a build should run.
//! - [`Action::UploadTrigger`] stores the trigger's bytes on the server.
//!
//! Failures travel as an [`ErrorEnvelope`] whose [`ErrorKind`] fixes the HTTP
//! status code.

mod action;
mod error;
mod message;

pub use action::{Action, TRIGGER_BUILD_ROUTE, UPLOAD_TRIGGER_ROUTE};
pub use error::{ErrorEnvelope, ErrorKind, RemoteError};
pub use message::{
  TriggerBuildRequest, TriggerBuildResponse, UploadTriggerRequest, UploadTriggerResponse,
};
