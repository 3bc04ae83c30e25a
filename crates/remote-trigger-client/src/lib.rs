//! Remote Trigger Client
//!
//! [`TriggerClient`] is a connection handle to one remote trigger server. It
//! sends the two protocol actions and maps every failure to a [`ClientError`]:
//! a typed [`RemoteError`](remote_trigger_protocol::RemoteError) when the
//! server answered with an error envelope, a transport error otherwise.
//!
//! A handle becomes *outdated* once it is closed or once a connect/timeout
//! failure shows the connection is unusable. Owners are expected to replace
//! outdated handles rather than reuse them.

mod client;
mod config;
mod error;

pub use client::TriggerClient;
pub use config::ClientConfig;
pub use error::ClientError;
