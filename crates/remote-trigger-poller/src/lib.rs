//! Remote Trigger Poller
//!
//! [`RemoteTriggerPolicy`] is the per-trigger state machine a build server's
//! poller calls once per tick. Each tick either asks the remote host whether a
//! build should run or, when the host does not know the trigger yet, uploads
//! the trigger's bytes first.
//!
//! # Structure
//!
//! - [`Deduplicator`] keeps at most one call per id in flight
//! - [`CallOutcome`] classifies a deduplicated call for the transition table
//! - [`PolledTriggerContext`] is what the host build server provides per tick
//! - [`Clock`] supplies the current time

mod context;
mod dedup;
mod descriptor;
mod outcome;
mod policy;

pub use context::{Clock, PolledTriggerContext, SystemClock};
pub use dedup::{DedupError, Deduplicator};
pub use descriptor::{
  DescriptorError, TRIGGER_NAME_PROPERTY, TRIGGER_PATH_PROPERTY, TriggerDescriptor,
};
pub use outcome::{ActionError, CallOutcome, ExpectedFailure};
pub use policy::{ConnectReason, POLL_INTERVAL, PollState, RemoteTriggerPolicy};
