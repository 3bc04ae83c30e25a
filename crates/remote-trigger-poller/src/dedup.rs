//! At-most-once coordination for keyed actions.
//!
//! A poll tick that timed out locally may still be running remotely. Before a
//! retry issues the same call again, it asks the [`Deduplicator`] whether an
//! earlier attempt for the same id is still in flight.

use std::collections::HashSet;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

/// Error returned by [`Deduplicator::try_complete`].
#[derive(Debug, Error)]
pub enum DedupError<E> {
  /// An earlier call for the same id has not settled yet.
  #[error("call '{id}' is still in flight")]
  NotComplete { id: String },

  /// The action ran and failed.
  #[error(transparent)]
  Action(E),
}

/// Tracks in-flight calls producing `T`, keyed by id.
///
/// The action runs on the caller's task. Its record is cleared once it settles
/// or once the calling future is dropped, so the next call for the same id
/// runs the action again.
pub struct Deduplicator<T> {
  in_flight: Mutex<HashSet<String>>,
  _result: PhantomData<fn() -> T>,
}

impl<T> Deduplicator<T> {
  pub fn new() -> Self {
    Self {
      in_flight: Mutex::new(HashSet::new()),
      _result: PhantomData,
    }
  }

  /// Whether a call for `id` is currently running.
  pub fn is_in_flight(&self, id: &str) -> bool {
    self
      .in_flight
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .contains(id)
  }

  /// Run `action` unless a call for `id` is already in flight.
  pub async fn try_complete<F, Fut, E>(&self, id: &str, action: F) -> Result<T, DedupError<E>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let Some(_record) = self.claim(id) else {
      debug!(id, "call already in flight");
      return Err(DedupError::NotComplete { id: id.to_string() });
    };

    action().await.map_err(DedupError::Action)
  }

  fn claim(&self, id: &str) -> Option<InFlight<'_>> {
    let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
    if !in_flight.insert(id.to_string()) {
      return None;
    }

    Some(InFlight {
      records: &self.in_flight,
      id: id.to_string(),
    })
  }
}

impl<T> Default for Deduplicator<T> {
  fn default() -> Self {
    Self::new()
  }
}

/// Clears its record when dropped.
struct InFlight<'a> {
  records: &'a Mutex<HashSet<String>>,
  id: String,
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    self
      .records
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&self.id);
  }
}
