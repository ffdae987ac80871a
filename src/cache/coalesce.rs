//! In-flight fetch deduplication.
//!
//! Concurrent reads of one cache key share a single upstream request. The
//! first caller becomes the leader and runs the fetch; everyone else waits
//! on the completion channel and takes the outcome the leader publishes
//! there.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::fakestore::ApiError;

/// What a shared fetch delivers: the leader's own result, handed to every
/// follower.
pub type FetchOutcome = Result<Value, ApiError>;

/// Tracks which cache keys have a fetch running right now.
///
/// Clones share state, so every handle on a cache sees the same in-flight
/// set.
#[derive(Debug, Clone)]
pub struct RequestCoalescer {
  /// Key to completion channel for every running fetch. The channel
  /// publishes the outcome exactly once, when the leader settles.
  in_flight: Arc<tokio::sync::Mutex<HashMap<String, watch::Sender<Option<FetchOutcome>>>>>,
}

impl RequestCoalescer {
  pub fn new() -> Self {
    Self {
      in_flight: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
    }
  }

  /// Claim `key` or wait for whoever already holds it.
  ///
  /// Returns `Leader` when no fetch is running: the caller must fetch and
  /// then pass its result to [`LeaderGuard::complete`]. Otherwise waits
  /// until the running fetch settles and returns `Follower` carrying the
  /// published outcome.
  pub async fn acquire(&self, key: &str) -> CoalescingSlot {
    let receiver = {
      let in_flight = self.in_flight.lock().await;
      in_flight.get(key).map(|sender| sender.subscribe())
    };

    if let Some(mut receiver) = receiver {
      debug!(key = %key, "waiting on in-flight fetch");
      // The sender may already be gone; either way the wait ends.
      let outcome = receiver
        .wait_for(|outcome| outcome.is_some())
        .await
        .ok()
        .and_then(|settled| (*settled).clone())
        .unwrap_or_else(|| Err(abandoned()));
      return CoalescingSlot::Follower(outcome);
    }

    let (sender, _receiver) = watch::channel(None);
    {
      let mut in_flight = self.in_flight.lock().await;
      // Someone else may have claimed the key while we held no lock.
      if in_flight.contains_key(key) {
        drop(in_flight);
        return Box::pin(self.acquire(key)).await;
      }
      in_flight.insert(key.to_string(), sender.clone());
    }

    CoalescingSlot::Leader(LeaderGuard {
      key: key.to_string(),
      coalescer: self.clone(),
      sender,
      completed: false,
    })
  }

  async fn release(&self, key: &str) {
    self.in_flight.lock().await.remove(key);
  }

  #[cfg(test)]
  pub(crate) async fn in_flight_count(&self) -> usize {
    self.in_flight.lock().await.len()
  }
}

impl Default for RequestCoalescer {
  fn default() -> Self {
    Self::new()
  }
}

fn abandoned() -> ApiError {
  ApiError::Transport("shared fetch was abandoned before it settled".to_string())
}

/// Outcome of [`RequestCoalescer::acquire`].
#[derive(Debug)]
pub enum CoalescingSlot {
  /// This caller runs the fetch.
  Leader(LeaderGuard),
  /// Another caller ran the fetch; this is the outcome it published.
  Follower(FetchOutcome),
}

/// Held by the leader while its fetch runs.
///
/// Dropping the guard without completing publishes an error, so a leader
/// that panics does not strand its followers.
#[derive(Debug)]
pub struct LeaderGuard {
  key: String,
  coalescer: RequestCoalescer,
  sender: watch::Sender<Option<FetchOutcome>>,
  completed: bool,
}

impl LeaderGuard {
  /// Publish the outcome to every follower and free the slot.
  pub async fn complete(mut self, outcome: FetchOutcome) {
    let _ = self.sender.send(Some(outcome));
    self.coalescer.release(&self.key).await;
    self.completed = true;
  }
}

impl Drop for LeaderGuard {
  fn drop(&mut self) {
    if self.completed {
      return;
    }
    let _ = self.sender.send(Some(Err(abandoned())));
    // Drop cannot await the map lock; finish the cleanup in a task.
    let coalescer = self.coalescer.clone();
    let key = self.key.clone();
    tokio::spawn(async move {
      coalescer.release(&key).await;
    });
  }
}
