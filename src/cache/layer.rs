//! Cache orchestration: freshness, in-flight deduplication, tag
//! invalidation, and eviction.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::fakestore::ApiError;

use super::coalesce::{CoalescingSlot, RequestCoalescer};
use super::entry::{CacheEntry, QueryStatus};
use super::tags::Tag;
use super::traits::QueryKey;

/// In-memory query cache.
///
/// One entry per cache key, shared by every clone. Reads of a fresh entry
/// never touch the network; reads of a missing or stale entry run exactly
/// one fetch, with concurrent callers sharing its outcome. Mutations mark
/// entries stale through their tags.
///
/// The interior lock is a plain `std::sync::Mutex` and is never held
/// across an await; the coalescer owns the only async lock.
#[derive(Clone)]
pub struct QueryCache {
  inner: Arc<Mutex<CacheInner>>,
  coalescer: RequestCoalescer,
}

#[derive(Default)]
struct CacheInner {
  entries: HashMap<String, CacheEntry>,
  /// Provided tag to the keys providing it. Consulted on every successful
  /// mutation.
  tag_index: HashMap<Tag, HashSet<String>>,
  /// Live subscription count per key. A subscribed entry is never
  /// evicted, no matter how old.
  subscribers: HashMap<String, usize>,
}

impl QueryCache {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(CacheInner::default())),
      coalescer: RequestCoalescer::new(),
    }
  }

  /// Read through the cache.
  ///
  /// Serves a fresh entry directly. Otherwise the caller either becomes
  /// the leader, running `fetcher`, settling the entry, and publishing
  /// the outcome to everyone waiting, or joins a fetch already in flight
  /// and takes the outcome it publishes. Each fetch cycle moves the entry
  /// to pending and settles it exactly once, to success or to error. A
  /// failed refetch leaves previously cached data in place; the failure
  /// is handed to the caller and the next read fetches again.
  pub async fn fetch<Q, F, Fut>(&self, query: &Q, fetcher: F) -> Result<Value, ApiError>
  where
    Q: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, ApiError>>,
  {
    let key = query.cache_key();

    if let Some(value) = self.fresh_value(&key) {
      debug!(key = %key, "cache hit");
      return Ok(value);
    }

    match self.coalescer.acquire(&key).await {
      CoalescingSlot::Follower(outcome) => {
        debug!(key = %key, "joined in-flight fetch");
        outcome
      }
      CoalescingSlot::Leader(guard) => {
        // A previous leader may have settled the key while we waited for
        // the slot.
        if let Some(value) = self.fresh_value(&key) {
          debug!(key = %key, "cache hit");
          guard.complete(Ok(value.clone())).await;
          return Ok(value);
        }

        self.mark_pending(query, &key);
        debug!(key = %key, "fetching");
        let result = fetcher().await;

        {
          let mut inner = self.lock();
          match &result {
            Ok(value) => {
              if let Some(entry) = inner.entries.get_mut(&key) {
                entry.settle_success(value.clone());
              }
            }
            Err(error) => {
              debug!(key = %key, error = %error, "fetch failed");
              if let Some(entry) = inner.entries.get_mut(&key) {
                entry.settle_error(error.clone());
              }
            }
          }
        }

        guard.complete(result.clone()).await;
        self.evict_unused();
        result
      }
    }
  }

  /// Run one write operation.
  ///
  /// On success, every entry providing a tag matched by `tags` is marked
  /// stale, so its next read refetches. A failed operation invalidates
  /// nothing.
  pub async fn mutate<T, F, Fut>(&self, tags: &[Tag], op: F) -> Result<T, ApiError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    let result = op().await;
    if result.is_ok() {
      self.invalidate(tags);
      self.evict_unused();
    }
    result
  }

  /// Register interest in a key. While the returned guard lives, the
  /// entry survives eviction.
  pub fn subscribe<Q: QueryKey>(&self, query: &Q) -> Subscription {
    let key = query.cache_key();
    {
      let mut inner = self.lock();
      *inner.subscribers.entry(key.clone()).or_insert(0) += 1;
    }
    Subscription {
      inner: Arc::clone(&self.inner),
      key,
    }
  }

  /// Drop entries that nobody subscribes to once their retention window
  /// has elapsed. Pending entries are kept so an in-flight fetch always
  /// finds its entry to settle, even when the subscriber that started it
  /// is gone.
  pub fn evict_unused(&self) {
    let now = Utc::now();
    let mut inner = self.lock();
    let CacheInner {
      entries,
      tag_index,
      subscribers,
    } = &mut *inner;

    let mut evicted = Vec::new();
    entries.retain(|key, entry| {
      let subscribed = subscribers.get(key).copied().unwrap_or(0) > 0;
      let keep = subscribed || entry.status == QueryStatus::Pending || !entry.is_expired(now);
      if !keep {
        evicted.push((key.clone(), entry.tags.clone()));
      }
      keep
    });

    // An entry's own tag list names every index set that mentions it.
    for (key, tags) in evicted {
      debug!(key = %key, "evicted");
      for tag in tags {
        let emptied = match tag_index.get_mut(&tag) {
          Some(keys) => {
            keys.remove(&key);
            keys.is_empty()
          }
          None => false,
        };
        if emptied {
          tag_index.remove(&tag);
        }
      }
    }
  }

  fn invalidate(&self, tags: &[Tag]) {
    let mut inner = self.lock();
    let CacheInner {
      entries, tag_index, ..
    } = &mut *inner;

    for tag in tags {
      for (provided, keys) in tag_index.iter() {
        if !tag.invalidates(provided) {
          continue;
        }
        for key in keys {
          if let Some(entry) = entries.get_mut(key) {
            if !entry.invalidated {
              debug!(key = %key, tag = %tag, "invalidated");
              entry.invalidated = true;
            }
          }
        }
      }
    }
  }

  fn mark_pending<Q: QueryKey>(&self, query: &Q, key: &str) {
    let mut inner = self.lock();
    let tags = query.provides();
    for tag in &tags {
      inner.tag_index.entry(*tag).or_default().insert(key.to_string());
    }
    match inner.entries.get_mut(key) {
      Some(entry) => {
        entry.status = QueryStatus::Pending;
        // Cleared here rather than on settle, so a mutation landing while
        // the fetch is in flight still stales the entry.
        entry.invalidated = false;
      }
      None => {
        inner
          .entries
          .insert(key.to_string(), CacheEntry::pending(query.retention(), tags));
      }
    }
  }

  fn fresh_value(&self, key: &str) -> Option<Value> {
    let inner = self.lock();
    let entry = inner.entries.get(key)?;
    if entry.is_fresh(Utc::now()) {
      entry.data.clone()
    } else {
      None
    }
  }

  fn lock(&self) -> MutexGuard<'_, CacheInner> {
    // A poisoned lock means a fetch task panicked between map updates;
    // the map itself is still usable.
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Shift an entry's timestamps into the past.
  #[cfg(test)]
  pub(crate) fn backdate(&self, key: &str, age: chrono::Duration) {
    let mut inner = self.lock();
    if let Some(entry) = inner.entries.get_mut(key) {
      entry.fetched_at = entry.fetched_at.map(|at| at - age);
      entry.updated_at = entry.updated_at - age;
    }
  }
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}

/// RAII guard returned by [`QueryCache::subscribe`]. Dropping it releases
/// the interest it registered.
pub struct Subscription {
  inner: Arc<Mutex<CacheInner>>,
  key: String,
}

impl Drop for Subscription {
  fn drop(&mut self) {
    let mut inner = match self.inner.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(count) = inner.subscribers.get_mut(&self.key) {
      *count -= 1;
      if *count == 0 {
        inner.subscribers.remove(&self.key);
      }
    }
  }
}
