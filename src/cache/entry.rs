//! Per-key cache entry state.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::fakestore::ApiError;

use super::tags::Tag;

/// Where an entry is in its fetch cycle. Each cycle moves from `Pending`
/// to exactly one of `Success` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  Pending,
  Success,
  Error,
}

/// Cached result, plus bookkeeping, for one endpoint and parameter
/// combination.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub status: QueryStatus,
  /// Last successful payload. A failed refetch leaves it in place.
  pub data: Option<Value>,
  pub error: Option<ApiError>,
  /// Stamped on success only; drives the freshness check.
  pub fetched_at: Option<DateTime<Utc>>,
  /// Set when a mutation matched one of this entry's tags. Forces the
  /// next read to refetch regardless of age.
  pub invalidated: bool,
  pub retention: Duration,
  pub tags: Vec<Tag>,
  /// When the entry last settled (or was created); drives eviction.
  pub(crate) updated_at: DateTime<Utc>,
}

impl CacheEntry {
  pub fn pending(retention: Duration, tags: Vec<Tag>) -> Self {
    Self {
      status: QueryStatus::Pending,
      data: None,
      error: None,
      fetched_at: None,
      invalidated: false,
      retention,
      tags,
      updated_at: Utc::now(),
    }
  }

  /// A fresh entry is served without touching the network.
  pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
    if self.status != QueryStatus::Success || self.invalidated {
      return false;
    }
    match self.fetched_at {
      Some(fetched_at) => now - fetched_at <= self.retention,
      None => false,
    }
  }

  /// Whether the retention window has elapsed since the entry last
  /// settled.
  pub(crate) fn is_expired(&self, now: DateTime<Utc>) -> bool {
    now - self.updated_at > self.retention
  }

  pub(crate) fn settle_success(&mut self, value: Value) {
    let now = Utc::now();
    self.status = QueryStatus::Success;
    self.data = Some(value);
    self.error = None;
    self.fetched_at = Some(now);
    self.updated_at = now;
  }

  pub(crate) fn settle_error(&mut self, error: ApiError) {
    self.status = QueryStatus::Error;
    self.error = Some(error);
    self.updated_at = Utc::now();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::tags::TagType;
  use serde_json::json;

  fn entry() -> CacheEntry {
    CacheEntry::pending(Duration::seconds(300), vec![Tag::of(TagType::Product)])
  }

  #[test]
  fn test_pending_is_not_fresh() {
    assert!(!entry().is_fresh(Utc::now()));
  }

  #[test]
  fn test_success_is_fresh_within_retention() {
    let mut e = entry();
    e.settle_success(json!([1, 2, 3]));
    assert!(e.is_fresh(Utc::now()));
    assert!(e.is_fresh(Utc::now() + Duration::seconds(299)));
    assert!(!e.is_fresh(Utc::now() + Duration::seconds(301)));
  }

  #[test]
  fn test_invalidated_success_is_not_fresh() {
    let mut e = entry();
    e.settle_success(json!([1]));
    e.invalidated = true;
    assert!(!e.is_fresh(Utc::now()));
  }

  #[test]
  fn test_error_is_never_fresh_and_keeps_data() {
    let mut e = entry();
    e.settle_success(json!({"v": 1}));
    e.settle_error(ApiError::Transport("offline".to_string()));
    assert!(!e.is_fresh(Utc::now()));
    assert_eq!(e.data, Some(json!({"v": 1})));
    assert_eq!(e.status, QueryStatus::Error);
  }

  #[test]
  fn test_success_clears_previous_error() {
    let mut e = entry();
    e.settle_error(ApiError::Transport("offline".to_string()));
    e.settle_success(json!({"v": 2}));
    assert!(e.error.is_none());
    assert!(e.fetched_at.is_some());
  }

  #[test]
  fn test_expiry_tracks_last_settle() {
    let mut e = entry();
    e.settle_success(json!(1));
    assert!(!e.is_expired(Utc::now()));
    assert!(e.is_expired(Utc::now() + Duration::seconds(301)));
  }
}
