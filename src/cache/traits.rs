//! Trait connecting endpoint descriptors to the cache.

use chrono::Duration;

use super::tags::Tag;

/// Implemented by descriptors of cacheable reads.
///
/// `cache_key` must be unique per endpoint and parameter combination.
/// Entries carry the `provides` tags for the lifetime of the key, and
/// `retention` bounds how long a successful result is served without a
/// refetch.
pub trait QueryKey {
  fn cache_key(&self) -> String;
  fn provides(&self) -> Vec<Tag>;
  fn retention(&self) -> Duration;
}
