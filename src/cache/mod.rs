//! Tag-invalidated in-memory query cache.
//!
//! Each read endpoint owns one cache entry per parameter combination.
//! Entries serve repeat reads inside a retention window, deduplicate
//! concurrent fetches of the same key, and are staled in bulk by the tags
//! mutations declare.

mod coalesce;
mod entry;
mod layer;
mod tags;
mod traits;

pub use entry::{CacheEntry, QueryStatus};
pub use layer::{QueryCache, Subscription};
pub use tags::{Tag, TagType};
pub use traits::QueryKey;
