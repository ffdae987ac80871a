//! Read-endpoint descriptors and their cache behavior.

use chrono::Duration;

use crate::cache::{QueryKey, Tag, TagType};

/// The read side of the store API, one variant per endpoint and parameter
/// combination.
///
/// The key identifies the entry, the provided tags connect it to the
/// mutations that stale it, and the retention window bounds how long a
/// result keeps being served. Collection reads carry the family tag;
/// detail reads carry the entity-scoped tag, so updating one product does
/// not stale every list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
  Products,
  Product { id: u64 },
  Categories,
  ProductsByCategory { category: String },
  Users,
  User { id: u64 },
  Carts,
  Cart { id: u64 },
  UserCarts { user_id: u64 },
}

impl QueryKey for Query {
  fn cache_key(&self) -> String {
    match self {
      Query::Products => "products".to_string(),
      Query::Product { id } => format!("products:{}", id),
      Query::Categories => "categories".to_string(),
      Query::ProductsByCategory { category } => format!("products:category:{}", category),
      Query::Users => "users".to_string(),
      Query::User { id } => format!("users:{}", id),
      Query::Carts => "carts".to_string(),
      Query::Cart { id } => format!("carts:{}", id),
      Query::UserCarts { user_id } => format!("carts:user:{}", user_id),
    }
  }

  fn provides(&self) -> Vec<Tag> {
    match self {
      Query::Products | Query::ProductsByCategory { .. } => vec![Tag::of(TagType::Product)],
      Query::Product { id } => vec![Tag::with_id(TagType::Product, *id)],
      Query::Categories => vec![Tag::of(TagType::Category)],
      Query::Users => vec![Tag::of(TagType::User)],
      Query::User { id } => vec![Tag::with_id(TagType::User, *id)],
      Query::Carts | Query::UserCarts { .. } => vec![Tag::of(TagType::Cart)],
      Query::Cart { id } => vec![Tag::with_id(TagType::Cart, *id)],
    }
  }

  /// Static retention table. Cart data moves fast, the category list
  /// barely moves at all.
  fn retention(&self) -> Duration {
    match self {
      Query::Categories => Duration::seconds(600),
      Query::Carts | Query::Cart { .. } | Query::UserCarts { .. } => Duration::seconds(60),
      Query::Products
      | Query::Product { .. }
      | Query::ProductsByCategory { .. }
      | Query::Users
      | Query::User { .. } => Duration::seconds(300),
    }
  }
}
