//! Tags group cache entries for bulk invalidation.

use std::fmt;

/// Entity families the cache tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
  Product,
  User,
  Cart,
  Category,
}

impl fmt::Display for TagType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      TagType::Product => "Product",
      TagType::User => "User",
      TagType::Cart => "Cart",
      TagType::Category => "Category",
    };
    f.write_str(name)
  }
}

/// A label carried by cache entries and listed by mutations. When a
/// mutation succeeds, every entry providing a tag it matches is marked
/// stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
  pub ty: TagType,
  pub id: Option<u64>,
}

impl Tag {
  /// Tag covering every entity of a family. Listed by collection reads,
  /// and by mutations whose effect reaches beyond one entity.
  pub fn of(ty: TagType) -> Self {
    Self { ty, id: None }
  }

  /// Tag scoped to a single entity.
  pub fn with_id(ty: TagType, id: u64) -> Self {
    Self { ty, id: Some(id) }
  }

  /// Whether this tag, listed on a mutation, stales an entry providing
  /// `provided`. An id-less tag hits every provider of its family; an
  /// id-carrying tag hits only providers of that exact entity.
  pub fn invalidates(&self, provided: &Tag) -> bool {
    if self.ty != provided.ty {
      return false;
    }
    match self.id {
      None => true,
      Some(id) => provided.id == Some(id),
    }
  }
}

impl fmt::Display for Tag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.id {
      Some(id) => write!(f, "{}:{}", self.ty, id),
      None => write!(f, "{}", self.ty),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_family_tag_hits_every_provider() {
    let broad = Tag::of(TagType::Product);
    assert!(broad.invalidates(&Tag::of(TagType::Product)));
    assert!(broad.invalidates(&Tag::with_id(TagType::Product, 3)));
  }

  #[test]
  fn test_scoped_tag_hits_only_its_entity() {
    let scoped = Tag::with_id(TagType::Product, 3);
    assert!(scoped.invalidates(&Tag::with_id(TagType::Product, 3)));
    assert!(!scoped.invalidates(&Tag::with_id(TagType::Product, 4)));
    assert!(!scoped.invalidates(&Tag::of(TagType::Product)));
  }

  #[test]
  fn test_families_are_isolated() {
    let product = Tag::of(TagType::Product);
    assert!(!product.invalidates(&Tag::of(TagType::Cart)));
    assert!(!product.invalidates(&Tag::with_id(TagType::User, 3)));
  }

  #[test]
  fn test_display() {
    assert_eq!(Tag::of(TagType::Category).to_string(), "Category");
    assert_eq!(Tag::with_id(TagType::Cart, 12).to_string(), "Cart:12");
  }
}
