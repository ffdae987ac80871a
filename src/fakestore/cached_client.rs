//! Store client with transparent caching.
//!
//! Reads go through the query cache: repeat calls inside the retention
//! window are served locally and concurrent calls share one request.
//! Mutations declare the tags they touch; a successful mutation stales
//! every matching read so its next call refetches. This is the only place
//! where endpoints and tags are paired.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{QueryCache, Tag, TagType};

use super::client::StoreClient;
use super::endpoints::Query;
use super::error::ApiError;
use super::types::{Cart, CartPayload, Product, ProductPayload, User, UserPayload};

#[derive(Clone)]
pub struct CachedStoreClient {
  inner: StoreClient,
  cache: QueryCache,
}

impl CachedStoreClient {
  pub fn new(inner: StoreClient) -> Self {
    Self {
      inner,
      cache: QueryCache::new(),
    }
  }

  /// Run one read through the cache. Entries store plain JSON so the
  /// cache stays ignorant of response shapes; the payload is retyped on
  /// the way out.
  async fn read<T, F, Fut>(&self, query: Query, fetch: F) -> Result<T, ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce(StoreClient) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    // Held for the duration of the call, like a mounted component's
    // subscription; afterwards the entry ages out on its own.
    let _sub = self.cache.subscribe(&query);
    let value = self
      .cache
      .fetch(&query, || {
        let inner = self.inner.clone();
        async move { Ok(serde_json::to_value(fetch(inner).await?)?) }
      })
      .await?;
    Ok(serde_json::from_value(value)?)
  }

  // --- reads ---

  pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
    self
      .read(Query::Products, |client| async move { client.get_products().await })
      .await
  }

  pub async fn product(&self, id: u64) -> Result<Product, ApiError> {
    self
      .read(Query::Product { id }, move |client| async move {
        client.get_product(id).await
      })
      .await
  }

  pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
    self
      .read(Query::Categories, |client| async move {
        client.get_categories().await
      })
      .await
  }

  pub async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
    // The key serializes its parameter verbatim, so the same normalized
    // name must feed both the key and the request path.
    let category = normalize_category(category);
    let query = Query::ProductsByCategory { category: category.clone() };
    self
      .read(query, move |client| async move {
        client.get_products_by_category(&category).await
      })
      .await
  }

  pub async fn users(&self) -> Result<Vec<User>, ApiError> {
    self
      .read(Query::Users, |client| async move { client.get_users().await })
      .await
  }

  pub async fn user(&self, id: u64) -> Result<User, ApiError> {
    self
      .read(Query::User { id }, move |client| async move {
        client.get_user(id).await
      })
      .await
  }

  pub async fn carts(&self) -> Result<Vec<Cart>, ApiError> {
    self
      .read(Query::Carts, |client| async move { client.get_carts().await })
      .await
  }

  pub async fn cart(&self, id: u64) -> Result<Cart, ApiError> {
    self
      .read(Query::Cart { id }, move |client| async move {
        client.get_cart(id).await
      })
      .await
  }

  pub async fn user_carts(&self, user_id: u64) -> Result<Vec<Cart>, ApiError> {
    self
      .read(Query::UserCarts { user_id }, move |client| async move {
        client.get_user_carts(user_id).await
      })
      .await
  }

  // --- mutations ---
  //
  // Creates and deletes reshape collections, so they stale the whole
  // family. Updates touch one entity and stale only its detail entry.

  pub async fn create_product(&self, product: &ProductPayload) -> Result<Product, ApiError> {
    let inner = self.inner.clone();
    let product = product.clone();
    self
      .cache
      .mutate(&[Tag::of(TagType::Product)], || async move {
        inner.create_product(&product).await
      })
      .await
  }

  pub async fn update_product(&self, id: u64, product: &ProductPayload) -> Result<Product, ApiError> {
    let inner = self.inner.clone();
    let product = product.clone();
    self
      .cache
      .mutate(&[Tag::with_id(TagType::Product, id)], || async move {
        inner.update_product(id, &product).await
      })
      .await
  }

  pub async fn delete_product(&self, id: u64) -> Result<Product, ApiError> {
    let inner = self.inner.clone();
    self
      .cache
      .mutate(&[Tag::of(TagType::Product)], || async move {
        inner.delete_product(id).await
      })
      .await
  }

  pub async fn create_user(&self, user: &UserPayload) -> Result<User, ApiError> {
    let inner = self.inner.clone();
    let user = user.clone();
    self
      .cache
      .mutate(&[Tag::of(TagType::User)], || async move {
        inner.create_user(&user).await
      })
      .await
  }

  pub async fn update_user(&self, id: u64, user: &UserPayload) -> Result<User, ApiError> {
    let inner = self.inner.clone();
    let user = user.clone();
    self
      .cache
      .mutate(&[Tag::with_id(TagType::User, id)], || async move {
        inner.update_user(id, &user).await
      })
      .await
  }

  pub async fn delete_user(&self, id: u64) -> Result<User, ApiError> {
    let inner = self.inner.clone();
    self
      .cache
      .mutate(&[Tag::of(TagType::User)], || async move {
        inner.delete_user(id).await
      })
      .await
  }

  pub async fn create_cart(&self, cart: &CartPayload) -> Result<Cart, ApiError> {
    let inner = self.inner.clone();
    let cart = cart.clone();
    self
      .cache
      .mutate(&[Tag::of(TagType::Cart)], || async move {
        inner.create_cart(&cart).await
      })
      .await
  }

  pub async fn update_cart(&self, id: u64, cart: &CartPayload) -> Result<Cart, ApiError> {
    let inner = self.inner.clone();
    let cart = cart.clone();
    self
      .cache
      .mutate(&[Tag::with_id(TagType::Cart, id)], || async move {
        inner.update_cart(id, &cart).await
      })
      .await
  }

  pub async fn delete_cart(&self, id: u64) -> Result<Cart, ApiError> {
    let inner = self.inner.clone();
    self
      .cache
      .mutate(&[Tag::of(TagType::Cart)], || async move {
        inner.delete_cart(id).await
      })
      .await
  }

  /// Login is a mutation with no tags: it changes no cached collection.
  pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
    let inner = self.inner.clone();
    let username = username.to_string();
    let password = password.to_string();
    self
      .cache
      .mutate(&[], || async move { inner.login(&username, &password).await })
      .await
  }
}

/// Category names come from user input as well as API data; the API only
/// knows lowercase names.
fn normalize_category(category: &str) -> String {
  category.trim().to_lowercase()
}
