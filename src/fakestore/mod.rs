//! Fake Store API integration: wire types, the raw HTTP client, and the
//! cached client the rest of the app consumes.

mod cached_client;
mod client;
mod endpoints;
mod error;
mod types;

pub use cached_client::CachedStoreClient;
pub use client::StoreClient;
pub use endpoints::Query;
pub use error::ApiError;
pub use types::{
  Address, Cart, CartPayload, CartProduct, Name, Product, ProductPayload, Rating, User,
  UserPayload,
};
