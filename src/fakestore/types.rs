//! Serde types matching Fake Store API payloads.
//!
//! Fields the client does not render are defaulted so upstream schema
//! drift cannot break deserialization.

use serde::{Deserialize, Serialize};

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: u64,
  pub title: String,
  pub price: f64,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub image: String,
  #[serde(default)]
  pub rating: Option<Rating>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
  pub rate: f64,
  pub count: u64,
}

/// Body for `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
  pub title: String,
  pub price: f64,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub image: String,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: u64,
  pub username: String,
  pub email: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub name: Option<Name>,
  #[serde(default)]
  pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Name {
  pub firstname: String,
  pub lastname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
  pub city: String,
  #[serde(default)]
  pub street: String,
  #[serde(default)]
  pub number: u64,
  #[serde(default)]
  pub zipcode: String,
}

/// Body for `POST /users` and `PUT /users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
  pub username: String,
  pub email: String,
  pub password: String,
}

// ============================================================================
// Carts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
  pub id: u64,
  #[serde(rename = "userId")]
  pub user_id: u64,
  #[serde(default)]
  pub date: String,
  #[serde(default)]
  pub products: Vec<CartProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartProduct {
  #[serde(rename = "productId")]
  pub product_id: u64,
  pub quantity: u32,
}

/// Body for `POST /carts` and `PUT /carts/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPayload {
  #[serde(rename = "userId")]
  pub user_id: u64,
  pub date: String,
  pub products: Vec<CartProduct>,
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
  pub username: &'a str,
  pub password: &'a str,
}

/// The token field is optional on purpose: a 2xx response without it is a
/// distinct error, not a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
  #[serde(default)]
  pub token: Option<String>,
}
