//! Typed HTTP client for the Fake Store API.
//!
//! One method per endpoint, no caching and no retries. Callers that want
//! either go through `CachedStoreClient`.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;
use url::Url;

use super::error::ApiError;
use super::types::{
  Cart, CartPayload, LoginRequest, LoginResponse, Product, ProductPayload, User, UserPayload,
};

#[derive(Debug, Clone)]
pub struct StoreClient {
  http: reqwest::Client,
  base_url: Url,
}

impl StoreClient {
  /// Build a client rooted at `base_url`. Every request carries a JSON
  /// content-type header.
  pub fn new(base_url: &str) -> Result<Self, ApiError> {
    let base_url = Url::parse(base_url)?;
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let http = reqwest::Client::builder().default_headers(headers).build()?;
    Ok(Self { http, base_url })
  }

  fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = self.base_url.clone();
    {
      let mut path = url
        .path_segments_mut()
        .map_err(|_| ApiError::InvalidUrl(format!("{} cannot carry a path", self.base_url)))?;
      path.pop_if_empty().extend(segments);
    }
    Ok(url)
  }

  async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
    let response = self.http.get(self.url(segments)?).send().await?;
    Self::decode(response).await
  }

  async fn send_json<T, B>(&self, method: Method, segments: &[&str], body: &B) -> Result<T, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let response = self
      .http
      .request(method, self.url(segments)?)
      .json(body)
      .send()
      .await?;
    Self::decode(response).await
  }

  async fn delete<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
    let response = self.http.delete(self.url(segments)?).send().await?;
    Self::decode(response).await
  }

  /// Non-2xx responses become `ApiError::Http` carrying the body text,
  /// falling back to the status reason when the body is empty. Success
  /// bodies are decoded as JSON.
  async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
      let message = Self::error_message(status, response).await;
      warn!(status = status.as_u16(), %message, "store API returned an error");
      return Err(ApiError::Http { status: status.as_u16(), message });
    }
    Ok(response.json().await?)
  }

  async fn error_message(status: StatusCode, response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
      status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
      body.to_string()
    }
  }

  // --- products ---

  pub async fn get_products(&self) -> Result<Vec<Product>, ApiError> {
    self.get(&["products"]).await
  }

  pub async fn get_product(&self, id: u64) -> Result<Product, ApiError> {
    self.get(&["products", &id.to_string()]).await
  }

  pub async fn get_categories(&self) -> Result<Vec<String>, ApiError> {
    self.get(&["products", "categories"]).await
  }

  pub async fn get_products_by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
    self.get(&["products", "category", category]).await
  }

  pub async fn create_product(&self, product: &ProductPayload) -> Result<Product, ApiError> {
    self.send_json(Method::POST, &["products"], product).await
  }

  pub async fn update_product(&self, id: u64, product: &ProductPayload) -> Result<Product, ApiError> {
    self.send_json(Method::PUT, &["products", &id.to_string()], product).await
  }

  /// The API echoes the deleted entity back.
  pub async fn delete_product(&self, id: u64) -> Result<Product, ApiError> {
    self.delete(&["products", &id.to_string()]).await
  }

  // --- users ---

  pub async fn get_users(&self) -> Result<Vec<User>, ApiError> {
    self.get(&["users"]).await
  }

  pub async fn get_user(&self, id: u64) -> Result<User, ApiError> {
    self.get(&["users", &id.to_string()]).await
  }

  pub async fn create_user(&self, user: &UserPayload) -> Result<User, ApiError> {
    self.send_json(Method::POST, &["users"], user).await
  }

  pub async fn update_user(&self, id: u64, user: &UserPayload) -> Result<User, ApiError> {
    self.send_json(Method::PUT, &["users", &id.to_string()], user).await
  }

  pub async fn delete_user(&self, id: u64) -> Result<User, ApiError> {
    self.delete(&["users", &id.to_string()]).await
  }

  // --- carts ---

  pub async fn get_carts(&self) -> Result<Vec<Cart>, ApiError> {
    self.get(&["carts"]).await
  }

  pub async fn get_cart(&self, id: u64) -> Result<Cart, ApiError> {
    self.get(&["carts", &id.to_string()]).await
  }

  pub async fn get_user_carts(&self, user_id: u64) -> Result<Vec<Cart>, ApiError> {
    self.get(&["carts", "user", &user_id.to_string()]).await
  }

  pub async fn create_cart(&self, cart: &CartPayload) -> Result<Cart, ApiError> {
    self.send_json(Method::POST, &["carts"], cart).await
  }

  pub async fn update_cart(&self, id: u64, cart: &CartPayload) -> Result<Cart, ApiError> {
    self.send_json(Method::PUT, &["carts", &id.to_string()], cart).await
  }

  pub async fn delete_cart(&self, id: u64) -> Result<Cart, ApiError> {
    self.delete(&["carts", &id.to_string()]).await
  }

  // --- auth ---

  /// Exchange credentials for a token. A 2xx response without a token is
  /// its own error rather than a decode failure.
  pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
    let request = LoginRequest { username, password };
    let response: LoginResponse = self
      .send_json(Method::POST, &["auth", "login"], &request)
      .await?;
    response.token.ok_or(ApiError::MissingField("token"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use wiremock::matchers::{body_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn product_json(id: u64) -> serde_json::Value {
    json!({"id": id, "title": format!("Product {}", id), "price": 9.99})
  }

  #[test]
  fn test_urls_append_to_the_base_path() {
    let client = StoreClient::new("http://localhost:5173/api").unwrap();
    assert_eq!(
      client.url(&["products", "3"]).unwrap().as_str(),
      "http://localhost:5173/api/products/3"
    );

    let client = StoreClient::new("https://fakestoreapi.com/").unwrap();
    assert_eq!(
      client.url(&["auth", "login"]).unwrap().as_str(),
      "https://fakestoreapi.com/auth/login"
    );
  }

  #[tokio::test]
  async fn test_requests_carry_json_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/products"))
      .and(header("content-type", "application/json"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json(1)])))
      .expect(1)
      .mount(&server)
      .await;

    let client = StoreClient::new(&server.uri()).unwrap();
    let products = client.get_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, 1);
  }

  #[tokio::test]
  async fn test_http_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/products/9"))
      .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
      .mount(&server)
      .await;

    let client = StoreClient::new(&server.uri()).unwrap();
    let error = client.get_product(9).await.unwrap_err();
    assert_eq!(error, ApiError::Http { status: 500, message: "boom".to_string() });
  }

  #[tokio::test]
  async fn test_empty_error_bodies_fall_back_to_the_status_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/users/42"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    let client = StoreClient::new(&server.uri()).unwrap();
    let error = client.get_user(42).await.unwrap_err();
    assert_eq!(error, ApiError::Http { status: 404, message: "Not Found".to_string() });
  }

  #[tokio::test]
  async fn test_unexpected_body_shape_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/products"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
      .mount(&server)
      .await;

    let client = StoreClient::new(&server.uri()).unwrap();
    let error = client.get_products().await.unwrap_err();
    assert!(matches!(error, ApiError::Decode(_)));
  }

  #[tokio::test]
  async fn test_login_posts_credentials_and_returns_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/auth/login"))
      .and(body_json(json!({"username": "mor_2314", "password": "83r5^_"})))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
      .expect(1)
      .mount(&server)
      .await;

    let client = StoreClient::new(&server.uri()).unwrap();
    let token = client.login("mor_2314", "83r5^_").await.unwrap();
    assert_eq!(token, "abc123");
  }

  #[tokio::test]
  async fn test_login_without_a_token_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/auth/login"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
      .mount(&server)
      .await;

    let client = StoreClient::new(&server.uri()).unwrap();
    let error = client.login("mor_2314", "nope").await.unwrap_err();
    assert_eq!(error, ApiError::MissingField("token"));
  }

  #[tokio::test]
  async fn test_delete_returns_the_deleted_entity() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/products/5"))
      .respond_with(ResponseTemplate::new(200).set_body_json(product_json(5)))
      .expect(1)
      .mount(&server)
      .await;

    let client = StoreClient::new(&server.uri()).unwrap();
    let product = client.delete_product(5).await.unwrap();
    assert_eq!(product.id, 5);
  }

  #[tokio::test]
  async fn test_update_puts_the_full_payload() {
    let server = MockServer::start().await;
    let payload = ProductPayload {
      title: "Leather Wallet".to_string(),
      price: 24.5,
      description: String::new(),
      category: "accessories".to_string(),
      image: String::new(),
    };
    Mock::given(method("PUT"))
      .and(path("/products/7"))
      .and(body_json(serde_json::to_value(&payload).unwrap()))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "id": 7, "title": "Leather Wallet", "price": 24.5
      })))
      .expect(1)
      .mount(&server)
      .await;

    let client = StoreClient::new(&server.uri()).unwrap();
    let product = client.update_product(7, &payload).await.unwrap();
    assert_eq!(product.title, "Leather Wallet");
  }
}
