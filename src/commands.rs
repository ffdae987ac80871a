//! Command-line surface: one subcommand per store operation, plus the
//! interactive shell.

use clap::Subcommand;
use color_eyre::eyre::{eyre, Report};
use color_eyre::Result;
use tracing::info;

use crate::config::Config;
use crate::fakestore::{
  CachedStoreClient, Cart, CartPayload, CartProduct, Product, ProductPayload, StoreClient, User,
  UserPayload,
};
use crate::session::{SessionStore, SqliteSessionStore};
use crate::shell;
use crate::state::{Action, AuthAction, Store};

#[derive(Debug, Subcommand)]
pub enum Command {
  /// List products
  Products {
    /// Only products in this category
    #[arg(long)]
    category: Option<String>,
  },
  /// Show one product
  Product { id: u64 },
  /// List product categories
  Categories,
  /// List users
  Users,
  /// Show one user
  User { id: u64 },
  /// List carts
  Carts {
    /// Only carts belonging to this user
    #[arg(long)]
    user: Option<u64>,
  },
  /// Show one cart
  Cart { id: u64 },
  /// Create a product
  CreateProduct {
    #[arg(long)]
    title: String,
    #[arg(long)]
    price: f64,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    category: String,
    #[arg(long, default_value = "")]
    image: String,
  },
  /// Replace a product
  UpdateProduct {
    id: u64,
    #[arg(long)]
    title: String,
    #[arg(long)]
    price: f64,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    category: String,
    #[arg(long, default_value = "")]
    image: String,
  },
  /// Delete a product
  DeleteProduct { id: u64 },
  /// Create a user
  CreateUser {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
  },
  /// Replace a user
  UpdateUser {
    id: u64,
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
  },
  /// Delete a user
  DeleteUser { id: u64 },
  /// Create a cart
  CreateCart {
    /// User the cart belongs to
    #[arg(long)]
    user: u64,
    /// Cart line as PRODUCT_ID:QUANTITY; repeat for more lines
    #[arg(long = "item", value_parser = parse_cart_line)]
    items: Vec<CartProduct>,
    /// Cart date (default: today)
    #[arg(long)]
    date: Option<String>,
  },
  /// Replace a cart
  UpdateCart {
    id: u64,
    #[arg(long)]
    user: u64,
    /// Cart line as PRODUCT_ID:QUANTITY; repeat for more lines
    #[arg(long = "item", value_parser = parse_cart_line)]
    items: Vec<CartProduct>,
    /// Cart date (default: today)
    #[arg(long)]
    date: Option<String>,
  },
  /// Delete a cart
  DeleteCart { id: u64 },
  /// Log in and persist the session
  Login {
    username: String,
    /// Password (default: $SHOPFRONT_PASSWORD)
    #[arg(short, long)]
    password: Option<String>,
  },
  /// Log out and clear the persisted session
  Logout,
  /// Show the current session
  Status,
  /// Interactive shell with a local shopping cart
  Shell,
}

/// Run one parsed command to completion.
pub async fn run(command: Command, config: Config) -> Result<()> {
  let client = CachedStoreClient::new(StoreClient::new(&config.base_url())?);
  let session = SqliteSessionStore::open()?;
  let mut store = Store::new(session)?;

  match command {
    Command::Products { category } => {
      let products = match category {
        Some(category) => client.products_by_category(&category).await,
        None => client.products().await,
      }
      .map_err(|e| eyre!("Failed to load products: {}", e))?;
      print_products(&products);
    }
    Command::Product { id } => {
      let product = client
        .product(id)
        .await
        .map_err(|e| eyre!("Failed to load product {}: {}", id, e))?;
      print_product(&product);
    }
    Command::Categories => {
      let categories = client
        .categories()
        .await
        .map_err(|e| eyre!("Failed to load categories: {}", e))?;
      for category in &categories {
        println!("{}", category);
      }
    }
    Command::Users => {
      let users = client
        .users()
        .await
        .map_err(|e| eyre!("Failed to load users: {}", e))?;
      print_users(&users);
    }
    Command::User { id } => {
      let user = client
        .user(id)
        .await
        .map_err(|e| eyre!("Failed to load user {}: {}", id, e))?;
      print_user(&user);
    }
    Command::Carts { user } => {
      let carts = match user {
        Some(user_id) => client.user_carts(user_id).await,
        None => client.carts().await,
      }
      .map_err(|e| eyre!("Failed to load carts: {}", e))?;
      print_carts(&carts);
    }
    Command::Cart { id } => {
      let cart = client
        .cart(id)
        .await
        .map_err(|e| eyre!("Failed to load cart {}: {}", id, e))?;
      print_cart(&cart);
    }
    Command::CreateProduct {
      title,
      price,
      description,
      category,
      image,
    } => {
      let payload = ProductPayload {
        title,
        price,
        description,
        category,
        image,
      };
      let created = client
        .create_product(&payload)
        .await
        .map_err(|e| eyre!("Failed to create product: {}", e))?;
      println!("Created product {}", created.id);
    }
    Command::UpdateProduct {
      id,
      title,
      price,
      description,
      category,
      image,
    } => {
      let payload = ProductPayload {
        title,
        price,
        description,
        category,
        image,
      };
      let updated = client
        .update_product(id, &payload)
        .await
        .map_err(|e| eyre!("Failed to update product {}: {}", id, e))?;
      println!("Updated product {}", updated.id);
    }
    Command::DeleteProduct { id } => {
      let deleted = client
        .delete_product(id)
        .await
        .map_err(|e| eyre!("Failed to delete product {}: {}", id, e))?;
      println!("Deleted product {} ({})", deleted.id, deleted.title);
    }
    Command::CreateUser {
      username,
      email,
      password,
    } => {
      let payload = UserPayload {
        username,
        email,
        password,
      };
      let created = client
        .create_user(&payload)
        .await
        .map_err(|e| eyre!("Failed to create user: {}", e))?;
      println!("Created user {}", created.id);
    }
    Command::UpdateUser {
      id,
      username,
      email,
      password,
    } => {
      let payload = UserPayload {
        username,
        email,
        password,
      };
      let updated = client
        .update_user(id, &payload)
        .await
        .map_err(|e| eyre!("Failed to update user {}: {}", id, e))?;
      println!("Updated user {}", updated.id);
    }
    Command::DeleteUser { id } => {
      let deleted = client
        .delete_user(id)
        .await
        .map_err(|e| eyre!("Failed to delete user {}: {}", id, e))?;
      println!("Deleted user {} ({})", deleted.id, deleted.username);
    }
    Command::CreateCart { user, items, date } => {
      let payload = CartPayload {
        user_id: user,
        date: date.unwrap_or_else(today),
        products: items,
      };
      let created = client
        .create_cart(&payload)
        .await
        .map_err(|e| eyre!("Failed to create cart: {}", e))?;
      println!("Created cart {}", created.id);
    }
    Command::UpdateCart {
      id,
      user,
      items,
      date,
    } => {
      let payload = CartPayload {
        user_id: user,
        date: date.unwrap_or_else(today),
        products: items,
      };
      let updated = client
        .update_cart(id, &payload)
        .await
        .map_err(|e| eyre!("Failed to update cart {}: {}", id, e))?;
      println!("Updated cart {}", updated.id);
    }
    Command::DeleteCart { id } => {
      let deleted = client
        .delete_cart(id)
        .await
        .map_err(|e| eyre!("Failed to delete cart {}: {}", id, e))?;
      println!("Deleted cart {}", deleted.id);
    }
    Command::Login { username, password } => {
      let password = match password {
        Some(password) => password,
        None => Config::get_password()?,
      };
      login(&mut store, &client, &username, &password).await?;
    }
    Command::Logout => logout(&mut store)?,
    Command::Status => status(&store),
    Command::Shell => shell::run(&mut store, &client).await?,
  }

  Ok(())
}

/// Shared login flow: flags loading, calls the API, lands the outcome in
/// the auth slice. The API error stays in the report's chain so callers
/// can inspect the status code.
pub async fn login<S: SessionStore>(
  store: &mut Store<S>,
  client: &CachedStoreClient,
  username: &str,
  password: &str,
) -> Result<()> {
  store.dispatch(Action::Auth(AuthAction::ClearError))?;
  store.dispatch(Action::Auth(AuthAction::SetLoading(true)))?;

  match client.login(username, password).await {
    Ok(token) => {
      store.dispatch(Action::Auth(AuthAction::LoginSuccess {
        token,
        username: username.to_string(),
      }))?;
      info!(username, "logged in");
      println!("Logged in as {}", username);
      Ok(())
    }
    Err(error) => {
      store.dispatch(Action::Auth(AuthAction::SetError(error.to_string())))?;
      Err(Report::new(error).wrap_err("Login failed"))
    }
  }
}

pub fn logout<S: SessionStore>(store: &mut Store<S>) -> Result<()> {
  store.dispatch(Action::Auth(AuthAction::Logout))?;
  info!("logged out");
  println!("Logged out");
  Ok(())
}

pub fn status<S: SessionStore>(store: &Store<S>) {
  match (store.auth().is_authenticated(), &store.auth().username) {
    (true, Some(username)) => println!("Logged in as {}", username),
    (true, None) => println!("Logged in"),
    _ => println!("Not logged in"),
  }
  if let Some(error) = &store.auth().error {
    println!("Last login error: {}", error);
  }
}

pub fn format_price(price: f64) -> String {
  format!("${:.2}", price)
}

fn today() -> String {
  chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Parse a PRODUCT_ID:QUANTITY pair as passed to --item.
fn parse_cart_line(raw: &str) -> Result<CartProduct, String> {
  let (id, quantity) = raw
    .split_once(':')
    .ok_or_else(|| format!("expected PRODUCT_ID:QUANTITY, got `{}`", raw))?;
  let product_id = id
    .trim()
    .parse::<u64>()
    .map_err(|_| format!("invalid product id `{}`", id))?;
  let quantity = quantity
    .trim()
    .parse::<u32>()
    .map_err(|_| format!("invalid quantity `{}`", quantity))?;
  if quantity == 0 {
    return Err("quantity must be at least 1".to_string());
  }
  Ok(CartProduct {
    product_id,
    quantity,
  })
}

pub fn print_products(products: &[Product]) {
  for product in products {
    println!(
      "{:>4}  {:<48.48}  {:>9}  {}",
      product.id,
      product.title,
      format_price(product.price),
      product.category
    );
  }
}

pub fn print_product(product: &Product) {
  println!("{} ({})", product.title, format_price(product.price));
  println!("  id:       {}", product.id);
  println!("  category: {}", product.category);
  if let Some(rating) = &product.rating {
    println!("  rating:   {} ({} votes)", rating.rate, rating.count);
  }
  if !product.description.is_empty() {
    println!("  {}", product.description);
  }
}

fn print_users(users: &[User]) {
  for user in users {
    println!("{:>4}  {:<20}  {}", user.id, user.username, user.email);
  }
}

fn print_user(user: &User) {
  println!("{} <{}>", user.username, user.email);
  println!("  id: {}", user.id);
  if let Some(name) = &user.name {
    println!("  name: {} {}", name.firstname, name.lastname);
  }
  if !user.phone.is_empty() {
    println!("  phone: {}", user.phone);
  }
  if let Some(address) = &user.address {
    println!(
      "  address: {} {}, {} {}",
      address.number, address.street, address.city, address.zipcode
    );
  }
}

fn print_carts(carts: &[Cart]) {
  for cart in carts {
    let units: u32 = cart.products.iter().map(|line| line.quantity).sum();
    println!(
      "{:>4}  user {:>4}  {:<12}  {} lines, {} units",
      cart.id,
      cart.user_id,
      cart.date,
      cart.products.len(),
      units
    );
  }
}

fn print_cart(cart: &Cart) {
  println!("Cart {} (user {}, {})", cart.id, cart.user_id, cart.date);
  for line in &cart.products {
    println!("  product {:>4} x {}", line.product_id, line.quantity);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fakestore::ApiError;
  use crate::session::MemorySessionStore;
  use serde_json::json;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[test]
  fn test_parse_cart_line_accepts_id_and_quantity() {
    let line = parse_cart_line("3:2").unwrap();
    assert_eq!(line.product_id, 3);
    assert_eq!(line.quantity, 2);
  }

  #[test]
  fn test_parse_cart_line_tolerates_spaces() {
    let line = parse_cart_line(" 14 : 1 ").unwrap();
    assert_eq!(line.product_id, 14);
    assert_eq!(line.quantity, 1);
  }

  #[test]
  fn test_parse_cart_line_rejects_bad_input() {
    assert!(parse_cart_line("3").is_err());
    assert!(parse_cart_line("x:2").is_err());
    assert!(parse_cart_line("3:x").is_err());
    assert!(parse_cart_line("3:0").is_err());
  }

  #[test]
  fn test_format_price_keeps_two_decimals() {
    assert_eq!(format_price(109.95), "$109.95");
    assert_eq!(format_price(22.3), "$22.30");
    assert_eq!(format_price(0.0), "$0.00");
  }

  #[tokio::test]
  async fn test_login_lands_the_session_in_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/auth/login"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc123"})))
      .mount(&server)
      .await;

    let client = CachedStoreClient::new(StoreClient::new(&server.uri()).unwrap());
    let mut store = Store::new(MemorySessionStore::new()).unwrap();

    login(&mut store, &client, "mor_2314", "83r5^_").await.unwrap();

    assert!(store.auth().is_authenticated());
    assert_eq!(store.auth().username.as_deref(), Some("mor_2314"));
    assert!(!store.auth().loading);
  }

  #[tokio::test]
  async fn test_failed_login_keeps_the_error_inspectable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/auth/login"))
      .respond_with(ResponseTemplate::new(401).set_body_string("username or password is incorrect"))
      .mount(&server)
      .await;

    let client = CachedStoreClient::new(StoreClient::new(&server.uri()).unwrap());
    let mut store = Store::new(MemorySessionStore::new()).unwrap();

    let report = login(&mut store, &client, "mor_2314", "wrong").await.unwrap_err();

    let status = report.downcast_ref::<ApiError>().and_then(|e| e.status());
    assert_eq!(status, Some(401));
    assert!(!store.auth().is_authenticated());
    assert!(store.auth().error.is_some());
  }
}
