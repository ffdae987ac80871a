//! Client state: three independent slices behind one synchronous
//! dispatch.
//!
//! Network work happens in the cache layer; by the time an action reaches
//! the store it is plain data. Dispatch applies the pure reducer of the
//! addressed slice, then runs whatever durable-storage effect the
//! reduction asked for. Keeping that effect out of the reducer keeps the
//! reducers trivially testable.

mod auth;
mod cart;
mod products;

pub use auth::{AuthAction, AuthState, SessionEffect};
pub use cart::{CartAction, CartItem, CartState};
pub use products::{ProductsAction, ProductsState};

use color_eyre::Result;

use crate::session::{SessionStore, TOKEN_KEY, USERNAME_KEY};

/// Any state transition the store accepts.
#[derive(Debug, Clone)]
pub enum Action {
  Auth(AuthAction),
  Cart(CartAction),
  #[allow(dead_code)]
  Products(ProductsAction),
}

/// Process-wide state container: the slices plus the session storage they
/// persist through.
pub struct Store<S: SessionStore> {
  auth: AuthState,
  cart: CartState,
  products: ProductsState,
  session: S,
}

impl<S: SessionStore> Store<S> {
  /// Build the store, seeding auth from session storage.
  pub fn new(session: S) -> Result<Self> {
    let token = session.get(TOKEN_KEY)?;
    let username = session.get(USERNAME_KEY)?;
    Ok(Self {
      auth: AuthState::seeded(token, username),
      cart: CartState::default(),
      products: ProductsState::default(),
      session,
    })
  }

  /// Apply one action. Actions are applied fully and in call order; there
  /// is no queueing or batching.
  pub fn dispatch(&mut self, action: Action) -> Result<()> {
    match action {
      Action::Auth(action) => {
        if let Some(effect) = self.auth.reduce(action) {
          self.run_session_effect(effect)?;
        }
      }
      Action::Cart(action) => self.cart.reduce(action),
      Action::Products(action) => self.products.reduce(action),
    }
    Ok(())
  }

  fn run_session_effect(&mut self, effect: SessionEffect) -> Result<()> {
    match effect {
      SessionEffect::Persist { token, username } => {
        self.session.set(TOKEN_KEY, &token)?;
        self.session.set(USERNAME_KEY, &username)?;
      }
      SessionEffect::Clear => {
        self.session.remove(TOKEN_KEY)?;
        self.session.remove(USERNAME_KEY)?;
      }
    }
    Ok(())
  }

  pub fn auth(&self) -> &AuthState {
    &self.auth
  }

  pub fn cart(&self) -> &CartState {
    &self.cart
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fakestore::Product;
  use crate::session::MemorySessionStore;

  fn store() -> Store<MemorySessionStore> {
    Store::new(MemorySessionStore::new()).unwrap()
  }

  fn product(id: u64, price: f64) -> Product {
    Product {
      id,
      title: format!("Product {}", id),
      price,
      description: String::new(),
      category: String::new(),
      image: String::new(),
      rating: None,
    }
  }

  #[test]
  fn test_seeds_auth_from_session_storage() {
    let session = MemorySessionStore::new();
    session.set(TOKEN_KEY, "abc123").unwrap();
    session.set(USERNAME_KEY, "mor_2314").unwrap();

    let store = Store::new(session).unwrap();
    assert!(store.auth().is_authenticated());
    assert_eq!(store.auth().username.as_deref(), Some("mor_2314"));
  }

  #[test]
  fn test_login_success_persists_the_session() {
    let mut store = store();
    store
      .dispatch(Action::Auth(AuthAction::LoginSuccess {
        token: "abc123".to_string(),
        username: "mor_2314".to_string(),
      }))
      .unwrap();

    assert!(store.auth().is_authenticated());
    assert_eq!(store.session.get(TOKEN_KEY).unwrap(), Some("abc123".to_string()));
    assert_eq!(
      store.session.get(USERNAME_KEY).unwrap(),
      Some("mor_2314".to_string())
    );
  }

  #[test]
  fn test_logout_clears_state_and_session() {
    let mut store = store();
    store
      .dispatch(Action::Auth(AuthAction::LoginSuccess {
        token: "abc123".to_string(),
        username: "mor_2314".to_string(),
      }))
      .unwrap();

    store.dispatch(Action::Auth(AuthAction::Logout)).unwrap();

    assert!(!store.auth().is_authenticated());
    assert_eq!(store.session.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(store.session.get(USERNAME_KEY).unwrap(), None);
  }

  #[test]
  fn test_failed_login_flow_records_the_error() {
    let mut store = store();
    store.dispatch(Action::Auth(AuthAction::ClearError)).unwrap();
    store.dispatch(Action::Auth(AuthAction::SetLoading(true))).unwrap();
    store
      .dispatch(Action::Auth(AuthAction::SetError("HTTP 401: nope".to_string())))
      .unwrap();

    assert!(!store.auth().is_authenticated());
    assert!(!store.auth().loading);
    assert_eq!(store.auth().error.as_deref(), Some("HTTP 401: nope"));
    // Nothing was persisted.
    assert_eq!(store.session.get(TOKEN_KEY).unwrap(), None);
  }

  #[test]
  fn test_cart_actions_route_to_the_cart_slice() {
    let mut store = store();
    store.dispatch(Action::Cart(CartAction::AddToCart(product(1, 10.0)))).unwrap();
    store.dispatch(Action::Cart(CartAction::AddToCart(product(1, 10.0)))).unwrap();

    assert_eq!(store.cart().total_quantity, 2);
    assert_eq!(store.cart().total_price, 20.0);

    store.dispatch(Action::Cart(CartAction::ClearCart)).unwrap();
    assert_eq!(store.cart(), &CartState::default());
  }

  #[test]
  fn test_products_actions_route_to_the_selection_slice() {
    let mut store = store();
    store.products.selected_product = Some(product(1, 10.0));

    store
      .dispatch(Action::Products(ProductsAction::ClearSelectedProduct))
      .unwrap();
    assert!(store.products.selected_product.is_none());
  }
}
