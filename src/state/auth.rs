//! Authentication slice.

/// Login state. Token presence is the authentication signal; there is no
/// separately stored flag to drift out of sync with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
  pub username: Option<String>,
  pub token: Option<String>,
  pub loading: bool,
  pub error: Option<String>,
}

impl AuthState {
  /// Initial state restored from session storage at startup.
  pub fn seeded(token: Option<String>, username: Option<String>) -> Self {
    Self {
      username,
      token,
      loading: false,
      error: None,
    }
  }

  pub fn is_authenticated(&self) -> bool {
    self.token.is_some()
  }
}

#[derive(Debug, Clone)]
pub enum AuthAction {
  LoginSuccess { token: String, username: String },
  Logout,
  SetLoading(bool),
  SetError(String),
  ClearError,
}

/// Durable-storage work a reduced action asks for. The reducer stays
/// pure; the store runs the effect after the state change.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
  Persist { token: String, username: String },
  Clear,
}

impl AuthState {
  pub fn reduce(&mut self, action: AuthAction) -> Option<SessionEffect> {
    match action {
      AuthAction::LoginSuccess { token, username } => {
        self.username = Some(username.clone());
        self.token = Some(token.clone());
        self.loading = false;
        self.error = None;
        Some(SessionEffect::Persist { token, username })
      }
      AuthAction::Logout => {
        *self = AuthState::default();
        Some(SessionEffect::Clear)
      }
      AuthAction::SetLoading(loading) => {
        self.loading = loading;
        None
      }
      AuthAction::SetError(message) => {
        self.error = Some(message);
        self.loading = false;
        None
      }
      AuthAction::ClearError => {
        self.error = None;
        None
      }
    }
  }
}
