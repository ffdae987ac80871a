//! Error taxonomy for store API calls.

use thiserror::Error;

/// What went wrong talking to the store API.
///
/// `Clone` because the cache hands the same failure to every caller that
/// shared the fetch, and keeps it for later reads of the entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  /// The request never produced a response.
  #[error("Request failed: {0}")]
  Transport(String),

  /// The server answered with a non-success status.
  #[error("HTTP {status}: {message}")]
  Http { status: u16, message: String },

  /// The response body did not match the expected shape.
  #[error("Failed to decode response: {0}")]
  Decode(String),

  /// A 2xx response was missing a field the flow cannot continue without.
  #[error("Response was missing the `{0}` field")]
  MissingField(&'static str),

  /// The configured base URL or a built endpoint URL is unusable.
  #[error("Invalid URL: {0}")]
  InvalidUrl(String),
}

impl ApiError {
  /// HTTP status code, when the server got far enough to send one.
  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Http { status, .. } => Some(*status),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      ApiError::Decode(err.to_string())
    } else {
      ApiError::Transport(err.to_string())
    }
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(err: serde_json::Error) -> Self {
    ApiError::Decode(err.to_string())
  }
}

impl From<url::ParseError> for ApiError {
  fn from(err: url::ParseError) -> Self {
    ApiError::InvalidUrl(err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_only_on_http_errors() {
    let http = ApiError::Http { status: 404, message: "Not Found".to_string() };
    assert_eq!(http.status(), Some(404));
    assert_eq!(ApiError::Transport("offline".to_string()).status(), None);
    assert_eq!(ApiError::MissingField("token").status(), None);
  }

  #[test]
  fn test_display_formats() {
    let err = ApiError::Http { status: 401, message: "username or password is incorrect".to_string() };
    assert_eq!(err.to_string(), "HTTP 401: username or password is incorrect");
    assert_eq!(
      ApiError::MissingField("token").to_string(),
      "Response was missing the `token` field"
    );
  }

  #[test]
  fn test_json_errors_map_to_decode() {
    let err = serde_json::from_str::<u64>("not json").unwrap_err();
    assert!(matches!(ApiError::from(err), ApiError::Decode(_)));
  }
}
