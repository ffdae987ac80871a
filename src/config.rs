use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Public API endpoint, used by release builds.
const PUBLIC_API_URL: &str = "https://fakestoreapi.com";
/// Development builds default to the local proxy so traffic stays
/// inspectable.
const DEV_API_URL: &str = "http://localhost:5173/api";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL requests are issued against.
  #[serde(default = "default_base_url")]
  pub base_url: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
    }
  }
}

fn default_base_url() -> String {
  if cfg!(debug_assertions) {
    DEV_API_URL.to_string()
  } else {
    PUBLIC_API_URL.to_string()
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./shopfront.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/shopfront/config.yaml
  ///
  /// The API needs no credentials and every field has a default, so a
  /// missing file is fine. An explicit path that does not exist is still
  /// an error.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Config::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("shopfront.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("shopfront").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// The effective base URL. SHOPFRONT_API_URL overrides whatever the
  /// config file says.
  pub fn base_url(&self) -> String {
    std::env::var("SHOPFRONT_API_URL").unwrap_or_else(|_| self.api.base_url.clone())
  }

  /// Password for `login` when not passed as a flag.
  ///
  /// Checks SHOPFRONT_PASSWORD.
  pub fn get_password() -> Result<String> {
    std::env::var("SHOPFRONT_PASSWORD").map_err(|_| {
      eyre!("Password not provided. Pass --password or set SHOPFRONT_PASSWORD.")
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_need_no_file() {
    let config = Config::default();
    assert_eq!(config.api.base_url, default_base_url());
    assert!(config.api.base_url.starts_with("http"));
  }

  #[test]
  fn test_yaml_overrides_the_base_url() {
    let config: Config =
      serde_yaml::from_str("api:\n  base_url: https://store.example.test\n").unwrap();
    assert_eq!(config.api.base_url, "https://store.example.test");
  }

  #[test]
  fn test_missing_sections_fall_back_to_defaults() {
    let config: Config = serde_yaml::from_str("api: {}\n").unwrap();
    assert_eq!(config.api.base_url, default_base_url());
  }

  #[test]
  fn test_env_var_overrides_the_config() {
    let config = Config::default();
    std::env::set_var("SHOPFRONT_API_URL", "http://127.0.0.1:9999");
    let url = config.base_url();
    std::env::remove_var("SHOPFRONT_API_URL");

    assert_eq!(url, "http://127.0.0.1:9999");
    assert_eq!(config.base_url(), default_base_url());
  }
}
