//! Server configuration: an optional TOML file layered with `JOURNEY_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use journey_api::auth::AdminAuth;
use journey_core::{ratelimit::RateLimitConfig, validate::BlessingRules};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
  #[default]
  Sqlite,
  /// Nothing survives a restart.
  Memory,
}

/// Runtime server configuration, deserialised from `journey.toml` and the
/// environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store:            StoreKind,
  pub store_path:       PathBuf,
  pub store_timeout_ms: u64,
  pub rate_limit:       RateLimitConfig,
  pub rules:            BlessingRules,
  pub admin:            Option<AdminAuth>,
  pub cors_origins:     Vec<String>,
  /// Key the rate limiter on `X-Forwarded-For`. Only enable behind a proxy
  /// that sets it.
  pub trust_forwarded:  bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_owned(),
      port:             3000,
      store:            StoreKind::default(),
      store_path:       PathBuf::from("journey.db"),
      store_timeout_ms: 5_000,
      rate_limit:       RateLimitConfig::default(),
      rules:            BlessingRules::default(),
      admin:            None,
      cors_origins:     vec!["http://localhost:5173".to_owned()],
      trust_forwarded:  false,
    }
  }
}

impl ServerConfig {
  /// Layer `file` (if it exists) under `JOURNEY_*` variables. Nested keys use
  /// `__`, e.g. `JOURNEY_RATE_LIMIT__ENABLED=false`.
  pub fn load(file: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("JOURNEY")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_origins"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn store_timeout(&self) -> Duration { Duration::from_millis(self.store_timeout_ms) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::{Config, File, FileFormat};

  use super::*;

  fn from_toml(src: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(src, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_yields_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.store, StoreKind::Sqlite);
    assert_eq!(cfg.rate_limit.max_requests, 3);
    assert_eq!(cfg.rate_limit.window_secs, 300);
    assert_eq!(cfg.rate_limit.max_tracked_keys, 10_000);
    assert_eq!(cfg.rules.blessing_text_max, 15);
    assert!(cfg.admin.is_none());
    assert_eq!(cfg.store_timeout(), Duration::from_secs(5));
  }

  #[test]
  fn nested_sections_override_partially() {
    let cfg = from_toml(
      r#"
      port  = 8080
      store = "memory"

      [rate_limit]
      enabled = false

      [rules]
      optional_note_max = 200

      [admin]
      username      = "ops"
      password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
      "#,
    );
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store, StoreKind::Memory);
    assert!(!cfg.rate_limit.enabled);
    assert_eq!(cfg.rate_limit.max_requests, 3);
    assert_eq!(cfg.rules.optional_note_max, 200);
    assert_eq!(cfg.rules.code_phrase_max, 10);
    assert_eq!(cfg.admin.unwrap().username, "ops");
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/j.db")), PathBuf::from(home).join("j.db"));
    assert_eq!(expand_tilde(Path::new("/tmp/j.db")), PathBuf::from("/tmp/j.db"));
  }
}
