//! journey-server binary.
//!
//! Reads `journey.toml` (or the path given with `--config`), opens the
//! configured store, and serves the JSON API over HTTP.
//!
//! # Admin password hash
//!
//! To generate the argon2 PHC string for `admin.password_hash`:
//!
//! ```
//! cargo run -p journey-server -- --hash-password
//! ```

mod settings;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use journey_api::AppState;
use journey_core::{memory::MemoryStore, ratelimit::SlidingWindowLimiter, store::JourneyStore};
use journey_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ServerConfig, StoreKind, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Keychain journey server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "journey.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = rpassword_or_stdin()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  if server_cfg.admin.is_none() {
    tracing::warn!("no [admin] section configured; moderation endpoints will reject every request");
  }
  if !server_cfg.rate_limit.enabled {
    tracing::warn!("blessing rate limiting is disabled");
  }

  match server_cfg.store {
    StoreKind::Sqlite => {
      let store_path = expand_tilde(&server_cfg.store_path);
      let store = SqliteStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open store at {store_path:?}"))?;
      tracing::info!(path = %store_path.display(), "opened sqlite store");
      serve(store, server_cfg).await
    }
    StoreKind::Memory => {
      tracing::info!("using in-memory store");
      serve(MemoryStore::new(), server_cfg).await
    }
  }
}

async fn serve<S: JourneyStore + 'static>(store: S, cfg: ServerConfig) -> anyhow::Result<()> {
  let state = AppState::new(Arc::new(store))
    .with_limiter(Arc::new(SlidingWindowLimiter::new(cfg.rate_limit.clone())))
    .with_rules(cfg.rules.clone())
    .with_admin(cfg.admin.clone())
    .with_store_timeout(cfg.store_timeout())
    .with_trust_forwarded(cfg.trust_forwarded);

  let app = journey_api::router(state)
    .layer(cors_layer(&cfg.cors_origins)?)
    .layer(TraceLayer::new_for_http());

  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("shut down cleanly");
  Ok(())
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
  let origins = origins
    .iter()
    .map(|o| HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin {o:?}")))
    .collect::<anyhow::Result<Vec<_>>>()?;

  Ok(
    CorsLayer::new()
      .allow_origin(AllowOrigin::list(origins))
      .allow_methods([Method::GET, Method::POST, Method::PATCH])
      .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
      .expose_headers([header::RETRY_AFTER]),
  )
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("failed to listen for ctrl-c: {e}");
    std::future::pending::<()>().await;
  }
}

/// Read a password from stdin.
fn rpassword_or_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
