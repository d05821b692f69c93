//! `journey`: terminal client for the keychain journey tracker.
//!
//! # Usage
//!
//! ```
//! journey --url http://localhost:3000 --id 7
//! journey story 7
//! journey reaction 7-1 1
//! ```

mod app;
mod client;
mod form;
mod ui;

use std::{io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use journey_core::keychain::{KeychainId, Route};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:3000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "journey", about = "Follow a keychain from hand to hand")]
struct Args {
  /// Path to a TOML config file (url, timeout_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the journey server (default: http://localhost:3000).
  #[arg(long, env = "JOURNEY_URL")]
  url: Option<String>,

  /// Open straight onto this keychain, as scanning its tag would.
  #[arg(long, value_name = "N")]
  id: Option<String>,

  /// Write logs here. Nothing is logged otherwise.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the shareable story of a keychain.
  Story { id: String },
  /// Ask which reaction the elephant gives at a station.
  Reaction {
    journey_id:     String,
    station_number: u32,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug, PartialEq)]
struct ConfigFile {
  #[serde(default)]
  url:          String,
  #[serde(default)]
  timeout_secs: Option<u64>,
}

fn api_config(args_url: Option<String>, file_cfg: &ConfigFile) -> ApiConfig {
  // CLI flags override config file, which overrides defaults.
  ApiConfig {
    base_url: args_url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    timeout:  Duration::from_secs(file_cfg.timeout_secs.unwrap_or(10)),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(path) = &args.log_file {
    let file = std::fs::File::create(path)
      .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
      .with_writer(Mutex::new(file))
      .with_ansi(false)
      .with_env_filter(
        EnvFilter::builder()
          .with_default_directive(LevelFilter::INFO.into())
          .from_env_lossy(),
      )
      .init();
  }

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let client = ApiClient::new(api_config(args.url, &file_cfg))?;

  match args.command {
    Some(Command::Story { id }) => {
      let id: KeychainId = id.parse().context("invalid keychain id")?;
      print!("{}", client.story(id).await?);
      Ok(())
    }
    Some(Command::Reaction { journey_id, station_number }) => {
      let card = client.reaction(&journey_id, station_number).await?;
      println!("{}", card.reaction_text);
      println!("  #{} {:?}/{:?} seed {}", card.id, card.category, card.emotion_type, card.seed);
      Ok(())
    }
    None => run_tui(client, Route::from_query(args.id.as_deref())).await,
  }
}

async fn run_tui(client: ApiClient, route: Route) -> Result<()> {
  let mut app = App::new(client, route);

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let load_result = app.load_initial().await;

  // Run the event loop; restore terminal even on error.
  let run_result = if load_result.is_ok() {
    run_event_loop(&mut terminal, &mut app).await
  } else {
    load_result
  };

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flag_beats_file_beats_default() {
    let file: ConfigFile = toml::from_str("url = \"http://kiosk:3000\"\ntimeout_secs = 3").unwrap();
    assert_eq!(api_config(None, &file).base_url, "http://kiosk:3000");
    assert_eq!(api_config(None, &file).timeout, Duration::from_secs(3));
    assert_eq!(api_config(Some("http://cli".into()), &file).base_url, "http://cli");
    assert_eq!(api_config(None, &ConfigFile::default()).base_url, DEFAULT_URL);
  }

  #[test]
  fn subcommands_parse() {
    let args = Args::try_parse_from(["journey", "reaction", "7-1", "1"]).unwrap();
    assert!(matches!(
      args.command,
      Some(Command::Reaction { ref journey_id, station_number: 1 }) if journey_id == "7-1"
    ));
    let args = Args::try_parse_from(["journey", "--id", "7"]).unwrap();
    assert_eq!(Route::from_query(args.id.as_deref()), Route::Keychain(KeychainId::new(7).unwrap()));
  }
}
