//! `vigil` — terminal watcher for a vigil ticket server.
//!
//! # Usage
//!
//! ```
//! vigil --url http://localhost:5230 --operator-id <uuid> --operator-name Dana
//! vigil --config ~/.config/vigil/config.toml
//! ```
//!
//! Polls the server at the configured interval and prints notification
//! events as they happen: new tickets, new messages, status changes. State
//! (which tickets have been observed, notification history) persists in a
//! local sqlite file so a restart does not re-announce old tickets.

mod client;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use clap::Parser;
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vigil_core::notify::NotificationEvent;
use vigil_store_sqlite::SqliteStateStore;
use vigil_watch::{Operator, WatchConfig, Watcher};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "vigil", about = "Watch a vigil ticket server for activity")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the vigil server (default: http://localhost:5230).
  #[arg(long, env = "VIGIL_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "VIGIL_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "VIGIL_PASSWORD")]
  password: Option<String>,

  /// Support-user id to track unread counts for.
  #[arg(long, env = "VIGIL_OPERATOR_ID")]
  operator_id: Option<Uuid>,

  /// Name used as the sender on replies (default: the operator id).
  #[arg(long, env = "VIGIL_OPERATOR_NAME")]
  operator_name: Option<String>,

  /// Path of the local state database (default: vigil-state.db).
  #[arg(long, env = "VIGIL_STATE_DB")]
  state_db: Option<PathBuf>,

  /// Poll interval in seconds (default: 30).
  #[arg(long)]
  interval: Option<u64>,

  /// Refresh once, print the current desk, and exit.
  #[arg(long)]
  once: bool,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:           String,
  #[serde(default)]
  username:      String,
  #[serde(default)]
  password:      String,
  operator_id:   Option<Uuid>,
  operator_name: Option<String>,
  state_db:      Option<PathBuf>,
  interval_secs: Option<u64>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:5230".to_string()),
    username: args
      .user
      .or_else(|| (!file_cfg.username.is_empty()).then(|| file_cfg.username.clone()))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| (!file_cfg.password.is_empty()).then(|| file_cfg.password.clone()))
      .unwrap_or_default(),
  };

  let Some(operator_id) = args.operator_id.or(file_cfg.operator_id) else {
    bail!("an operator id is required (--operator-id, VIGIL_OPERATOR_ID, or the config file)");
  };
  let operator = Operator {
    user_id: operator_id,
    name:    args
      .operator_name
      .or(file_cfg.operator_name)
      .unwrap_or_else(|| operator_id.to_string()),
  };

  let state_db = args
    .state_db
    .or(file_cfg.state_db)
    .unwrap_or_else(|| PathBuf::from("vigil-state.db"));
  let interval = args
    .interval
    .or(file_cfg.interval_secs)
    .unwrap_or(30);

  let client = ApiClient::new(api_config).context("building API client")?;
  let store = SqliteStateStore::open(&state_db)
    .await
    .with_context(|| format!("opening state db {}", state_db.display()))?;

  let watcher = Watcher::new(client, store, operator, WatchConfig {
    poll_interval: Duration::from_secs(interval),
    ..WatchConfig::default()
  });

  watcher
    .load_initial()
    .await
    .context("initial load failed")?;
  print_desk(&watcher);

  if args.once {
    return Ok(());
  }

  // Stream events until interrupted.
  let mut events = watcher.subscribe();
  let poller = watcher.start_polling();

  loop {
    tokio::select! {
      event = events.recv() => match event {
        Ok(event) => print_event(&event),
        Err(RecvError::Lagged(missed)) => {
          eprintln!("(skipped {missed} events)");
        }
        Err(RecvError::Closed) => break,
      },
      _ = tokio::signal::ctrl_c() => break,
    }
  }

  poller.stop().await;
  Ok(())
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_desk(watcher: &Watcher<ApiClient, SqliteStateStore>) {
  watcher.desk(|desk| {
    println!(
      "{} tickets ({} open, {} in progress, {} urgent)",
      desk.stats.total, desk.stats.open, desk.stats.in_progress, desk.stats.urgent,
    );
    for ticket in &desk.tickets {
      let unread = desk.unread.get(&ticket.ticket_id).copied().unwrap_or(0);
      let marker = if unread > 0 { format!(" [{unread} unread]") } else { String::new() };
      println!(
        "  {} {:8} {:11} {}{marker}",
        ticket.ticket_id, ticket.priority, ticket.status, ticket.subject,
      );
    }
  });
}

fn print_event(event: &NotificationEvent) {
  println!(
    "{} {}: {}",
    event.created_at.format("%H:%M:%S"),
    event.title,
    event.description,
  );
}
