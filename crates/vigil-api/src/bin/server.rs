//! vigil-api server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), builds an
//! in-memory ticket directory, and serves the JSON API over HTTP. With
//! `seed_demo = true` the directory starts with a handful of tickets so the
//! watcher has something to poll.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vigil_api::{ServerConfig, TicketDirectory, directory::OpenTicket};
use vigil_core::ticket::{Person, TicketPriority};

#[derive(Parser)]
#[command(author, version, about = "Vigil ticket API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VIGIL"))
    .set_default("host", "127.0.0.1")?
    .set_default("port", 5230)?
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let directory = TicketDirectory::new();
  if server_cfg.seed_demo {
    seed_demo(&directory);
    tracing::info!("seeded demo tickets");
  }

  let app = vigil_api::api_router(Arc::new(directory))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// A small fixed dataset for local development.
fn seed_demo(directory: &TicketDirectory) {
  directory.add_support_user("Dana Ops", "dana@example.com");
  directory.add_support_user("Lee Support", "lee@example.com");
  let acme = directory.add_client("Acme Corp");

  directory.open_ticket(OpenTicket {
    subject:  "Cannot download invoice PDF".into(),
    category: "billing".into(),
    priority: TicketPriority::High,
    creator:  Person {
      name:  "Alice Liddell".into(),
      email: "alice@acme.example".into(),
    },
    client:   Some(acme.client_id),
    body:     "The invoice download link returns a 500.".into(),
  });
  directory.open_ticket(OpenTicket {
    subject:  "Annual report filing question".into(),
    category: "compliance".into(),
    priority: TicketPriority::Medium,
    creator:  Person {
      name:  "Bob Hargreave".into(),
      email: "bob@acme.example".into(),
    },
    client:   Some(acme.client_id),
    body:     "Which state form do we need for the amendment?".into(),
  });
  directory.open_ticket(OpenTicket {
    subject:  "Urgent: account locked".into(),
    category: "access".into(),
    priority: TicketPriority::Urgent,
    creator:  Person {
      name:  "Carol Finch".into(),
      email: "carol@example.net".into(),
    },
    client:   None,
    body:     "Locked out after too many login attempts.".into(),
  });
}
