//! JSON REST API for the Vigil ticket backend.
//!
//! Exposes an axum [`Router`] backed by any
//! [`vigil_core::service::TicketService`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", vigil_api::api_router(service.clone()))
//! ```

pub mod directory;
pub mod error;
pub mod messages;
pub mod meta;
pub mod tickets;
pub mod unread;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use vigil_core::service::TicketService;

pub use directory::TicketDirectory;
pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: Arc<S>) -> Router<()>
where
  S: TicketService + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Tickets
    .route("/tickets", get(tickets::list::<S>))
    .route(
      "/tickets/{id}",
      get(tickets::get_one::<S>)
        .patch(tickets::update_one::<S>)
        .delete(tickets::delete_one::<S>),
    )
    // Conversation
    .route("/tickets/{id}/messages", post(messages::create::<S>))
    .route("/tickets/{id}/viewed", post(unread::mark_viewed::<S>))
    // Unread counts
    .route("/unread", get(unread::counts::<S>))
    // Aggregates & listings
    .route("/stats", get(meta::stats::<S>))
    .route("/support-users", get(meta::support_users::<S>))
    .route("/clients", get(meta::clients::<S>))
    .with_state(service)
}

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
  /// Seed the in-memory directory with demo tickets on startup.
  #[serde(default)]
  pub seed_demo: bool,
}
