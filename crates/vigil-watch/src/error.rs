//! Error type for `vigil-watch`.
//!
//! Service and store errors are boxed so the watcher does not leak its type
//! parameters into every caller's signatures.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("ticket service error: {0}")]
  Service(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("state store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("ticket not found: {0}")]
  TicketNotFound(Uuid),
}

impl Error {
  pub fn service<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Service(Box::new(e))
  }

  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
