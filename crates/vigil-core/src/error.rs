//! Error types for `vigil-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("ticket not found: {0}")]
  TicketNotFound(Uuid),

  #[error("ticket {0} is closed and accepts no further replies")]
  TicketClosed(Uuid),

  #[error("message content must not be empty")]
  EmptyMessage,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
