//! Handler for `POST /tickets/:id/messages` — append a reply.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use vigil_core::{
  service::{NewMessage, TicketService},
  ticket::{Attachment, MessageSender},
};

use crate::error::ApiError;

/// JSON body accepted by `POST /tickets/:id/messages`.
#[derive(Debug, Deserialize)]
pub struct NewMessageBody {
  pub content:     String,
  /// Defaults to staff — the admin dashboard is the staff side.
  pub sender:      Option<MessageSender>,
  pub sender_name: String,
  #[serde(default)]
  pub attachments: Vec<Attachment>,
}

/// `POST /tickets/:id/messages` — returns 201 + the stored message.
///
/// Replies to closed tickets are rejected with 409.
pub async fn create<S>(
  State(service): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewMessageBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TicketService,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let message = service
    .create_message(NewMessage {
      ticket_id:   id,
      content:     body.content,
      sender:      body.sender.unwrap_or(MessageSender::Staff),
      sender_name: body.sender_name,
      attachments: body.attachments,
    })
    .await
    .map_err(ApiError::service)?;
  Ok((StatusCode::CREATED, Json(message)))
}
