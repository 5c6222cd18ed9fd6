//! Handlers for unread-count tracking.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/unread` | `?operator_id` required; per-ticket unread counts |
//! | `POST` | `/tickets/:id/viewed` | body: `{"operator_id": ...}`; returns 204 |

use std::{collections::HashMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vigil_core::service::TicketService;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CountParams {
  pub operator_id: Uuid,
}

/// Wire shape of the unread-count response.
#[derive(Debug, Serialize)]
pub struct UnreadBody {
  pub unread_counts: HashMap<Uuid, u32>,
}

/// `GET /unread?operator_id=<id>`
pub async fn counts<S>(
  State(service): State<Arc<S>>,
  Query(params): Query<CountParams>,
) -> Result<Json<UnreadBody>, ApiError>
where
  S: TicketService,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let unread_counts = service
    .unread_counts(params.operator_id)
    .await
    .map_err(ApiError::service)?;
  Ok(Json(UnreadBody { unread_counts }))
}

#[derive(Debug, Deserialize)]
pub struct ViewedBody {
  pub operator_id: Uuid,
}

/// `POST /tickets/:id/viewed` — record that the operator opened the detail
/// view now. Subsequent unread fetches report zero for this ticket until new
/// messages arrive.
pub async fn mark_viewed<S>(
  State(service): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ViewedBody>,
) -> Result<StatusCode, ApiError>
where
  S: TicketService,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  service
    .mark_viewed(id, body.operator_id)
    .await
    .map_err(ApiError::service)?;
  Ok(StatusCode::NO_CONTENT)
}
