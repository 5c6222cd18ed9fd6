//! Handlers for `/tickets` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tickets` | paginated; optional `search`, `priority`, `category`, `assignee`, `client` |
//! | `GET`    | `/tickets/:id` | single ticket with full conversation |
//! | `PATCH`  | `/tickets/:id` | body: [`TicketPatch`]; returns the updated ticket |
//! | `DELETE` | `/tickets/:id` | returns 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use vigil_core::{
  service::{TicketQuery, TicketService, TicketUpdate},
  ticket::{Pagination, Ticket, TicketPriority, TicketStatus},
};

use crate::error::ApiError;

// ─── List ────────────────────────────────────────────────────────────────────

fn default_page() -> u32 { 1 }
fn default_page_size() -> u32 { 20 }

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default = "default_page")]
  pub page:      u32,
  #[serde(default = "default_page_size")]
  pub page_size: u32,
  pub search:    Option<String>,
  pub priority:  Option<TicketPriority>,
  pub category:  Option<String>,
  pub assignee:  Option<Uuid>,
  pub client:    Option<Uuid>,
}

impl From<ListParams> for TicketQuery {
  fn from(p: ListParams) -> Self {
    TicketQuery {
      page:      p.page,
      page_size: p.page_size,
      search:    p.search,
      priority:  p.priority,
      category:  p.category,
      assignee:  p.assignee,
      client:    p.client,
    }
  }
}

/// Wire shape of a ticket page.
#[derive(Debug, Serialize)]
pub struct TicketPageBody {
  pub tickets:    Vec<Ticket>,
  pub pagination: Pagination,
}

/// `GET /tickets?page=1&page_size=20[&search=...][&priority=...]`
pub async fn list<S>(
  State(service): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<TicketPageBody>, ApiError>
where
  S: TicketService,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let page = service
    .list_tickets(&TicketQuery::from(params))
    .await
    .map_err(ApiError::service)?;
  Ok(Json(TicketPageBody {
    tickets:    page.tickets,
    pagination: page.pagination,
  }))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /tickets/:id`
pub async fn get_one<S>(
  State(service): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Ticket>, ApiError>
where
  S: TicketService,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let ticket = service
    .ticket_detail(id)
    .await
    .map_err(ApiError::service)?
    .ok_or_else(|| ApiError::NotFound(format!("ticket {id} not found")))?;
  Ok(Json(ticket))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Distinguishes "field absent" from "field set to null": an absent
/// `assignee` leaves the assignment untouched; an explicit `null` unassigns.
fn double_option<'de, D>(d: D) -> Result<Option<Option<Uuid>>, D::Error>
where
  D: Deserializer<'de>,
{
  Option::<Uuid>::deserialize(d).map(Some)
}

/// JSON body accepted by `PATCH /tickets/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct TicketPatch {
  pub status:   Option<TicketStatus>,
  pub priority: Option<TicketPriority>,
  #[serde(default, deserialize_with = "double_option")]
  pub assignee: Option<Option<Uuid>>,
}

/// `PATCH /tickets/:id` — returns the updated ticket.
pub async fn update_one<S>(
  State(service): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<TicketPatch>,
) -> Result<Json<Ticket>, ApiError>
where
  S: TicketService,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let update = TicketUpdate {
    status:   body.status,
    priority: body.priority,
    assignee: body.assignee,
  };
  let ticket = service
    .update_ticket(id, update)
    .await
    .map_err(ApiError::service)?;
  Ok(Json(ticket))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /tickets/:id` — returns 204.
pub async fn delete_one<S>(
  State(service): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: TicketService,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  service
    .delete_ticket(id)
    .await
    .map_err(ApiError::service)?;
  Ok(StatusCode::NO_CONTENT)
}
