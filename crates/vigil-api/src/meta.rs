//! Read-only listing and aggregate endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};
use vigil_core::{
  service::TicketService,
  ticket::{ClientAccount, SupportUser, TicketStats},
};

use crate::error::ApiError;

/// `GET /stats`
pub async fn stats<S>(
  State(service): State<Arc<S>>,
) -> Result<Json<TicketStats>, ApiError>
where
  S: TicketService,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Ok(Json(service.stats().await.map_err(ApiError::service)?))
}

/// `GET /support-users`
pub async fn support_users<S>(
  State(service): State<Arc<S>>,
) -> Result<Json<Vec<SupportUser>>, ApiError>
where
  S: TicketService,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Ok(Json(
    service.support_users().await.map_err(ApiError::service)?,
  ))
}

/// `GET /clients`
pub async fn clients<S>(
  State(service): State<Arc<S>>,
) -> Result<Json<Vec<ClientAccount>>, ApiError>
where
  S: TicketService,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Ok(Json(
    service.client_accounts().await.map_err(ApiError::service)?,
  ))
}
