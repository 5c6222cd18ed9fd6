//! Async HTTP client wrapping the vigil JSON API.
//!
//! Implements [`TicketService`] so the watcher polls a remote server the
//! same way it polls the in-memory directory in tests.

use std::{collections::HashMap, time::Duration};

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;
use vigil_core::{
  service::{NewMessage, TicketPage, TicketQuery, TicketService, TicketUpdate},
  ticket::{
    ClientAccount, Message, Pagination, SupportUser, Ticket, TicketStats,
  },
};

/// Connection settings for the vigil API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} {path} returned {status}: {message}")]
  Api {
    method:  Method,
    path:    String,
    status:  StatusCode,
    message: String,
  },
}

/// Async HTTP client for the vigil JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Deserialize)]
struct TicketPageBody {
  tickets:    Vec<Ticket>,
  pagination: Pagination,
}

#[derive(Deserialize)]
struct UnreadBody {
  unread_counts: HashMap<Uuid, u32>,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.config.base_url.trim_end_matches('/'))
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let req = self.client.request(method, self.url(path));
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// Turn a non-success response into [`ClientError::Api`], extracting the
  /// server's `{"error": ...}` message when there is one.
  async fn check(
    method: Method,
    path: &str,
    resp: reqwest::Response,
  ) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = match resp.json::<ErrorBody>().await {
      Ok(body) => body.error,
      Err(_) => status.to_string(),
    };
    Err(ClientError::Api { method, path: path.to_string(), status, message })
  }

  async fn get_json<T: serde::de::DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T, ClientError> {
    let resp = self
      .request(Method::GET, path)
      .query(query)
      .send()
      .await?;
    Ok(Self::check(Method::GET, path, resp).await?.json().await?)
  }
}

impl TicketService for ApiClient {
  type Error = ClientError;

  /// `GET /tickets?page=..&page_size=..[&search=..][&priority=..]`
  async fn list_tickets(
    &self,
    query: &TicketQuery,
  ) -> Result<TicketPage, ClientError> {
    let mut params = vec![
      ("page", query.page.to_string()),
      ("page_size", query.page_size.to_string()),
    ];
    if let Some(search) = &query.search {
      params.push(("search", search.clone()));
    }
    if let Some(priority) = query.priority {
      params.push(("priority", priority.to_string()));
    }
    if let Some(category) = &query.category {
      params.push(("category", category.clone()));
    }
    if let Some(assignee) = query.assignee {
      params.push(("assignee", assignee.to_string()));
    }
    if let Some(client) = query.client {
      params.push(("client", client.to_string()));
    }

    let body: TicketPageBody = self.get_json("/tickets", &params).await?;
    Ok(TicketPage { tickets: body.tickets, pagination: body.pagination })
  }

  /// `GET /tickets/{id}` — 404 maps to `None`.
  async fn ticket_detail(
    &self,
    ticket_id: Uuid,
  ) -> Result<Option<Ticket>, ClientError> {
    let path = format!("/tickets/{ticket_id}");
    let resp = self.request(Method::GET, &path).send().await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Ok(Some(Self::check(Method::GET, &path, resp).await?.json().await?))
  }

  /// `GET /unread?operator_id={id}`
  async fn unread_counts(
    &self,
    operator_id: Uuid,
  ) -> Result<HashMap<Uuid, u32>, ClientError> {
    let body: UnreadBody = self
      .get_json("/unread", &[("operator_id", operator_id.to_string())])
      .await?;
    Ok(body.unread_counts)
  }

  /// `GET /stats`
  async fn stats(&self) -> Result<TicketStats, ClientError> {
    self.get_json("/stats", &[]).await
  }

  /// `GET /support-users`
  async fn support_users(&self) -> Result<Vec<SupportUser>, ClientError> {
    self.get_json("/support-users", &[]).await
  }

  /// `GET /clients`
  async fn client_accounts(&self) -> Result<Vec<ClientAccount>, ClientError> {
    self.get_json("/clients", &[]).await
  }

  /// `PATCH /tickets/{id}`
  ///
  /// The `assignee` key is only present when the update touches assignment;
  /// an explicit `null` unassigns.
  async fn update_ticket(
    &self,
    ticket_id: Uuid,
    update: TicketUpdate,
  ) -> Result<Ticket, ClientError> {
    let mut body = serde_json::Map::new();
    if let Some(status) = update.status {
      body.insert("status".into(), json!(status));
    }
    if let Some(priority) = update.priority {
      body.insert("priority".into(), json!(priority));
    }
    if let Some(assignee) = update.assignee {
      body.insert("assignee".into(), json!(assignee));
    }

    let path = format!("/tickets/{ticket_id}");
    let resp = self
      .request(Method::PATCH, &path)
      .json(&body)
      .send()
      .await?;
    Ok(Self::check(Method::PATCH, &path, resp).await?.json().await?)
  }

  /// `DELETE /tickets/{id}`
  async fn delete_ticket(&self, ticket_id: Uuid) -> Result<(), ClientError> {
    let path = format!("/tickets/{ticket_id}");
    let resp = self.request(Method::DELETE, &path).send().await?;
    Self::check(Method::DELETE, &path, resp).await?;
    Ok(())
  }

  /// `POST /tickets/{id}/messages`
  async fn create_message(
    &self,
    input: NewMessage,
  ) -> Result<Message, ClientError> {
    let path = format!("/tickets/{}/messages", input.ticket_id);
    let resp = self
      .request(Method::POST, &path)
      .json(&json!({
        "content":     input.content,
        "sender":      input.sender,
        "sender_name": input.sender_name,
        "attachments": input.attachments,
      }))
      .send()
      .await?;
    Ok(Self::check(Method::POST, &path, resp).await?.json().await?)
  }

  /// `POST /tickets/{id}/viewed`
  async fn mark_viewed(
    &self,
    ticket_id: Uuid,
    operator_id: Uuid,
  ) -> Result<(), ClientError> {
    let path = format!("/tickets/{ticket_id}/viewed");
    let resp = self
      .request(Method::POST, &path)
      .json(&json!({ "operator_id": operator_id }))
      .send()
      .await?;
    Self::check(Method::POST, &path, resp).await?;
    Ok(())
  }
}
