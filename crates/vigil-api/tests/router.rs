//! Integration tests for the JSON API router over an in-memory directory.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;
use vigil_api::{TicketDirectory, api_router, directory::OpenTicket};
use vigil_core::ticket::{Person, Ticket, TicketPriority};

fn directory_with_ticket() -> (Arc<TicketDirectory>, Ticket) {
  let directory = TicketDirectory::new();
  let ticket = directory.open_ticket(OpenTicket {
    subject:  "Printer on fire".into(),
    category: "hardware".into(),
    priority: TicketPriority::High,
    creator:  Person {
      name:  "Alice".into(),
      email: "alice@example.com".into(),
    },
    client:   None,
    body:     "There is smoke coming out of the tray.".into(),
  });
  (Arc::new(directory), ticket)
}

async fn request(
  directory: Arc<TicketDirectory>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = api_router(directory)
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();

  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_empty_directory() {
  let (status, body) =
    request(Arc::new(TicketDirectory::new()), "GET", "/tickets", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["tickets"].as_array().unwrap().len(), 0);
  assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn list_returns_seeded_ticket() {
  let (directory, ticket) = directory_with_ticket();
  let (status, body) = request(directory, "GET", "/tickets", None).await;

  assert_eq!(status, StatusCode::OK);
  let tickets = body["tickets"].as_array().unwrap();
  assert_eq!(tickets.len(), 1);
  assert_eq!(tickets[0]["ticket_id"], ticket.ticket_id.to_string());
  assert_eq!(tickets[0]["subject"], "Printer on fire");
}

#[tokio::test]
async fn list_filters_by_priority() {
  let (directory, _ticket) = directory_with_ticket();
  let (_, body) =
    request(directory.clone(), "GET", "/tickets?priority=low", None).await;
  assert_eq!(body["tickets"].as_array().unwrap().len(), 0);

  let (_, body) = request(directory, "GET", "/tickets?priority=high", None).await;
  assert_eq!(body["tickets"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn list_search_matches_message_content() {
  let (directory, _ticket) = directory_with_ticket();
  let (_, body) =
    request(directory, "GET", "/tickets?search=smoke", None).await;
  assert_eq!(body["tickets"].as_array().unwrap().len(), 1);
}

// ─── Detail ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_one_returns_conversation() {
  let (directory, ticket) = directory_with_ticket();
  let (status, body) = request(
    directory,
    "GET",
    &format!("/tickets/{}", ticket.ticket_id),
    None,
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn get_missing_returns_404() {
  let (directory, _) = directory_with_ticket();
  let (status, body) = request(
    directory,
    "GET",
    &format!("/tickets/{}", Uuid::new_v4()),
    None,
  )
  .await;

  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("not found"));
}

// ─── Mutations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn patch_status_and_priority() {
  let (directory, ticket) = directory_with_ticket();
  let (status, body) = request(
    directory,
    "PATCH",
    &format!("/tickets/{}", ticket.ticket_id),
    Some(json!({ "status": "resolved", "priority": "low" })),
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "resolved");
  assert_eq!(body["priority"], "low");
}

#[tokio::test]
async fn patch_explicit_null_unassigns() {
  let (directory, ticket) = directory_with_ticket();
  let user = directory.add_support_user("Dana", "dana@example.com");

  let (_, body) = request(
    directory.clone(),
    "PATCH",
    &format!("/tickets/{}", ticket.ticket_id),
    Some(json!({ "assignee": user.user_id })),
  )
  .await;
  assert_eq!(body["assignee_id"], user.user_id.to_string());
  assert_eq!(body["assignee"]["name"], "Dana");

  let (_, body) = request(
    directory,
    "PATCH",
    &format!("/tickets/{}", ticket.ticket_id),
    Some(json!({ "assignee": null })),
  )
  .await;
  assert_eq!(body["assignee_id"], Value::Null);
}

#[tokio::test]
async fn delete_then_get_returns_404() {
  let (directory, ticket) = directory_with_ticket();
  let uri = format!("/tickets/{}", ticket.ticket_id);

  let (status, _) = request(directory.clone(), "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = request(directory, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Replies ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reply_returns_201_and_grows_conversation() {
  let (directory, ticket) = directory_with_ticket();
  let (status, body) = request(
    directory.clone(),
    "POST",
    &format!("/tickets/{}/messages", ticket.ticket_id),
    Some(json!({ "content": "On it.", "sender_name": "Dana" })),
  )
  .await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["sender"], "staff");

  let (_, body) = request(
    directory,
    "GET",
    &format!("/tickets/{}", ticket.ticket_id),
    None,
  )
  .await;
  let messages = body["messages"].as_array().unwrap();
  assert_eq!(messages.len(), 2);
  // Most-recent-first ordering.
  assert_eq!(messages[0]["content"], "On it.");
}

#[tokio::test]
async fn reply_to_closed_ticket_returns_409() {
  let (directory, ticket) = directory_with_ticket();
  request(
    directory.clone(),
    "PATCH",
    &format!("/tickets/{}", ticket.ticket_id),
    Some(json!({ "status": "closed" })),
  )
  .await;

  let (status, _) = request(
    directory,
    "POST",
    &format!("/tickets/{}/messages", ticket.ticket_id),
    Some(json!({ "content": "too late", "sender_name": "Dana" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn empty_reply_returns_400() {
  let (directory, ticket) = directory_with_ticket();
  let (status, _) = request(
    directory,
    "POST",
    &format!("/tickets/{}/messages", ticket.ticket_id),
    Some(json!({ "content": "   ", "sender_name": "Dana" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Unread tracking ─────────────────────────────────────────────────────────

#[tokio::test]
async fn unread_counts_drop_to_zero_after_viewing() {
  let (directory, ticket) = directory_with_ticket();
  let operator = Uuid::new_v4();
  let unread_uri = format!("/unread?operator_id={operator}");

  // The opening customer message counts as unread.
  let (_, body) = request(directory.clone(), "GET", &unread_uri, None).await;
  assert_eq!(body["unread_counts"][ticket.ticket_id.to_string()], 1);

  let (status, _) = request(
    directory.clone(),
    "POST",
    &format!("/tickets/{}/viewed", ticket.ticket_id),
    Some(json!({ "operator_id": operator })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, body) = request(directory, "GET", &unread_uri, None).await;
  assert_eq!(
    body["unread_counts"]
      .get(ticket.ticket_id.to_string())
      .cloned()
      .unwrap_or(Value::Null),
    Value::Null
  );
}

#[tokio::test]
async fn staff_replies_do_not_count_as_unread() {
  let (directory, ticket) = directory_with_ticket();
  let operator = Uuid::new_v4();

  request(
    directory.clone(),
    "POST",
    &format!("/tickets/{}/viewed", ticket.ticket_id),
    Some(json!({ "operator_id": operator })),
  )
  .await;
  request(
    directory.clone(),
    "POST",
    &format!("/tickets/{}/messages", ticket.ticket_id),
    Some(json!({ "content": "We are looking into it.", "sender_name": "Dana" })),
  )
  .await;

  let (_, body) = request(
    directory,
    "GET",
    &format!("/unread?operator_id={operator}"),
    None,
  )
  .await;
  assert!(body["unread_counts"]
    .get(ticket.ticket_id.to_string())
    .is_none());
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_reflect_status_changes() {
  let (directory, ticket) = directory_with_ticket();
  let (_, body) = request(directory.clone(), "GET", "/stats", None).await;
  assert_eq!(body["total"], 1);
  assert_eq!(body["open"], 1);

  request(
    directory.clone(),
    "PATCH",
    &format!("/tickets/{}", ticket.ticket_id),
    Some(json!({ "status": "in_progress" })),
  )
  .await;

  let (_, body) = request(directory, "GET", "/stats", None).await;
  assert_eq!(body["open"], 0);
  assert_eq!(body["in_progress"], 1);
}

#[tokio::test]
async fn support_users_and_clients_are_listed() {
  let (directory, _) = directory_with_ticket();
  directory.add_support_user("Dana", "dana@example.com");
  directory.add_client("Acme Corp");

  let (_, users) = request(directory.clone(), "GET", "/support-users", None).await;
  assert_eq!(users.as_array().unwrap().len(), 1);

  let (_, clients) = request(directory, "GET", "/clients", None).await;
  assert_eq!(clients[0]["name"], "Acme Corp");
}
