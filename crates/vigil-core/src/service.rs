//! The `TicketService` trait and supporting query types.
//!
//! The trait is the collaborator surface the watcher orchestrates over. It is
//! implemented by the in-memory directory in `vigil-api` and by the HTTP
//! client in `vigil-cli`; the desk in `vigil-watch` depends only on this
//! abstraction.

use std::{collections::HashMap, future::Future};

use uuid::Uuid;

use crate::ticket::{
  ClientAccount, Message, Pagination, SupportUser, Ticket, TicketPriority,
  TicketStats, TicketStatus,
};

// ─── Query & payload types ───────────────────────────────────────────────────

/// Parameters for [`TicketService::list_tickets`].
#[derive(Debug, Clone)]
pub struct TicketQuery {
  /// 1-indexed page.
  pub page:      u32,
  pub page_size: u32,
  /// Free-text filter over subject and message content.
  pub search:    Option<String>,
  pub priority:  Option<TicketPriority>,
  pub category:  Option<String>,
  /// Restrict to tickets assigned to this operator.
  pub assignee:  Option<Uuid>,
  /// Restrict to tickets opened by users of this client account.
  pub client:    Option<Uuid>,
}

impl Default for TicketQuery {
  fn default() -> Self {
    Self {
      page:      1,
      page_size: 20,
      search:    None,
      priority:  None,
      category:  None,
      assignee:  None,
      client:    None,
    }
  }
}

/// One page of tickets plus its pagination envelope.
#[derive(Debug, Clone)]
pub struct TicketPage {
  pub tickets:    Vec<Ticket>,
  pub pagination: Pagination,
}

/// Partial update applied to a single ticket. `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct TicketUpdate {
  pub status:   Option<TicketStatus>,
  pub priority: Option<TicketPriority>,
  /// `Some(None)` unassigns; `Some(Some(id))` reassigns; `None` leaves as-is.
  pub assignee: Option<Option<Uuid>>,
}

/// Input to [`TicketService::create_message`]. `created_at` and the message
/// id are assigned by the service, never by callers.
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub ticket_id:   Uuid,
  pub content:     String,
  pub sender:      crate::ticket::MessageSender,
  pub sender_name: String,
  pub attachments: Vec<crate::ticket::Attachment>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the ticket backend the watcher polls and mutates.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with `axum`, the poller task).
pub trait TicketService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Fetch one page of tickets matching `query`.
  fn list_tickets<'a>(
    &'a self,
    query: &'a TicketQuery,
  ) -> impl Future<Output = Result<TicketPage, Self::Error>> + Send + 'a;

  /// Fetch a single ticket with its full conversation. `None` if missing.
  fn ticket_detail(
    &self,
    ticket_id: Uuid,
  ) -> impl Future<Output = Result<Option<Ticket>, Self::Error>> + Send + '_;

  /// Per-ticket unread message counts for `operator_id`. The returned map
  /// replaces any previously fetched map wholesale.
  fn unread_counts(
    &self,
    operator_id: Uuid,
  ) -> impl Future<Output = Result<HashMap<Uuid, u32>, Self::Error>> + Send + '_;

  /// Aggregate counts for the dashboard header.
  fn stats(
    &self,
  ) -> impl Future<Output = Result<TicketStats, Self::Error>> + Send + '_;

  /// All support-staff accounts tickets can be assigned to.
  fn support_users(
    &self,
  ) -> impl Future<Output = Result<Vec<SupportUser>, Self::Error>> + Send + '_;

  /// All customer accounts.
  fn client_accounts(
    &self,
  ) -> impl Future<Output = Result<Vec<ClientAccount>, Self::Error>> + Send + '_;

  // ── Mutations ─────────────────────────────────────────────────────────

  /// Apply a partial update and return the updated ticket.
  fn update_ticket(
    &self,
    ticket_id: Uuid,
    update: TicketUpdate,
  ) -> impl Future<Output = Result<Ticket, Self::Error>> + Send + '_;

  /// Delete a ticket and its conversation.
  fn delete_ticket(
    &self,
    ticket_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append a reply to a ticket. Fails on closed tickets.
  fn create_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Record that `operator_id` has viewed `ticket_id` now. Subsequent
  /// [`TicketService::unread_counts`] fetches report zero for that ticket
  /// until new messages arrive — eventually consistent, not transactional.
  fn mark_viewed(
    &self,
    ticket_id: Uuid,
    operator_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
