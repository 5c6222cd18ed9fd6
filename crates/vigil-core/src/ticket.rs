//! Ticket types — the records a support operator watches.
//!
//! A ticket owns its conversation history. Messages are append-only: once
//! created they are never edited or deleted, so a ticket's message count is
//! monotonically non-decreasing until the ticket itself is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

// ─── Status & priority ───────────────────────────────────────────────────────

/// Workflow state of a ticket. `Closed` is terminal — a closed ticket
/// accepts no further replies.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "kebab-case")]
pub enum TicketStatus {
  Open,
  InProgress,
  Resolved,
  Closed,
}

impl TicketStatus {
  pub fn is_terminal(&self) -> bool { matches!(self, Self::Closed) }
}

/// Display-level urgency. No ordering is enforced beyond presentation.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TicketPriority {
  Low,
  Medium,
  High,
  Urgent,
}

// ─── People ──────────────────────────────────────────────────────────────────

/// Display identity for a customer or staff member attached to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub name:  String,
  pub email: String,
}

/// A support-staff account that tickets can be assigned to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportUser {
  pub user_id: Uuid,
  pub name:    String,
  pub email:   String,
}

/// A customer account whose users open tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientAccount {
  pub client_id: Uuid,
  pub name:      String,
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
  /// The customer who opened the ticket.
  Creator,
  /// A support operator.
  Staff,
  /// Automated system notice (e.g. status-change audit line).
  System,
}

/// A file attached to a message. The binary lives behind `file_url`; no
/// payload data travels with the ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
  pub attachment_id: Uuid,
  pub name:          String,
  pub size:          u64,
  pub file_url:      String,
}

/// One entry in a ticket's conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub message_id:  Uuid,
  pub content:     String,
  pub sender:      MessageSender,
  pub sender_name: String,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub attachments: Vec<Attachment>,
}

// ─── Ticket ──────────────────────────────────────────────────────────────────

/// A customer support request with its conversation history.
///
/// `messages` is ordered most-recent-first. `updated_at` changes on any
/// mutation: status, priority, assignment, or a new message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
  pub ticket_id:   Uuid,
  pub subject:     String,
  pub status:      TicketStatus,
  pub priority:    TicketPriority,
  pub category:    String,
  pub creator_id:  Uuid,
  pub creator:     Person,
  /// `None` means unassigned.
  pub assignee_id: Option<Uuid>,
  pub assignee:    Option<Person>,
  pub messages:    Vec<Message>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Ticket {
  /// The most recent message, if any. Messages are most-recent-first.
  pub fn latest_message(&self) -> Option<&Message> { self.messages.first() }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Counts shown in the dashboard header, recomputed server-side per fetch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TicketStats {
  pub total:       u64,
  pub open:        u64,
  pub in_progress: u64,
  pub resolved:    u64,
  pub closed:      u64,
  pub urgent:      u64,
}

/// Pagination envelope returned alongside a page of tickets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
  /// 1-indexed current page.
  pub page:        u32,
  pub page_size:   u32,
  pub total:       u64,
  pub total_pages: u32,
}

impl Pagination {
  /// Compute the envelope for `total` items at `page_size` per page.
  pub fn for_page(page: u32, page_size: u32, total: u64) -> Self {
    let total_pages = if total == 0 {
      1
    } else {
      total.div_ceil(u64::from(page_size.max(1))) as u32
    };
    Self { page, page_size, total, total_pages }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn closed_is_the_only_terminal_status() {
    assert!(TicketStatus::Closed.is_terminal());
    assert!(!TicketStatus::Open.is_terminal());
    assert!(!TicketStatus::InProgress.is_terminal());
    assert!(!TicketStatus::Resolved.is_terminal());
  }

  #[test]
  fn pagination_rounds_up() {
    let p = Pagination::for_page(1, 20, 41);
    assert_eq!(p.total_pages, 3);
  }

  #[test]
  fn pagination_empty_has_one_page() {
    let p = Pagination::for_page(1, 20, 0);
    assert_eq!(p.total_pages, 1);
  }
}
