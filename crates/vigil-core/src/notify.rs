//! Notification events and the bounded in-memory feed.
//!
//! Every detected delta — new ticket, new messages, status change, priority
//! change, reassignment, deletion — becomes one human-readable event. Events
//! are an observability side channel: persisting them is best-effort and
//! never blocks the mutation they describe.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{diff::ActivityDiff, ticket::Ticket};

/// Feed source tag for ticket-derived events.
pub const SOURCE_TICKETS: &str = "tickets";

// ─── Event ───────────────────────────────────────────────────────────────────

/// One entry in the notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
  pub title:       String,
  pub description: String,
  /// Which subsystem produced the event (currently always `"tickets"`).
  pub source:      String,
  pub created_at:  DateTime<Utc>,
}

impl NotificationEvent {
  fn tickets(title: impl Into<String>, description: impl Into<String>) -> Self {
    Self {
      title:       title.into(),
      description: description.into(),
      source:      SOURCE_TICKETS.into(),
      created_at:  Utc::now(),
    }
  }
}

// ─── Mutation events ─────────────────────────────────────────────────────────
//
// One event per delta per mutation call. Two separate calls — say a status
// change followed by a priority change — produce two events, never one.

pub fn status_changed(ticket: &Ticket) -> NotificationEvent {
  NotificationEvent::tickets(
    "Ticket status changed",
    format!("\"{}\" is now {}", ticket.subject, ticket.status),
  )
}

pub fn priority_changed(ticket: &Ticket) -> NotificationEvent {
  NotificationEvent::tickets(
    "Ticket priority changed",
    format!("\"{}\" is now {} priority", ticket.subject, ticket.priority),
  )
}

pub fn assignee_changed(ticket: &Ticket) -> NotificationEvent {
  let who = ticket
    .assignee
    .as_ref()
    .map(|p| p.name.as_str())
    .unwrap_or("nobody");
  NotificationEvent::tickets(
    "Ticket reassigned",
    format!("\"{}\" is now assigned to {who}", ticket.subject),
  )
}

pub fn ticket_deleted(subject: &str) -> NotificationEvent {
  NotificationEvent::tickets("Ticket deleted", format!("\"{subject}\" was deleted"))
}

pub fn reply_posted(ticket: &Ticket) -> NotificationEvent {
  NotificationEvent::tickets(
    "Reply posted",
    format!("Your reply on \"{}\" was posted", ticket.subject),
  )
}

// ─── Refresh events ──────────────────────────────────────────────────────────

/// Convert a background-refresh diff into feed events.
///
/// Each brand-new ticket gets its own event. New messages aggregate: exactly
/// one affected ticket yields a specific event naming its subject, while
/// several affected tickets collapse into a single "N new messages across M
/// tickets" summary so a busy refresh cannot flood the feed.
pub fn refresh_events(
  diff: &ActivityDiff,
  previous: &[Ticket],
  next: &[Ticket],
) -> Vec<NotificationEvent> {
  let by_id: HashMap<Uuid, &Ticket> =
    next.iter().map(|t| (t.ticket_id, t)).collect();
  let prev_counts: HashMap<Uuid, usize> = previous
    .iter()
    .map(|t| (t.ticket_id, t.messages.len()))
    .collect();

  let mut events = Vec::new();

  for id in &diff.new_tickets {
    if let Some(ticket) = by_id.get(id) {
      events.push(NotificationEvent::tickets(
        "New ticket",
        format!("\"{}\" was opened by {}", ticket.subject, ticket.creator.name),
      ));
    }
  }

  match diff.updated_tickets.as_slice() {
    [] => {}
    [id] => {
      if let Some(ticket) = by_id.get(id) {
        events.push(NotificationEvent::tickets(
          "New message",
          format!("New message in \"{}\"", ticket.subject),
        ));
      }
    }
    ids => {
      let new_messages: usize = ids
        .iter()
        .filter_map(|id| {
          let ticket = by_id.get(id)?;
          let prev = prev_counts.get(id).copied().unwrap_or(0);
          Some(ticket.messages.len().saturating_sub(prev))
        })
        .sum();
      events.push(NotificationEvent::tickets(
        "New messages",
        format!("{new_messages} new messages across {} tickets", ids.len()),
      ));
    }
  }

  events
}

// ─── Feed ────────────────────────────────────────────────────────────────────

/// Bounded in-memory notification feed. Oldest events are evicted once the
/// capacity is reached — retention is explicit, never unbounded.
#[derive(Debug)]
pub struct NotificationFeed {
  events:   VecDeque<NotificationEvent>,
  capacity: usize,
}

/// Default number of events retained in memory and in the store.
pub const DEFAULT_FEED_CAPACITY: usize = 100;

impl Default for NotificationFeed {
  fn default() -> Self { Self::with_capacity(DEFAULT_FEED_CAPACITY) }
}

impl NotificationFeed {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      events: VecDeque::with_capacity(capacity.min(DEFAULT_FEED_CAPACITY)),
      capacity: capacity.max(1),
    }
  }

  pub fn capacity(&self) -> usize { self.capacity }

  pub fn len(&self) -> usize { self.events.len() }

  pub fn is_empty(&self) -> bool { self.events.is_empty() }

  /// Append one event, evicting the oldest if at capacity.
  pub fn push(&mut self, event: NotificationEvent) {
    if self.events.len() == self.capacity {
      self.events.pop_front();
    }
    self.events.push_back(event);
  }

  /// Append events oldest-first.
  pub fn extend(&mut self, events: impl IntoIterator<Item = NotificationEvent>) {
    for event in events {
      self.push(event);
    }
  }

  /// Seed from persisted history (`events` newest-first, as returned by
  /// `StateStore::recent_notifications`).
  pub fn hydrate(&mut self, events: Vec<NotificationEvent>) {
    self.events.clear();
    self.extend(events.into_iter().rev());
  }

  /// Events newest-first.
  pub fn iter(&self) -> impl Iterator<Item = &NotificationEvent> {
    self.events.iter().rev()
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use chrono::TimeZone;

  use super::*;
  use crate::{
    diff::detect_activity,
    ticket::{Message, MessageSender, Person, TicketPriority, TicketStatus},
  };

  fn ticket(id: Uuid, message_count: u32) -> Ticket {
    let ts = Utc.timestamp_opt(1_000_000, 0).unwrap();
    Ticket {
      ticket_id:   id,
      subject:     "printer on fire".into(),
      status:      TicketStatus::Open,
      priority:    TicketPriority::Medium,
      category:    "general".into(),
      creator_id:  Uuid::new_v4(),
      creator:     Person {
        name:  "Alice".into(),
        email: "alice@example.com".into(),
      },
      assignee_id: None,
      assignee:    None,
      messages:    (0..message_count)
        .map(|n| Message {
          message_id:  Uuid::new_v4(),
          content:     format!("m{n}"),
          sender:      MessageSender::Creator,
          sender_name: "Alice".into(),
          created_at:  ts,
          attachments: vec![],
        })
        .collect(),
      created_at:  ts,
      updated_at:  ts,
    }
  }

  #[test]
  fn single_updated_ticket_names_the_subject() {
    let t1 = Uuid::new_v4();
    let previous = vec![ticket(t1, 1)];
    let next = vec![ticket(t1, 2)];
    let seen: HashSet<Uuid> = [t1].into();

    let diff = detect_activity(&previous, &next, &seen);
    let events = refresh_events(&diff, &previous, &next);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "New message");
    assert!(events[0].description.contains("printer"), "{}", events[0].description);
  }

  #[test]
  fn several_updated_tickets_collapse_into_a_summary() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let previous = vec![ticket(a, 1), ticket(b, 1), ticket(c, 3)];
    let next = vec![ticket(a, 3), ticket(b, 2), ticket(c, 3)];
    let seen: HashSet<Uuid> = [a, b, c].into();

    let diff = detect_activity(&previous, &next, &seen);
    let events = refresh_events(&diff, &previous, &next);

    // a gained 2, b gained 1 → "3 new messages across 2 tickets".
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].description, "3 new messages across 2 tickets");
  }

  #[test]
  fn new_ticket_and_new_message_are_separate_events() {
    let t1 = Uuid::new_v4();
    let t2 = Uuid::new_v4();
    let previous = vec![ticket(t1, 1)];
    let next = vec![ticket(t1, 2), ticket(t2, 1)];
    let seen: HashSet<Uuid> = [t1].into();

    let diff = detect_activity(&previous, &next, &seen);
    let events = refresh_events(&diff, &previous, &next);

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "New ticket");
    assert_eq!(events[1].title, "New message");
  }

  #[test]
  fn feed_evicts_oldest_at_capacity() {
    let mut feed = NotificationFeed::with_capacity(3);
    for n in 0..5 {
      feed.push(NotificationEvent::tickets(format!("event {n}"), ""));
    }
    assert_eq!(feed.len(), 3);
    let titles: Vec<_> = feed.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["event 4", "event 3", "event 2"]);
  }

  #[test]
  fn hydrate_restores_newest_first_history() {
    let mut feed = NotificationFeed::with_capacity(10);
    feed.hydrate(vec![
      NotificationEvent::tickets("newest", ""),
      NotificationEvent::tickets("older", ""),
    ]);
    let titles: Vec<_> = feed.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["newest", "older"]);
  }
}
