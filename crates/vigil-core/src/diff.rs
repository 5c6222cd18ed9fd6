//! Snapshot diffing: previous ticket page vs. freshly fetched page.
//!
//! Computes which tickets are brand new to this client and which existing
//! tickets received messages since the last fetch. Comparison is by message
//! count, never by latest-message timestamp, so skewed clocks cannot hide a
//! new message.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::ticket::Ticket;

/// The result of diffing a fresh ticket snapshot against the previous one.
///
/// No ordering is guaranteed among the flagged ids; consumers must not
/// depend on it.
#[derive(Debug, Default)]
pub struct ActivityDiff {
  /// Tickets this client has never observed before.
  pub new_tickets:     Vec<Uuid>,
  /// Previously known tickets whose message count strictly increased.
  pub updated_tickets: Vec<Uuid>,
}

impl ActivityDiff {
  pub fn is_empty(&self) -> bool {
    self.new_tickets.is_empty() && self.updated_tickets.is_empty()
  }

  /// All ids with new activity, new tickets first.
  pub fn flagged(&self) -> impl Iterator<Item = Uuid> + '_ {
    self
      .new_tickets
      .iter()
      .chain(self.updated_tickets.iter())
      .copied()
  }
}

/// Diff `next` against `previous`, using the persisted `seen` set as the
/// long-term baseline.
///
/// - A ticket absent from both `previous` and `seen` is new — unless this is
///   the very first load (`previous` and `seen` both empty), in which case
///   nothing is flagged and the caller seeds the baseline instead. This
///   prevents a notification storm on first visit.
/// - A ticket present in `previous` with strictly more messages in `next`
///   is updated. Equal counts are never activity: messages are append-only,
///   so an equal count with a different latest timestamp cannot occur.
/// - A ticket in `seen` but not in `previous` (paged out and back in) is
///   neither new nor updated; its messages may have grown while it was out
///   of view, but without a prior count there is nothing sound to compare.
pub fn detect_activity(
  previous: &[Ticket],
  next: &[Ticket],
  seen: &HashSet<Uuid>,
) -> ActivityDiff {
  let first_load = previous.is_empty() && seen.is_empty();
  if first_load {
    return ActivityDiff::default();
  }

  let prev_counts: HashMap<Uuid, usize> = previous
    .iter()
    .map(|t| (t.ticket_id, t.messages.len()))
    .collect();

  let mut diff = ActivityDiff::default();
  for ticket in next {
    match prev_counts.get(&ticket.ticket_id) {
      Some(prev_count) => {
        if ticket.messages.len() > *prev_count {
          diff.updated_tickets.push(ticket.ticket_id);
        }
      }
      None => {
        if !seen.contains(&ticket.ticket_id) {
          diff.new_tickets.push(ticket.ticket_id);
        }
      }
    }
  }
  diff
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::ticket::{
    Message, MessageSender, Person, Ticket, TicketPriority, TicketStatus,
  };

  fn message(n: u32) -> Message {
    Message {
      message_id:  Uuid::new_v4(),
      content:     format!("message {n}"),
      sender:      MessageSender::Creator,
      sender_name: "Alice".into(),
      created_at:  Utc.timestamp_opt(1_000_000 + i64::from(n), 0).unwrap(),
      attachments: vec![],
    }
  }

  fn ticket(id: Uuid, message_count: u32) -> Ticket {
    let ts = Utc.timestamp_opt(1_000_000, 0).unwrap();
    Ticket {
      ticket_id:   id,
      subject:     "printer on fire".into(),
      status:      TicketStatus::Open,
      priority:    TicketPriority::Medium,
      category:    "hardware".into(),
      creator_id:  Uuid::new_v4(),
      creator:     Person {
        name:  "Alice".into(),
        email: "alice@example.com".into(),
      },
      assignee_id: None,
      assignee:    None,
      messages:    (0..message_count).rev().map(message).collect(),
      created_at:  ts,
      updated_at:  ts,
    }
  }

  #[test]
  fn first_load_flags_nothing() {
    let next = vec![ticket(Uuid::new_v4(), 1), ticket(Uuid::new_v4(), 3)];
    let diff = detect_activity(&[], &next, &HashSet::new());
    assert!(diff.is_empty());
  }

  #[test]
  fn equal_or_lesser_counts_flag_nothing() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let previous = vec![ticket(a, 2), ticket(b, 5)];
    // b shrank (ticket replaced server-side); still not activity.
    let next = vec![ticket(a, 2), ticket(b, 4)];
    let seen: HashSet<Uuid> = [a, b].into();
    let diff = detect_activity(&previous, &next, &seen);
    assert!(diff.is_empty(), "flagged: {:?}", diff.flagged().collect::<Vec<_>>());
  }

  #[test]
  fn message_growth_and_new_ticket_both_flagged() {
    let t1 = Uuid::new_v4();
    let t2 = Uuid::new_v4();
    let previous = vec![ticket(t1, 1)];
    let next = vec![ticket(t1, 2), ticket(t2, 1)];
    let seen: HashSet<Uuid> = [t1].into();

    let diff = detect_activity(&previous, &next, &seen);
    assert_eq!(diff.updated_tickets, vec![t1]);
    assert_eq!(diff.new_tickets, vec![t2]);
  }

  #[test]
  fn seen_ticket_reappearing_is_not_new() {
    let t1 = Uuid::new_v4();
    let t2 = Uuid::new_v4();
    // t2 was observed in an earlier session, then paged out.
    let previous = vec![ticket(t1, 1)];
    let next = vec![ticket(t1, 1), ticket(t2, 4)];
    let seen: HashSet<Uuid> = [t1, t2].into();

    let diff = detect_activity(&previous, &next, &seen);
    assert!(diff.is_empty());
  }

  #[test]
  fn unknown_ticket_with_empty_previous_but_nonempty_seen_is_new() {
    // Previous page happened to be empty (filter with no matches), but the
    // client has a baseline — a genuinely new ticket still gets flagged.
    let t1 = Uuid::new_v4();
    let next = vec![ticket(t1, 1)];
    let seen: HashSet<Uuid> = [Uuid::new_v4()].into();

    let diff = detect_activity(&[], &next, &seen);
    assert_eq!(diff.new_tickets, vec![t1]);
  }

  #[test]
  fn deleted_ticket_is_simply_absent() {
    let t1 = Uuid::new_v4();
    let t2 = Uuid::new_v4();
    let previous = vec![ticket(t1, 1), ticket(t2, 2)];
    let next = vec![ticket(t1, 1)];
    let seen: HashSet<Uuid> = [t1, t2].into();

    let diff = detect_activity(&previous, &next, &seen);
    assert!(diff.is_empty());
  }
}
