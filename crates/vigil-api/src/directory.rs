//! [`TicketDirectory`] — the in-memory implementation of
//! [`TicketService`].
//!
//! Owns the tickets, the staff and client listings, and the per-operator
//! last-viewed marks that unread counts are derived from. Suitable for the
//! demo server and for tests; a relational backend would implement the same
//! trait.

use std::{
  collections::HashMap,
  sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};
use uuid::Uuid;
use vigil_core::{
  Error, Result,
  service::{NewMessage, TicketPage, TicketQuery, TicketService, TicketUpdate},
  ticket::{
    ClientAccount, Message, MessageSender, Pagination, Person, SupportUser,
    Ticket, TicketPriority, TicketStats, TicketStatus,
  },
};

// ─── Input types ─────────────────────────────────────────────────────────────

/// Input to [`TicketDirectory::open_ticket`].
#[derive(Debug, Clone)]
pub struct OpenTicket {
  pub subject:  String,
  pub category: String,
  pub priority: TicketPriority,
  pub creator:  Person,
  /// Client account the creator belongs to, if any.
  pub client:   Option<Uuid>,
  /// Body of the opening message.
  pub body:     String,
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Inner {
  tickets:        HashMap<Uuid, Ticket>,
  /// (operator, ticket) → when the operator last opened the detail view.
  last_viewed:    HashMap<(Uuid, Uuid), DateTime<Utc>>,
  support_users:  Vec<SupportUser>,
  clients:        Vec<ClientAccount>,
  /// creator → client account membership, for the client filter.
  client_members: HashMap<Uuid, Uuid>,
}

/// In-memory ticket backend. Cheap to share behind an [`std::sync::Arc`].
#[derive(Default)]
pub struct TicketDirectory {
  inner: Mutex<Inner>,
}

impl TicketDirectory {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  // ── Seeding ───────────────────────────────────────────────────────────

  pub fn add_support_user(&self, name: &str, email: &str) -> SupportUser {
    let user = SupportUser {
      user_id: Uuid::new_v4(),
      name:    name.to_string(),
      email:   email.to_string(),
    };
    self.lock().support_users.push(user.clone());
    user
  }

  pub fn add_client(&self, name: &str) -> ClientAccount {
    let client = ClientAccount { client_id: Uuid::new_v4(), name: name.to_string() };
    self.lock().clients.push(client.clone());
    client
  }

  /// Create a ticket with its opening message, as a customer would.
  pub fn open_ticket(&self, input: OpenTicket) -> Ticket {
    let now = Utc::now();
    let creator_id = Uuid::new_v4();
    let ticket = Ticket {
      ticket_id:   Uuid::new_v4(),
      subject:     input.subject,
      status:      TicketStatus::Open,
      priority:    input.priority,
      category:    input.category,
      creator_id,
      creator:     input.creator.clone(),
      assignee_id: None,
      assignee:    None,
      messages:    vec![Message {
        message_id:  Uuid::new_v4(),
        content:     input.body,
        sender:      MessageSender::Creator,
        sender_name: input.creator.name,
        created_at:  now,
        attachments: vec![],
      }],
      created_at:  now,
      updated_at:  now,
    };

    let mut inner = self.lock();
    if let Some(client) = input.client {
      inner.client_members.insert(creator_id, client);
    }
    inner.tickets.insert(ticket.ticket_id, ticket.clone());
    ticket
  }
}

// ─── Filtering ───────────────────────────────────────────────────────────────

fn matches(inner: &Inner, ticket: &Ticket, query: &TicketQuery) -> bool {
  if let Some(priority) = query.priority
    && ticket.priority != priority
  {
    return false;
  }
  if let Some(category) = &query.category
    && !ticket.category.eq_ignore_ascii_case(category)
  {
    return false;
  }
  if let Some(assignee) = query.assignee
    && ticket.assignee_id != Some(assignee)
  {
    return false;
  }
  if let Some(client) = query.client
    && inner.client_members.get(&ticket.creator_id) != Some(&client)
  {
    return false;
  }
  if let Some(search) = &query.search {
    let needle = search.to_lowercase();
    let in_subject = ticket.subject.to_lowercase().contains(&needle);
    let in_messages = ticket
      .messages
      .iter()
      .any(|m| m.content.to_lowercase().contains(&needle));
    if !in_subject && !in_messages {
      return false;
    }
  }
  true
}

// ─── TicketService impl ──────────────────────────────────────────────────────

impl TicketService for TicketDirectory {
  type Error = Error;

  async fn list_tickets(&self, query: &TicketQuery) -> Result<TicketPage> {
    let inner = self.lock();
    let mut tickets: Vec<Ticket> = inner
      .tickets
      .values()
      .filter(|t| matches(&inner, t, query))
      .cloned()
      .collect();
    drop(inner);

    // Most recently touched first; id as a stable tie-break.
    tickets.sort_by(|a, b| {
      b.updated_at
        .cmp(&a.updated_at)
        .then(a.ticket_id.cmp(&b.ticket_id))
    });

    let total = tickets.len() as u64;
    let page_size = query.page_size.max(1);
    let start = (query.page.saturating_sub(1) as usize) * page_size as usize;
    let tickets: Vec<Ticket> = tickets
      .into_iter()
      .skip(start)
      .take(page_size as usize)
      .collect();

    Ok(TicketPage {
      tickets,
      pagination: Pagination::for_page(query.page, page_size, total),
    })
  }

  async fn ticket_detail(&self, ticket_id: Uuid) -> Result<Option<Ticket>> {
    Ok(self.lock().tickets.get(&ticket_id).cloned())
  }

  async fn unread_counts(&self, operator_id: Uuid) -> Result<HashMap<Uuid, u32>> {
    let inner = self.lock();
    let mut counts = HashMap::new();
    for ticket in inner.tickets.values() {
      let viewed_at = inner.last_viewed.get(&(operator_id, ticket.ticket_id));
      let unread = ticket
        .messages
        .iter()
        // Staff messages are the operator's own side of the conversation.
        .filter(|m| m.sender != MessageSender::Staff)
        .filter(|m| viewed_at.is_none_or(|at| m.created_at > *at))
        .count() as u32;
      if unread > 0 {
        counts.insert(ticket.ticket_id, unread);
      }
    }
    Ok(counts)
  }

  async fn stats(&self) -> Result<TicketStats> {
    let inner = self.lock();
    let mut stats = TicketStats::default();
    for ticket in inner.tickets.values() {
      stats.total += 1;
      match ticket.status {
        TicketStatus::Open => stats.open += 1,
        TicketStatus::InProgress => stats.in_progress += 1,
        TicketStatus::Resolved => stats.resolved += 1,
        TicketStatus::Closed => stats.closed += 1,
      }
      if ticket.priority == TicketPriority::Urgent {
        stats.urgent += 1;
      }
    }
    Ok(stats)
  }

  async fn support_users(&self) -> Result<Vec<SupportUser>> {
    Ok(self.lock().support_users.clone())
  }

  async fn client_accounts(&self) -> Result<Vec<ClientAccount>> {
    Ok(self.lock().clients.clone())
  }

  async fn update_ticket(
    &self,
    ticket_id: Uuid,
    update: TicketUpdate,
  ) -> Result<Ticket> {
    let mut inner = self.lock();
    let assignee_person = match update.assignee {
      Some(Some(id)) => {
        let person = inner
          .support_users
          .iter()
          .find(|u| u.user_id == id)
          .map(|u| Person { name: u.name.clone(), email: u.email.clone() });
        Some(person)
      }
      Some(None) => Some(None),
      None => None,
    };

    let ticket = inner
      .tickets
      .get_mut(&ticket_id)
      .ok_or(Error::TicketNotFound(ticket_id))?;

    if let Some(status) = update.status {
      ticket.status = status;
    }
    if let Some(priority) = update.priority {
      ticket.priority = priority;
    }
    match update.assignee {
      Some(Some(id)) => {
        ticket.assignee_id = Some(id);
        ticket.assignee = assignee_person.flatten();
      }
      Some(None) => {
        ticket.assignee_id = None;
        ticket.assignee = None;
      }
      None => {}
    }
    ticket.updated_at = Utc::now();
    Ok(ticket.clone())
  }

  async fn delete_ticket(&self, ticket_id: Uuid) -> Result<()> {
    let mut inner = self.lock();
    inner
      .tickets
      .remove(&ticket_id)
      .ok_or(Error::TicketNotFound(ticket_id))?;
    inner.last_viewed.retain(|(_, tid), _| *tid != ticket_id);
    Ok(())
  }

  async fn create_message(&self, input: NewMessage) -> Result<Message> {
    if input.content.trim().is_empty() {
      return Err(Error::EmptyMessage);
    }

    let mut inner = self.lock();
    let ticket = inner
      .tickets
      .get_mut(&input.ticket_id)
      .ok_or(Error::TicketNotFound(input.ticket_id))?;
    if ticket.status.is_terminal() {
      return Err(Error::TicketClosed(input.ticket_id));
    }

    let message = Message {
      message_id:  Uuid::new_v4(),
      content:     input.content,
      sender:      input.sender,
      sender_name: input.sender_name,
      created_at:  Utc::now(),
      attachments: input.attachments,
    };
    // Conversation is most-recent-first.
    ticket.messages.insert(0, message.clone());
    ticket.updated_at = message.created_at;
    Ok(message)
  }

  async fn mark_viewed(&self, ticket_id: Uuid, operator_id: Uuid) -> Result<()> {
    let mut inner = self.lock();
    if !inner.tickets.contains_key(&ticket_id) {
      return Err(Error::TicketNotFound(ticket_id));
    }
    inner.last_viewed.insert((operator_id, ticket_id), Utc::now());
    Ok(())
  }
}
