//! [`SqliteStateStore`] — the SQLite implementation of
//! [`vigil_core::state::StateStore`].

use std::{collections::HashSet, path::Path};

use uuid::Uuid;
use vigil_core::{notify::NotificationEvent, state::StateStore};

use crate::{
  Result,
  encode::{decode_dt, decode_uuid, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Persisted watcher state backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStateStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStateStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── StateStore impl ─────────────────────────────────────────────────────────

impl StateStore for SqliteStateStore {
  type Error = crate::Error;

  async fn load_seen(&self) -> Result<HashSet<Uuid>> {
    let raw: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT ticket_id FROM seen_tickets")?;
        let rows = stmt
          .query_map([], |r| r.get::<_, String>(0))?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    raw.iter().map(|s| decode_uuid(s)).collect()
  }

  async fn record_seen(&self, ids: &[Uuid]) -> Result<()> {
    if ids.is_empty() {
      return Ok(());
    }
    let encoded: Vec<String> = ids.iter().copied().map(encode_uuid).collect();
    let now = encode_dt(chrono::Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO seen_tickets (ticket_id, first_seen_at)
             VALUES (?1, ?2)",
          )?;
          for id in &encoded {
            stmt.execute(rusqlite::params![id, now])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn append_notifications(
    &self,
    events: &[NotificationEvent],
  ) -> Result<()> {
    if events.is_empty() {
      return Ok(());
    }
    let rows: Vec<(String, String, String, String)> = events
      .iter()
      .map(|e| {
        (
          e.title.clone(),
          e.description.clone(),
          e.source.clone(),
          encode_dt(e.created_at),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO notifications (title, description, source, created_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (title, description, source, created_at) in &rows {
            stmt.execute(rusqlite::params![title, description, source, created_at])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn recent_notifications(
    &self,
    limit: usize,
  ) -> Result<Vec<NotificationEvent>> {
    let limit = limit as i64;
    let raw: Vec<(String, String, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT title, description, source, created_at
           FROM notifications ORDER BY seq DESC LIMIT ?1",
        )?;
        let rows = stmt
          .query_map([limit], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    raw
      .into_iter()
      .map(|(title, description, source, created_at)| {
        Ok(NotificationEvent {
          title,
          description,
          source,
          created_at: decode_dt(&created_at)?,
        })
      })
      .collect()
  }

  async fn prune_notifications(&self, keep: usize) -> Result<()> {
    let keep = keep as i64;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM notifications WHERE seq NOT IN (
             SELECT seq FROM notifications ORDER BY seq DESC LIMIT ?1
           )",
          [keep],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
