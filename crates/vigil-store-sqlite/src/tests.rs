//! Integration tests for `SqliteStateStore` against an in-memory database.

use chrono::{TimeZone, Utc};
use uuid::Uuid;
use vigil_core::{notify::NotificationEvent, state::StateStore};

use crate::SqliteStateStore;

async fn store() -> SqliteStateStore {
  SqliteStateStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn event(title: &str, n: i64) -> NotificationEvent {
  NotificationEvent {
    title:       title.into(),
    description: format!("event body {n}"),
    source:      "tickets".into(),
    created_at:  Utc.timestamp_opt(1_000_000 + n, 0).unwrap(),
  }
}

// ─── Seen set ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seen_set_starts_empty() {
  let s = store().await;
  assert!(s.load_seen().await.unwrap().is_empty());
}

#[tokio::test]
async fn record_and_load_seen() {
  let s = store().await;
  let ids = vec![Uuid::new_v4(), Uuid::new_v4()];

  s.record_seen(&ids).await.unwrap();
  let seen = s.load_seen().await.unwrap();

  assert_eq!(seen.len(), 2);
  assert!(ids.iter().all(|id| seen.contains(id)));
}

#[tokio::test]
async fn seen_set_only_grows() {
  let s = store().await;
  let first = Uuid::new_v4();
  let second = Uuid::new_v4();

  s.record_seen(&[first]).await.unwrap();
  // Recording a different page must not drop the earlier id.
  s.record_seen(&[second]).await.unwrap();

  let seen = s.load_seen().await.unwrap();
  assert!(seen.contains(&first));
  assert!(seen.contains(&second));
}

#[tokio::test]
async fn recording_duplicates_is_idempotent() {
  let s = store().await;
  let id = Uuid::new_v4();

  s.record_seen(&[id, id]).await.unwrap();
  s.record_seen(&[id]).await.unwrap();

  assert_eq!(s.load_seen().await.unwrap().len(), 1);
}

// ─── Notification feed ───────────────────────────────────────────────────────

#[tokio::test]
async fn append_and_read_back_newest_first() {
  let s = store().await;
  s.append_notifications(&[event("first", 1), event("second", 2)])
    .await
    .unwrap();

  let recent = s.recent_notifications(10).await.unwrap();
  assert_eq!(recent.len(), 2);
  assert_eq!(recent[0].title, "second");
  assert_eq!(recent[1].title, "first");
}

#[tokio::test]
async fn recent_respects_limit() {
  let s = store().await;
  for n in 0..5 {
    s.append_notifications(&[event("e", n)]).await.unwrap();
  }

  let recent = s.recent_notifications(3).await.unwrap();
  assert_eq!(recent.len(), 3);
  assert_eq!(recent[0].description, "event body 4");
}

#[tokio::test]
async fn prune_keeps_newest() {
  let s = store().await;
  let events: Vec<_> = (0..10).map(|n| event("e", n)).collect();
  s.append_notifications(&events).await.unwrap();

  s.prune_notifications(4).await.unwrap();

  let recent = s.recent_notifications(100).await.unwrap();
  assert_eq!(recent.len(), 4);
  assert_eq!(recent[0].description, "event body 9");
  assert_eq!(recent[3].description, "event body 6");
}

#[tokio::test]
async fn timestamps_round_trip() {
  let s = store().await;
  let e = event("ts", 42);
  s.append_notifications(std::slice::from_ref(&e)).await.unwrap();

  let recent = s.recent_notifications(1).await.unwrap();
  assert_eq!(recent[0].created_at, e.created_at);
}
