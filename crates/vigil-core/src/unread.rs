//! Unread-count comparison.
//!
//! Each fetch replaces the whole unread map. The alert signal compares the
//! two maps key-by-key: any single ticket whose count strictly increased
//! raises the flag. Comparing aggregate sums instead would let a decrease in
//! one ticket mask an increase in another when the totals net out.

use std::collections::HashMap;

use uuid::Uuid;

/// Per-ticket unread message counts for the current operator.
pub type UnreadMap = HashMap<Uuid, u32>;

/// Ticket ids whose unread count strictly increased from `before` to
/// `after`. Tickets absent from `before` count from zero.
pub fn newly_unread(before: &UnreadMap, after: &UnreadMap) -> Vec<Uuid> {
  after
    .iter()
    .filter(|(id, count)| **count > before.get(*id).copied().unwrap_or(0))
    .map(|(id, _)| *id)
    .collect()
}

/// Whether the operator should be alerted after replacing `before` with
/// `after`.
pub fn has_new_unread(before: &UnreadMap, after: &UnreadMap) -> bool {
  !newly_unread(before, after).is_empty()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sum_netting_still_raises_flag() {
    // {t1: 2, t2: 0} → {t1: 0, t2: 3}: t1 dropped but t2 rose.
    let t1 = Uuid::new_v4();
    let t2 = Uuid::new_v4();
    let before: UnreadMap = [(t1, 2), (t2, 0)].into();
    let after: UnreadMap = [(t1, 0), (t2, 3)].into();

    assert!(has_new_unread(&before, &after));
    assert_eq!(newly_unread(&before, &after), vec![t2]);
  }

  #[test]
  fn increase_hidden_by_lower_sum_is_caught() {
    // Sum drops from 5 to 3, yet t2 gained a message. A sum comparison
    // would miss this.
    let t1 = Uuid::new_v4();
    let t2 = Uuid::new_v4();
    let before: UnreadMap = [(t1, 5), (t2, 0)].into();
    let after: UnreadMap = [(t1, 2), (t2, 1)].into();

    assert_eq!(newly_unread(&before, &after), vec![t2]);
  }

  #[test]
  fn pure_decrease_is_quiet() {
    let t1 = Uuid::new_v4();
    let before: UnreadMap = [(t1, 4)].into();
    let after: UnreadMap = [(t1, 0)].into();

    assert!(!has_new_unread(&before, &after));
  }

  #[test]
  fn ticket_missing_from_before_counts_from_zero() {
    let t1 = Uuid::new_v4();
    let after: UnreadMap = [(t1, 1)].into();

    assert_eq!(newly_unread(&UnreadMap::new(), &after), vec![t1]);
  }
}
