//! Selection and ordering of cards that are ready for review

use std::cmp::{Ordering, Reverse};

use chrono::NaiveDate;

use super::models::MemoryCard;

/// All cards due on or before `date`, in presentation order
///
/// Overdue cards come before cards due today; within each group, newer stages
/// come first (new, learning, review, mastered) and then earlier due dates.
/// The sort is stable, so equal cards keep their input order.
pub fn get_due_cards(cards: &[MemoryCard], date: NaiveDate) -> Vec<MemoryCard> {
    let mut due: Vec<MemoryCard> = cards.iter().filter(|c| c.is_due(date)).cloned().collect();
    due.sort_by(|a, b| compare_due(a, b, date));
    due
}

fn compare_due(a: &MemoryCard, b: &MemoryCard, date: NaiveDate) -> Ordering {
    let key = |c: &MemoryCard| (c.due == date, Reverse(c.stage.due_priority()), c.due);
    key(a).cmp(&key(b))
}

/// Earliest due date strictly after `date`, for "next review in ..." hints
pub fn next_due_date(cards: &[MemoryCard], date: NaiveDate) -> Option<NaiveDate> {
    cards.iter().map(|c| c.due).filter(|due| *due > date).min()
}
