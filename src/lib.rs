//! Nous memory engine: spaced repetition scheduling for everything a reader
//! wants to remember, from book excerpts and lessons to puzzles and notes.
//!
//! The scheduling core (`calculate_review`, `get_due_cards`, `calculate_stats`)
//! is pure and takes "today" from the caller. [`memory::CardStore`] persists
//! the card collection and serializes writes.

pub mod memory;

pub use memory::adapters::{
    create_manual_card, import_book_excerpt, import_chapter_summary, import_feed_item, import_lesson,
    import_puzzle, ImportReport,
};
pub use memory::migration::{migrate_legacy_card, migrate_legacy_card_with, migrate_legacy_file, LegacyCard};
pub use memory::*;
