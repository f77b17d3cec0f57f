//! Spaced repetition memory engine for Nous
//!
//! This module provides:
//! - Memory cards built from books, feeds, lessons, puzzles and manual notes
//! - SM-2 derived review scheduling with mastery stages
//! - Due card selection and collection statistics
//! - Durable card storage with atomic saves
//! - One-shot migration from the legacy fixed-interval model

pub mod adapters;
pub mod algorithm;
pub mod config;
pub mod due;
pub mod migration;
pub mod models;
pub mod stats;
pub mod storage;

pub use algorithm::{calculate_review, calculate_review_with, ReviewError, ReviewOutcome, ReviewRating};
pub use config::{ConfigError, SchedulerConfig};
pub use due::get_due_cards;
pub use models::*;
pub use stats::{calculate_stats, DifficultyDistribution, MemoryStats};
pub use storage::{CardBackend, CardStore, InMemoryBackend, JsonFileBackend, MemoryStorageError};

use chrono::{NaiveDate, Utc};

/// The current calendar day in UTC, for callers that do not carry their own clock
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
