//! One-time migration of cards from the old fixed-interval review model.
//!
//! The old model moved a card along a fixed ladder of 1/3/7/14/30 day
//! intervals. Those records are converted into regular memory cards once; after
//! that only the SM-2 scheduler touches them.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::config::SchedulerConfig;
use super::models::{make_card_id, CardSource, CardStage, MemoryCard, SourceKind};
use super::storage::{CardBackend, CardStore, ImportReport, MemoryStorageError, Result};

/// Intervals (days) of the old review ladder
pub const LEGACY_INTERVALS: [u32; 5] = [1, 3, 7, 14, 30];

/// A card as stored by the fixed-interval model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCard {
    /// Identifier of the content the card was made from
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    /// Position on the interval ladder
    #[serde(default)]
    pub level: usize,
    pub next_review: NaiveDate,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub correct_count: u32,
    pub created_at: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Convert one legacy record
///
/// Legacy cards become manual cards keyed `manual-{legacyId}-legacy`. A card
/// that was never reviewed starts over as new; otherwise the ladder position
/// decides the interval, and the last rung counts as graduated to review.
pub fn migrate_legacy_card(legacy: LegacyCard) -> MemoryCard {
    migrate_legacy_card_with(&SchedulerConfig::default(), legacy)
}

/// Convert one legacy record, starting it at the configured ease
pub fn migrate_legacy_card_with(config: &SchedulerConfig, legacy: LegacyCard) -> MemoryCard {
    let level = legacy.level.min(LEGACY_INTERVALS.len() - 1);

    let (stage, interval) = if legacy.review_count == 0 {
        (CardStage::New, 0)
    } else if level == LEGACY_INTERVALS.len() - 1 {
        (CardStage::Review, LEGACY_INTERVALS[level])
    } else {
        (CardStage::Learning, LEGACY_INTERVALS[level])
    };

    let due = legacy.next_review.max(legacy.created_at);
    let last_reviewed = if legacy.review_count == 0 {
        None
    } else {
        due.checked_sub_days(Days::new(u64::from(interval)))
            .filter(|d| *d >= legacy.created_at)
    };

    let mut tags: Vec<String> = Vec::with_capacity(legacy.tags.len());
    for tag in legacy.tags {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    MemoryCard {
        id: make_card_id(SourceKind::Manual, &legacy.id, "legacy"),
        title: legacy.title,
        content: legacy.content,
        question: legacy.question,
        answer: legacy.answer,
        source: CardSource::Manual,
        source_id: legacy.id,
        stage,
        ease: config.clamp_ease(config.ease_start),
        interval,
        due,
        reps: if stage == CardStage::New { 0 } else { level as u32 + 1 },
        consecutive_correct: if stage == CardStage::New { 0 } else { level as u32 },
        total_reviews: legacy.review_count,
        created_at: legacy.created_at,
        last_reviewed,
        tags,
    }
}

fn marker_path(legacy_path: &Path) -> PathBuf {
    legacy_path.with_extension("migrated")
}

/// Import a legacy JSON array of cards into `store` (one-time).
///
/// - If the marker next to the legacy file exists, this is a no-op.
/// - If the legacy file does not exist, there is nothing to migrate.
/// - Cards whose id already exists in the store are skipped.
/// - The legacy file is NOT deleted (serves as backup).
pub fn migrate_legacy_file<B: CardBackend>(legacy_path: &Path, store: &CardStore<B>) -> Result<ImportReport> {
    let marker = marker_path(legacy_path);

    if marker.exists() {
        return Ok(ImportReport::default());
    }
    if !legacy_path.exists() {
        log::debug!("Migration: no legacy cards at {:?}", legacy_path);
        return Ok(ImportReport::default());
    }

    let content = fs::read_to_string(legacy_path)?;
    let legacy: Vec<LegacyCard> = serde_json::from_str(&content).map_err(|source| MemoryStorageError::Corrupt {
        path: legacy_path.to_path_buf(),
        source,
    })?;

    let cards = legacy
        .into_iter()
        .map(|card| migrate_legacy_card_with(store.config(), card))
        .collect();
    let report = store.create_many(cards)?;

    fs::write(&marker, "migrated")?;
    log::info!(
        "Migration: imported {} legacy cards from {:?} ({} skipped)",
        report.created.len(),
        legacy_path,
        report.skipped.len()
    );

    Ok(report)
}
