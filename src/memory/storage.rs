//! Storage operations for memory cards
//!
//! The whole collection is one JSON array. With the file backend it lives at:
//! ```text
//! {data_dir}/memory/
//! └── cards.json       # Array of all cards
//! ```
//!
//! Saves go through `cards.json.tmp` and a rename, so a crash mid-write never
//! replaces the previous durable collection with a partial one.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::algorithm::{calculate_review_with, ReviewError, ReviewOutcome};
use super::config::SchedulerConfig;
use super::models::MemoryCard;

#[derive(Error, Debug)]
pub enum MemoryStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Card file {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Card already exists: {0}")]
    AlreadyExists(String),

    #[error("Card not found: {0}")]
    NotFound(String),

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    #[error("Card store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, MemoryStorageError>;

/// Outcome of a batch create
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Ids of cards created by this run
    pub created: Vec<String>,
    /// Ids that already existed and were left untouched
    pub skipped: Vec<String>,
}

impl ImportReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
    }
}

/// First id that appears more than once
fn find_duplicate_id(cards: &[MemoryCard]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(cards.len());
    cards.iter().map(|c| c.id.as_str()).find(|id| !seen.insert(*id))
}

/// Durable medium holding the whole card collection
pub trait CardBackend: Send + Sync {
    /// Read every card. An absent collection is empty, not an error.
    fn load(&self) -> Result<Vec<MemoryCard>>;

    /// Replace the whole collection atomically
    fn save(&self, cards: &[MemoryCard]) -> Result<()>;
}

/// Cards kept in a single JSON file
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Backend at `{data_dir}/memory/cards.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("memory").join("cards.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl CardBackend for JsonFileBackend {
    fn load(&self) -> Result<Vec<MemoryCard>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let corrupt = |source: serde_json::Error| {
            log::warn!("Card file {:?} could not be parsed: {}", self.path, source);
            MemoryStorageError::Corrupt {
                path: self.path.clone(),
                source,
            }
        };

        let cards: Vec<MemoryCard> = serde_json::from_str(&content).map_err(corrupt)?;
        if let Some(id) = find_duplicate_id(&cards) {
            let message = format!("duplicate card id {}", id);
            return Err(corrupt(<serde_json::Error as serde::de::Error>::custom(message)));
        }
        Ok(cards)
    }

    fn save(&self, cards: &[MemoryCard]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(cards)?;
        let tmp_path = self.tmp_path();
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        log::debug!("Saved {} cards to {:?}", cards.len(), self.path);
        Ok(())
    }
}

/// Cards kept in process memory
#[derive(Default)]
pub struct InMemoryBackend {
    cards: RwLock<Vec<MemoryCard>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(cards: Vec<MemoryCard>) -> Self {
        Self {
            cards: RwLock::new(cards),
        }
    }
}

impl CardBackend for InMemoryBackend {
    fn load(&self) -> Result<Vec<MemoryCard>> {
        let cards = self.cards.read().map_err(|_| MemoryStorageError::LockPoisoned)?;
        Ok(cards.clone())
    }

    fn save(&self, cards: &[MemoryCard]) -> Result<()> {
        let mut stored = self.cards.write().map_err(|_| MemoryStorageError::LockPoisoned)?;
        *stored = cards.to_vec();
        Ok(())
    }
}

/// Card collection with CRUD and review operations
///
/// Every read-modify-write runs under one lock, so concurrent updates through
/// the same store never overwrite each other. Independent stores over the same
/// file do not share that lock.
pub struct CardStore<B: CardBackend> {
    backend: B,
    config: SchedulerConfig,
    write_lock: Mutex<()>,
}

impl CardStore<JsonFileBackend> {
    /// Open the store in the per-user data directory
    pub fn open_default() -> Result<Self> {
        let data_dir = dirs::data_local_dir()
            .map(|p| p.join("nous"))
            .ok_or(MemoryStorageError::DataDirNotFound)?;
        Ok(Self::new(JsonFileBackend::in_dir(&data_dir)))
    }
}

impl<B: CardBackend> CardStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, SchedulerConfig::default())
    }

    pub fn with_config(backend: B, config: SchedulerConfig) -> Self {
        Self {
            backend,
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `f` over the loaded collection and save it if `f` reports a change
    fn mutate<T>(&self, f: impl FnOnce(&mut Vec<MemoryCard>) -> Result<(T, bool)>) -> Result<T> {
        let _guard = self.write_lock.lock().map_err(|_| MemoryStorageError::LockPoisoned)?;
        let mut cards = self.backend.load()?;
        let (value, changed) = f(&mut cards)?;
        if changed {
            self.backend.save(&cards)?;
        }
        Ok(value)
    }

    // ==================== Collection Operations ====================

    pub fn load(&self) -> Result<Vec<MemoryCard>> {
        self.backend.load()
    }

    /// Alias of [`CardStore::load`]
    pub fn get_all(&self) -> Result<Vec<MemoryCard>> {
        self.load()
    }

    /// Overwrite the whole collection; ids must be unique
    pub fn save(&self, cards: &[MemoryCard]) -> Result<()> {
        if let Some(id) = find_duplicate_id(cards) {
            return Err(MemoryStorageError::AlreadyExists(id.to_string()));
        }
        let _guard = self.write_lock.lock().map_err(|_| MemoryStorageError::LockPoisoned)?;
        self.backend.save(cards)
    }

    // ==================== Card Operations ====================

    pub fn get_by_id(&self, id: &str) -> Result<Option<MemoryCard>> {
        let cards = self.backend.load()?;
        Ok(cards.into_iter().find(|c| c.id == id))
    }

    /// Add a card; fails without touching the store if the id is taken
    pub fn create(&self, card: MemoryCard) -> Result<()> {
        self.mutate(|cards| {
            if cards.iter().any(|c| c.id == card.id) {
                return Err(MemoryStorageError::AlreadyExists(card.id.clone()));
            }
            log::info!("Created memory card {}", card.id);
            cards.push(card);
            Ok(((), true))
        })
    }

    /// Add several cards in one save, skipping ids that are already taken
    ///
    /// Either every new card is persisted or, if the save fails, none is.
    pub fn create_many(&self, new_cards: Vec<MemoryCard>) -> Result<ImportReport> {
        self.mutate(|cards| {
            let mut report = ImportReport::default();
            for card in new_cards {
                if cards.iter().any(|c| c.id == card.id) {
                    report.skipped.push(card.id);
                } else {
                    report.created.push(card.id.clone());
                    cards.push(card);
                }
            }
            if !report.created.is_empty() {
                log::info!(
                    "Created {} memory cards ({} already present)",
                    report.created.len(),
                    report.skipped.len()
                );
            }
            let changed = !report.created.is_empty();
            Ok((report, changed))
        })
    }

    /// Replace a card wholesale
    pub fn update(&self, card: MemoryCard) -> Result<()> {
        self.mutate(|cards| {
            let pos = cards
                .iter()
                .position(|c| c.id == card.id)
                .ok_or_else(|| MemoryStorageError::NotFound(card.id.clone()))?;
            cards[pos] = card;
            Ok(((), true))
        })
    }

    /// Remove a card. Returns whether anything was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.mutate(|cards| {
            let before = cards.len();
            cards.retain(|c| c.id != id);
            let removed = cards.len() != before;
            if removed {
                log::info!("Deleted memory card {}", id);
            } else {
                log::debug!("Delete of unknown memory card {}", id);
            }
            Ok((removed, removed))
        })
    }

    // ==================== Review Operations ====================

    /// Grade a stored card and persist the result in one locked step
    pub fn review_card(&self, id: &str, quality: i32, today: NaiveDate) -> Result<ReviewOutcome> {
        self.mutate(|cards| {
            let pos = cards
                .iter()
                .position(|c| c.id == id)
                .ok_or_else(|| MemoryStorageError::NotFound(id.to_string()))?;

            let outcome = calculate_review_with(&self.config, &cards[pos], quality, today)?;
            log::debug!(
                "Reviewed {} with quality {}: {:?} -> {:?}, next in {}d",
                id,
                quality,
                cards[pos].stage,
                outcome.new_stage,
                outcome.new_interval
            );
            cards[pos] = outcome.card.clone();
            Ok((outcome, true))
        })
    }
}
