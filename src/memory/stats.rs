//! Collection-level statistics for dashboards

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::due::get_due_cards;
use super::models::{CardStage, MemoryCard};

/// Ease at or above which a card counts as easy
const EASY_EASE: f64 = 2.2;
/// Ease at or above which a card counts as medium
const MEDIUM_EASE: f64 = 1.7;

/// Cards bucketed by ease factor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyDistribution {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

/// Summary of a card collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total_cards: usize,
    pub new_cards: usize,
    pub learning_cards: usize,
    pub review_cards: usize,
    pub mastered_cards: usize,
    pub due_today: usize,
    /// Longest running streak of correct answers on any card
    pub current_streak: u32,
    /// Percentage of reviews that belong to a card's current correct streak.
    ///
    /// This is not a historical recall rate: a failure resets a card's streak,
    /// which removes its earlier successes from the numerator.
    pub accuracy: f64,
    pub total_reviews: u64,
    pub reviewed_today: usize,
    pub difficulty_distribution: DifficultyDistribution,
}

/// Summarize a collection of cards as of `today`
pub fn calculate_stats(cards: &[MemoryCard], today: NaiveDate) -> MemoryStats {
    let mut stats = MemoryStats {
        total_cards: cards.len(),
        due_today: get_due_cards(cards, today).len(),
        ..Default::default()
    };

    let mut streak_sum: u64 = 0;

    for card in cards {
        match card.stage {
            CardStage::New => stats.new_cards += 1,
            CardStage::Learning => stats.learning_cards += 1,
            CardStage::Review => stats.review_cards += 1,
            CardStage::Mastered => stats.mastered_cards += 1,
        }

        if card.ease >= EASY_EASE {
            stats.difficulty_distribution.easy += 1;
        } else if card.ease >= MEDIUM_EASE {
            stats.difficulty_distribution.medium += 1;
        } else {
            stats.difficulty_distribution.hard += 1;
        }

        if card.last_reviewed == Some(today) {
            stats.reviewed_today += 1;
        }

        stats.current_streak = stats.current_streak.max(card.consecutive_correct);
        streak_sum += u64::from(card.consecutive_correct);
        stats.total_reviews += u64::from(card.total_reviews);
    }

    if stats.total_reviews > 0 {
        stats.accuracy = streak_sum as f64 / stats.total_reviews as f64 * 100.0;
    }

    stats
}
