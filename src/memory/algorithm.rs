//! SM-2 derived review scheduling
//!
//! Given a card, a quality rating and the current day, compute the card's
//! next state. The function is pure: persisting the result is the caller's job.
//!
//! Quality ratings (0-5):
//! - 0: Complete blackout, the card starts over
//! - 1: Incorrect, but upon seeing the answer, remembered
//! - 2: Incorrect, but the answer seemed easy to recall
//! - 3: Correct response with serious difficulty
//! - 4: Correct response after hesitation
//! - 5: Perfect response with no hesitation

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::SchedulerConfig;
use super::models::{CardStage, MemoryCard};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Quality must be between 0 and 5, got {0}")]
    QualityOutOfRange(i32),

    #[error("Unknown rating: {0}")]
    UnknownRating(String),
}

/// Result of calculating the next review
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    /// The whole replacement record
    pub card: MemoryCard,
    pub new_interval: u32,
    pub new_due: NaiveDate,
    pub new_ease: f64,
    pub new_stage: CardStage,
}

/// Calculate the next review with the default constants
pub fn calculate_review(card: &MemoryCard, quality: i32, today: NaiveDate) -> Result<ReviewOutcome, ReviewError> {
    calculate_review_with(&SchedulerConfig::default(), card, quality, today)
}

/// Calculate the next review with explicit scheduler constants
///
/// The new interval never reaches past `NaiveDate::MAX`; a longer one is cut
/// down to the days remaining, so the due date is always today plus the interval.
pub fn calculate_review_with(
    config: &SchedulerConfig,
    card: &MemoryCard,
    quality: i32,
    today: NaiveDate,
) -> Result<ReviewOutcome, ReviewError> {
    if !(0..=5).contains(&quality) {
        return Err(ReviewError::QualityOutOfRange(quality));
    }

    let mut next = card.clone();
    let ease = config.clamp_ease(card.ease);

    if quality >= config.pass_quality {
        next.consecutive_correct = card.consecutive_correct.saturating_add(1);
        next.reps = card.reps.saturating_add(1);

        // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
        let miss = (5 - quality) as f64;
        next.ease = config.clamp_ease(ease + (0.1 - miss * (0.08 + miss * 0.02)));

        let (interval, stage) = match card.stage {
            CardStage::New => (1, CardStage::Learning),
            CardStage::Learning if card.reps == 0 => (config.second_step_interval, CardStage::Learning),
            CardStage::Learning => {
                let interval = grow(card.interval, next.ease);
                if interval >= config.graduation_interval {
                    (interval, CardStage::Review)
                } else {
                    (interval, CardStage::Learning)
                }
            }
            CardStage::Review => {
                let interval = grow(card.interval, next.ease);
                if interval >= config.mastery_interval {
                    (interval, CardStage::Mastered)
                } else {
                    (interval, CardStage::Review)
                }
            }
            CardStage::Mastered => (grow(card.interval, next.ease), CardStage::Mastered),
        };
        next.interval = interval;
        next.stage = stage;
    } else {
        next.consecutive_correct = 0;
        next.ease = (ease - config.failure_penalty).max(config.ease_min);

        match quality {
            0 => {
                next.interval = 0;
                next.stage = CardStage::New;
                next.reps = 0;
            }
            1 => {
                next.interval = 1;
                next.stage = CardStage::Learning;
            }
            _ => {
                next.interval = 3;
                next.stage = CardStage::Learning;
            }
        }
    }

    next.total_reviews = card.total_reviews.saturating_add(1);
    next.last_reviewed = Some(today);
    // Intervals are capped at the last representable day, so due == today + interval
    let days_left = NaiveDate::MAX.signed_duration_since(today).num_days();
    next.interval = next.interval.min(u32::try_from(days_left).unwrap_or(u32::MAX));
    next.due = today
        .checked_add_days(Days::new(u64::from(next.interval)))
        .unwrap_or(NaiveDate::MAX);
    // A card reviewed before its creation day (clock skew) must still satisfy due >= created_at
    if next.due < next.created_at {
        next.due = next.created_at;
    }

    Ok(ReviewOutcome {
        new_interval: next.interval,
        new_due: next.due,
        new_ease: next.ease,
        new_stage: next.stage,
        card: next,
    })
}

fn grow(interval: u32, ease: f64) -> u32 {
    let grown = (f64::from(interval) * ease).round();
    if grown >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        grown as u32
    }
}

/// Qualitative self-rating offered by review screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewRating {
    Forgot,
    Hard,
    Good,
    Easy,
}

impl ReviewRating {
    pub const ALL: [ReviewRating; 4] = [Self::Forgot, Self::Hard, Self::Good, Self::Easy];

    /// Map to the 0-5 quality scale
    pub fn quality(self) -> i32 {
        match self {
            Self::Forgot => 0,
            Self::Hard => 3,
            Self::Good => 4,
            Self::Easy => 5,
        }
    }
}

impl fmt::Display for ReviewRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Forgot => "forgot",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        };
        f.write_str(s)
    }
}

impl FromStr for ReviewRating {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forgot" | "again" => Ok(Self::Forgot),
            "hard" => Ok(Self::Hard),
            "good" => Ok(Self::Good),
            "easy" => Ok(Self::Easy),
            other => Err(ReviewError::UnknownRating(other.to_string())),
        }
    }
}

/// Interval each rating would produce, in [`ReviewRating::ALL`] order
///
/// Used to show users what interval each button would give.
pub fn preview_intervals(config: &SchedulerConfig, card: &MemoryCard, today: NaiveDate) -> [u32; 4] {
    ReviewRating::ALL.map(|rating| {
        calculate_review_with(config, card, rating.quality(), today)
            .map(|outcome| outcome.new_interval)
            .unwrap_or(card.interval)
    })
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: u32) -> String {
    match days {
        0 => "now".to_string(),
        1..=6 => format!("{}d", days),
        7..=29 => format!("{}w", days / 7),
        30..=364 => format!("{}mo", days / 30),
        _ => format!("{}y", days / 365),
    }
}
