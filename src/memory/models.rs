//! Data models for memory cards

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::config::SchedulerConfig;

/// Ease factor every card starts with
pub const STARTING_EASE: f64 = 2.5;

/// Mastery stage of a card
///
/// The declaration order is the progression order, so `New < Learning < Review < Mastered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardStage {
    /// Never answered correctly, or reset by a blackout
    New,
    /// Short intervals while the card is being learned
    Learning,
    /// Regular spaced review
    Review,
    /// Interval of a year or more
    Mastered,
}

impl Default for CardStage {
    fn default() -> Self {
        Self::New
    }
}

impl CardStage {
    pub const ALL: [CardStage; 4] = [Self::New, Self::Learning, Self::Review, Self::Mastered];

    /// Priority used when ordering due cards (higher is shown first)
    pub fn due_priority(self) -> u8 {
        match self {
            Self::New => 4,
            Self::Learning => 3,
            Self::Review => 2,
            Self::Mastered => 1,
        }
    }
}

/// Where a card came from, with the provenance each source carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CardSource {
    /// A highlighted passage from a book
    #[serde(rename_all = "camelCase")]
    BookExcerpt {
        book_title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        author: Option<String>,
        excerpt_index: u32,
    },
    /// A chapter summary or one of its key points
    #[serde(rename_all = "camelCase")]
    ChapterSummary {
        book_title: String,
        chapter_number: u32,
        chapter_title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        key_point_index: Option<u32>,
    },
    /// An item from the reading feed
    #[serde(rename_all = "camelCase")]
    FeedItem {
        #[serde(skip_serializing_if = "Option::is_none")]
        link: Option<String>,
    },
    /// A step of a generic lesson
    #[serde(rename_all = "camelCase")]
    Lesson {
        lesson_title: String,
        step_index: u32,
    },
    /// The result of a puzzle attempt
    #[serde(rename_all = "camelCase")]
    Puzzle {
        solved: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        rating: Option<u32>,
    },
    /// Written directly by the user
    Manual,
}

impl CardSource {
    /// Stable slug used as the first segment of card ids
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::BookExcerpt { .. } => SourceKind::BookExcerpt,
            Self::ChapterSummary { .. } => SourceKind::ChapterSummary,
            Self::FeedItem { .. } => SourceKind::FeedItem,
            Self::Lesson { .. } => SourceKind::Lesson,
            Self::Puzzle { .. } => SourceKind::Puzzle,
            Self::Manual => SourceKind::Manual,
        }
    }
}

/// Metadata-free discriminant of [`CardSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    BookExcerpt,
    ChapterSummary,
    FeedItem,
    Lesson,
    Puzzle,
    Manual,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BookExcerpt => "book-excerpt",
            Self::ChapterSummary => "chapter-summary",
            Self::FeedItem => "feed-item",
            Self::Lesson => "lesson",
            Self::Puzzle => "puzzle",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the deterministic id `{source}-{sourceId}-{subIdentifier}`.
///
/// Adapters rely on this being a pure function of its inputs: importing the
/// same content twice yields the same id and the store rejects the duplicate.
pub fn make_card_id(kind: SourceKind, source_id: &str, sub_identifier: &str) -> String {
    format!("{}-{}-{}", kind.as_str(), source_id, sub_identifier)
}

/// A reviewable item with its scheduling state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryCard {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub source: CardSource,
    pub source_id: String,
    #[serde(default)]
    pub stage: CardStage,
    /// SM-2 ease factor, kept within the configured band
    #[serde(default = "default_ease")]
    pub ease: f64,
    /// Days until the next review
    #[serde(default)]
    pub interval: u32,
    pub due: NaiveDate,
    /// Successful reviews since the last reset
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub consecutive_correct: u32,
    #[serde(default)]
    pub total_reviews: u32,
    pub created_at: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_ease() -> f64 {
    STARTING_EASE
}

impl MemoryCard {
    /// Check if the card is due on the given day
    pub fn is_due(&self, date: NaiveDate) -> bool {
        self.due <= date
    }

    /// Compare tags as sets, ignoring order and duplicates
    pub fn has_same_tags(&self, other: &MemoryCard) -> bool {
        let mine: HashSet<&str> = self.tags.iter().map(String::as_str).collect();
        let theirs: HashSet<&str> = other.tags.iter().map(String::as_str).collect();
        mine == theirs
    }
}

/// Everything needed to create a card; scheduling fields are filled in by [`initialize_card`]
#[derive(Debug, Clone)]
pub struct NewCard {
    pub source: CardSource,
    pub source_id: String,
    pub sub_identifier: String,
    pub title: String,
    pub content: String,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub tags: Vec<String>,
}

impl NewCard {
    pub fn new(
        source: CardSource,
        source_id: impl Into<String>,
        sub_identifier: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source,
            source_id: source_id.into(),
            sub_identifier: sub_identifier.into(),
            title: title.into(),
            content: content.into(),
            question: None,
            answer: None,
            tags: Vec::new(),
        }
    }

    pub fn with_question(mut self, question: impl Into<String>, answer: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self.answer = Some(answer.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// The id this input will produce
    pub fn card_id(&self) -> String {
        make_card_id(self.source.kind(), &self.source_id, &self.sub_identifier)
    }
}

/// Create a fresh card that is due on `today`, starting at the default ease
pub fn initialize_card(input: NewCard, today: NaiveDate) -> MemoryCard {
    initialize_card_with(&SchedulerConfig::default(), input, today)
}

/// Create a fresh card that starts at the configured ease
pub fn initialize_card_with(config: &SchedulerConfig, input: NewCard, today: NaiveDate) -> MemoryCard {
    let id = input.card_id();

    let mut tags: Vec<String> = Vec::with_capacity(input.tags.len());
    for tag in input.tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    MemoryCard {
        id,
        title: input.title,
        content: input.content,
        question: input.question,
        answer: input.answer,
        source: input.source,
        source_id: input.source_id,
        stage: CardStage::New,
        ease: config.clamp_ease(config.ease_start),
        interval: 0,
        due: today,
        reps: 0,
        consecutive_correct: 0,
        total_reviews: 0,
        created_at: today,
        last_reviewed: None,
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_initialize_card_defaults() {
        let input = NewCard::new(CardSource::Manual, "n1", "note", "Title", "Body");
        let card = initialize_card(input, date("2024-01-01"));

        assert_eq!(card.id, "manual-n1-note");
        assert_eq!(card.stage, CardStage::New);
        assert_eq!(card.ease, 2.5);
        assert_eq!(card.interval, 0);
        assert_eq!(card.due, date("2024-01-01"));
        assert_eq!(card.created_at, date("2024-01-01"));
        assert_eq!(card.reps, 0);
        assert_eq!(card.consecutive_correct, 0);
        assert_eq!(card.total_reviews, 0);
        assert!(card.last_reviewed.is_none());
    }

    #[test]
    fn test_initialize_card_uses_configured_start_ease() {
        let config = SchedulerConfig::from_toml_str("ease_start = 2.0\n").unwrap();
        let input = NewCard::new(CardSource::Manual, "n1", "note", "Title", "Body");
        let card = initialize_card_with(&config, input, date("2024-01-01"));
        assert_eq!(card.ease, 2.0);
    }

    #[test]
    fn test_initialize_card_dedups_tags() {
        let input = NewCard::new(CardSource::Manual, "n1", "note", "T", "C")
            .with_tags(["book", "idea", "book", " ", "idea"]);
        let card = initialize_card(input, date("2024-01-01"));
        assert_eq!(card.tags, vec!["book", "idea"]);
    }

    #[test]
    fn test_tag_equality_is_set_like() {
        let today = date("2024-01-01");
        let a = initialize_card(
            NewCard::new(CardSource::Manual, "a", "note", "T", "C").with_tags(["x", "y"]),
            today,
        );
        let b = initialize_card(
            NewCard::new(CardSource::Manual, "b", "note", "T", "C").with_tags(["y", "x"]),
            today,
        );
        assert!(a.has_same_tags(&b));
    }

    #[test]
    fn test_stage_order() {
        assert!(CardStage::New < CardStage::Learning);
        assert!(CardStage::Learning < CardStage::Review);
        assert!(CardStage::Review < CardStage::Mastered);
    }

    #[test]
    fn test_all_stages_in_progression_order() {
        assert!(CardStage::ALL.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(CardStage::ALL[0], CardStage::default());
    }

    #[test]
    fn test_card_json_shape() {
        let input = NewCard::new(
            CardSource::BookExcerpt {
                book_title: "Meditations".to_string(),
                author: None,
                excerpt_index: 3,
            },
            "meditations",
            "excerpt-3",
            "Meditations",
            "You have power over your mind",
        );
        let card = initialize_card(input, date("2024-03-05"));
        let json = serde_json::to_value(&card).unwrap();

        assert_eq!(json["id"], "book-excerpt-meditations-excerpt-3");
        assert_eq!(json["due"], "2024-03-05");
        assert_eq!(json["stage"], "new");
        assert_eq!(json["source"]["type"], "bookExcerpt");
        assert_eq!(json["source"]["excerptIndex"], 3);
        assert_eq!(json["sourceId"], "meditations");

        let back: MemoryCard = serde_json::from_value(json).unwrap();
        assert_eq!(back, card);
    }
}
