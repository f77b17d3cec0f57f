//! Turn external content into memory cards
//!
//! Each importer derives card ids from the content's provenance, so running it
//! again over the same content finds the existing cards and skips them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{initialize_card_with, CardSource, MemoryCard, NewCard};
pub use super::storage::ImportReport;
use super::storage::{CardBackend, CardStore, Result};

/// A highlighted passage from a book
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookExcerpt {
    pub book_id: String,
    pub book_title: String,
    #[serde(default)]
    pub author: Option<String>,
    pub excerpt_index: u32,
    pub text: String,
    /// The reader's own note on the passage, used as the recall prompt
    #[serde(default)]
    pub note: Option<String>,
}

/// A chapter summary with its key points
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    pub book_id: String,
    pub book_title: String,
    pub chapter_number: u32,
    pub chapter_title: String,
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// An item from the reading feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub item_id: String,
    pub headline: String,
    pub body: String,
    #[serde(default)]
    pub link: Option<String>,
    /// One-line lesson from the item
    #[serde(default)]
    pub takeaway: Option<String>,
}

/// One prompt/answer pair of a lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroLesson {
    pub prompt: String,
    pub answer: String,
}

/// A generic lesson broken into micro-lessons
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub lesson_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub steps: Vec<MicroLesson>,
}

/// The result of a puzzle attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleResult {
    pub puzzle_id: String,
    pub title: String,
    pub prompt: String,
    pub solution: String,
    pub solved: bool,
    #[serde(default)]
    pub rating: Option<u32>,
}

/// A card written by hand
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualCard {
    /// Stable id of the note this card belongs to; generated when absent
    #[serde(default)]
    pub note_id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Create every card in one write, treating an id collision as "already imported"
fn import_all<B: CardBackend>(store: &CardStore<B>, inputs: Vec<NewCard>, today: NaiveDate) -> Result<ImportReport> {
    let cards = inputs
        .into_iter()
        .map(|input| initialize_card_with(store.config(), input, today))
        .collect();
    let report = store.create_many(cards)?;

    for id in &report.skipped {
        log::debug!("Skipping already imported card {}", id);
    }
    Ok(report)
}

pub fn import_book_excerpt<B: CardBackend>(
    store: &CardStore<B>,
    excerpt: &BookExcerpt,
    today: NaiveDate,
) -> Result<ImportReport> {
    let source = CardSource::BookExcerpt {
        book_title: excerpt.book_title.clone(),
        author: excerpt.author.clone(),
        excerpt_index: excerpt.excerpt_index,
    };

    let mut input = NewCard::new(
        source,
        &excerpt.book_id,
        format!("excerpt-{}", excerpt.excerpt_index),
        &excerpt.book_title,
        &excerpt.text,
    )
    .with_tags(["book", "excerpt"]);

    if let Some(note) = &excerpt.note {
        input = input.with_question(note, &excerpt.text);
    }

    import_all(store, vec![input], today)
}

pub fn import_chapter_summary<B: CardBackend>(
    store: &CardStore<B>,
    chapter: &ChapterSummary,
    today: NaiveDate,
) -> Result<ImportReport> {
    let title = format!("{}: {}", chapter.book_title, chapter.chapter_title);
    let source = |key_point_index| CardSource::ChapterSummary {
        book_title: chapter.book_title.clone(),
        chapter_number: chapter.chapter_number,
        chapter_title: chapter.chapter_title.clone(),
        key_point_index,
    };

    let mut inputs = vec![NewCard::new(
        source(None),
        &chapter.book_id,
        format!("ch{}", chapter.chapter_number),
        &title,
        &chapter.summary,
    )
    .with_question(
        format!("What is chapter {} of {} about?", chapter.chapter_number, chapter.book_title),
        &chapter.summary,
    )
    .with_tags(["book", "chapter", "summary"])];

    for (i, point) in chapter.key_points.iter().enumerate() {
        let index = i as u32;
        inputs.push(
            NewCard::new(
                source(Some(index)),
                &chapter.book_id,
                format!("ch{}-kp{}", chapter.chapter_number, index),
                &title,
                point,
            )
            .with_tags(["book", "chapter", "key-point"]),
        );
    }

    import_all(store, inputs, today)
}

pub fn import_feed_item<B: CardBackend>(store: &CardStore<B>, item: &FeedItem, today: NaiveDate) -> Result<ImportReport> {
    let source = CardSource::FeedItem { link: item.link.clone() };

    let mut input = NewCard::new(source, &item.item_id, "main", &item.headline, &item.body).with_tags(["feed"]);
    if let Some(takeaway) = &item.takeaway {
        input = input.with_question(format!("What is the takeaway of \"{}\"?", item.headline), takeaway);
    }

    import_all(store, vec![input], today)
}

pub fn import_lesson<B: CardBackend>(store: &CardStore<B>, lesson: &Lesson, today: NaiveDate) -> Result<ImportReport> {
    let inputs = lesson
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let step_index = i as u32;
            let source = CardSource::Lesson {
                lesson_title: lesson.title.clone(),
                step_index,
            };
            NewCard::new(
                source,
                &lesson.lesson_id,
                format!("step-{}", step_index),
                &lesson.title,
                &lesson.body,
            )
            .with_question(&step.prompt, &step.answer)
            .with_tags(["lesson"])
        })
        .collect();

    import_all(store, inputs, today)
}

pub fn import_puzzle<B: CardBackend>(store: &CardStore<B>, puzzle: &PuzzleResult, today: NaiveDate) -> Result<ImportReport> {
    let source = CardSource::Puzzle {
        solved: puzzle.solved,
        rating: puzzle.rating,
    };
    let outcome_tag = if puzzle.solved { "solved" } else { "missed" };

    let input = NewCard::new(source, &puzzle.puzzle_id, "solution", &puzzle.title, &puzzle.prompt)
        .with_question(&puzzle.prompt, &puzzle.solution)
        .with_tags(["puzzle", outcome_tag]);

    import_all(store, vec![input], today)
}

/// Create a hand-written card and return it
pub fn create_manual_card<B: CardBackend>(store: &CardStore<B>, manual: ManualCard, today: NaiveDate) -> Result<MemoryCard> {
    let note_id = manual.note_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut input = NewCard::new(CardSource::Manual, note_id, "note", manual.title, manual.content)
        .with_tags(["manual"])
        .with_tags(manual.tags);
    input.question = manual.question;
    input.answer = manual.answer;

    let card = initialize_card_with(store.config(), input, today);
    store.create(card.clone())?;
    Ok(card)
}
