//! Property-based tests for the review scheduler and due selection

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use nous_memory::{
    calculate_review, get_due_cards, initialize_card, CardSource, CardStage, CardStore, InMemoryBackend,
    MemoryCard, MemoryStorageError, NewCard,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0u64..2000).prop_map(|offset| base_date() + Days::new(offset))
}

fn arb_stage() -> impl Strategy<Value = CardStage> {
    prop_oneof![
        Just(CardStage::New),
        Just(CardStage::Learning),
        Just(CardStage::Review),
        Just(CardStage::Mastered),
    ]
}

fn arb_card() -> impl Strategy<Value = MemoryCard> {
    (
        arb_stage(),
        130u32..=250u32,  // ease * 100
        0u32..2000u32,    // interval
        0u32..50u32,      // reps
        0u32..50u32,      // consecutive correct
        0u32..200u32,     // total reviews
        0u64..500u64,     // due offset from creation
        "[a-z0-9]{1,8}",  // source id
    )
        .prop_map(|(stage, ease, interval, reps, streak, reviews, due_offset, source_id)| {
            let input = NewCard::new(CardSource::Manual, source_id, "note", "Title", "Body");
            let mut card = initialize_card(input, base_date());
            card.stage = stage;
            card.ease = f64::from(ease) / 100.0;
            card.interval = interval;
            card.reps = reps;
            card.consecutive_correct = streak;
            card.total_reviews = reviews;
            card.due = base_date() + Days::new(due_offset);
            card
        })
}

fn review_day(card: &MemoryCard, offset: u64) -> NaiveDate {
    card.created_at + Days::new(offset)
}

// ============================================================================
// Scheduler Properties
// ============================================================================

proptest! {
    #[test]
    fn ease_stays_in_band(card in arb_card(), quality in 0i32..=5, offset in 0u64..1000) {
        let today = review_day(&card, offset);
        let outcome = calculate_review(&card, quality, today).unwrap();
        prop_assert!(outcome.new_ease >= 1.3 && outcome.new_ease <= 2.5);
        prop_assert_eq!(outcome.card.ease, outcome.new_ease);
    }

    #[test]
    fn due_is_today_plus_interval(card in arb_card(), quality in 0i32..=5, offset in 0u64..1000) {
        let today = review_day(&card, offset);
        let outcome = calculate_review(&card, quality, today).unwrap();
        prop_assert_eq!(outcome.new_due, today + Days::new(u64::from(outcome.new_interval)));
        prop_assert!(outcome.new_due >= outcome.card.created_at);
        prop_assert_eq!(outcome.card.last_reviewed, Some(today));
        prop_assert_eq!(outcome.card.total_reviews, card.total_reviews + 1);
    }

    #[test]
    fn blackout_always_resets(card in arb_card(), offset in 0u64..1000) {
        let outcome = calculate_review(&card, 0, review_day(&card, offset)).unwrap();
        prop_assert_eq!(outcome.new_stage, CardStage::New);
        prop_assert_eq!(outcome.new_interval, 0);
        prop_assert_eq!(outcome.card.reps, 0);
        prop_assert_eq!(outcome.card.consecutive_correct, 0);
    }

    #[test]
    fn stage_never_regresses_on_success(card in arb_card(), qualities in prop::collection::vec(3i32..=5, 1..20)) {
        let mut current = card;
        let mut today = current.created_at;
        for quality in qualities {
            let outcome = calculate_review(&current, quality, today).unwrap();
            prop_assert!(outcome.new_stage >= current.stage);
            today = outcome.new_due;
            current = outcome.card;
        }
    }

    #[test]
    fn out_of_range_quality_is_rejected(card in arb_card(), quality in prop_oneof![-100i32..0, 6i32..100]) {
        prop_assert!(calculate_review(&card, quality, card.created_at).is_err());
    }

    // ========================================================================
    // Due Selection Properties
    // ========================================================================

    #[test]
    fn due_selection_is_exact(cards in prop::collection::vec(arb_card(), 0..30), date in arb_date()) {
        let due = get_due_cards(&cards, date);
        prop_assert!(due.iter().all(|c| c.due <= date));
        prop_assert_eq!(due.len(), cards.iter().filter(|c| c.due <= date).count());
    }

    #[test]
    fn due_selection_is_repeatable(cards in prop::collection::vec(arb_card(), 0..30), date in arb_date()) {
        let first = serde_json::to_string(&get_due_cards(&cards, date)).unwrap();
        let second = serde_json::to_string(&get_due_cards(&cards, date)).unwrap();
        prop_assert_eq!(first, second);
    }
}

// ============================================================================
// Concrete Scenarios
// ============================================================================

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn review_flow_through_store() {
    let store = CardStore::new(InMemoryBackend::new());
    let card = initialize_card(
        NewCard::new(CardSource::Manual, "flow", "note", "Flow", "Body"),
        date("2024-01-01"),
    );
    let id = card.id.clone();
    store.create(card.clone()).unwrap();

    // Duplicate creation fails and leaves the store unchanged
    let before = store.get_all().unwrap();
    assert!(matches!(store.create(card), Err(MemoryStorageError::AlreadyExists(_))));
    assert_eq!(store.get_all().unwrap(), before);

    let due = get_due_cards(&store.get_all().unwrap(), date("2024-01-01"));
    assert_eq!(due.len(), 1);

    let first = store.review_card(&id, 5, date("2024-01-01")).unwrap();
    assert_eq!(first.new_stage, CardStage::Learning);
    assert_eq!(first.new_interval, 1);
    assert_eq!(first.new_due, date("2024-01-02"));

    assert!(get_due_cards(&store.get_all().unwrap(), date("2024-01-01")).is_empty());
    assert_eq!(get_due_cards(&store.get_all().unwrap(), date("2024-01-02")).len(), 1);

    assert!(store.delete(&id).unwrap());
    assert!(!store.delete(&id).unwrap());
    assert!(store.get_all().unwrap().is_empty());
}
