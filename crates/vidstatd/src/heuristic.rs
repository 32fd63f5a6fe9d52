//! Heuristic parse path - keyword inference straight from raw text.
//!
//! Total function: whatever the input, it returns a complete intent
//! that passes validation. This is the guaranteed floor under the
//! generative path; with no working model backend the bot still answers.

use vidstat_common::{fold_delta_field, Comparison, Entity, Operation, QueryIntent};

use crate::extract;

const SNAPSHOT_HINTS: [&str; 7] = [
    "замер",
    "снапш",
    "за час",
    "по сравнению",
    "предыдущ",
    "приращ",
    "динамик",
];

const FINAL_HINTS: [&str; 4] = ["итог", "финал", "опубликован", "вышл"];

const DELTA_HINTS: [&str; 6] = [
    "за час",
    "приращ",
    "динамик",
    "стало меньше",
    "стало больше",
    "по сравнению",
];

const NEGATIVE_HINTS: [&str; 3] = ["отриц", "стало меньше", "уменьш"];

const GROWTH_HINTS: [&str; 4] = ["вырос", "стало больше", "прибав", "получали новые"];

fn any_hint(t: &str, hints: &[&str]) -> bool {
    hints.iter().any(|h| t.contains(h))
}

/// Infer a complete intent from the question text alone.
pub fn heuristic_parse(text: &str) -> QueryIntent {
    let t = text.to_lowercase().replace('\u{a0}', " ");

    // Entity: snapshot vocabulary unless final/published vocabulary
    // overrides it.
    let mut entity = if any_hint(&t, &SNAPSHOT_HINTS) && !any_hint(&t, &FINAL_HINTS) {
        Entity::Snapshots
    } else {
        Entity::Videos
    };
    if t.contains("итоговой статистике") {
        entity = Entity::Videos;
    }
    if t.contains("замеров") || t.contains("снапшотов") {
        entity = Entity::Snapshots;
    }

    // Field: named counter or the views default; snapshot delta
    // vocabulary moves to the hourly delta counter.
    let explicit_counter =
        t.contains("просмотр") || t.contains("лайк") || t.contains("коммент")
            || t.contains("жалоб") || t.contains("репорт");
    let base = if t.contains("лайк") {
        "likes"
    } else if t.contains("коммент") {
        "comments"
    } else if t.contains("жалоб") || t.contains("репорт") {
        "reports"
    } else {
        "views"
    };
    let mut field = if entity == Entity::Snapshots && any_hint(&t, &DELTA_HINTS) {
        format!("delta_{base}")
    } else {
        base.to_string()
    };

    // Comparison/value: negative-change or growth vocabulary first, an
    // explicit numeric threshold always wins.
    let mut comparison = Comparison::None;
    let mut value: i64 = 0;
    if any_hint(&t, &NEGATIVE_HINTS) {
        comparison = Comparison::Lt;
        value = 0;
    } else if any_hint(&t, &GROWTH_HINTS) {
        comparison = Comparison::Gt;
        value = 0;
    }
    if let Some(threshold) = extract::extract_threshold(text) {
        comparison = if extract::has_min_phrase(text) {
            Comparison::Gte
        } else {
            Comparison::Gt
        };
        value = threshold;
    }

    // Operation.
    let operation = if t.contains("суммар") || t.contains("в сумме") {
        Operation::Sum
    } else if t.contains("разных видео") {
        // "how many distinct videos got ..." is a snapshot question
        entity = Entity::Snapshots;
        field = "video_id".to_string();
        Operation::DistinctCount
    } else {
        // Counting videos themselves, not a specific counter.
        if t.contains("видео") && comparison == Comparison::None && !explicit_counter {
            field = "video_id".to_string();
        }
        Operation::Count
    };

    let dates = extract::extract_dates(text);

    let mut intent = QueryIntent::new(entity, operation, field);
    intent.comparison = comparison;
    intent.value = value;
    intent.creator_id = extract::extract_creator_id(text);
    intent.date = dates.date;
    intent.date_from = dates.date_from;
    intent.date_to = dates.date_to;

    // Publication semantics only exist on videos.
    if extract::mentions_publication(text) {
        intent.entity = Entity::Videos;
        intent.field = fold_delta_field(&intent.field).to_string();
    }

    debug_assert!(intent.validate().is_ok());
    intent
}
