//! Parser facade - generative path first, heuristic path as the floor.
//!
//! Exactly one generative attempt per request. Every way that attempt
//! can die (transport, malformed output, explicit decline, validation)
//! is an explicit `ParseFailure`, and each of them lands on the same
//! fallback: the total heuristic parser. The caller always receives a
//! validated intent.

use serde_json::Value;
use tracing::{debug, warn};
use vidstat_common::{
    canonical_field, fold_delta_field, prompts, Comparison, Entity, Operation, QueryIntent,
};

use crate::error::ParseFailure;
use crate::extract;
use crate::heuristic::heuristic_parse;
use crate::llm::{extract_json_object, OllamaClient};

/// Parse a question into a validated intent. Never fails.
pub async fn parse_question(client: &OllamaClient, text: &str) -> QueryIntent {
    match try_generative(client, text).await {
        Ok(intent) => {
            debug!(?intent, "generative parse succeeded");
            intent
        }
        Err(failure) => {
            warn!("generative parse failed ({failure}); using heuristic path");
            heuristic_parse(text)
        }
    }
}

/// The single generative attempt: prompt, completion call, JSON span
/// extraction, candidate normalization, validation.
async fn try_generative(client: &OllamaClient, text: &str) -> Result<QueryIntent, ParseFailure> {
    let prompt = prompts::build_prompt(text);
    let raw = client
        .complete(&prompt)
        .await
        .map_err(|e| ParseFailure::Transport(e.to_string()))?;

    let span = extract_json_object(&raw)
        .ok_or_else(|| ParseFailure::MalformedOutput(snippet(&raw)))?;
    let value: Value =
        serde_json::from_str(&span).map_err(|e| ParseFailure::MalformedOutput(e.to_string()))?;

    if let Some(reason) = value.get("error").filter(|e| !e.is_null()) {
        let reason = reason.as_str().unwrap_or("unspecified").to_string();
        return Err(ParseFailure::Declined(reason));
    }

    candidate_from_value(&value, text)
}

fn snippet(raw: &str) -> String {
    raw.chars().take(200).collect()
}

/// Normalize a decoded model object into a validated intent.
///
/// The model's structured output is authoritative where present and
/// well-typed; the deterministic extractors over the original text are
/// the safety net for everything it omitted or mistyped. Missing or
/// non-whitelisted entity/operation/field reject the whole candidate.
pub fn candidate_from_value(v: &Value, text: &str) -> Result<QueryIntent, ParseFailure> {
    let entity = v
        .get("entity")
        .and_then(Value::as_str)
        .and_then(Entity::parse)
        .ok_or_else(|| ParseFailure::Validation("entity missing or not allowed".into()))?;
    let operation = v
        .get("operation")
        .and_then(Value::as_str)
        .and_then(Operation::parse)
        .ok_or_else(|| ParseFailure::Validation("operation missing or not allowed".into()))?;
    let field = v
        .get("field")
        .and_then(Value::as_str)
        .map(|f| canonical_field(f.trim()).to_string())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ParseFailure::Validation("field missing".into()))?;

    let mut intent = QueryIntent::new(entity, operation, field);

    // Unknown comparison degrades to none rather than rejecting.
    intent.comparison = v
        .get("comparison")
        .and_then(Value::as_str)
        .and_then(Comparison::parse)
        .unwrap_or(Comparison::None);

    intent.value = coerce_value(v.get("value"));
    intent.creator_id =
        coerce_creator(v.get("creator_id")).or_else(|| extract::extract_creator_id(text));

    fill_dates(&mut intent, v, text);

    // Threshold backfill: the model often answers gt/gte with value 0
    // even when the question names a number.
    if matches!(intent.comparison, Comparison::Gt | Comparison::Gte) && intent.value == 0 {
        if let Some(threshold) = extract::extract_threshold(text) {
            intent.value = threshold;
        }
    }

    let t = text.to_lowercase();
    if t.contains("отриц") || t.contains("стало меньше") {
        intent.comparison = Comparison::Lt;
        intent.value = 0;
    }
    if t.contains("получали новые") && t.contains("видео") {
        intent.entity = Entity::Snapshots;
        intent.operation = Operation::DistinctCount;
        intent.field = "video_id".to_string();
        intent.comparison = Comparison::Gt;
        intent.value = 0;
    }

    // Publication semantics only exist on videos.
    if extract::mentions_publication(text) {
        intent.entity = Entity::Videos;
        intent.field = fold_delta_field(&intent.field).to_string();
    }

    intent
        .validate()
        .map_err(|e| ParseFailure::Validation(e.to_string()))?;
    Ok(intent)
}

/// Integer `value`, tolerating stringly-typed numbers with separators.
fn coerce_value(v: Option<&Value>) -> i64 {
    match v {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => extract::parse_human_int(s).unwrap_or(0),
        _ => 0,
    }
}

/// `creator_id` as an opaque string, tolerating a numeric id.
fn coerce_creator(v: Option<&Value>) -> Option<String> {
    match v {
        Some(Value::String(s)) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Merge model-supplied dates with deterministic extraction, expanding a
/// stringly `YYYY-MM` into month bounds and keeping the date-vs-range
/// exclusivity invariant (the range wins when the merge produces both).
fn fill_dates(intent: &mut QueryIntent, v: &Value, text: &str) {
    let extracted = extract::extract_dates(text);

    intent.date = date_field(v, "date").or(extracted.date);
    intent.date_from = date_field(v, "date_from").or(extracted.date_from);
    intent.date_to = date_field(v, "date_to").or(extracted.date_to);

    // Model answered a bare month for the whole range.
    if intent.date_to.is_none() {
        if let Some((y, m)) = year_month_field(v, "date_from") {
            if let Some((from, to)) = extract::month_bounds(y, m) {
                intent.date_from = Some(from);
                intent.date_to = Some(to);
            }
        }
    }

    // A half-formed range becomes a single-day range.
    match (intent.date_from, intent.date_to) {
        (Some(from), None) => intent.date_to = Some(from),
        (None, Some(to)) => intent.date_from = Some(to),
        _ => {}
    }

    if intent.date.is_some() && intent.date_from.is_some() {
        intent.date = None;
    }
}

fn date_field(v: &Value, key: &str) -> Option<chrono::NaiveDate> {
    v.get(key)
        .and_then(Value::as_str)
        .and_then(|s| chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

fn year_month_field(v: &Value, key: &str) -> Option<(i32, u32)> {
    let s = v.get(key)?.as_str()?.trim();
    let (y, m) = s.split_once('-')?;
    if y.len() != 4 || m.len() != 2 {
        return None;
    }
    Some((y.parse().ok()?, m.parse().ok()?))
}
