//! Query-intent schema and validator.
//!
//! A `QueryIntent` is the single value passed from the parser to the
//! query compiler. Everything in it is drawn from closed whitelists so
//! the compiler never sees a user-controlled identifier. The validator
//! is the one place that knows which logical fields exist on which
//! entity and which operation/field combinations are legal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which of the two relations an intent targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    /// Final per-video statistics (`videos`).
    Videos,
    /// Hourly per-video statistic snapshots (`video_snapshots`).
    Snapshots,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Videos => "videos",
            Self::Snapshots => "snapshots",
        }
    }

    /// Screen a raw string (e.g. from model output) against the whitelist.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "videos" => Some(Self::Videos),
            "snapshots" => Some(Self::Snapshots),
            _ => None,
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Count,
    Sum,
    DistinctCount,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::DistinctCount => "distinct_count",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "distinct_count" => Some(Self::DistinctCount),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied to the resolved column, paired with `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[default]
    None,
    Gt,
    Lt,
    Eq,
    Gte,
    Lte,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Eq => "eq",
            Self::Gte => "gte",
            Self::Lte => "lte",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "eq" => Some(Self::Eq),
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    /// SQL operator for this comparison. `None` has no operator.
    pub fn sql_operator(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gt => Some(">"),
            Self::Lt => Some("<"),
            Self::Eq => Some("="),
            Self::Gte => Some(">="),
            Self::Lte => Some("<="),
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logical field that names a distinct row identity.
pub const IDENTITY_FIELD: &str = "video_id";

/// Per-entity whitelist: logical field name -> physical column.
///
/// This map is the single source of truth for which identifiers may
/// ever appear in generated SQL.
pub fn column_for(entity: Entity, field: &str) -> Option<&'static str> {
    match entity {
        Entity::Videos => match field {
            "views" => Some("views_count"),
            "likes" => Some("likes_count"),
            "comments" => Some("comments_count"),
            "reports" => Some("reports_count"),
            "video_id" => Some("id"),
            _ => None,
        },
        Entity::Snapshots => match field {
            "views" => Some("views_count"),
            "likes" => Some("likes_count"),
            "comments" => Some("comments_count"),
            "reports" => Some("reports_count"),
            "delta_views" => Some("delta_views_count"),
            "delta_likes" => Some("delta_likes_count"),
            "delta_comments" => Some("delta_comments_count"),
            "delta_reports" => Some("delta_reports_count"),
            "video_id" => Some("video_id"),
            _ => None,
        },
    }
}

/// Canonicalize model-supplied field spellings (`views_count` -> `views`).
pub fn canonical_field(field: &str) -> &str {
    match field {
        "views_count" => "views",
        "likes_count" => "likes",
        "comments_count" => "comments",
        "reports_count" => "reports",
        "delta_views_count" => "delta_views",
        "delta_likes_count" => "delta_likes",
        "delta_comments_count" => "delta_comments",
        "delta_reports_count" => "delta_reports",
        "id" => "video_id",
        other => other,
    }
}

/// Fold a delta field back to its base counter (`delta_views` -> `views`).
/// Needed when an intent is forced onto the `videos` entity, which has
/// no delta columns.
pub fn fold_delta_field(field: &str) -> &str {
    field.strip_prefix("delta_").unwrap_or(field)
}

/// Validated description of what to compute, independent of whether it
/// came from the model or the heuristic parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub entity: Entity,
    pub operation: Operation,
    pub field: String,
    #[serde(default)]
    pub comparison: Comparison,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl QueryIntent {
    /// Bare intent with no filters; the common starting point for both
    /// parse paths.
    pub fn new(entity: Entity, operation: Operation, field: impl Into<String>) -> Self {
        Self {
            entity,
            operation,
            field: field.into(),
            comparison: Comparison::None,
            value: 0,
            creator_id: None,
            date: None,
            date_from: None,
            date_to: None,
        }
    }

    /// Enforce the schema invariants. An intent that passes here is safe
    /// to hand to the query compiler.
    pub fn validate(&self) -> Result<(), IntentError> {
        if column_for(self.entity, &self.field).is_none() {
            return Err(IntentError::FieldNotAllowed {
                field: self.field.clone(),
                entity: self.entity,
            });
        }
        if self.operation == Operation::DistinctCount && self.field != IDENTITY_FIELD {
            return Err(IntentError::DistinctCountOnNonIdentity {
                field: self.field.clone(),
            });
        }
        if self.date.is_some() && (self.date_from.is_some() || self.date_to.is_some()) {
            return Err(IntentError::DateAndRangeBothSet);
        }
        Ok(())
    }
}

/// Schema/whitelist violations raised by [`QueryIntent::validate`].
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("field `{field}` is not allowed for entity `{entity}`")]
    FieldNotAllowed { field: String, entity: Entity },

    #[error("distinct_count requires field `video_id`, got `{field}`")]
    DistinctCountOnNonIdentity { field: String },

    #[error("exact date and date range are mutually exclusive")]
    DateAndRangeBothSet,
}
