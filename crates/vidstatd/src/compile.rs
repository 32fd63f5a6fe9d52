//! Query compiler - validated intent to one parameterized scalar query.
//!
//! Identifiers come exclusively from the per-relation whitelists in
//! `vidstat_common::intent`; every user-influenced value is a bound
//! parameter. Date filters are half-open `[start, end)` intervals in
//! UTC so calendar-inclusive ranges never double-count a boundary.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rusqlite::types::ToSqlOutput;
use rusqlite::ToSql;
use vidstat_common::{column_for, Entity, Operation, QueryIntent, IDENTITY_FIELD};

use crate::error::CompileError;

/// A bound parameter. Timestamps go through the chrono `ToSql`
/// impl so they match the format ingestion writes.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Int(n) => n.to_sql(),
            Self::Text(s) => s.to_sql(),
            Self::Timestamp(ts) => ts.to_sql(),
        }
    }
}

/// One compiled scalar query: SQL text with `?` placeholders plus its
/// parameters in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Per-relation shape: table, time column, and where the creator lives.
struct Relation {
    table: &'static str,
    time_column: &'static str,
    /// Creator column on the relation itself, or `None` when the filter
    /// must join through the owning `videos` row.
    creator_column: Option<&'static str>,
}

fn relation_for(entity: Entity) -> Relation {
    match entity {
        Entity::Videos => Relation {
            table: "videos",
            time_column: "video_created_at",
            creator_column: Some("creator_id"),
        },
        Entity::Snapshots => Relation {
            table: "video_snapshots",
            time_column: "created_at",
            creator_column: None,
        },
    }
}

/// UTC midnight of a calendar date.
fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// `[midnight(date), midnight(date) + 1 day)`.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day_utc(date);
    (start, start + Duration::days(1))
}

/// `[midnight(from), midnight(to) + 1 day)` - inclusive on both calendar
/// ends, expressed half-open.
pub fn range_bounds(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    (start_of_day_utc(from), start_of_day_utc(to) + Duration::days(1))
}

/// Compile a validated intent. `Err` here means the whitelists and the
/// validator have drifted apart; intents from the parser facade never
/// trigger it.
pub fn compile(intent: &QueryIntent) -> Result<CompiledQuery, CompileError> {
    let relation = relation_for(intent.entity);

    let column = column_for(intent.entity, &intent.field)
        .ok_or_else(|| CompileError::UnsupportedField(intent.field.clone()))?;
    let column_ref = format!("{}.{}", relation.table, column);

    let aggregate = match intent.operation {
        Operation::Count => "COUNT(*)".to_string(),
        Operation::DistinctCount => {
            if intent.field != IDENTITY_FIELD {
                return Err(CompileError::UnsupportedOperation(format!(
                    "distinct_count over `{}`",
                    intent.field
                )));
            }
            format!("COUNT(DISTINCT {column_ref})")
        }
        // Null-safe on both the column and the total.
        Operation::Sum => format!("COALESCE(SUM(COALESCE({column_ref}, 0)), 0)"),
    };

    let mut join = String::new();
    let mut predicates: Vec<String> = Vec::new();
    let mut params: Vec<SqlParam> = Vec::new();

    if let Some(creator_id) = &intent.creator_id {
        match relation.creator_column {
            Some(col) => predicates.push(format!("{}.{} = ?", relation.table, col)),
            None => {
                // Snapshots carry no creator; filter on the owning video.
                join = format!(" JOIN videos ON videos.id = {}.video_id", relation.table);
                predicates.push("videos.creator_id = ?".to_string());
            }
        }
        params.push(SqlParam::Text(creator_id.clone()));
    }

    let bounds = match (intent.date, intent.date_from, intent.date_to) {
        (Some(date), _, _) => Some(day_bounds(date)),
        (None, Some(from), Some(to)) => Some(range_bounds(from, to)),
        (None, Some(from), None) => Some(day_bounds(from)),
        (None, None, Some(to)) => Some(day_bounds(to)),
        (None, None, None) => None,
    };
    if let Some((start, end)) = bounds {
        predicates.push(format!(
            "{table}.{col} >= ? AND {table}.{col} < ?",
            table = relation.table,
            col = relation.time_column
        ));
        params.push(SqlParam::Timestamp(start));
        params.push(SqlParam::Timestamp(end));
    }

    if let Some(op) = intent.comparison.sql_operator() {
        // Unset counters compare as zero.
        predicates.push(format!("COALESCE({column_ref}, 0) {op} ?"));
        params.push(SqlParam::Int(intent.value));
    }

    let mut sql = format!("SELECT {aggregate} FROM {}{join}", relation.table);
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }

    Ok(CompiledQuery { sql, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vidstat_common::Comparison;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ts(y: i32, mo: u32, da: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, da, 0, 0, 0).unwrap()
    }

    #[test]
    fn count_all_videos_has_no_where_clause() {
        let intent = QueryIntent::new(Entity::Videos, Operation::Count, "video_id");
        let q = compile(&intent).unwrap();
        assert_eq!(q.sql, "SELECT COUNT(*) FROM videos");
        assert!(q.params.is_empty());
    }

    #[test]
    fn comparison_binds_value_and_is_null_safe() {
        let mut intent = QueryIntent::new(Entity::Videos, Operation::Count, "views");
        intent.comparison = Comparison::Gt;
        intent.value = 10000;
        let q = compile(&intent).unwrap();
        assert_eq!(
            q.sql,
            "SELECT COUNT(*) FROM videos WHERE COALESCE(videos.views_count, 0) > ?"
        );
        assert_eq!(q.params, vec![SqlParam::Int(10000)]);
    }

    #[test]
    fn creator_filter_is_direct_on_videos() {
        let mut intent = QueryIntent::new(Entity::Videos, Operation::Count, "video_id");
        intent.creator_id = Some("42".to_string());
        let q = compile(&intent).unwrap();
        assert_eq!(
            q.sql,
            "SELECT COUNT(*) FROM videos WHERE videos.creator_id = ?"
        );
        assert_eq!(q.params, vec![SqlParam::Text("42".to_string())]);
    }

    #[test]
    fn creator_filter_joins_for_snapshots() {
        let mut intent = QueryIntent::new(Entity::Snapshots, Operation::Count, "delta_views");
        intent.creator_id = Some("42".to_string());
        intent.comparison = Comparison::Lt;
        let q = compile(&intent).unwrap();
        assert_eq!(
            q.sql,
            "SELECT COUNT(*) FROM video_snapshots \
             JOIN videos ON videos.id = video_snapshots.video_id \
             WHERE videos.creator_id = ? \
             AND COALESCE(video_snapshots.delta_views_count, 0) < ?"
        );
        assert_eq!(
            q.params,
            vec![SqlParam::Text("42".to_string()), SqlParam::Int(0)]
        );
    }

    #[test]
    fn exact_date_compiles_to_half_open_day() {
        let mut intent = QueryIntent::new(Entity::Snapshots, Operation::Sum, "delta_views");
        intent.date = Some(d("2025-11-28"));
        let q = compile(&intent).unwrap();
        assert_eq!(
            q.sql,
            "SELECT COALESCE(SUM(COALESCE(video_snapshots.delta_views_count, 0)), 0) \
             FROM video_snapshots \
             WHERE video_snapshots.created_at >= ? AND video_snapshots.created_at < ?"
        );
        assert_eq!(
            q.params,
            vec![
                SqlParam::Timestamp(ts(2025, 11, 28)),
                SqlParam::Timestamp(ts(2025, 11, 29)),
            ]
        );
    }

    #[test]
    fn inclusive_range_compiles_to_half_open_interval() {
        let mut intent = QueryIntent::new(Entity::Videos, Operation::Count, "video_id");
        intent.date_from = Some(d("2025-11-01"));
        intent.date_to = Some(d("2025-11-05"));
        let q = compile(&intent).unwrap();
        assert_eq!(
            q.params,
            vec![
                SqlParam::Timestamp(ts(2025, 11, 1)),
                SqlParam::Timestamp(ts(2025, 11, 6)),
            ]
        );
    }

    #[test]
    fn distinct_count_targets_identity_column() {
        let intent = QueryIntent::new(Entity::Snapshots, Operation::DistinctCount, "video_id");
        let q = compile(&intent).unwrap();
        assert_eq!(
            q.sql,
            "SELECT COUNT(DISTINCT video_snapshots.video_id) FROM video_snapshots"
        );
    }

    #[test]
    fn distinct_count_on_counter_is_a_contract_violation() {
        let intent = QueryIntent::new(Entity::Snapshots, Operation::DistinctCount, "views");
        assert!(matches!(
            compile(&intent),
            Err(CompileError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn unknown_field_is_a_contract_violation() {
        let intent = QueryIntent::new(Entity::Videos, Operation::Count, "bogus");
        assert!(matches!(
            compile(&intent),
            Err(CompileError::UnsupportedField(_))
        ));
    }

    #[test]
    fn all_filters_compose() {
        let mut intent = QueryIntent::new(Entity::Videos, Operation::Count, "views");
        intent.creator_id = Some("42".to_string());
        intent.date_from = Some(d("2025-11-01"));
        intent.date_to = Some(d("2025-11-05"));
        intent.comparison = Comparison::Gte;
        intent.value = 300;
        let q = compile(&intent).unwrap();
        assert_eq!(
            q.sql,
            "SELECT COUNT(*) FROM videos \
             WHERE videos.creator_id = ? \
             AND videos.video_created_at >= ? AND videos.video_created_at < ? \
             AND COALESCE(videos.views_count, 0) >= ?"
        );
        assert_eq!(q.params.len(), 4);
    }

    #[test]
    fn video_identity_resolves_to_id_column() {
        let intent = QueryIntent::new(Entity::Videos, Operation::DistinctCount, "video_id");
        let q = compile(&intent).unwrap();
        assert_eq!(q.sql, "SELECT COUNT(DISTINCT videos.id) FROM videos");
    }
}
