//! Bulk JSON ingestion.
//!
//! Accepts either `{"videos": [...]}` or a bare array of video objects,
//! each optionally carrying nested `snapshots`. Rows are upserted by id,
//! so re-running ingestion over a newer export refreshes counters in
//! place. Ids may arrive as numbers or strings; timestamps are RFC3339
//! (trailing `Z` accepted) and naive timestamps are taken as UTC.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::store::{SnapshotRow, Store, VideoRow};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    Wrapped { videos: Vec<VideoRecord> },
    Bare(Vec<VideoRecord>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Num(i64),
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Num(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VideoRecord {
    id: IdValue,
    creator_id: IdValue,
    video_created_at: String,
    #[serde(default)]
    views_count: i64,
    #[serde(default)]
    likes_count: i64,
    #[serde(default)]
    comments_count: i64,
    #[serde(default)]
    reports_count: i64,
    #[serde(default)]
    snapshots: Vec<SnapshotRecord>,
}

#[derive(Debug, Deserialize)]
struct SnapshotRecord {
    id: IdValue,
    #[serde(default)]
    video_id: Option<IdValue>,
    created_at: String,
    #[serde(default)]
    views_count: i64,
    #[serde(default)]
    likes_count: i64,
    #[serde(default)]
    comments_count: i64,
    #[serde(default)]
    reports_count: i64,
    #[serde(default)]
    delta_views_count: i64,
    #[serde(default)]
    delta_likes_count: i64,
    #[serde(default)]
    delta_comments_count: i64,
    #[serde(default)]
    delta_reports_count: i64,
}

/// RFC3339 first, then naive datetime or bare date taken as UTC.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    anyhow::bail!("unrecognized timestamp: {s}")
}

/// Load one JSON export into the store. Returns (videos, snapshots)
/// row counts.
pub fn load_file(store: &Store, path: &Path) -> Result<(usize, usize)> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc: Document = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let records = match doc {
        Document::Wrapped { videos } => videos,
        Document::Bare(videos) => videos,
    };

    let mut videos: Vec<VideoRow> = Vec::new();
    let mut snapshots: Vec<SnapshotRow> = Vec::new();

    for record in records {
        let video_id = record.id.into_string();
        videos.push(VideoRow {
            id: video_id.clone(),
            creator_id: record.creator_id.into_string(),
            video_created_at: parse_timestamp(&record.video_created_at)
                .with_context(|| format!("video {video_id}"))?,
            views_count: record.views_count,
            likes_count: record.likes_count,
            comments_count: record.comments_count,
            reports_count: record.reports_count,
        });

        for snap in record.snapshots {
            let snap_id = snap.id.into_string();
            snapshots.push(SnapshotRow {
                id: snap_id.clone(),
                // Exports sometimes omit the back-reference.
                video_id: snap
                    .video_id
                    .map(IdValue::into_string)
                    .unwrap_or_else(|| video_id.clone()),
                views_count: snap.views_count,
                likes_count: snap.likes_count,
                comments_count: snap.comments_count,
                reports_count: snap.reports_count,
                delta_views_count: snap.delta_views_count,
                delta_likes_count: snap.delta_likes_count,
                delta_comments_count: snap.delta_comments_count,
                delta_reports_count: snap.delta_reports_count,
                created_at: parse_timestamp(&snap.created_at)
                    .with_context(|| format!("snapshot {snap_id}"))?,
            });
        }
    }

    store.upsert_batch(&videos, &snapshots)?;
    info!(
        "ingested videos={} snapshots={} from {}",
        videos.len(),
        snapshots.len(),
        path.display()
    );
    Ok((videos.len(), snapshots.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "videos": [
            {
                "id": 101,
                "creator_id": "42",
                "video_created_at": "2025-11-03T12:00:00Z",
                "views_count": 15000,
                "likes_count": 120,
                "snapshots": [
                    {
                        "id": "s1",
                        "created_at": "2025-11-03T13:00:00Z",
                        "views_count": 14000,
                        "delta_views_count": 500
                    },
                    {
                        "id": "s2",
                        "video_id": "101",
                        "created_at": "2025-11-03T14:00:00",
                        "views_count": 15000,
                        "delta_views_count": -30
                    }
                ]
            }
        ]
    }"#;

    fn write_sample(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn timestamps_in_all_accepted_shapes() {
        let expected = Utc.with_ymd_and_hms(2025, 11, 3, 13, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-11-03T13:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-11-03T13:00:00+00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-11-03T13:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-11-03 13:00:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2025-11-03").unwrap(),
            Utc.with_ymd_and_hms(2025, 11, 3, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("后天").is_err());
    }

    #[test]
    fn wrapped_document_loads_videos_and_snapshots() {
        let store = Store::open_in_memory().unwrap();
        let file = write_sample(SAMPLE);
        let (v, s) = load_file(&store, file.path()).unwrap();
        assert_eq!((v, s), (1, 2));

        assert_eq!(
            store.fetch_scalar("SELECT COUNT(*) FROM videos", &[]).unwrap(),
            Some(1)
        );
        assert_eq!(
            store
                .fetch_scalar("SELECT COUNT(*) FROM video_snapshots", &[])
                .unwrap(),
            Some(2)
        );
        // Numeric video id coerced, missing back-reference backfilled.
        assert_eq!(
            store
                .fetch_scalar(
                    "SELECT COUNT(*) FROM video_snapshots WHERE video_id = '101'",
                    &[]
                )
                .unwrap(),
            Some(2)
        );
        // Negative deltas survive.
        assert_eq!(
            store
                .fetch_scalar(
                    "SELECT COUNT(*) FROM video_snapshots WHERE delta_views_count < 0",
                    &[]
                )
                .unwrap(),
            Some(1)
        );
    }

    #[test]
    fn bare_array_document_loads() {
        let store = Store::open_in_memory().unwrap();
        let file = write_sample(
            r#"[{"id": "v1", "creator_id": 7, "video_created_at": "2025-06-01T00:00:00Z"}]"#,
        );
        let (v, s) = load_file(&store, file.path()).unwrap();
        assert_eq!((v, s), (1, 0));
    }

    #[test]
    fn reingestion_refreshes_in_place() {
        let store = Store::open_in_memory().unwrap();
        let file = write_sample(SAMPLE);
        load_file(&store, file.path()).unwrap();
        load_file(&store, file.path()).unwrap();

        assert_eq!(
            store.fetch_scalar("SELECT COUNT(*) FROM videos", &[]).unwrap(),
            Some(1)
        );
        assert_eq!(
            store
                .fetch_scalar("SELECT COUNT(*) FROM video_snapshots", &[])
                .unwrap(),
            Some(2)
        );
    }

    #[test]
    fn malformed_document_is_an_error() {
        let store = Store::open_in_memory().unwrap();
        let file = write_sample(r#"{"unexpected": true}"#);
        assert!(load_file(&store, file.path()).is_err());
    }
}
