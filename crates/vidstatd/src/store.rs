//! SQLite-backed statistics store.
//!
//! Two relations: `videos` (final per-video counters, publication
//! timestamp) and `video_snapshots` (hourly counters plus hour-over-hour
//! deltas, which may be negative). The query side of the daemon only
//! ever runs single parameterized scalar reads; writes happen solely
//! through the ingestion upserts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;

use crate::compile::SqlParam;

/// Default database path.
pub const DB_PATH: &str = "/var/lib/vidstat/stats.db";

/// One final-statistics row.
#[derive(Debug, Clone)]
pub struct VideoRow {
    pub id: String,
    pub creator_id: String,
    pub video_created_at: DateTime<Utc>,
    pub views_count: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub reports_count: i64,
}

/// One hourly snapshot row.
#[derive(Debug, Clone)]
pub struct SnapshotRow {
    pub id: String,
    pub video_id: String,
    pub views_count: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub reports_count: i64,
    pub delta_views_count: i64,
    pub delta_likes_count: i64,
    pub delta_comments_count: i64,
    pub delta_reports_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Store handle over a single SQLite connection.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create the store at a path, creating the schema
    /// idempotently.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("failed to open database at {}", path.as_ref().display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                id TEXT PRIMARY KEY,
                creator_id TEXT NOT NULL,
                video_created_at TIMESTAMP NOT NULL,
                views_count INTEGER NOT NULL DEFAULT 0,
                likes_count INTEGER NOT NULL DEFAULT 0,
                comments_count INTEGER NOT NULL DEFAULT 0,
                reports_count INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_videos_creator ON videos(creator_id);
            CREATE INDEX IF NOT EXISTS idx_videos_created_at ON videos(video_created_at);

            CREATE TABLE IF NOT EXISTS video_snapshots (
                id TEXT PRIMARY KEY,
                video_id TEXT NOT NULL,
                views_count INTEGER NOT NULL DEFAULT 0,
                likes_count INTEGER NOT NULL DEFAULT 0,
                comments_count INTEGER NOT NULL DEFAULT 0,
                reports_count INTEGER NOT NULL DEFAULT 0,
                delta_views_count INTEGER NOT NULL DEFAULT 0,
                delta_likes_count INTEGER NOT NULL DEFAULT 0,
                delta_comments_count INTEGER NOT NULL DEFAULT 0,
                delta_reports_count INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_snapshots_video ON video_snapshots(video_id);
            CREATE INDEX IF NOT EXISTS idx_snapshots_created_at ON video_snapshots(created_at);
            "#,
        )
        .context("failed to create schema")?;
        Ok(())
    }

    /// Execute one scalar query. `None` means the engine returned NULL;
    /// the answer layer coerces that to 0.
    pub fn fetch_scalar(&self, sql: &str, params: &[SqlParam]) -> Result<Option<i64>> {
        let value = self
            .conn
            .query_row(sql, params_from_iter(params.iter()), |row| {
                row.get::<_, Option<i64>>(0)
            })
            .with_context(|| format!("scalar query failed: {sql}"))?;
        Ok(value)
    }

    pub fn upsert_video(&self, row: &VideoRow) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO videos (
                id, creator_id, video_created_at,
                views_count, likes_count, comments_count, reports_count
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                creator_id = excluded.creator_id,
                video_created_at = excluded.video_created_at,
                views_count = excluded.views_count,
                likes_count = excluded.likes_count,
                comments_count = excluded.comments_count,
                reports_count = excluded.reports_count
            "#,
            params![
                row.id,
                row.creator_id,
                row.video_created_at,
                row.views_count,
                row.likes_count,
                row.comments_count,
                row.reports_count,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_snapshot(&self, row: &SnapshotRow) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO video_snapshots (
                id, video_id,
                views_count, likes_count, comments_count, reports_count,
                delta_views_count, delta_likes_count, delta_comments_count, delta_reports_count,
                created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
                video_id = excluded.video_id,
                views_count = excluded.views_count,
                likes_count = excluded.likes_count,
                comments_count = excluded.comments_count,
                reports_count = excluded.reports_count,
                delta_views_count = excluded.delta_views_count,
                delta_likes_count = excluded.delta_likes_count,
                delta_comments_count = excluded.delta_comments_count,
                delta_reports_count = excluded.delta_reports_count,
                created_at = excluded.created_at
            "#,
            params![
                row.id,
                row.video_id,
                row.views_count,
                row.likes_count,
                row.comments_count,
                row.reports_count,
                row.delta_views_count,
                row.delta_likes_count,
                row.delta_comments_count,
                row.delta_reports_count,
                row.created_at,
            ],
        )?;
        Ok(())
    }

    /// Upsert a batch atomically.
    pub fn upsert_batch(&self, videos: &[VideoRow], snapshots: &[SnapshotRow]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            for row in videos {
                self.upsert_video(row)?;
            }
            for row in snapshots {
                self.upsert_snapshot(row)?;
            }
        }
        tx.commit().context("failed to commit ingest batch")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn video(id: &str, creator: &str, views: i64) -> VideoRow {
        VideoRow {
            id: id.to_string(),
            creator_id: creator.to_string(),
            video_created_at: Utc.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap(),
            views_count: views,
            likes_count: 0,
            comments_count: 0,
            reports_count: 0,
        }
    }

    #[test]
    fn schema_creation_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        Store::init_schema(&store.conn).unwrap();
    }

    #[test]
    fn scalar_query_over_seeded_rows() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_video(&video("v1", "42", 100)).unwrap();
        store.upsert_video(&video("v2", "42", 200)).unwrap();
        store.upsert_video(&video("v3", "7", 300)).unwrap();

        let n = store
            .fetch_scalar("SELECT COUNT(*) FROM videos", &[])
            .unwrap();
        assert_eq!(n, Some(3));

        let n = store
            .fetch_scalar(
                "SELECT COUNT(*) FROM videos WHERE videos.creator_id = ?",
                &[SqlParam::Text("42".to_string())],
            )
            .unwrap();
        assert_eq!(n, Some(2));
    }

    #[test]
    fn upsert_overwrites_by_id() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_video(&video("v1", "42", 100)).unwrap();
        store.upsert_video(&video("v1", "42", 150)).unwrap();

        let n = store
            .fetch_scalar("SELECT COUNT(*) FROM videos", &[])
            .unwrap();
        assert_eq!(n, Some(1));
        let views = store
            .fetch_scalar("SELECT COALESCE(SUM(views_count), 0) FROM videos", &[])
            .unwrap();
        assert_eq!(views, Some(150));
    }

    #[test]
    fn timestamp_params_bracket_stored_timestamps() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_video(&video("v1", "42", 100)).unwrap();

        let start = Utc.with_ymd_and_hms(2025, 11, 3, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 11, 4, 0, 0, 0).unwrap();
        let n = store
            .fetch_scalar(
                "SELECT COUNT(*) FROM videos \
                 WHERE videos.video_created_at >= ? AND videos.video_created_at < ?",
                &[SqlParam::Timestamp(start), SqlParam::Timestamp(end)],
            )
            .unwrap();
        assert_eq!(n, Some(1));

        let n = store
            .fetch_scalar(
                "SELECT COUNT(*) FROM videos \
                 WHERE videos.video_created_at >= ? AND videos.video_created_at < ?",
                &[
                    SqlParam::Timestamp(end),
                    SqlParam::Timestamp(end + chrono::Duration::days(1)),
                ],
            )
            .unwrap();
        assert_eq!(n, Some(0));
    }
}
