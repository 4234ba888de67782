//! Progress Store
//!
//! Durable per-(student, course) progression state. The engine is the sole
//! writer; every mutation goes through [`apply_transition_cas`] so
//! concurrent writers for the same pair serialize on the record's version
//! counter.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use praxis_common::api::types::ProgressInfo;
use praxis_common::events::TransitionCause;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use uuid::Uuid;

/// Per-(student, course) progress record
///
/// `unlocked_modules` is monotonically non-decreasing under normal
/// operation; only administrative lock removes entries. `version` is the
/// optimistic-concurrency counter checked by every write.
#[derive(Debug, Clone)]
pub struct ProgressRecord {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub current_module_index: u32,
    pub unlocked_modules: BTreeSet<u32>,
    pub version: i64,
}

impl ProgressRecord {
    /// Default record for a pair that has no row yet: module 0 unlocked
    pub fn default_for(student_id: Uuid, course_id: Uuid) -> Self {
        Self {
            student_id,
            course_id,
            current_module_index: 0,
            unlocked_modules: BTreeSet::from([0]),
            version: 0,
        }
    }

    /// Wire form for API responses
    pub fn to_info(&self) -> ProgressInfo {
        ProgressInfo {
            student_id: self.student_id,
            course_id: self.course_id,
            current_module_index: self.current_module_index,
            unlocked_modules: self.unlocked_modules.iter().copied().collect(),
        }
    }
}

fn decode_unlocked(raw: &str) -> Result<BTreeSet<u32>> {
    serde_json::from_str(raw)
        .map_err(|e| Error::Internal(format!("Corrupt unlocked_modules column: {}", e)))
}

fn encode_unlocked(unlocked: &BTreeSet<u32>) -> String {
    // BTreeSet iterates sorted, so the stored array is sorted too
    serde_json::to_string(&unlocked.iter().copied().collect::<Vec<u32>>())
        .expect("Vec<u32> serialization cannot fail")
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProgressRecord> {
    let student: String = row.get("student_guid");
    let course: String = row.get("course_guid");
    Ok(ProgressRecord {
        student_id: student
            .parse()
            .map_err(|e| Error::Internal(format!("Invalid student guid: {}", e)))?,
        course_id: course
            .parse()
            .map_err(|e| Error::Internal(format!("Invalid course guid: {}", e)))?,
        current_module_index: row.get::<i64, _>("current_module_index").max(0) as u32,
        unlocked_modules: decode_unlocked(&row.get::<String, _>("unlocked_modules"))?,
        version: row.get("version"),
    })
}

/// Load a progress record without creating one
///
/// Used by the Access Oracle: reads must stay side-effect-free, so an
/// absent row is reported as None and interpreted by the caller as the
/// default record.
pub async fn load_progress(
    db: &Pool<Sqlite>,
    student_id: Uuid,
    course_id: Uuid,
) -> Result<Option<ProgressRecord>> {
    let row = sqlx::query(
        r#"
        SELECT student_guid, course_guid, current_module_index, unlocked_modules, version
        FROM progress_records
        WHERE student_guid = ? AND course_guid = ?
        "#,
    )
    .bind(student_id.to_string())
    .bind(course_id.to_string())
    .fetch_optional(db)
    .await?;

    row.as_ref().map(record_from_row).transpose()
}

/// Get the progress record, creating the default on first read
///
/// The caller is responsible for validating that the student and course
/// exist; this function only manages the record itself.
pub async fn get_or_create_progress(
    db: &Pool<Sqlite>,
    student_id: Uuid,
    course_id: Uuid,
) -> Result<ProgressRecord> {
    // INSERT OR IGNORE keeps racing first reads idempotent
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO progress_records (student_guid, course_guid)
        VALUES (?, ?)
        "#,
    )
    .bind(student_id.to_string())
    .bind(course_id.to_string())
    .execute(db)
    .await?;

    load_progress(db, student_id, course_id)
        .await?
        .ok_or_else(|| Error::Internal("Progress record vanished after create".to_string()))
}

/// Compare-and-swap write of a progress record
///
/// Returns false if the record's version moved under us (another writer
/// committed first); the caller re-reads and re-runs its decision.
pub async fn apply_transition_cas(
    conn: &mut SqliteConnection,
    record: &ProgressRecord,
    new_current: u32,
    new_unlocked: &BTreeSet<u32>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE progress_records
        SET current_module_index = ?,
            unlocked_modules = ?,
            version = version + 1,
            updated_at = CURRENT_TIMESTAMP
        WHERE student_guid = ? AND course_guid = ? AND version = ?
        "#,
    )
    .bind(new_current)
    .bind(encode_unlocked(new_unlocked))
    .bind(record.student_id.to_string())
    .bind(record.course_id.to_string())
    .bind(record.version)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Append a transition to the audit history
pub async fn append_history(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    course_id: Uuid,
    from_index: u32,
    to_index: u32,
    cause: TransitionCause,
    actor_id: Option<Uuid>,
    detail: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO progress_history
            (student_guid, course_guid, from_index, to_index, cause, actor_guid, detail)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(student_id.to_string())
    .bind(course_id.to_string())
    .bind(from_index)
    .bind(to_index)
    .bind(cause.as_str())
    .bind(actor_id.map(|a| a.to_string()))
    .bind(detail)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// History entry as returned to staff audit views
#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryEntry {
    pub from_index: u32,
    pub to_index: u32,
    pub cause: TransitionCause,
    pub actor_id: Option<Uuid>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Load the transition history for a (student, course) pair, oldest first
pub async fn load_history(
    db: &Pool<Sqlite>,
    student_id: Uuid,
    course_id: Uuid,
) -> Result<Vec<HistoryEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT from_index, to_index, cause, actor_guid, detail, created_at
        FROM progress_history
        WHERE student_guid = ? AND course_guid = ?
        ORDER BY id ASC
        "#,
    )
    .bind(student_id.to_string())
    .bind(course_id.to_string())
    .fetch_all(db)
    .await?;

    rows.iter()
        .map(|row| {
            let cause_raw: String = row.get("cause");
            let cause = TransitionCause::from_str(&cause_raw)
                .ok_or_else(|| Error::Internal(format!("Unknown history cause: {}", cause_raw)))?;
            let actor: Option<String> = row.get("actor_guid");
            Ok(HistoryEntry {
                from_index: row.get::<i64, _>("from_index").max(0) as u32,
                to_index: row.get::<i64, _>("to_index").max(0) as u32,
                cause,
                actor_id: actor.and_then(|a| a.parse().ok()),
                detail: row.get("detail"),
                created_at: row.get("created_at"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        // Isolated progress unit tests don't seed users/courses; run without
        // referential-integrity enforcement (production enables it in
        // init_database).
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&pool).await.unwrap();
        praxis_common::db::init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_load_absent_record_is_none() {
        let pool = setup_test_db().await;
        let record = load_progress(&pool, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_get_or_create_returns_default() {
        let pool = setup_test_db().await;
        let student = Uuid::new_v4();
        let course = Uuid::new_v4();

        let record = get_or_create_progress(&pool, student, course).await.unwrap();
        assert_eq!(record.current_module_index, 0);
        assert_eq!(record.unlocked_modules, BTreeSet::from([0]));
        assert_eq!(record.version, 0);

        // Second read does not reset anything
        let again = get_or_create_progress(&pool, student, course).await.unwrap();
        assert_eq!(again.version, 0);
    }

    #[tokio::test]
    async fn test_cas_succeeds_on_matching_version() {
        let pool = setup_test_db().await;
        let student = Uuid::new_v4();
        let course = Uuid::new_v4();
        let record = get_or_create_progress(&pool, student, course).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let unlocked = BTreeSet::from([0, 1]);
        let applied = apply_transition_cas(&mut conn, &record, 1, &unlocked)
            .await
            .unwrap();
        assert!(applied);
        drop(conn);

        let reread = load_progress(&pool, student, course).await.unwrap().unwrap();
        assert_eq!(reread.current_module_index, 1);
        assert_eq!(reread.unlocked_modules, unlocked);
        assert_eq!(reread.version, 1);
    }

    #[tokio::test]
    async fn test_cas_fails_on_stale_version() {
        let pool = setup_test_db().await;
        let student = Uuid::new_v4();
        let course = Uuid::new_v4();
        let stale = get_or_create_progress(&pool, student, course).await.unwrap();

        // First writer wins
        let mut conn = pool.acquire().await.unwrap();
        let unlocked = BTreeSet::from([0, 1]);
        assert!(apply_transition_cas(&mut conn, &stale, 1, &unlocked)
            .await
            .unwrap());

        // Second writer holding the stale snapshot loses
        let applied = apply_transition_cas(&mut conn, &stale, 2, &BTreeSet::from([0, 1, 2]))
            .await
            .unwrap();
        assert!(!applied);
        drop(conn);

        // Loser's write left no trace
        let reread = load_progress(&pool, student, course).await.unwrap().unwrap();
        assert_eq!(reread.current_module_index, 1);
    }

    #[tokio::test]
    async fn test_history_round_trip() {
        let pool = setup_test_db().await;
        let student = Uuid::new_v4();
        let course = Uuid::new_v4();
        let actor = Uuid::new_v4();

        let mut conn = pool.acquire().await.unwrap();
        append_history(
            &mut conn,
            student,
            course,
            0,
            3,
            TransitionCause::AdminForce,
            Some(actor),
            Some("force to module 3"),
        )
        .await
        .unwrap();
        drop(conn);

        let history = load_history(&pool, student, course).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from_index, 0);
        assert_eq!(history[0].to_index, 3);
        assert_eq!(history[0].cause, TransitionCause::AdminForce);
        assert_eq!(history[0].actor_id, Some(actor));
    }
}
