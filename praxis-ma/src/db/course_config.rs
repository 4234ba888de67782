//! Auto-Unlock Policy storage
//!
//! Per-course configuration read by the Decision Function and written only
//! by staff via the admin API.

use crate::engine::decision::AutoUnlockPolicy;
use crate::error::Result;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Read a course's auto-unlock policy
///
/// Courses without a config row get the default policy (disabled,
/// threshold 0). Reads never write.
pub async fn get_policy(db: &Pool<Sqlite>, course_id: Uuid) -> Result<AutoUnlockPolicy> {
    let row: Option<(i64, f64)> =
        sqlx::query_as("SELECT enabled, score_threshold FROM auto_unlock_config WHERE course_guid = ?")
            .bind(course_id.to_string())
            .fetch_optional(db)
            .await?;

    Ok(match row {
        Some((enabled, score_threshold)) => AutoUnlockPolicy {
            enabled: enabled != 0,
            score_threshold,
        },
        None => AutoUnlockPolicy::default(),
    })
}

/// Upsert a course's auto-unlock policy
pub async fn update_policy(
    db: &Pool<Sqlite>,
    course_id: Uuid,
    enabled: bool,
    score_threshold: f64,
    updated_by: Uuid,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO auto_unlock_config (course_guid, enabled, score_threshold, updated_by)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(course_guid) DO UPDATE SET
            enabled = excluded.enabled,
            score_threshold = excluded.score_threshold,
            updated_by = excluded.updated_by,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(course_id.to_string())
    .bind(enabled)
    .bind(score_threshold)
    .bind(updated_by.to_string())
    .execute(db)
    .await?;

    Ok(())
}
