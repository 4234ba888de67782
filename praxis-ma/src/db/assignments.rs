//! Assignment Ledger
//!
//! Append-and-transition log of submissions per (student, course, module).
//! One logical slot per module cycles through pending/approved/rejected;
//! resolved rows are retained for audit and a new pending row is appended
//! on resubmission. The single-pending invariant is enforced by a partial
//! unique index, so two racing submissions cannot both land.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use praxis_common::api::types::{AssignmentInfo, SubmissionStatus};
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use uuid::Uuid;

fn assignment_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<AssignmentInfo> {
    let guid: String = row.get("guid");
    let student: String = row.get("student_guid");
    let course: String = row.get("course_guid");
    let status_raw: String = row.get("status");
    let status = SubmissionStatus::from_str(&status_raw)
        .ok_or_else(|| Error::Internal(format!("Unknown assignment status: {}", status_raw)))?;

    Ok(AssignmentInfo {
        id: guid
            .parse()
            .map_err(|e| Error::Internal(format!("Invalid assignment guid: {}", e)))?,
        student_id: student
            .parse()
            .map_err(|e| Error::Internal(format!("Invalid student guid: {}", e)))?,
        course_id: course
            .parse()
            .map_err(|e| Error::Internal(format!("Invalid course guid: {}", e)))?,
        module_index: row.get::<i64, _>("module_index").max(0) as u32,
        submission_link: row.get("submission_link"),
        file_url: row.get("file_url"),
        status,
        feedback: row.get("feedback"),
        score: row.get("score"),
        submitted_at: row.get::<DateTime<Utc>, _>("submitted_at"),
        reviewed_at: row.get("reviewed_at"),
    })
}

const SELECT_COLUMNS: &str = "guid, student_guid, course_guid, module_index, submission_link, \
     file_url, status, feedback, score, submitted_at, reviewed_at";

/// Insert a new pending submission
///
/// Fails with `Conflict` if a pending submission already exists for the
/// slot (partial unique index violation).
pub async fn insert_pending(
    db: &Pool<Sqlite>,
    student_id: Uuid,
    course_id: Uuid,
    module_index: u32,
    submission_link: Option<&str>,
    file_url: Option<&str>,
) -> Result<AssignmentInfo> {
    let guid = Uuid::new_v4();

    let result = sqlx::query(
        r#"
        INSERT INTO assignments
            (guid, student_guid, course_guid, module_index, submission_link, file_url, status)
        VALUES (?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(guid.to_string())
    .bind(student_id.to_string())
    .bind(course_id.to_string())
    .bind(module_index)
    .bind(submission_link)
    .bind(file_url)
    .execute(db)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(Error::Conflict(format!(
                "A submission is already pending for module {}",
                module_index
            )));
        }
        Err(e) => return Err(e.into()),
    }

    get_assignment(db, guid)
        .await?
        .ok_or_else(|| Error::Internal("Assignment vanished after insert".to_string()))
}

/// Load an assignment by id
pub async fn get_assignment(db: &Pool<Sqlite>, id: Uuid) -> Result<Option<AssignmentInfo>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM assignments WHERE guid = ?",
        SELECT_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(db)
    .await?;

    row.as_ref().map(assignment_from_row).transpose()
}

/// Transition a pending assignment to approved/rejected
///
/// The `status = 'pending'` guard makes the transition race-safe: if a
/// concurrent review resolved the row first, zero rows update and the
/// caller reports `InvalidState`.
pub async fn mark_reviewed(
    conn: &mut SqliteConnection,
    id: Uuid,
    status: SubmissionStatus,
    feedback: Option<&str>,
    score: Option<f64>,
    reviewer_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE assignments
        SET status = ?,
            feedback = ?,
            score = ?,
            reviewed_at = CURRENT_TIMESTAMP,
            reviewer_guid = ?
        WHERE guid = ? AND status = 'pending'
        "#,
    )
    .bind(status.as_str())
    .bind(feedback)
    .bind(score)
    .bind(reviewer_id.to_string())
    .bind(id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// All submissions for a (student, course) pair, newest first
pub async fn list_for_student(
    db: &Pool<Sqlite>,
    student_id: Uuid,
    course_id: Uuid,
) -> Result<Vec<AssignmentInfo>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM assignments
         WHERE student_guid = ? AND course_guid = ?
         ORDER BY submitted_at DESC, guid DESC",
        SELECT_COLUMNS
    ))
    .bind(student_id.to_string())
    .bind(course_id.to_string())
    .fetch_all(db)
    .await?;

    rows.iter().map(assignment_from_row).collect()
}

/// Pending submissions for staff review queues, oldest first
///
/// Scoped to one course when `course_id` is given.
pub async fn list_pending(
    db: &Pool<Sqlite>,
    course_id: Option<Uuid>,
) -> Result<Vec<AssignmentInfo>> {
    let rows = match course_id {
        Some(course) => {
            sqlx::query(&format!(
                "SELECT {} FROM assignments
                 WHERE status = 'pending' AND course_guid = ?
                 ORDER BY submitted_at ASC",
                SELECT_COLUMNS
            ))
            .bind(course.to_string())
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM assignments
                 WHERE status = 'pending'
                 ORDER BY submitted_at ASC",
                SELECT_COLUMNS
            ))
            .fetch_all(db)
            .await?
        }
    };

    rows.iter().map(assignment_from_row).collect()
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
        // Isolated ledger unit tests don't seed users/courses; run without
        // referential-integrity enforcement (production enables it in
        // init_database).
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&pool).await.unwrap();
        praxis_common::db::init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let pool = setup_test_db().await;
        let student = Uuid::new_v4();
        let course = Uuid::new_v4();

        let assignment =
            insert_pending(&pool, student, course, 0, Some("https://repo.example/pr/1"), None)
                .await
                .unwrap();
        assert_eq!(assignment.status, SubmissionStatus::Pending);
        assert_eq!(assignment.module_index, 0);

        let loaded = get_assignment(&pool, assignment.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, assignment.id);
        assert_eq!(
            loaded.submission_link.as_deref(),
            Some("https://repo.example/pr/1")
        );
    }

    #[tokio::test]
    async fn test_second_pending_for_slot_conflicts() {
        let pool = setup_test_db().await;
        let student = Uuid::new_v4();
        let course = Uuid::new_v4();

        insert_pending(&pool, student, course, 1, None, None).await.unwrap();

        let err = insert_pending(&pool, student, course, 1, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // A different module slot is unaffected
        insert_pending(&pool, student, course, 2, None, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_mark_reviewed_guards_pending() {
        let pool = setup_test_db().await;
        let student = Uuid::new_v4();
        let course = Uuid::new_v4();
        let reviewer = Uuid::new_v4();

        let assignment = insert_pending(&pool, student, course, 0, None, None).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let updated = mark_reviewed(
            &mut conn,
            assignment.id,
            SubmissionStatus::Approved,
            Some("Nice work"),
            Some(90.0),
            reviewer,
        )
        .await
        .unwrap();
        assert!(updated);

        // Reviewing again finds no pending row
        let again = mark_reviewed(
            &mut conn,
            assignment.id,
            SubmissionStatus::Rejected,
            None,
            None,
            reviewer,
        )
        .await
        .unwrap();
        assert!(!again);
        drop(conn);

        let loaded = get_assignment(&pool, assignment.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SubmissionStatus::Approved);
        assert_eq!(loaded.score, Some(90.0));
        assert!(loaded.reviewed_at.is_some());
    }

    #[tokio::test]
    async fn test_rejected_slot_accepts_resubmission() {
        let pool = setup_test_db().await;
        let student = Uuid::new_v4();
        let course = Uuid::new_v4();
        let reviewer = Uuid::new_v4();

        let first = insert_pending(&pool, student, course, 0, None, None).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        mark_reviewed(
            &mut conn,
            first.id,
            SubmissionStatus::Rejected,
            Some("Missing tests"),
            None,
            reviewer,
        )
        .await
        .unwrap();
        drop(conn);

        // New row, prior row retained for audit
        let second = insert_pending(&pool, student, course, 0, None, None).await.unwrap();
        assert_ne!(second.id, first.id);

        let all = list_for_student(&pool, student, course).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_list_pending_scoped_by_course() {
        let pool = setup_test_db().await;
        let student = Uuid::new_v4();
        let course_a = Uuid::new_v4();
        let course_b = Uuid::new_v4();

        insert_pending(&pool, student, course_a, 0, None, None).await.unwrap();
        insert_pending(&pool, student, course_b, 0, None, None).await.unwrap();

        let all = list_pending(&pool, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let scoped = list_pending(&pool, Some(course_a)).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].course_id, course_a);
    }
}
