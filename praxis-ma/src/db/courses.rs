//! Course catalog and lesson completion queries
//!
//! The engine reads course structure (module list length, registered
//! lessons) as external facts it does not own, and records lesson-level
//! completion as a fact feeding the submission precondition.

use crate::error::{Error, Result};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Number of modules in a course, or None if the course is unknown
pub async fn get_module_count(db: &Pool<Sqlite>, course_id: Uuid) -> Result<Option<u32>> {
    let count: Option<i64> =
        sqlx::query_scalar("SELECT module_count FROM courses WHERE guid = ?")
            .bind(course_id.to_string())
            .fetch_optional(db)
            .await?;

    Ok(count.map(|c| c.max(0) as u32))
}

/// Module count, failing with NotFound for unknown courses
pub async fn require_module_count(db: &Pool<Sqlite>, course_id: Uuid) -> Result<u32> {
    get_module_count(db, course_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Course {} not found", course_id)))
}

/// Check that a user exists and is not archived
pub async fn user_exists(db: &Pool<Sqlite>, user_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE guid = ? AND archived = 0)",
    )
    .bind(user_id.to_string())
    .fetch_one(db)
    .await?;

    Ok(exists)
}

/// Check that a lesson is registered for the given (course, module) slot
pub async fn lesson_in_module(
    db: &Pool<Sqlite>,
    lesson_id: Uuid,
    course_id: Uuid,
    module_index: u32,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM module_lessons
            WHERE guid = ? AND course_guid = ? AND module_index = ?
        )
        "#,
    )
    .bind(lesson_id.to_string())
    .bind(course_id.to_string())
    .bind(module_index)
    .fetch_one(db)
    .await?;

    Ok(exists)
}

/// Record a lesson completion (idempotent)
pub async fn mark_lesson_complete(
    db: &Pool<Sqlite>,
    student_id: Uuid,
    course_id: Uuid,
    module_index: u32,
    lesson_id: Uuid,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO lesson_completions
            (student_guid, lesson_guid, course_guid, module_index)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(student_id.to_string())
    .bind(lesson_id.to_string())
    .bind(course_id.to_string())
    .bind(module_index)
    .execute(db)
    .await?;

    Ok(())
}

/// Whether every lesson registered for the module is completed by the student
///
/// A module with no registered lessons has no lesson gate.
pub async fn all_lessons_complete(
    db: &Pool<Sqlite>,
    student_id: Uuid,
    course_id: Uuid,
    module_index: u32,
) -> Result<bool> {
    let incomplete: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM module_lessons l
        LEFT JOIN lesson_completions c
            ON c.lesson_guid = l.guid AND c.student_guid = ?
        WHERE l.course_guid = ? AND l.module_index = ? AND c.lesson_guid IS NULL
        "#,
    )
    .bind(student_id.to_string())
    .bind(course_id.to_string())
    .bind(module_index)
    .fetch_one(db)
    .await?;

    Ok(incomplete == 0)
}
