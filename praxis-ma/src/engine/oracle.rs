//! Access Oracle
//!
//! Read-only query answering "may principal P view module M of course C
//! now?". Called by the route guard on every gated navigation and by
//! content-serving endpoints, so it must stay cheap and side-effect-free:
//! no writes, not even lazy record creation.

use crate::db::{courses, progress};
use crate::error::{Error, Result};
use praxis_common::Principal;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Check module access for a principal
///
/// Returns Ok(()) when access is allowed; every denial is an error carrying
/// the human-readable reason. Staff and admin principals always pass.
pub async fn can_access(
    db: &Pool<Sqlite>,
    principal: &Principal,
    course_id: Uuid,
    module_index: u32,
) -> Result<()> {
    let module_count = courses::require_module_count(db, course_id).await?;

    if module_index >= module_count {
        return Err(Error::OutOfRange(format!(
            "Module index {} outside course module list (0..{})",
            module_index, module_count
        )));
    }

    if principal.is_staff() {
        return Ok(());
    }

    // A student with no record yet has the default unlock set {0}; the
    // record itself is only created by the first mutating operation
    let unlocked = match progress::load_progress(db, principal.user_id, course_id).await? {
        Some(record) => record.unlocked_modules.contains(&module_index),
        None => module_index == 0,
    };

    if unlocked {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "Module {} is locked. Complete the previous module to continue.",
            module_index
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_common::Role;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        // Isolated engine unit tests seed only courses, not users; run without
        // referential-integrity enforcement (production enables it in
        // init_database).
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&pool).await.unwrap();
        praxis_common::db::init_schema(&pool).await.unwrap();
        pool
    }

    async fn seed_course(pool: &Pool<Sqlite>, course_id: Uuid, module_count: u32) {
        sqlx::query("INSERT INTO courses (guid, title, module_count) VALUES (?, 'Course', ?)")
            .bind(course_id.to_string())
            .bind(module_count)
            .execute(pool)
            .await
            .unwrap();
    }

    fn student() -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            role: Role::Student,
        }
    }

    #[tokio::test]
    async fn test_unknown_course_is_not_found() {
        let pool = setup_test_db().await;
        let err = can_access(&pool, &student(), Uuid::new_v4(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_index_out_of_range() {
        let pool = setup_test_db().await;
        let course = Uuid::new_v4();
        seed_course(&pool, course, 3).await;

        let err = can_access(&pool, &student(), course, 3).await.unwrap_err();
        assert!(matches!(err, Error::OutOfRange(_)));
    }

    #[tokio::test]
    async fn test_staff_always_allowed() {
        let pool = setup_test_db().await;
        let course = Uuid::new_v4();
        seed_course(&pool, course, 3).await;

        for role in [Role::Staff, Role::Admin] {
            let principal = Principal {
                user_id: Uuid::new_v4(),
                role,
            };
            can_access(&pool, &principal, course, 2).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_student_without_record_gets_module_zero_only() {
        let pool = setup_test_db().await;
        let course = Uuid::new_v4();
        seed_course(&pool, course, 3).await;
        let principal = student();

        can_access(&pool, &principal, course, 0).await.unwrap();
        let err = can_access(&pool, &principal, course, 1).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        // The check itself must not have created a record
        let record = progress::load_progress(&pool, principal.user_id, course)
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_student_with_record_follows_unlock_set() {
        let pool = setup_test_db().await;
        let course = Uuid::new_v4();
        seed_course(&pool, course, 4).await;
        let principal = student();

        progress::get_or_create_progress(&pool, principal.user_id, course)
            .await
            .unwrap();
        sqlx::query(
            "UPDATE progress_records SET unlocked_modules = '[0,2]'
             WHERE student_guid = ? AND course_guid = ?",
        )
        .bind(principal.user_id.to_string())
        .bind(course.to_string())
        .execute(&pool)
        .await
        .unwrap();

        can_access(&pool, &principal, course, 0).await.unwrap();
        can_access(&pool, &principal, course, 2).await.unwrap();
        assert!(can_access(&pool, &principal, course, 1).await.is_err());
        assert!(can_access(&pool, &principal, course, 3).await.is_err());
    }
}
