//! Database initialization
//!
//! Creates the SQLite store on first run and brings an existing store up to
//! the current schema. All tables are created idempotently; versioned
//! migrations handle everything CREATE TABLE IF NOT EXISTS cannot.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer; progress reads
    // (can-access) vastly outnumber writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Set busy timeout
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and run migrations (idempotent)
///
/// Split from [`init_database`] so tests can apply the schema to an
/// in-memory pool.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_api_tokens_table(pool).await?;

    // Course content catalog (read-only facts for the engine)
    create_courses_table(pool).await?;
    create_course_modules_table(pool).await?;
    create_module_lessons_table(pool).await?;

    // Engine-owned state
    create_lesson_completions_table(pool).await?;
    create_progress_records_table(pool).await?;
    create_progress_history_table(pool).await?;
    create_assignments_table(pool).await?;
    create_auto_unlock_config_table(pool).await?;

    // Versioned migrations (idempotent - safe to call multiple times)
    crate::db::migrations::run_migrations(pool).await?;

    info!("Database initialization complete");
    Ok(())
}

/// Create the users table
async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL DEFAULT 'student',
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the api_tokens table
///
/// Only token hashes are stored; cleartext never touches the database.
async fn create_api_tokens_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS api_tokens (
            token_hash TEXT PRIMARY KEY,
            user_guid TEXT NOT NULL REFERENCES users(guid),
            expires_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the courses table
async fn create_courses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            module_count INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the course_modules table
///
/// Index is the sole addressing scheme: 0-based, contiguous, no gaps.
/// courses.module_count is the authoritative length.
async fn create_course_modules_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS course_modules (
            course_guid TEXT NOT NULL REFERENCES courses(guid),
            module_index INTEGER NOT NULL,
            title TEXT NOT NULL,
            PRIMARY KEY (course_guid, module_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the module_lessons table
async fn create_module_lessons_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS module_lessons (
            guid TEXT PRIMARY KEY,
            course_guid TEXT NOT NULL REFERENCES courses(guid),
            module_index INTEGER NOT NULL,
            title TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the lesson_completions table
async fn create_lesson_completions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lesson_completions (
            student_guid TEXT NOT NULL REFERENCES users(guid),
            lesson_guid TEXT NOT NULL REFERENCES module_lessons(guid),
            course_guid TEXT NOT NULL,
            module_index INTEGER NOT NULL,
            completed_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (student_guid, lesson_guid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the progress_records table
///
/// `version` is the optimistic-concurrency counter: every transition is a
/// compare-and-swap against it, so concurrent writers for the same
/// (student, course) pair serialize.
async fn create_progress_records_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS progress_records (
            student_guid TEXT NOT NULL REFERENCES users(guid),
            course_guid TEXT NOT NULL REFERENCES courses(guid),
            current_module_index INTEGER NOT NULL DEFAULT 0,
            unlocked_modules TEXT NOT NULL DEFAULT '[0]',
            version INTEGER NOT NULL DEFAULT 0,
            archived INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (student_guid, course_guid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the progress_history table (append-only audit log)
async fn create_progress_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS progress_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_guid TEXT NOT NULL,
            course_guid TEXT NOT NULL,
            from_index INTEGER NOT NULL,
            to_index INTEGER NOT NULL,
            cause TEXT NOT NULL,
            actor_guid TEXT,
            detail TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_progress_history_pair
        ON progress_history (student_guid, course_guid)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the assignments table
///
/// The partial unique index enforces the single-pending invariant at the
/// store level: two racing submissions for the same slot cannot both insert
/// a pending row.
async fn create_assignments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assignments (
            guid TEXT PRIMARY KEY,
            student_guid TEXT NOT NULL REFERENCES users(guid),
            course_guid TEXT NOT NULL REFERENCES courses(guid),
            module_index INTEGER NOT NULL,
            submission_link TEXT,
            file_url TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            feedback TEXT,
            score REAL,
            submitted_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            reviewed_at TIMESTAMP,
            reviewer_guid TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_assignments_single_pending
        ON assignments (student_guid, course_guid, module_index)
        WHERE status = 'pending'
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_assignments_course_status
        ON assignments (course_guid, status)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the auto_unlock_config table
async fn create_auto_unlock_config_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS auto_unlock_config (
            course_guid TEXT PRIMARY KEY REFERENCES courses(guid),
            enabled INTEGER NOT NULL DEFAULT 0,
            score_threshold REAL NOT NULL DEFAULT 0,
            updated_by TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_init_schema_creates_tables() {
        let pool = setup_test_db().await;

        for table in [
            "users",
            "api_tokens",
            "courses",
            "course_modules",
            "module_lessons",
            "lesson_completions",
            "progress_records",
            "progress_history",
            "assignments",
            "auto_unlock_config",
            "schema_version",
        ] {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .unwrap();
            assert!(exists, "table {} missing", table);
        }
    }

    #[tokio::test]
    async fn test_init_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("praxis.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        // Reopening an existing database is fine
        pool.close().await;
        init_database(&db_path).await.unwrap();
    }

    #[tokio::test]
    async fn test_init_schema_idempotent() {
        let pool = setup_test_db().await;

        // Second run must not fail or duplicate anything
        init_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_single_pending_index_rejects_duplicate() {
        let pool = setup_test_db().await;

        sqlx::query("INSERT INTO users (guid, username, role) VALUES ('s1', 'student1', 'student')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO courses (guid, title, module_count) VALUES ('c1', 'Course', 4)")
            .execute(&pool)
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO assignments (guid, student_guid, course_guid, module_index, status)
             VALUES ('a1', 's1', 'c1', 0, 'pending')",
        )
        .execute(&pool)
        .await
        .unwrap();

        // Second pending row for the same slot violates the partial index
        let result = sqlx::query(
            "INSERT INTO assignments (guid, student_guid, course_guid, module_index, status)
             VALUES ('a2', 's1', 'c1', 0, 'pending')",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());

        // A resolved row alongside a pending one is fine
        sqlx::query(
            "INSERT INTO assignments (guid, student_guid, course_guid, module_index, status)
             VALUES ('a3', 's1', 'c1', 0, 'rejected')",
        )
        .execute(&pool)
        .await
        .unwrap();
    }
}
