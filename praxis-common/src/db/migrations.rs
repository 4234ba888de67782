//! Database schema migrations
//!
//! Implements versioned schema migrations to allow seamless database
//! upgrades without requiring manual deletion or data loss.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - They must remain stable for
//!    deployments upgrading from older versions
//! 2. **Always add new migrations** - Create a new migration function for
//!    each schema change
//! 3. **Use ALTER TABLE** - Prefer ALTER TABLE over DROP/CREATE to preserve
//!    data
//!
//! # Example Migration
//!
//! ```rust,ignore
//! async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
//!     // Check if column already exists (idempotency)
//!     let has_column: i64 = sqlx::query_scalar(
//!         "SELECT COUNT(*) FROM pragma_table_info('assignments') WHERE name = 'new_column'"
//!     )
//!     .fetch_one(pool)
//!     .await?;
//!
//!     if has_column == 0 {
//!         sqlx::query("ALTER TABLE assignments ADD COLUMN new_column TEXT")
//!             .execute(pool)
//!             .await?;
//!         info!("Migration v2: Added new_column to assignments table");
//!     }
//!     Ok(())
//! }
//! ```

use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

/// Record a schema version in the database
async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Create the schema_version tracking table
async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Run all pending migrations
///
/// Safe to call multiple times; already-applied versions are skipped.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;

    let current = get_schema_version(pool).await?;

    if current >= CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    info!(
        "Migrating database schema from v{} to v{}",
        current, CURRENT_SCHEMA_VERSION
    );

    if current < 1 {
        // v1 is the baseline schema created by init_schema; nothing to
        // transform, just record it
        set_schema_version(pool, 1).await?;
        info!("Migration v1: Baseline schema recorded");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_database_reports_version_zero() {
        let pool = setup_test_db().await;
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_migrations_reaches_current_version() {
        let pool = setup_test_db().await;

        run_migrations(&pool).await.unwrap();
        assert_eq!(
            get_schema_version(&pool).await.unwrap(),
            CURRENT_SCHEMA_VERSION
        );
    }

    #[tokio::test]
    async fn test_run_migrations_idempotent() {
        let pool = setup_test_db().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, CURRENT_SCHEMA_VERSION as i64);
    }
}
