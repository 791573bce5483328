//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 1,
            revision_id INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO meta (id, schema_version, revision_id, generated_at)
        VALUES (1, 1, 0, datetime('now'));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            first_name TEXT NOT NULL,
            birthday TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'member' CHECK (role IN ('member', 'admin')),
            is_present INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            UNIQUE (name, birthday)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // List columns hold JSON arrays of catalogue strings.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meal_preferences (
            id TEXT PRIMARY KEY,
            member_id TEXT NOT NULL UNIQUE REFERENCES members(id) ON DELETE CASCADE,
            has_allergy INTEGER NOT NULL DEFAULT 0,
            allergy_details TEXT,
            drink_type TEXT CHECK (drink_type IN ('soft', 'alcohol')),
            favorite_alcohols TEXT NOT NULL DEFAULT '[]',
            favorite_soft_drinks TEXT NOT NULL DEFAULT '[]',
            alcohol_amount TEXT,
            food_categories TEXT NOT NULL DEFAULT '[]',
            food_request TEXT,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id TEXT PRIMARY KEY,
            time_start TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS requests (
            id TEXT PRIMARY KEY,
            member_id TEXT REFERENCES members(id) ON DELETE SET NULL,
            member_name TEXT,
            song_title TEXT NOT NULL,
            artist_name TEXT,
            message TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_members_name ON members(name);
        CREATE INDEX IF NOT EXISTS idx_meal_preferences_updated_at ON meal_preferences(updated_at);
        CREATE INDEX IF NOT EXISTS idx_schedules_time_start ON schedules(time_start);
        CREATE INDEX IF NOT EXISTS idx_requests_created_at ON requests(created_at);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
