//! Database schema migrations for gritfit.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: programs, favorites and interval sessions.
///
/// `programs.rounds` is NULL for infinite programs. Built-in presets are
/// not stored; `favorites` may reference their ids.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS programs (
            id                  TEXT PRIMARY KEY,
            name                TEXT NOT NULL,
            category            TEXT NOT NULL DEFAULT '',
            description         TEXT NOT NULL DEFAULT '',
            work_seconds        INTEGER NOT NULL,
            rest_seconds        INTEGER NOT NULL DEFAULT 0,
            rounds              INTEGER,
            warmup_seconds      INTEGER NOT NULL DEFAULT 0,
            cooldown_seconds    INTEGER NOT NULL DEFAULT 0,
            sound_enabled       INTEGER NOT NULL DEFAULT 1,
            vibration_enabled   INTEGER NOT NULL DEFAULT 1,
            countdown_enabled   INTEGER NOT NULL DEFAULT 1,
            keep_awake_enabled  INTEGER NOT NULL DEFAULT 1,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS favorites (
            program_id TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS interval_sessions (
            id                  TEXT PRIMARY KEY,
            program_id          TEXT,
            program_name        TEXT NOT NULL DEFAULT '',
            started_at          TEXT NOT NULL,
            ended_at            TEXT NOT NULL,
            completed_rounds    INTEGER NOT NULL DEFAULT 0,
            stopped_early       INTEGER NOT NULL DEFAULT 0,
            work_time_sec       INTEGER NOT NULL DEFAULT 0,
            rest_time_sec       INTEGER NOT NULL DEFAULT 0,
            warmup_time_sec     INTEGER NOT NULL DEFAULT 0,
            cooldown_time_sec   INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_programs_category ON programs(category);
        CREATE INDEX IF NOT EXISTS idx_programs_updated_at ON programs(updated_at);
        CREATE INDEX IF NOT EXISTS idx_sessions_program_id ON interval_sessions(program_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON interval_sessions(started_at);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}
