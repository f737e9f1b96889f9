//! SQLite-based program and session storage.
//!
//! Provides persistent storage for:
//! - User interval programs and favorites
//! - Finished interval sessions

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use super::{
    data_dir, ensure_not_builtin, migrations, prepare_for_save, ProgramStore, SessionRecord,
    SessionStore, SessionSummary, SessionTotals,
};
use crate::error::{DatabaseError, Result};
use crate::program::{builtin_programs, CueSettings, Program, RoundLimit};

/// SQLite database for programs and sessions.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/gritfit/gritfit.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("gritfit.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    fn favorite_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT program_id FROM favorites")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn user_programs(&self) -> Result<Vec<Program>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, description, work_seconds, rest_seconds, rounds,
                    warmup_seconds, cooldown_seconds, sound_enabled, vibration_enabled,
                    countdown_enabled, keep_awake_enabled, created_at, updated_at
             FROM programs
             ORDER BY updated_at DESC",
        )?;
        let programs = stmt
            .query_map([], program_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(programs)
    }
}

impl ProgramStore for Database {
    fn list_programs(&self) -> Result<Vec<Program>> {
        let favorites = self.favorite_ids()?;
        let mut programs = builtin_programs();
        programs.extend(self.user_programs()?);
        for program in &mut programs {
            program.is_favorite = program
                .id
                .as_ref()
                .is_some_and(|id| favorites.contains(id));
        }
        Ok(programs)
    }

    fn get_program(&self, id: &str) -> Result<Option<Program>> {
        Ok(self
            .list_programs()?
            .into_iter()
            .find(|p| p.id.as_deref() == Some(id)))
    }

    fn save_program(&mut self, program: &Program) -> Result<String> {
        let prepared = prepare_for_save(program)?;
        let id = prepared.id.clone().unwrap_or_default();
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO programs (id, name, category, description, work_seconds, rest_seconds,
                                   rounds, warmup_seconds, cooldown_seconds, sound_enabled,
                                   vibration_enabled, countdown_enabled, keep_awake_enabled,
                                   created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                description = excluded.description,
                work_seconds = excluded.work_seconds,
                rest_seconds = excluded.rest_seconds,
                rounds = excluded.rounds,
                warmup_seconds = excluded.warmup_seconds,
                cooldown_seconds = excluded.cooldown_seconds,
                sound_enabled = excluded.sound_enabled,
                vibration_enabled = excluded.vibration_enabled,
                countdown_enabled = excluded.countdown_enabled,
                keep_awake_enabled = excluded.keep_awake_enabled,
                updated_at = excluded.updated_at",
            params![
                id,
                prepared.name,
                prepared.category,
                prepared.description,
                prepared.work_seconds,
                prepared.rest_seconds,
                prepared.rounds.total(),
                prepared.warmup_seconds,
                prepared.cooldown_seconds,
                prepared.cues.sound_enabled,
                prepared.cues.vibration_enabled,
                prepared.cues.countdown_enabled,
                prepared.cues.keep_awake_enabled,
                prepared.created_at.unwrap_or(now).to_rfc3339(),
                prepared.updated_at.unwrap_or(now).to_rfc3339(),
            ],
        )?;
        Ok(id)
    }

    fn delete_program(&mut self, id: &str) -> Result<()> {
        ensure_not_builtin(id)?;
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM programs WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(DatabaseError::NotFound {
                kind: "Program",
                id: id.to_string(),
            }
            .into());
        }
        tx.execute("DELETE FROM favorites WHERE program_id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    fn set_favorite(&mut self, id: &str, favorite: bool) -> Result<()> {
        if self.get_program(id)?.is_none() {
            return Err(DatabaseError::NotFound {
                kind: "Program",
                id: id.to_string(),
            }
            .into());
        }
        if favorite {
            self.conn.execute(
                "INSERT OR IGNORE INTO favorites (program_id) VALUES (?1)",
                params![id],
            )?;
        } else {
            self.conn
                .execute("DELETE FROM favorites WHERE program_id = ?1", params![id])?;
        }
        Ok(())
    }
}

impl SessionStore for Database {
    fn save_session(&mut self, record: &SessionRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO interval_sessions (id, program_id, program_name, started_at, ended_at,
                                            completed_rounds, stopped_early, work_time_sec,
                                            rest_time_sec, warmup_time_sec, cooldown_time_sec)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.id,
                record.program_id,
                record.program_name,
                record.started_at.to_rfc3339(),
                record.ended_at.to_rfc3339(),
                record.completed_rounds,
                record.stopped_early,
                record.totals.work_time_sec,
                record.totals.rest_time_sec,
                record.totals.warmup_time_sec,
                record.totals.cooldown_time_sec,
            ],
        )?;
        Ok(())
    }

    fn list_sessions(&self, program_id: Option<&str>) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, program_id, program_name, started_at, ended_at, completed_rounds,
                    stopped_early, work_time_sec, rest_time_sec, warmup_time_sec,
                    cooldown_time_sec
             FROM interval_sessions
             WHERE ?1 IS NULL OR program_id = ?1
             ORDER BY started_at DESC",
        )?;
        let sessions = stmt
            .query_map(params![program_id], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    fn session_summary(&self) -> Result<SessionSummary> {
        let summary = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN stopped_early = 0 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN stopped_early = 1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(completed_rounds), 0),
                    COALESCE(SUM(work_time_sec), 0),
                    COALESCE(SUM(rest_time_sec), 0)
             FROM interval_sessions",
            [],
            |row| {
                Ok(SessionSummary {
                    total_sessions: row.get(0)?,
                    completed_sessions: row.get(1)?,
                    stopped_early_sessions: row.get(2)?,
                    total_rounds: row.get(3)?,
                    total_work_sec: row.get(4)?,
                    total_rest_sec: row.get(5)?,
                })
            },
        )?;
        Ok(summary)
    }
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn program_from_row(row: &Row<'_>) -> rusqlite::Result<Program> {
    let rounds = match row.get::<_, Option<u32>>(6)? {
        Some(n) => RoundLimit::Fixed(n),
        None => RoundLimit::Infinite,
    };
    Ok(Program {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        work_seconds: row.get(4)?,
        rest_seconds: row.get(5)?,
        rounds,
        warmup_seconds: row.get(7)?,
        cooldown_seconds: row.get(8)?,
        cues: CueSettings {
            sound_enabled: row.get(9)?,
            vibration_enabled: row.get(10)?,
            countdown_enabled: row.get(11)?,
            keep_awake_enabled: row.get(12)?,
        },
        is_built_in: false,
        is_favorite: false,
        created_at: Some(parse_timestamp(row, 13)?),
        updated_at: Some(parse_timestamp(row, 14)?),
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        program_id: row.get(1)?,
        program_name: row.get(2)?,
        started_at: parse_timestamp(row, 3)?,
        ended_at: parse_timestamp(row, 4)?,
        completed_rounds: row.get(5)?,
        stopped_early: row.get(6)?,
        totals: SessionTotals {
            work_time_sec: row.get(7)?,
            rest_time_sec: row.get(8)?,
            warmup_time_sec: row.get(9)?,
            cooldown_time_sec: row.get(10)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(program_id: Option<&str>, stopped_early: bool, minutes_ago: i64) -> SessionRecord {
        let ended_at = Utc::now() - Duration::minutes(minutes_ago);
        SessionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            program_id: program_id.map(str::to_string),
            program_name: "Tabata".into(),
            started_at: ended_at - Duration::minutes(4),
            ended_at,
            completed_rounds: if stopped_early { 3 } else { 8 },
            stopped_early,
            totals: SessionTotals {
                work_time_sec: 160,
                rest_time_sec: 70,
                ..SessionTotals::default()
            },
        }
    }

    #[test]
    fn save_and_list_user_program() {
        let mut db = Database::open_memory().unwrap();
        let program = Program::quick(40, 20, RoundLimit::Infinite).with_name("Open 40/20");
        let id = db.save_program(&program).unwrap();

        let saved = db.get_program(&id).unwrap().unwrap();
        assert_eq!(saved.name, "Open 40/20");
        assert_eq!(saved.rounds, RoundLimit::Infinite);
        assert!(saved.created_at.is_some());
        assert!(db.list_programs().unwrap().len() > 1);
    }

    #[test]
    fn update_keeps_created_at() {
        let mut db = Database::open_memory().unwrap();
        let id = db
            .save_program(&Program::quick(40, 20, RoundLimit::Fixed(5)).with_name("A"))
            .unwrap();
        let mut saved = db.get_program(&id).unwrap().unwrap();
        let created = saved.created_at;
        saved.rest_seconds = 30;
        assert_eq!(db.save_program(&saved).unwrap(), id);

        let updated = db.get_program(&id).unwrap().unwrap();
        assert_eq!(updated.rest_seconds, 30);
        assert_eq!(updated.created_at, created);
    }

    #[test]
    fn favorite_round_trip_and_delete() {
        let mut db = Database::open_memory().unwrap();
        let id = db
            .save_program(&Program::quick(40, 20, RoundLimit::Fixed(5)).with_name("A"))
            .unwrap();
        db.set_favorite(&id, true).unwrap();
        assert!(db.get_program(&id).unwrap().unwrap().is_favorite);
        db.delete_program(&id).unwrap();
        assert!(db.get_program(&id).unwrap().is_none());
        assert!(db.favorite_ids().unwrap().is_empty());
        assert!(db.delete_program(&id).is_err());
    }

    #[test]
    fn sessions_filter_by_program() {
        let mut db = Database::open_memory().unwrap();
        db.save_session(&record(Some("preset-tabata"), false, 30)).unwrap();
        db.save_session(&record(None, true, 10)).unwrap();

        let all = db.list_sessions(None).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].started_at > all[1].started_at);

        let tabata = db.list_sessions(Some("preset-tabata")).unwrap();
        assert_eq!(tabata.len(), 1);
        assert_eq!(tabata[0].completed_rounds, 8);
    }

    #[test]
    fn summary_matches_records() {
        let mut db = Database::open_memory().unwrap();
        db.save_session(&record(None, false, 30)).unwrap();
        db.save_session(&record(None, true, 10)).unwrap();
        let summary = db.session_summary().unwrap();
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.completed_sessions, 1);
        assert_eq!(summary.stopped_early_sessions, 1);
        assert_eq!(summary.total_rounds, 11);
        assert_eq!(summary.total_work_sec, 320);
    }
}
