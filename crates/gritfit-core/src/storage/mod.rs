mod config;
pub mod database;
mod memory;
pub mod migrations;
mod session;

pub use config::{Config, TerminalConfig, TimerConfig};
pub use database::Database;
pub use memory::MemoryStore;
pub use session::{SessionRecord, SessionSummary, SessionTotals};

use std::path::PathBuf;

use chrono::Utc;

use crate::error::{ConfigError, DatabaseError, Result, ValidationError};
use crate::program::{find_builtin, Program};

/// Saved and built-in interval programs.
///
/// Built-in presets are listed alongside user programs but are never
/// mutated in place: saving one creates a new user program.
pub trait ProgramStore {
    fn list_programs(&self) -> Result<Vec<Program>>;

    fn get_program(&self, id: &str) -> Result<Option<Program>>;

    /// Insert or update a program and return its id.
    fn save_program(&mut self, program: &Program) -> Result<String>;

    /// Remove a user program. Built-in presets cannot be deleted.
    fn delete_program(&mut self, id: &str) -> Result<()>;

    fn set_favorite(&mut self, id: &str, favorite: bool) -> Result<()>;
}

/// Append-only log of finished runs.
pub trait SessionStore {
    fn save_session(&mut self, record: &SessionRecord) -> Result<()>;

    /// Sessions newest first, optionally only those of one program.
    fn list_sessions(&self, program_id: Option<&str>) -> Result<Vec<SessionRecord>>;

    fn session_summary(&self) -> Result<SessionSummary> {
        let sessions = self.list_sessions(None)?;
        Ok(SessionSummary::from_records(&sessions))
    }
}

/// Returns `~/.config/gritfit[-dev]/` based on GRITFIT_ENV.
///
/// Set GRITFIT_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("GRITFIT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("gritfit-dev")
    } else {
        base_dir.join("gritfit")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Validate `program` and stamp the metadata a store writes with it.
///
/// Programs without an id and built-in presets get a fresh uuid, so an
/// edited preset always becomes a new user program.
pub(crate) fn prepare_for_save(program: &Program) -> Result<Program> {
    program.validate()?;
    if program.name.trim().is_empty() {
        return Err(ValidationError::Empty("name".into()).into());
    }

    let now = Utc::now();
    let mut prepared = program.clone();
    let is_new = prepared.id.is_none() || prepared.is_built_in;
    if is_new {
        prepared.id = Some(uuid::Uuid::new_v4().to_string());
        prepared.is_built_in = false;
        prepared.created_at = Some(now);
    } else if prepared.created_at.is_none() {
        prepared.created_at = Some(now);
    }
    prepared.updated_at = Some(now);
    Ok(prepared)
}

/// Refuse to delete a built-in preset.
pub(crate) fn ensure_not_builtin(id: &str) -> Result<()> {
    if find_builtin(id).is_some() {
        return Err(DatabaseError::BuiltInReadOnly(id.to_string()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{find_builtin, RoundLimit};

    #[test]
    fn prepared_preset_becomes_user_program() {
        let preset = find_builtin("preset-tabata").unwrap();
        let prepared = prepare_for_save(&preset).unwrap();
        assert_ne!(prepared.id.as_deref(), Some("preset-tabata"));
        assert!(!prepared.is_built_in);
        assert!(prepared.created_at.is_some());
    }

    #[test]
    fn prepared_user_program_keeps_id() {
        let mut program = Program::quick(30, 15, RoundLimit::Fixed(4));
        program.id = Some("abc".into());
        let prepared = prepare_for_save(&program).unwrap();
        assert_eq!(prepared.id.as_deref(), Some("abc"));
    }

    #[test]
    fn invalid_program_is_not_prepared() {
        let program = Program::quick(0, 15, RoundLimit::Fixed(4));
        assert!(prepare_for_save(&program).is_err());
        let program = Program::quick(30, 15, RoundLimit::Fixed(4)).with_name("  ");
        assert!(prepare_for_save(&program).is_err());
    }
}
