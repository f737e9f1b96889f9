//! In-memory program and session store.
//!
//! Used by tests and by ephemeral runs that should leave nothing on disk.
//! Clones share the same contents.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ensure_not_builtin, prepare_for_save, ProgramStore, SessionRecord, SessionStore};
use crate::error::{CoreError, DatabaseError, Result};
use crate::program::{builtin_programs, Program};

#[derive(Debug, Default)]
struct MemoryState {
    programs: Vec<Program>,
    favorites: HashSet<String>,
    sessions: Vec<SessionRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.lock().map(|s| s.sessions.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| CoreError::Custom("memory store poisoned".into()))
    }
}

impl ProgramStore for MemoryStore {
    fn list_programs(&self) -> Result<Vec<Program>> {
        let state = self.lock()?;
        let mut programs = builtin_programs();
        programs.extend(state.programs.iter().cloned());
        for program in &mut programs {
            program.is_favorite = program
                .id
                .as_ref()
                .is_some_and(|id| state.favorites.contains(id));
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
        let mut state = self.lock()?;
        match state
            .programs
            .iter()
            .position(|p| p.id.as_deref() == Some(id.as_str()))
        {
            Some(pos) => state.programs[pos] = prepared,
            None => state.programs.push(prepared),
        }
        Ok(id)
    }

    fn delete_program(&mut self, id: &str) -> Result<()> {
        ensure_not_builtin(id)?;
        let mut state = self.lock()?;
        let before = state.programs.len();
        state.programs.retain(|p| p.id.as_deref() != Some(id));
        if state.programs.len() == before {
            return Err(DatabaseError::NotFound {
                kind: "Program",
                id: id.to_string(),
            }
            .into());
        }
        state.favorites.remove(id);
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
        let mut state = self.lock()?;
        if favorite {
            state.favorites.insert(id.to_string());
        } else {
            state.favorites.remove(id);
        }
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn save_session(&mut self, record: &SessionRecord) -> Result<()> {
        self.lock()?.sessions.push(record.clone());
        Ok(())
    }

    fn list_sessions(&self, program_id: Option<&str>) -> Result<Vec<SessionRecord>> {
        let state = self.lock()?;
        let mut sessions: Vec<SessionRecord> = state
            .sessions
            .iter()
            .filter(|s| program_id.is_none() || s.program_id.as_deref() == program_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }
}
