//! Integration tests for SQLite persistence.
//!
//! Runs an interval program against a database file, reopens it, and checks
//! that programs, favorites and session records survive.

use gritfit_core::timer::ManualClock;
use gritfit_core::{
    CoreError, Database, DatabaseError, IntervalEngine, Program, ProgramStore, RoundLimit,
    SessionStore,
};

const T0: u64 = 1_700_000_000_000;

#[test]
fn finished_run_is_persisted_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gritfit.db");

    let mut db = Database::open_at(&path).unwrap();
    let program = Program::quick(10, 5, RoundLimit::Fixed(2)).with_name("Lunch Intervals");
    let id = db.save_program(&program).unwrap();
    let saved = db.get_program(&id).unwrap().expect("program saved");

    let clock = ManualClock::new(T0);
    let mut engine = IntervalEngine::new(Box::new(db)).with_clock(clock.clone());
    engine.start(&saved, None).unwrap();
    clock.advance_secs(60);
    engine.tick();
    assert!(engine.run().unwrap().is_complete());
    drop(engine);

    let db = Database::open_at(&path).unwrap();
    let sessions = db.list_sessions(Some(id.as_str())).unwrap();
    assert_eq!(sessions.len(), 1);
    let record = &sessions[0];
    assert_eq!(record.program_name, "Lunch Intervals");
    assert_eq!(record.completed_rounds, 2);
    assert_eq!(record.totals.work_time_sec, 20);
    assert_eq!(record.totals.rest_time_sec, 5);
    assert!(!record.stopped_early);

    let summary = db.session_summary().unwrap();
    assert_eq!(summary.total_sessions, 1);
    assert_eq!(summary.completed_sessions, 1);
    assert_eq!(summary.total_rounds, 2);
}

#[test]
fn favorites_survive_reopen_and_presets_stay_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gritfit.db");

    {
        let mut db = Database::open_at(&path).unwrap();
        db.set_favorite("preset-tabata", true).unwrap();
        let err = db.delete_program("preset-tabata").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::BuiltInReadOnly(_))
        ));
    }

    let db = Database::open_at(&path).unwrap();
    let tabata = db.get_program("preset-tabata").unwrap().unwrap();
    assert!(tabata.is_favorite);
    assert!(tabata.is_built_in);
    let programs = db.list_programs().unwrap();
    assert!(programs.iter().any(|p| p.id.as_deref() == Some("preset-emom-10")));
}

#[test]
fn stopped_run_is_recorded_as_early() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gritfit.db");

    let clock = ManualClock::new(T0);
    let db = Database::open_at(&path).unwrap();
    let mut engine = IntervalEngine::new(Box::new(db)).with_clock(clock.clone());
    engine
        .start(&Program::quick(30, 10, RoundLimit::Infinite), Some("Open"))
        .unwrap();
    clock.advance_secs(3 + 40 * 3 + 5);
    engine.tick();
    engine.stop(true);
    drop(engine);

    let db = Database::open_at(&path).unwrap();
    let sessions = db.list_sessions(None).unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].stopped_early);
    assert_eq!(sessions[0].completed_rounds, 3);
    assert_eq!(sessions[0].program_id, None);
    assert_eq!(sessions[0].program_name, "Open");
    assert_eq!(db.session_summary().unwrap().stopped_early_sessions, 1);
}
