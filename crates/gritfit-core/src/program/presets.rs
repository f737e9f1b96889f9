//! Built-in interval presets.
//!
//! Presets are never stored in the database and never mutated in place.
//! Saving an edited preset creates a new user program.

use super::{CueSettings, Program, RoundLimit};

/// Returns all built-in presets.
pub fn builtin_programs() -> Vec<Program> {
    vec![
        tabata(),
        hiit_40_20(),
        emom_10(),
        sprint_ladder(),
        open_intervals(),
    ]
}

/// Find a built-in preset by ID.
pub fn find_builtin(id: &str) -> Option<Program> {
    builtin_programs()
        .into_iter()
        .find(|p| p.id.as_deref() == Some(id))
}

/// Get preset IDs for listing.
pub fn preset_ids() -> Vec<&'static str> {
    vec![
        "preset-tabata",
        "preset-hiit-40-20",
        "preset-emom-10",
        "preset-sprint-ladder",
        "preset-open-intervals",
    ]
}

fn preset(
    id: &str,
    name: &str,
    category: &str,
    description: &str,
    work: u32,
    rest: u32,
    rounds: RoundLimit,
) -> Program {
    Program {
        id: Some(id.to_string()),
        name: name.to_string(),
        category: category.to_string(),
        description: description.trim().to_string(),
        work_seconds: work,
        rest_seconds: rest,
        rounds,
        warmup_seconds: 0,
        cooldown_seconds: 0,
        cues: CueSettings::default(),
        is_built_in: true,
        is_favorite: false,
        created_at: None,
        updated_at: None,
    }
}

/// Classic Tabata: 8 rounds of 20s on, 10s off.
fn tabata() -> Program {
    preset(
        "preset-tabata",
        "Tabata",
        "hiit",
        indoc::indoc! {"
            Eight rounds of 20 seconds all-out effort followed by 10 seconds
            of rest. Four minutes total.
        "},
        20,
        10,
        RoundLimit::Fixed(8),
    )
}

fn hiit_40_20() -> Program {
    preset(
        "preset-hiit-40-20",
        "HIIT 40/20",
        "hiit",
        indoc::indoc! {"
            Ten rounds of 40 seconds work and 20 seconds rest, bracketed by a
            one minute warm-up and a one minute cool-down.
        "},
        40,
        20,
        RoundLimit::Fixed(10),
    )
    .with_warmup(60)
    .with_cooldown(60)
}

/// Every minute on the minute. No rest phase: the next round starts
/// right after the previous one.
fn emom_10() -> Program {
    preset(
        "preset-emom-10",
        "EMOM 10",
        "strength",
        indoc::indoc! {"
            Every minute on the minute for ten minutes. Finish the prescribed
            reps early and use the remainder of the minute to recover.
        "},
        60,
        0,
        RoundLimit::Fixed(10),
    )
}

fn sprint_ladder() -> Program {
    preset(
        "preset-sprint-ladder",
        "Sprint 30/30",
        "cardio",
        indoc::indoc! {"
            Six 30 second sprints with equal recovery, after a two minute
            easy warm-up.
        "},
        30,
        30,
        RoundLimit::Fixed(6),
    )
    .with_warmup(120)
}

fn open_intervals() -> Program {
    preset(
        "preset-open-intervals",
        "Open Intervals",
        "cardio",
        indoc::indoc! {"
            45 seconds on, 15 seconds off, until you stop.
        "},
        45,
        15,
        RoundLimit::Infinite,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_are_valid_and_flagged() {
        for program in builtin_programs() {
            assert!(program.validate().is_ok(), "{} is invalid", program.name);
            assert!(program.is_built_in);
        }
    }

    #[test]
    fn ids_match_presets() {
        let ids: Vec<String> = builtin_programs()
            .into_iter()
            .filter_map(|p| p.id)
            .collect();
        assert_eq!(ids, preset_ids());
    }

    #[test]
    fn find_builtin_by_id() {
        let tabata = find_builtin("preset-tabata").unwrap();
        assert_eq!(tabata.work_seconds, 20);
        assert_eq!(tabata.rounds, RoundLimit::Fixed(8));
        assert!(find_builtin("missing").is_none());
    }
}
