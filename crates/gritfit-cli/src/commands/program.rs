//! Interval program commands.
//!
//! Built-in presets and saved programs are listed together. Editing a
//! preset saves an edited copy; the preset itself never changes.

use clap::Subcommand;
use gritfit_core::storage::ProgramStore;
use gritfit_core::timer::format_clock;
use gritfit_core::{Database, Program, RoundLimit};

use super::{parse_rounds, CueArgs};

#[derive(Subcommand)]
pub enum ProgramAction {
    /// List built-in and saved programs
    List {
        /// Only show favorites
        #[arg(long)]
        favorites: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one program
    Show {
        /// Program ID (e.g. "preset-tabata")
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Create a program
    Create {
        /// Display name
        name: String,
        /// Work phase length in seconds
        #[arg(long)]
        work: u32,
        /// Rest phase length in seconds (0 skips rest)
        #[arg(long, default_value = "0")]
        rest: u32,
        /// Number of rounds, or "inf"
        #[arg(long, default_value = "8", value_parser = parse_rounds)]
        rounds: RoundLimit,
        /// Warm-up length in seconds
        #[arg(long, default_value = "0")]
        warmup: u32,
        /// Cool-down length in seconds
        #[arg(long, default_value = "0")]
        cooldown: u32,
        #[arg(long, default_value = "custom")]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        #[command(flatten)]
        cues: CueArgs,
    },
    /// Edit a program; editing a preset saves a copy
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        work: Option<u32>,
        #[arg(long)]
        rest: Option<u32>,
        #[arg(long, value_parser = parse_rounds)]
        rounds: Option<RoundLimit>,
        #[arg(long)]
        warmup: Option<u32>,
        #[arg(long)]
        cooldown: Option<u32>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        cues: CueArgs,
    },
    /// Mark a program as favorite
    Favorite {
        id: String,
        /// Remove the mark instead
        #[arg(long)]
        off: bool,
    },
    /// Delete a saved program
    Delete { id: String },
}

pub fn run(action: ProgramAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;

    match action {
        ProgramAction::List { favorites, json } => {
            let programs: Vec<Program> = db
                .list_programs()?
                .into_iter()
                .filter(|p| !favorites || p.is_favorite)
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&programs)?);
            } else {
                print_table(&programs);
            }
        }
        ProgramAction::Show { id, json } => {
            let program = load(&db, &id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&program)?);
            } else {
                print_details(&program);
            }
        }
        ProgramAction::Create {
            name,
            work,
            rest,
            rounds,
            warmup,
            cooldown,
            category,
            description,
            cues,
        } => {
            let mut program = Program::quick(work, rest, rounds)
                .with_name(name)
                .with_warmup(warmup)
                .with_cooldown(cooldown);
            program.category = category;
            program.description = description;
            cues.apply(&mut program.cues);
            let id = db.save_program(&program)?;
            println!("{id}");
        }
        ProgramAction::Edit {
            id,
            name,
            work,
            rest,
            rounds,
            warmup,
            cooldown,
            category,
            description,
            cues,
        } => {
            let mut program = load(&db, &id)?;
            if let Some(name) = name {
                program.name = name;
            }
            if let Some(work) = work {
                program.work_seconds = work;
            }
            if let Some(rest) = rest {
                program.rest_seconds = rest;
            }
            if let Some(rounds) = rounds {
                program.rounds = rounds;
            }
            if let Some(warmup) = warmup {
                program.warmup_seconds = warmup;
            }
            if let Some(cooldown) = cooldown {
                program.cooldown_seconds = cooldown;
            }
            if let Some(category) = category {
                program.category = category;
            }
            if let Some(description) = description {
                program.description = description;
            }
            cues.apply(&mut program.cues);
            let saved_id = db.save_program(&program)?;
            if saved_id != id {
                eprintln!("{id} is a built-in preset; saved an edited copy");
            }
            println!("{saved_id}");
        }
        ProgramAction::Favorite { id, off } => {
            db.set_favorite(&id, !off)?;
            println!("ok");
        }
        ProgramAction::Delete { id } => {
            db.delete_program(&id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

pub fn load(db: &Database, id: &str) -> Result<Program, Box<dyn std::error::Error>> {
    db.get_program(id)?
        .ok_or_else(|| format!("program '{id}' not found").into())
}

fn print_table(programs: &[Program]) {
    for program in programs {
        let id = program.id.as_deref().unwrap_or("-");
        let favorite = if program.is_favorite { " *" } else { "" };
        let length = program
            .planned_duration_secs()
            .map(format_clock)
            .unwrap_or_else(|| "open".to_string());
        println!(
            "{id:<24} {:<20} {:<18} {length:>6}{favorite}",
            program.name,
            program.shape_label()
        );
    }
}

fn print_details(program: &Program) {
    let title = format!("{} ({})", program.name, program.id.as_deref().unwrap_or("-"));
    println!("{title}");
    println!("{}", "=".repeat(title.chars().count()));
    if !program.description.is_empty() {
        println!("{}", program.description);
    }
    println!();
    println!("Category: {}", program.category);
    println!("Work:     {}", format_clock(u64::from(program.work_seconds)));
    println!("Rest:     {}", format_clock(u64::from(program.rest_seconds)));
    match program.rounds {
        RoundLimit::Fixed(n) => println!("Rounds:   {n}"),
        RoundLimit::Infinite => println!("Rounds:   until stopped"),
    }
    if program.warmup_seconds > 0 {
        println!("Warm-up:  {}", format_clock(u64::from(program.warmup_seconds)));
    }
    if program.cooldown_seconds > 0 {
        println!("Cool-down: {}", format_clock(u64::from(program.cooldown_seconds)));
    }
    if let Some(total) = program.planned_duration_secs() {
        println!("Total:    {}", format_clock(total));
    }
    println!();
    println!(
        "Cues: sound={} vibration={} countdown={} keep_awake={}",
        program.cues.sound_enabled,
        program.cues.vibration_enabled,
        program.cues.countdown_enabled,
        program.cues.keep_awake_enabled
    );
    if program.is_built_in {
        println!("Built-in preset");
    }
    if program.is_favorite {
        println!("Favorite");
    }
}
