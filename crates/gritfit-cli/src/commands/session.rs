use clap::Subcommand;
use gritfit_core::storage::SessionStore;
use gritfit_core::timer::format_clock;
use gritfit_core::Database;

#[derive(Subcommand)]
pub enum SessionAction {
    /// List recorded sessions, newest first
    List {
        /// Only sessions of this program
        #[arg(long)]
        program: Option<String>,
        /// Maximum number of sessions to show
        #[arg(long, default_value = "20")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// All-time totals
    Stats,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SessionAction::List {
            program,
            limit,
            json,
        } => {
            let mut sessions = db.list_sessions(program.as_deref())?;
            sessions.truncate(limit);
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
                return Ok(());
            }
            for s in &sessions {
                let status = if s.stopped_early { "stopped" } else { "done" };
                println!(
                    "{} {:<20} {:>3} rounds  work {:>6}  rest {:>6}  {status}",
                    s.started_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
                    s.program_name,
                    s.completed_rounds,
                    format_clock(s.totals.work_time_sec),
                    format_clock(s.totals.rest_time_sec),
                );
            }
        }
        SessionAction::Stats => {
            let summary = db.session_summary()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
