mod clock;
mod display;
mod engine;
mod phase;
mod run;

pub use clock::{to_datetime, Clock, ManualClock, PollScheduler, SystemClock, TickScheduler};
pub use display::{current_round, format_clock, project, DisplayProjection, WakeLockStatus};
pub use engine::{IntervalEngine, MIN_PHASE_MS};
pub use phase::{duration_of, next_phase, preview_next, Phase};
pub use run::{ElapsedTotals, Run};
