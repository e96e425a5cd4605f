use chrono::Local;
use clap::Subcommand;
use clockblock_core::history::{self, WeeklyRecap};

use super::{print_json, CliResult, Session};

const RECAP_DAYS: usize = 7;

#[derive(Subcommand)]
pub enum LogAction {
    /// Project today's log from the live engine state
    Today,
    /// Recorded daily logs, newest first
    History {
        #[arg(long, default_value = "7")]
        limit: usize,
    },
    /// Summary of the last seven recorded days
    Recap,
}

pub fn run(action: LogAction) -> CliResult {
    let session = Session::open()?;
    match action {
        LogAction::Today => {
            let engine = session.engine()?;
            let allowance = session.config.schedule.day_for(engine.day()).allowance;
            let log = history::project(
                &engine.snapshot(),
                allowance,
                Local::now().date_naive(),
            );
            print_json(&log)?;
        }
        LogAction::History { limit } => {
            print_json(&session.db.recent_logs(limit)?)?;
        }
        LogAction::Recap => {
            let logs = session.db.recent_logs(RECAP_DAYS)?;
            print_json(&WeeklyRecap::from_logs(&logs))?;
        }
    }
    Ok(())
}
