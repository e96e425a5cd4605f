use clap::Subcommand;
use clockblock_core::{Config, DayConfig, DayEdit, TimeOfDay, WeeklySchedule};

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Show the weekly schedule
    List,
    /// Replace the whole week from JSON (array of 7 days, Sunday first)
    Set {
        json: String,
    },
    /// Edit one day (0 = Sunday)
    SetDay {
        index: usize,
        #[arg(long)]
        allowance: Option<u32>,
        /// Window start (HH:MM)
        #[arg(long)]
        start: Option<TimeOfDay>,
        /// Window end (HH:MM)
        #[arg(long)]
        end: Option<TimeOfDay>,
    },
    /// Copy the first weekday's allowance and window onto the weekend days
    CopyWeekdays,
    /// Copy the first weekend day's allowance and window onto the weekdays
    CopyWeekends,
    /// Restore the default week
    Reset,
}

pub fn run(action: ScheduleAction) -> CliResult {
    let mut config = Config::load()?;
    let changed = !matches!(action, ScheduleAction::List);
    match action {
        ScheduleAction::List => {}
        ScheduleAction::Set { json } => {
            let days: Vec<DayConfig> = serde_json::from_str(&json)?;
            config.schedule.replace_all(days)?;
        }
        ScheduleAction::SetDay {
            index,
            allowance,
            start,
            end,
        } => {
            let edits = [
                allowance.map(DayEdit::Allowance),
                start.map(DayEdit::WindowStart),
                end.map(DayEdit::WindowEnd),
            ];
            // Validate the index even when no field was given.
            config.schedule.get_day(index)?;
            for edit in edits.into_iter().flatten() {
                config.schedule.update_day(index, edit)?;
            }
        }
        ScheduleAction::CopyWeekdays => {
            if config.schedule.copy_to_group(true).is_none() {
                eprintln!("no weekday to copy from");
            }
        }
        ScheduleAction::CopyWeekends => {
            if config.schedule.copy_to_group(false).is_none() {
                eprintln!("no weekend day to copy from");
            }
        }
        ScheduleAction::Reset => {
            config.schedule = WeeklySchedule::default();
        }
    }
    if changed {
        config.save()?;
    }
    print_json(config.schedule.days())
}
