use chrono::Local;
use clockblock_core::{curfew, TimeOfDay};

use super::{print_json, CliResult, Session};

/// Evaluate the play window of the engine's current day.
pub fn run(at: Option<&str>) -> CliResult {
    let now = match at {
        Some(text) => text.parse::<TimeOfDay>()?,
        None => TimeOfDay::from(Local::now().time()),
    };
    let session = Session::open()?;
    let day = session.config.schedule.day_for(session.engine()?.day());
    print_json(&curfew::evaluate(now, day))
}
