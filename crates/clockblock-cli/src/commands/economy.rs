use chrono::{Local, Utc};
use clockblock_core::{curfew, history, Event, TimeOfDay};
use serde_json::json;

use super::{fresh_engine, print_json, CliResult, Session};

pub fn status() -> CliResult {
    let session = Session::open()?;
    let engine = session.engine()?;
    let day = session.config.schedule.day_for(engine.day());
    let now = Local::now();
    let snapshot = engine.snapshot();

    print_json(&json!({
        "snapshot": snapshot,
        "curfew": curfew::evaluate(TimeOfDay::from(now.time()), day),
        "today": history::project(&snapshot, day.allowance, now.date_naive()),
    }))
}

pub fn tick(count: u32) -> CliResult {
    let mut session = Session::open()?;
    let events: Vec<Event> =
        session.update(|engine| Ok((0..count).map(|_| engine.tick()).collect()))?;
    print_json(&events)
}

pub fn adjust(amount: i64) -> CliResult {
    let mut session = Session::open()?;
    let event = session.update(|engine| Ok(engine.adjust_budget(amount)))?;
    print_json(&event)
}

/// Close the engine's current day. The log is dated with the closed day,
/// which is usually yesterday when this runs after midnight.
pub fn settle() -> CliResult {
    let mut session = Session::open()?;
    let schedule = session.config.schedule.clone();
    let today = Local::now().date_naive();
    let (settlement, log) = session.update(|engine| {
        let allowance = schedule.day_for(engine.day()).allowance;
        let date = history::closing_date(engine.day(), today);
        let log = history::project(&engine.snapshot(), allowance, date);
        Ok((engine.settle_day_end(&schedule), log))
    })?;
    session.db.record_daily_log(&log)?;

    print_json(&json!({
        "event": Event::DaySettled { settlement, at: Utc::now() },
        "log": log,
    }))
}

pub fn reset() -> CliResult {
    let mut session = Session::open()?;
    let config = session.config.clone();
    let event = session.update(|engine| {
        *engine = fresh_engine(&config)?;
        Ok(engine.snapshot_event())
    })?;
    print_json(&event)
}
