use clockblock_core::Heartbeat;

use super::{print_json, CliResult, Session};

pub fn run(json: &str) -> CliResult {
    let heartbeat: Heartbeat = serde_json::from_str(json)?;
    let mut session = Session::open()?;
    let events = session.update(|engine| Ok(heartbeat.apply(engine)?))?;
    print_json(&events)
}
