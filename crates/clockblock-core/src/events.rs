use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::economy::{EconomySnapshot, Settlement};

/// Every state change in the economy produces an Event.
/// Hosts print them, log them, or forward them to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PlayStarted {
        current_budget: i64,
        at: DateTime<Utc>,
    },
    PlayStopped {
        current_budget: i64,
        at: DateTime<Utc>,
    },
    /// One minute of budget consumed.
    BudgetTicked {
        current_budget: i64,
        overdraft_accumulated: u32,
        /// True only on the tick that crossed from zero into overdraft.
        entered_overdraft: bool,
        at: DateTime<Utc>,
    },
    /// Administrative grant or penalty.
    BudgetAdjusted {
        amount: i64,
        current_budget: i64,
        at: DateTime<Utc>,
    },
    DaySettled {
        settlement: Settlement,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        snapshot: EconomySnapshot,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::PlayStarted { at, .. }
            | Event::PlayStopped { at, .. }
            | Event::BudgetTicked { at, .. }
            | Event::BudgetAdjusted { at, .. }
            | Event::DaySettled { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}
