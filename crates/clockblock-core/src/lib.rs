//! # ClockBlock Core Library
//!
//! This library provides the business logic for ClockBlock, a parental
//! screen-time budget tracker. A child gets a daily allowance of minutes;
//! playing debits it once per minute, going below zero accrues overdraft
//! that becomes tomorrow's penalty, and leftover minutes are banked up to a
//! cap. Everything runs through a standalone CLI binary over this library.
//!
//! ## Architecture
//!
//! - **Economy Engine**: A synchronous state machine for budget, overdraft,
//!   penalty and bank. Every command returns the resulting [`Event`].
//! - **Budget Clock**: A tokio task that ticks a shared engine once per period
//!   while play is active.
//! - **Schedule**: The seven-day allowance and curfew table.
//! - **Storage**: SQLite engine state and daily history, TOML configuration.
//!
//! ## Key Components
//!
//! - [`EconomyEngine`]: Budget state machine
//! - [`BudgetClock`]: Periodic tick driver
//! - [`WeeklySchedule`]: Per-day allowance and window
//! - [`Database`]: Engine state and history persistence
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod curfew;
pub mod economy;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod history;
pub mod schedule;
pub mod storage;

pub use clock::{BudgetClock, SharedEngine};
pub use curfew::CurfewStatus;
pub use economy::{EconomyConfig, EconomyEngine, EconomySnapshot, Settlement};
pub use error::{ConfigError, CoreError, DatabaseError, HeartbeatError, Result, ScheduleError};
pub use events::Event;
pub use heartbeat::Heartbeat;
pub use history::{DailyLog, WeeklyRecap};
pub use schedule::{DayConfig, DayEdit, TimeOfDay, WeeklySchedule};
pub use storage::{ClockConfig, Config, Database};
