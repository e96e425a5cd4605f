//! Budget economy engine.
//!
//! A plain state machine over integer minutes. It owns no timer: the
//! [`BudgetClock`](crate::clock::BudgetClock) or an external heartbeat source
//! calls [`EconomyEngine::tick`] once per elapsed minute.
//!
//! ## Axes
//!
//! ```text
//! playing:   Stopped <-> Playing        (start_playing / stop_playing)
//! overdraft: InBudget  -> Overdraft     (derived: current_budget < 0)
//! ```
//!
//! Day rollover is explicit: [`EconomyEngine::settle_day_end`] converts
//! overdraft into tomorrow's penalty, banks surplus, and reseeds the budget
//! from the next weekday's allowance.

use chrono::{Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::EconomyConfig;
use crate::error::ConfigError;
use crate::events::Event;
use crate::schedule::WeeklySchedule;

/// Outcome of a day-rollover settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub closed_day: Weekday,
    pub next_day: Weekday,
    /// Bank balance after settlement.
    pub banked: u32,
    /// Surplus minutes that did not fit under the bank cap.
    pub surplus_lost: u32,
    /// Penalty carried into the next day.
    pub penalty_applied: u32,
    /// Starting budget of the next day (negative when the penalty exceeds the allowance).
    pub new_budget: i64,
}

/// Consistent read of the engine state plus its derived values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    pub day: Weekday,
    pub current_budget: i64,
    pub overdraft_accumulated: u32,
    pub prev_day_penalty: u32,
    pub weekend_bank: u32,
    pub is_playing: bool,
    pub is_overdraft: bool,
    pub total_debt: f64,
}

/// The time-budget economy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyEngine {
    config: EconomyConfig,
    day: Weekday,
    /// Minutes remaining today; negative means overdraft.
    current_budget: i64,
    /// Minutes ticked today while already in overdraft.
    overdraft_accumulated: u32,
    /// Penalty carried from yesterday's settlement.
    prev_day_penalty: u32,
    weekend_bank: u32,
    #[serde(default)]
    is_playing: bool,
}

impl EconomyEngine {
    /// Create an engine for `today`, seeding the budget from that day's allowance.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `config` does not validate.
    pub fn new(
        config: EconomyConfig,
        schedule: &WeeklySchedule,
        today: Weekday,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            day: today,
            current_budget: i64::from(schedule.day_for(today).allowance),
            overdraft_accumulated: 0,
            prev_day_penalty: 0,
            weekend_bank: 0,
            is_playing: false,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn day(&self) -> Weekday {
        self.day
    }

    pub fn current_budget(&self) -> i64 {
        self.current_budget
    }

    pub fn overdraft_accumulated(&self) -> u32 {
        self.overdraft_accumulated
    }

    pub fn prev_day_penalty(&self) -> u32 {
        self.prev_day_penalty
    }

    pub fn weekend_bank(&self) -> u32 {
        self.weekend_bank
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_overdraft(&self) -> bool {
        self.current_budget < 0
    }

    /// Running debt estimate: carried penalty plus today's overdraft at the multiplier.
    ///
    /// This is the intraday view. The amount actually carried forward is
    /// fixed by [`settle_day_end`](Self::settle_day_end) from the budget
    /// itself, so the two can differ.
    pub fn total_debt(&self) -> f64 {
        f64::from(self.prev_day_penalty)
            + f64::from(self.overdraft_accumulated) * self.config.overdraft_multiplier
    }

    pub fn snapshot(&self) -> EconomySnapshot {
        EconomySnapshot {
            day: self.day,
            current_budget: self.current_budget,
            overdraft_accumulated: self.overdraft_accumulated,
            prev_day_penalty: self.prev_day_penalty,
            weekend_bank: self.weekend_bank,
            is_playing: self.is_playing,
            is_overdraft: self.is_overdraft(),
            total_debt: self.total_debt(),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot_event(&self) -> Event {
        Event::StateSnapshot {
            snapshot: self.snapshot(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the economy policy.
    ///
    /// Applies to later debt estimates and settlements; nothing already
    /// settled is recomputed.
    pub fn set_config(&mut self, config: EconomyConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Mark play as active. `None` if already playing.
    pub fn start_playing(&mut self) -> Option<Event> {
        if self.is_playing {
            return None;
        }
        self.is_playing = true;
        info!(budget = self.current_budget, "play started");
        Some(Event::PlayStarted {
            current_budget: self.current_budget,
            at: Utc::now(),
        })
    }

    /// Mark play as stopped. `None` if already stopped.
    pub fn stop_playing(&mut self) -> Option<Event> {
        if !self.is_playing {
            return None;
        }
        self.is_playing = false;
        info!(budget = self.current_budget, "play stopped");
        Some(Event::PlayStopped {
            current_budget: self.current_budget,
            at: Utc::now(),
        })
    }

    /// Consume one minute of budget.
    ///
    /// Overdraft accrues only when the post-tick budget is negative.
    pub fn tick(&mut self) -> Event {
        let was_overdraft = self.is_overdraft();
        self.current_budget = self.current_budget.saturating_sub(1);
        if self.current_budget < 0 {
            self.overdraft_accumulated = self.overdraft_accumulated.saturating_add(1);
        }
        debug!(
            budget = self.current_budget,
            overdraft = self.overdraft_accumulated,
            "budget tick"
        );
        Event::BudgetTicked {
            current_budget: self.current_budget,
            overdraft_accumulated: self.overdraft_accumulated,
            entered_overdraft: !was_overdraft && self.is_overdraft(),
            at: Utc::now(),
        }
    }

    /// Apply an administrative grant (positive) or penalty (negative).
    ///
    /// Only `current_budget` moves; manual penalties are budget cuts, not debt.
    pub fn adjust_budget(&mut self, amount: i64) -> Event {
        self.current_budget = self.current_budget.saturating_add(amount);
        info!(amount, budget = self.current_budget, "budget adjusted");
        Event::BudgetAdjusted {
            amount,
            current_budget: self.current_budget,
            at: Utc::now(),
        }
    }

    /// Close out the current day and open the next weekday.
    ///
    /// Not guarded against repeated calls: each call settles whatever
    /// budget it finds.
    pub fn settle_day_end(&mut self, schedule: &WeeklySchedule) -> Settlement {
        let closed_day = self.day;

        let new_penalty = if self.current_budget < 0 {
            self.config.penalty_for(self.current_budget.unsigned_abs())
        } else {
            0
        };

        let (new_bank, surplus_lost) = if self.current_budget > 0 {
            let surplus = u64::try_from(self.current_budget).unwrap_or(0);
            let cap = u64::from(self.config.bank_cap);
            let total = u64::from(self.weekend_bank).saturating_add(surplus);
            let kept = total.min(cap);
            let lost = total - kept;
            (
                u32::try_from(kept).unwrap_or(self.config.bank_cap),
                u32::try_from(lost.min(surplus)).unwrap_or(u32::MAX),
            )
        } else {
            (self.weekend_bank, 0)
        };

        self.prev_day_penalty = new_penalty;
        self.weekend_bank = new_bank;
        self.overdraft_accumulated = 0;
        self.is_playing = false;

        self.day = closed_day.succ();
        let allowance = i64::from(schedule.day_for(self.day).allowance);
        self.current_budget = allowance - i64::from(new_penalty);

        let settlement = Settlement {
            closed_day,
            next_day: self.day,
            banked: new_bank,
            surplus_lost,
            penalty_applied: new_penalty,
            new_budget: self.current_budget,
        };
        info!(
            closed = %closed_day,
            next = %self.day,
            banked = new_bank,
            surplus_lost,
            penalty = new_penalty,
            new_budget = self.current_budget,
            "day settled"
        );
        settlement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_for(allowance: u32) -> EconomyEngine {
        let mut schedule = WeeklySchedule::default();
        let days = schedule
            .days()
            .iter()
            .cloned()
            .map(|mut d| {
                d.allowance = allowance;
                d
            })
            .collect();
        schedule.replace_all(days).unwrap();
        EconomyEngine::new(EconomyConfig::default(), &schedule, Weekday::Mon).unwrap()
    }

    #[test]
    fn new_seeds_budget_from_today() {
        let schedule = WeeklySchedule::default();
        let e = EconomyEngine::new(EconomyConfig::default(), &schedule, Weekday::Fri).unwrap();
        assert_eq!(e.current_budget(), 120);
        assert_eq!(e.day(), Weekday::Fri);
        assert!(!e.is_playing());
        assert_eq!(e.total_debt(), 0.0);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let cfg = EconomyConfig {
            overdraft_multiplier: 0.5,
            bank_cap: 60,
        };
        assert!(EconomyEngine::new(cfg, &WeeklySchedule::default(), Weekday::Mon).is_err());
    }

    #[test]
    fn start_stop_are_idempotent() {
        let mut e = engine_for(60);
        assert!(e.start_playing().is_some());
        assert!(e.start_playing().is_none());
        assert!(e.is_playing());
        assert!(e.stop_playing().is_some());
        assert!(e.stop_playing().is_none());
        assert!(!e.is_playing());
    }

    #[test]
    fn tick_enters_overdraft_at_zero_crossing() {
        let mut e = engine_for(1);
        match e.tick() {
            Event::BudgetTicked {
                current_budget,
                entered_overdraft,
                ..
            } => {
                assert_eq!(current_budget, 0);
                assert!(!entered_overdraft);
            }
            other => panic!("Expected BudgetTicked, got {other:?}"),
        }
        assert_eq!(e.overdraft_accumulated(), 0);

        match e.tick() {
            Event::BudgetTicked {
                current_budget,
                overdraft_accumulated,
                entered_overdraft,
                ..
            } => {
                assert_eq!(current_budget, -1);
                assert_eq!(overdraft_accumulated, 1);
                assert!(entered_overdraft);
            }
            other => panic!("Expected BudgetTicked, got {other:?}"),
        }
    }

    #[test]
    fn adjust_does_not_accrue_overdraft() {
        let mut e = engine_for(10);
        e.adjust_budget(-25);
        assert_eq!(e.current_budget(), -15);
        assert!(e.is_overdraft());
        assert_eq!(e.overdraft_accumulated(), 0);
        assert_eq!(e.total_debt(), 0.0);
    }

    #[test]
    fn overdraft_scenario_then_settle() {
        let mut e = engine_for(60);
        e.start_playing();
        for _ in 0..75 {
            e.tick();
        }
        assert_eq!(e.current_budget(), -15);
        assert_eq!(e.overdraft_accumulated(), 15);
        assert_eq!(e.total_debt(), 30.0);

        let s = e.settle_day_end(&WeeklySchedule::default());
        assert_eq!(s.penalty_applied, 30);
        assert_eq!(s.new_budget, 30);
        assert_eq!(s.banked, 0);
        assert_eq!(s.closed_day, Weekday::Mon);
        assert_eq!(s.next_day, Weekday::Tue);
        assert_eq!(e.prev_day_penalty(), 30);
        assert_eq!(e.current_budget(), 30);
        assert_eq!(e.weekend_bank(), 0);
        assert_eq!(e.overdraft_accumulated(), 0);
        assert!(!e.is_playing());
        assert_eq!(e.total_debt(), 30.0);
    }

    #[test]
    fn surplus_beyond_cap_is_lost() {
        let mut e = engine_for(60);
        e.weekend_bank = 50;
        for _ in 0..40 {
            e.tick();
        }
        assert_eq!(e.current_budget(), 20);
        let s = e.settle_day_end(&WeeklySchedule::default());
        assert_eq!(s.banked, 60);
        assert_eq!(s.surplus_lost, 10);
        assert_eq!(s.penalty_applied, 0);
        assert_eq!(e.weekend_bank(), 60);
        assert_eq!(e.prev_day_penalty(), 0);
    }

    #[test]
    fn penalty_larger_than_allowance_starts_in_debt() {
        let mut e = engine_for(60);
        e.adjust_budget(-100);
        assert_eq!(e.current_budget(), -40);
        let s = e.settle_day_end(&WeeklySchedule::default());
        // Tuesday allowance 60, penalty 80.
        assert_eq!(s.penalty_applied, 80);
        assert_eq!(s.new_budget, -20);
        assert!(e.is_overdraft());
        assert_eq!(e.overdraft_accumulated(), 0);
    }

    #[test]
    fn zero_budget_settles_clean() {
        let mut e = engine_for(0);
        e.weekend_bank = 12;
        let s = e.settle_day_end(&WeeklySchedule::default());
        assert_eq!(s.penalty_applied, 0);
        assert_eq!(s.banked, 12);
        assert_eq!(s.surplus_lost, 0);
    }

    #[test]
    fn bank_above_lowered_cap_clamps_to_cap() {
        let mut e = engine_for(60);
        e.weekend_bank = 80;
        let s = e.settle_day_end(&WeeklySchedule::default());
        assert_eq!(s.banked, 60);
    }

    #[test]
    fn settle_twice_settles_whatever_it_finds() {
        let mut e = engine_for(60);
        e.adjust_budget(-70);
        let first = e.settle_day_end(&WeeklySchedule::default());
        assert_eq!(first.penalty_applied, 20);
        assert_eq!(first.new_budget, 40);
        let second = e.settle_day_end(&WeeklySchedule::default());
        assert_eq!(second.penalty_applied, 0);
        assert_eq!(second.banked, 40);
        assert_eq!(second.next_day, Weekday::Wed);
    }

    #[test]
    fn settle_wraps_saturday_to_sunday() {
        let schedule = WeeklySchedule::default();
        let mut e = EconomyEngine::new(EconomyConfig::default(), &schedule, Weekday::Sat).unwrap();
        let s = e.settle_day_end(&schedule);
        assert_eq!(s.next_day, Weekday::Sun);
        // Saturday's 120 unused minutes bank up to the cap; Sunday starts at 60.
        assert_eq!(s.banked, 60);
        assert_eq!(s.new_budget, 60);
    }

    #[test]
    fn snapshot_is_consistent() {
        let mut e = engine_for(5);
        e.start_playing();
        for _ in 0..8 {
            e.tick();
        }
        let snap = e.snapshot();
        assert_eq!(snap.current_budget, -3);
        assert!(snap.is_overdraft);
        assert!(snap.is_playing);
        assert_eq!(
            snap.total_debt,
            f64::from(snap.prev_day_penalty) + f64::from(snap.overdraft_accumulated) * 2.0
        );
    }

    #[test]
    fn serde_roundtrip_preserves_state() {
        let mut e = engine_for(30);
        e.adjust_budget(-45);
        e.tick();
        let json = serde_json::to_string(&e).unwrap();
        let back: EconomyEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(back.snapshot(), e.snapshot());
    }

    #[test]
    fn set_config_changes_later_settlements() {
        let mut e = engine_for(10);
        for _ in 0..14 {
            e.tick();
        }
        assert!(e
            .set_config(EconomyConfig {
                overdraft_multiplier: 0.5,
                bank_cap: 60,
            })
            .is_err());
        e.set_config(EconomyConfig {
            overdraft_multiplier: 3.0,
            bank_cap: 60,
        })
        .unwrap();
        assert_eq!(e.total_debt(), 12.0);
        assert_eq!(e.settle_day_end(&WeeklySchedule::default()).penalty_applied, 12);
    }
}
