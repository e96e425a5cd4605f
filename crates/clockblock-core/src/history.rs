//! Daily activity log projection and weekly recap.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::economy::EconomySnapshot;

/// One day's activity summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLog {
    pub date: NaiveDate,
    pub minutes_played: i64,
    pub minutes_penalty: u32,
    pub banked_minutes: u32,
    pub overdraft_minutes: u32,
}

/// Project the engine state into a [`DailyLog`] for `date`.
///
/// When in overdraft, the minutes beyond zero are counted twice in
/// `minutes_played` (once as allowance consumed down to the budget, once
/// as the overdraft magnitude). History consumers rely on that figure.
pub fn project(snapshot: &EconomySnapshot, today_allowance: u32, date: NaiveDate) -> DailyLog {
    let budget = snapshot.current_budget;
    let overdraft_extra = if budget < 0 { budget.saturating_abs() } else { 0 };
    DailyLog {
        date,
        minutes_played: i64::from(today_allowance)
            .saturating_sub(budget)
            .saturating_add(overdraft_extra),
        minutes_penalty: snapshot.prev_day_penalty,
        banked_minutes: snapshot.weekend_bank,
        overdraft_minutes: snapshot.overdraft_accumulated,
    }
}

/// The calendar date of the most recent `closed_day` on or before `today`.
///
/// Settlement usually runs just after midnight, when the local date has
/// already moved on from the day being closed.
pub fn closing_date(closed_day: Weekday, today: NaiveDate) -> NaiveDate {
    let back = (7 + today.weekday().num_days_from_monday() - closed_day.num_days_from_monday()) % 7;
    today - chrono::Days::new(u64::from(back))
}

/// Summary over a run of daily logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRecap {
    pub days: usize,
    pub total_minutes_played: i64,
    pub average_minutes_played: f64,
    pub total_overdraft_minutes: u64,
    pub total_penalty_minutes: u64,
    /// Days finished without any overdraft.
    pub clean_days: usize,
    pub latest_bank: u32,
}

impl WeeklyRecap {
    /// `logs` newest first, as returned by the database.
    pub fn from_logs(logs: &[DailyLog]) -> Self {
        if logs.is_empty() {
            return Self::default();
        }
        let total_minutes_played: i64 = logs.iter().map(|l| l.minutes_played).sum();
        Self {
            days: logs.len(),
            total_minutes_played,
            average_minutes_played: total_minutes_played as f64 / logs.len() as f64,
            total_overdraft_minutes: logs.iter().map(|l| u64::from(l.overdraft_minutes)).sum(),
            total_penalty_minutes: logs.iter().map(|l| u64::from(l.minutes_penalty)).sum(),
            clean_days: logs.iter().filter(|l| l.overdraft_minutes == 0).count(),
            latest_bank: logs.first().map(|l| l.banked_minutes).unwrap_or(0),
        }
    }
}
