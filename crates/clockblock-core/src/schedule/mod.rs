//! Weekly play schedule.
//!
//! One [`DayConfig`] per calendar day, indexed `0..=6` with Sunday first.
//! The schedule is only ever replaced wholesale, edited one field at a time,
//! or bulk-copied onto the weekday/weekend group.

mod time_of_day;

pub use time_of_day::TimeOfDay;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Number of days in a weekly schedule.
pub const DAYS_PER_WEEK: usize = 7;

const DAY_NAMES: [&str; DAYS_PER_WEEK] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// One calendar day's play policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayConfig {
    pub day_name: String,
    /// Minutes granted at the start of the day.
    pub allowance: u32,
    pub window_start: TimeOfDay,
    pub window_end: TimeOfDay,
    #[serde(default)]
    pub is_weekend: bool,
}

impl DayConfig {
    /// Build a day from `"HH:MM"` window text.
    pub fn new(
        day_name: impl Into<String>,
        allowance: u32,
        window_start: &str,
        window_end: &str,
        is_weekend: bool,
    ) -> Result<Self, ScheduleError> {
        Ok(Self {
            day_name: day_name.into(),
            allowance,
            window_start: window_start.parse()?,
            window_end: window_end.parse()?,
            is_weekend,
        })
    }
}

/// A single-field edit to one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayEdit {
    Allowance(u32),
    WindowStart(TimeOfDay),
    WindowEnd(TimeOfDay),
}

/// The seven-day schedule store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DayConfig>", into = "Vec<DayConfig>")]
pub struct WeeklySchedule {
    days: [DayConfig; DAYS_PER_WEEK],
}

impl WeeklySchedule {
    /// Look up a day by index (0 = Sunday).
    pub fn get_day(&self, index: usize) -> Result<&DayConfig, ScheduleError> {
        self.days
            .get(index)
            .ok_or(ScheduleError::IndexOutOfRange { index })
    }

    /// Look up a day by chrono weekday.
    pub fn day_for(&self, weekday: Weekday) -> &DayConfig {
        &self.days[weekday.num_days_from_sunday() as usize]
    }

    /// Look up the day a calendar date falls on.
    pub fn day_for_date(&self, date: NaiveDate) -> &DayConfig {
        self.day_for(date.weekday())
    }

    pub fn days(&self) -> &[DayConfig] {
        &self.days
    }

    /// Replace every day at once.
    ///
    /// Only the length is checked; ordering and field sanity are the
    /// caller's responsibility.
    pub fn replace_all(&mut self, days: Vec<DayConfig>) -> Result<(), ScheduleError> {
        *self = Self::try_from(days)?;
        Ok(())
    }

    /// Apply a single-field edit to one day.
    pub fn update_day(&mut self, index: usize, edit: DayEdit) -> Result<(), ScheduleError> {
        let day = self
            .days
            .get_mut(index)
            .ok_or(ScheduleError::IndexOutOfRange { index })?;
        match edit {
            DayEdit::Allowance(minutes) => day.allowance = minutes,
            DayEdit::WindowStart(t) => day.window_start = t,
            DayEdit::WindowEnd(t) => day.window_end = t,
        }
        Ok(())
    }

    /// Copy allowance and window from the first day of the opposite group
    /// onto every day whose `is_weekend` equals `target_is_weekend`.
    ///
    /// Returns the index of the source day, or `None` when every day belongs
    /// to the target group (nothing changes in that case).
    pub fn copy_to_group(&mut self, target_is_weekend: bool) -> Option<usize> {
        let source_index = self
            .days
            .iter()
            .position(|d| d.is_weekend != target_is_weekend)?;
        let source = self.days[source_index].clone();

        for day in self.days.iter_mut().filter(|d| d.is_weekend == target_is_weekend) {
            day.allowance = source.allowance;
            day.window_start = source.window_start;
            day.window_end = source.window_end;
        }
        Some(source_index)
    }

    /// Sunday-Thursday 60 min 08:00-20:00; Friday and Saturday 120 min 08:00-22:00.
    pub fn default_week() -> Self {
        let evening = TimeOfDay(20 * 60);
        let late = TimeOfDay(22 * 60);
        let morning = TimeOfDay(8 * 60);

        let days = DAY_NAMES.map(|name| {
            let is_weekend = matches!(name, "Fri" | "Sat");
            DayConfig {
                day_name: name.to_string(),
                allowance: if is_weekend { 120 } else { 60 },
                window_start: morning,
                window_end: if is_weekend { late } else { evening },
                is_weekend,
            }
        });
        Self { days }
    }
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self::default_week()
    }
}

impl TryFrom<Vec<DayConfig>> for WeeklySchedule {
    type Error = ScheduleError;

    fn try_from(days: Vec<DayConfig>) -> Result<Self, Self::Error> {
        let len = days.len();
        let days: [DayConfig; DAYS_PER_WEEK] = days
            .try_into()
            .map_err(|_| ScheduleError::InvalidScheduleShape { len })?;
        Ok(Self { days })
    }
}

impl From<WeeklySchedule> for Vec<DayConfig> {
    fn from(schedule: WeeklySchedule) -> Self {
        schedule.days.into()
    }
}
