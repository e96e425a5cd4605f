use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ScheduleError;

/// A wall-clock time of day with minute precision.
///
/// Stored as minutes since midnight (`0..=1439`); read and written as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(pub(super) u16);

impl TimeOfDay {
    /// Build from hour and minute, rejecting out-of-range components.
    pub fn from_hm(hour: u16, minute: u16) -> Result<Self, ScheduleError> {
        if hour > 23 {
            return Err(ScheduleError::InvalidWindow {
                value: format!("{hour:02}:{minute:02}"),
                reason: "hour must be 0-23".into(),
            });
        }
        if minute > 59 {
            return Err(ScheduleError::InvalidWindow {
                value: format!("{hour:02}:{minute:02}"),
                reason: "minute must be 0-59".into(),
            });
        }
        Ok(Self(hour * 60 + minute))
    }

    pub fn minutes_since_midnight(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(t: NaiveTime) -> Self {
        // hour() <= 23 and minute() <= 59, so this stays within a day.
        Self((t.hour() * 60 + t.minute()) as u16)
    }
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ScheduleError::InvalidWindow {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (h, m) = s.split_once(':').ok_or_else(|| invalid("expected HH:MM"))?;
        if h.len() != 2 || m.len() != 2 {
            return Err(invalid("expected HH:MM"));
        }
        if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected HH:MM"));
        }
        let hour: u16 = h.parse().map_err(|_| invalid("expected HH:MM"))?;
        let minute: u16 = m.parse().map_err(|_| invalid("expected HH:MM"))?;
        Self::from_hm(hour, minute).map_err(|_| {
            invalid(if hour > 23 {
                "hour must be 0-23"
            } else {
                "minute must be 0-59"
            })
        })
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
