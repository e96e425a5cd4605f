//! Heartbeats from an external play detector.
//!
//! A local agent polls for the game process and reports once per poll. A
//! playing heartbeat carries `minutes_delta` minutes of play; each minute is
//! applied as one ordinary engine tick. The agent polls once a minute, so a
//! delta is normally 1 and never more than [`MAX_MINUTES_DELTA`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::economy::EconomyEngine;
use crate::error::HeartbeatError;
use crate::events::Event;

/// Largest delta one heartbeat may carry, covering a few late polls.
pub const MAX_MINUTES_DELTA: u32 = 5;

/// One poll result from the play detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub device_id: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub is_playing: bool,
    #[serde(default)]
    pub minutes_delta: u32,
    #[serde(default)]
    pub client_version: String,
}

impl Heartbeat {
    /// Apply the heartbeat's minutes to `engine`, one tick per minute.
    ///
    /// Does not change the engine's playing flag.
    ///
    /// # Errors
    ///
    /// Returns [`HeartbeatError::DeltaTooLarge`] without touching the engine
    /// when `minutes_delta` exceeds [`MAX_MINUTES_DELTA`].
    pub fn apply(&self, engine: &mut EconomyEngine) -> Result<Vec<Event>, HeartbeatError> {
        if !self.is_playing || self.minutes_delta == 0 {
            debug!(device = %self.device_id, "idle heartbeat");
            return Ok(Vec::new());
        }
        if self.minutes_delta > MAX_MINUTES_DELTA {
            return Err(HeartbeatError::DeltaTooLarge {
                delta: self.minutes_delta,
                max: MAX_MINUTES_DELTA,
            });
        }
        if self.minutes_delta > 1 {
            warn!(
                device = %self.device_id,
                minutes = self.minutes_delta,
                "heartbeat covers more than one minute"
            );
        }
        Ok((0..self.minutes_delta).map(|_| engine.tick()).collect())
    }
}
