pub mod config;
pub mod curfew;
pub mod economy;
pub mod heartbeat;
pub mod log;
pub mod play;
pub mod schedule;

use chrono::{Datelike, Local, TimeDelta, Utc};
use clockblock_core::{Config, Database, EconomyEngine};
use serde::Serialize;
use tracing::warn;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Config and database for one invocation.
///
/// The engine is never held across commands: every change is a single
/// read-modify-write of the stored engine, so a running `play` and an admin
/// command on the same data directory both keep their effects.
pub struct Session {
    pub config: Config,
    pub db: Database,
}

impl Session {
    pub fn open() -> CliResult<Self> {
        let config = Config::load()?;
        let db = Database::open()?;
        Ok(Self { config, db })
    }

    /// The stored engine as the next update would see it. Nothing is saved.
    pub fn engine(&self) -> CliResult<EconomyEngine> {
        let lease_live = self.play_lease_live()?;
        let mut engine = match self.db.load_engine()? {
            Some(engine) => engine,
            None => fresh_engine(&self.config)?,
        };
        normalize(&mut engine, &self.config, lease_live)?;
        Ok(engine)
    }

    /// Apply `f` to the stored engine and save the result atomically.
    pub fn update<R>(
        &mut self,
        f: impl FnOnce(&mut EconomyEngine) -> clockblock_core::Result<R>,
    ) -> CliResult<R> {
        let lease_live = self.play_lease_live()?;
        self.update_with_lease(lease_live, f)
    }

    /// [`Session::update`] with the play lease state observed by the caller.
    pub fn update_with_lease<R>(
        &mut self,
        lease_live: bool,
        f: impl FnOnce(&mut EconomyEngine) -> clockblock_core::Result<R>,
    ) -> CliResult<R> {
        let config = &self.config;
        let out = self.db.update_engine(
            || fresh_engine(config),
            |engine| {
                normalize(engine, config, lease_live)?;
                f(engine)
            },
        )?;
        Ok(out)
    }

    /// Whether a `play` process renewed its lease recently enough to be alive.
    pub fn play_lease_live(&self) -> CliResult<bool> {
        Ok(self
            .db
            .play_lease_is_live(Utc::now(), lease_ttl(&self.config)?)?)
    }
}

/// A lease older than two clock periods belongs to a process that is gone.
pub fn lease_ttl(config: &Config) -> CliResult<TimeDelta> {
    let period = TimeDelta::from_std(config.clock.period())?;
    Ok(period * 2 + TimeDelta::seconds(1))
}

/// Bring a stored engine up to date with the current settings.
///
/// A playing flag without a live lease is left over from a `play` that was
/// killed, and is cleared.
fn normalize(
    engine: &mut EconomyEngine,
    config: &Config,
    lease_live: bool,
) -> clockblock_core::Result<()> {
    engine.set_config(config.economy)?;
    if engine.is_playing() && !lease_live {
        warn!("clearing playing flag left by a play session that is no longer running");
        engine.stop_playing();
    }
    Ok(())
}

pub fn fresh_engine(config: &Config) -> clockblock_core::Result<EconomyEngine> {
    let today = Local::now().weekday();
    Ok(EconomyEngine::new(config.economy, &config.schedule, today)?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
