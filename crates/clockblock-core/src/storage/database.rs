//! SQLite-based state storage and history.
//!
//! Provides persistent storage for:
//! - The serialized economy engine (key-value store)
//! - Daily activity logs written at settlement

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::warn;

use super::{data_dir, migrations};
use crate::economy::EconomyEngine;
use crate::error::{DatabaseError, Result};
use crate::history::DailyLog;

const ENGINE_KEY: &str = "economy_engine";
const PLAY_LEASE_KEY: &str = "play_lease";

/// How long a writer waits for another process's transaction to finish.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database for engine state and daily history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/clockblock.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("clockblock.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrations::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        kv_get(&self.conn, key)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        kv_set(&self.conn, key, value)
    }

    /// Load the persisted engine, if any.
    ///
    /// A stored value that no longer deserializes is treated as absent.
    pub fn load_engine(&self) -> Result<Option<EconomyEngine>> {
        read_engine(&self.conn)
    }

    pub fn save_engine(&self, engine: &EconomyEngine) -> Result<()> {
        write_engine(&self.conn, engine)
    }

    /// Load, modify and store the engine inside one write transaction.
    ///
    /// `seed` builds the engine when none is stored yet. Other processes
    /// cannot write between the load and the store, so concurrent commands
    /// never overwrite each other's changes. Nothing is stored when `f`
    /// fails.
    pub fn update_engine<R>(
        &mut self,
        seed: impl FnOnce() -> Result<EconomyEngine>,
        f: impl FnOnce(&mut EconomyEngine) -> Result<R>,
    ) -> Result<R> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut engine = match read_engine(&tx)? {
            Some(engine) => engine,
            None => seed()?,
        };
        let out = f(&mut engine)?;
        write_engine(&tx, &engine)?;
        tx.commit()?;
        Ok(out)
    }

    /// Record that a foreground clock is alive as of `at`.
    pub fn renew_play_lease(&self, at: DateTime<Utc>) -> Result<()> {
        self.kv_set(PLAY_LEASE_KEY, &at.to_rfc3339())?;
        Ok(())
    }

    pub fn release_play_lease(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![PLAY_LEASE_KEY])?;
        Ok(())
    }

    /// True when a clock renewed its lease less than `stale_after` before `now`.
    ///
    /// A missing or unreadable lease is not live.
    pub fn play_lease_is_live(&self, now: DateTime<Utc>, stale_after: TimeDelta) -> Result<bool> {
        let Some(text) = self.kv_get(PLAY_LEASE_KEY)? else {
            return Ok(false);
        };
        match DateTime::parse_from_rfc3339(&text) {
            Ok(renewed) => Ok(now.signed_duration_since(renewed) < stale_after),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable play lease");
                Ok(false)
            }
        }
    }

    /// Append one daily log to the history.
    pub fn record_daily_log(&self, log: &DailyLog) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO daily_logs
                (date, minutes_played, minutes_penalty, banked_minutes, overdraft_minutes, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                log.date.format("%Y-%m-%d").to_string(),
                log.minutes_played,
                log.minutes_penalty,
                log.banked_minutes,
                log.overdraft_minutes,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent logs first.
    pub fn recent_logs(&self, limit: usize) -> Result<Vec<DailyLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, minutes_played, minutes_penalty, banked_minutes, overdraft_minutes
             FROM daily_logs
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u32>(4)?,
            ))
        })?;

        let mut logs = Vec::new();
        for row in rows {
            let (date, minutes_played, minutes_penalty, banked_minutes, overdraft_minutes) = row?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| DatabaseError::QueryFailed(format!("bad date '{date}': {e}")))?;
            logs.push(DailyLog {
                date,
                minutes_played,
                minutes_penalty,
                banked_minutes,
                overdraft_minutes,
            });
        }
        Ok(logs)
    }
}

fn kv_get(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
        row.get::<_, String>(0)
    })
    .optional()
}

fn kv_set(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

fn read_engine(conn: &Connection) -> Result<Option<EconomyEngine>> {
    let Some(json) = kv_get(conn, ENGINE_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str::<EconomyEngine>(&json) {
        Ok(engine) => Ok(Some(engine)),
        Err(e) => {
            warn!(error = %e, "discarding unreadable engine state");
            Ok(None)
        }
    }
}

fn write_engine(conn: &Connection, engine: &EconomyEngine) -> Result<()> {
    let json = serde_json::to_string(engine)?;
    kv_set(conn, ENGINE_KEY, &json)?;
    Ok(())
}
