mod config;
pub mod database;
pub mod migrations;

pub use config::{ClockConfig, Config};
pub use database::Database;

use std::path::PathBuf;

/// Returns the ClockBlock data directory, creating it if needed.
///
/// `CLOCKBLOCK_DATA_DIR` wins when set. Otherwise `~/.config/clockblock`,
/// or `~/.config/clockblock-dev` with `CLOCKBLOCK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("CLOCKBLOCK_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CLOCKBLOCK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("clockblock-dev")
            } else {
                base_dir.join("clockblock")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
