mod config;
mod engine;

pub use config::EconomyConfig;
pub use engine::{EconomyEngine, EconomySnapshot, Settlement};
