use serde::{Deserialize, Serialize};
use slog::Logger;
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

use crate::error::{Error, Result};

/// Host supplied settings for an `Emulator`. Every field has a default, so a
/// partial config file deserializes fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// level for the logger built by `build_logger`
    pub log_level: Severity,
    /// seed for CXNN, random from entropy when unset
    pub rng_seed: Option<u64>,
    /// how many instructions `Emulator::run_configured` executes, unbounded when unset
    pub max_steps: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: Severity::Info,
            rng_seed: None,
            max_steps: None,
        }
    }
}

impl Config {
    /// A terminal logger writing to stderr at `log_level`
    pub fn build_logger(&self) -> Result<Logger> {
        let mut builder = TerminalLoggerBuilder::new();
        builder.level(self.log_level);
        builder.destination(Destination::Stderr);
        builder.build().map_err(|e| Error::Logger(e.to_string()))
    }
}
