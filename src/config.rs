use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use crate::seed::SeedTables;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub tick_ms: u64,
    pub rng_seed: Option<u64>,
    pub seed_file: Option<String>,
    /// Ticks between tick-summary log records (0 disables them)
    pub summary_every: u64,
    pub status_secs: u64,
    pub request_queue: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            rng_seed: None,
            seed_file: None,
            summary_every: 50,
            status_secs: 5,
            request_queue: 64,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            tick_ms: std::env::var("TICK_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.tick_ms),
            rng_seed: std::env::var("RNG_SEED").ok().and_then(|v| v.parse().ok()),
            seed_file: std::env::var("SEED_FILE").ok().filter(|v| !v.is_empty()),
            summary_every: std::env::var("SUMMARY_EVERY").ok().and_then(|v| v.parse().ok()).unwrap_or(d.summary_every),
            status_secs: std::env::var("STATUS_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.status_secs),
            request_queue: std::env::var("REQUEST_QUEUE").ok().and_then(|v| v.parse().ok()).unwrap_or(d.request_queue),
        }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Seed tables from `seed_file`, or the built-in set.
    pub fn load_seed(&self) -> Result<SeedTables> {
        match &self.seed_file {
            Some(path) => SeedTables::from_json_file(path),
            None => Ok(SeedTables::builtin()),
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
