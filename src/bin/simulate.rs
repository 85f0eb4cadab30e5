//! Deterministic offline run of the engine.
//!
//! Usage: simulate [ticks] [rng_seed] [optimize_every]
//! Honors SEED_FILE like the main binary.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use blackdiamond::config::EngineConfig;
use blackdiamond::engine::Engine;
use blackdiamond::logging::flush_logs;

fn arg<T: std::str::FromStr>(args: &[String], idx: usize, default: T) -> T {
    args.get(idx).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let ticks: u64 = arg(&args, 1, 1_000);
    let rng_seed: u64 = arg(&args, 2, 42);
    let optimize_every: u64 = arg(&args, 3, 0);

    let cfg = EngineConfig::from_env();
    let seed = cfg.load_seed()?;
    let mut engine = Engine::new(&seed, StdRng::seed_from_u64(rng_seed))
        .context("build engine from seed tables")?;

    let mut succeeded = 0usize;
    let mut missed = 0usize;
    let mut faulted = 0usize;
    let mut optimizations = Vec::new();

    for _ in 0..ticks {
        let report = engine.tick();
        succeeded += report.succeeded;
        missed += report.missed;
        faulted += report.faulted;
        if optimize_every > 0 && report.tick_seq % optimize_every == 0 {
            optimizations.push(engine.optimize_network());
        }
    }

    let out = json!({
        "ticks": ticks,
        "rng_seed": rng_seed,
        "seed_fingerprint": seed.fingerprint(),
        "succeeded": succeeded,
        "missed": missed,
        "faulted": faulted,
        "status": engine.system_status(),
        "pipelines": engine.pipeline_status(),
        "optimizations": optimizations,
        "state_hash": format!("{:016x}", engine.state_hash()),
    });
    flush_logs();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
