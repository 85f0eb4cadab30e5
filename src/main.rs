use anyhow::{Context, Result};
use serde_json::json;
use tokio::time::{interval, Duration};

use blackdiamond::config::EngineConfig;
use blackdiamond::engine::actor::spawn_engine;
use blackdiamond::engine::Engine;
use blackdiamond::logging::{flush_logs, log, log_engine_start, obj, v_num, Domain, Level};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = EngineConfig::from_env();
    let seed = cfg.load_seed()?;
    let fingerprint = seed.fingerprint();
    let engine = Engine::new(&seed, cfg.rng()).context("build engine from seed tables")?;

    let state = engine.state();
    log_engine_start(
        &fingerprint,
        state.neural_processing_power,
        state.global_coherence,
        cfg.tick_ms,
    );

    let (handle, actor) = spawn_engine(engine, &cfg);
    let mut status_timer = interval(Duration::from_secs(cfg.status_secs.max(1)));

    loop {
        tokio::select! {
            _ = status_timer.tick() => {
                let status = handle.system_status().await?;
                log(
                    Level::Info,
                    Domain::System,
                    "status",
                    obj(&[
                        ("tick_seq", json!(status.tick_seq)),
                        ("global_coherence", v_num(status.global_coherence)),
                        ("neural_processing_power", v_num(status.neural_processing_power)),
                        ("total_profit", v_num(status.total_profit)),
                        ("active_pipelines", json!(status.active_pipelines)),
                        ("active_agents", json!(status.active_agents)),
                    ]),
                );
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await?;
    let engine = actor.await.context("engine actor panicked")?;
    let status = engine.system_status();
    log(
        Level::Info,
        Domain::System,
        "shutdown",
        obj(&[
            ("tick_seq", json!(status.tick_seq)),
            ("total_profit", v_num(status.total_profit)),
            ("state_hash", json!(format!("{:016x}", engine.state_hash()))),
        ]),
    );
    flush_logs();
    Ok(())
}
