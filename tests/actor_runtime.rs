//! The actor runtime: scheduled ticks and facade requests share one
//! serialized owner of the engine.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::{sleep, Duration};

use blackdiamond::config::EngineConfig;
use blackdiamond::engine::actor::spawn_engine;
use blackdiamond::engine::Engine;
use blackdiamond::error::EngineError;
use blackdiamond::model::Pipeline;
use blackdiamond::seed::SeedTables;

fn quiet_logs() {
    std::env::set_var("LOG_DIR", "-");
    std::env::set_var("LOG_LEVEL", "error");
}

fn single_stage_seed() -> SeedTables {
    let mut seed = SeedTables::empty();
    seed.pipelines = vec![Pipeline {
        id: "P1".to_string(),
        name: "Always".to_string(),
        stages: vec!["x".to_string()],
        current_stage: 0,
        is_active: true,
        profit: 0.0,
        execution_time_ms: 1,
        success_rate: 100.0,
    }];
    seed.strategy_routes.insert("always".to_string(), "P1".to_string());
    seed
}

fn cfg(tick_ms: u64) -> EngineConfig {
    EngineConfig {
        tick_ms,
        summary_every: 0,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_ticks_follow_schedule() {
    quiet_logs();
    let engine = Engine::new(&single_stage_seed(), StdRng::seed_from_u64(1)).unwrap();
    let (handle, actor) = spawn_engine(engine, &cfg(100));

    // first tick fires one period after start
    assert_eq!(handle.system_status().await.unwrap().tick_seq, 0);

    sleep(Duration::from_millis(1_050)).await;
    let status = handle.system_status().await.unwrap();
    assert!((9..=10).contains(&status.tick_seq), "tick_seq = {}", status.tick_seq);
    assert!(status.total_profit > 0.0);

    let hash = handle.state_hash().await.unwrap();
    handle.shutdown().await.unwrap();
    let engine = actor.await.unwrap();
    assert_eq!(engine.state().tick_seq, status.tick_seq);
    assert_eq!(engine.state_hash(), hash);
}

#[tokio::test(start_paused = true)]
async fn test_facade_requests_round_trip() {
    quiet_logs();
    let engine = Engine::new(&SeedTables::builtin(), StdRng::seed_from_u64(2)).unwrap();
    let (handle, _actor) = spawn_engine(engine, &cfg(60_000));

    handle.deploy_transformer("memecoin_sniper_neural").await.unwrap();
    handle.activate_agent("void_sage").await.unwrap();
    assert!(handle.deploy_transformer("nonexistent").await.unwrap_err().is_not_found());
    assert!(handle.activate_agent("nonexistent").await.unwrap_err().is_not_found());
    assert!(handle
        .execute_flash_loan_strategy("unknown_type", 10.0)
        .await
        .unwrap_err()
        .is_not_found());

    let agents = handle.agent_performance().await.unwrap();
    let void_sage = agents.iter().find(|a| a.id == "void_sage").unwrap();
    assert!(void_sage.last_execution.is_some());

    assert_eq!(handle.transformer_status().await.unwrap().len(), 6);
    assert_eq!(handle.pipeline_status().await.unwrap().len(), 5);

    let report = handle.optimize_network().await.unwrap();
    assert_eq!(report.notes.len(), 4);
    let status = handle.system_status().await.unwrap();
    assert_eq!(status.global_coherence, report.new_coherence);
    assert_eq!(status.neural_processing_power, report.new_processing_power);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_flash_loans_are_serialized() {
    quiet_logs();
    let engine = Engine::new(&single_stage_seed(), StdRng::seed_from_u64(3)).unwrap();
    let (handle, _actor) = spawn_engine(engine, &cfg(3_600_000));

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let h = handle.clone();
        tasks.push(tokio::spawn(async move {
            h.execute_flash_loan_strategy("always", 1.0).await
        }));
    }

    let mut returned = 0.0;
    for t in tasks {
        let outcome = t.await.unwrap().unwrap();
        assert!(outcome.success);
        returned += outcome.profit.unwrap();
    }

    let pipelines = handle.pipeline_status().await.unwrap();
    assert!((pipelines[0].profit - returned).abs() < 1e-9);
    assert_eq!(handle.system_status().await.unwrap().tick_seq, 0);
}

#[tokio::test(start_paused = true)]
async fn test_replay_hash_matches_offline_run() {
    quiet_logs();
    let engine = Engine::new(&single_stage_seed(), StdRng::seed_from_u64(9)).unwrap();
    let (handle, _actor) = spawn_engine(engine, &cfg(100));
    sleep(Duration::from_millis(550)).await;
    let status = handle.system_status().await.unwrap();
    let hash = handle.state_hash().await.unwrap();

    let mut offline = Engine::new(&single_stage_seed(), StdRng::seed_from_u64(9)).unwrap();
    for _ in 0..status.tick_seq {
        offline.tick();
    }
    assert_eq!(offline.state_hash(), hash);
}

#[tokio::test(start_paused = true)]
async fn test_handle_errors_after_shutdown() {
    quiet_logs();
    let engine = Engine::new(&single_stage_seed(), StdRng::seed_from_u64(4)).unwrap();
    let (handle, actor) = spawn_engine(engine, &cfg(100));

    handle.shutdown().await.unwrap();
    actor.await.unwrap();

    assert_eq!(handle.system_status().await.unwrap_err(), EngineError::ActorStopped);
    assert_eq!(handle.state_hash().await.unwrap_err(), EngineError::ActorStopped);
    assert_eq!(handle.shutdown().await.unwrap_err(), EngineError::ActorStopped);
}

#[tokio::test(start_paused = true)]
async fn test_actor_stops_when_handles_dropped() {
    quiet_logs();
    let engine = Engine::new(&single_stage_seed(), StdRng::seed_from_u64(5)).unwrap();
    let (handle, actor) = spawn_engine(engine, &cfg(100));
    drop(handle);

    let engine = actor.await.unwrap();
    assert_eq!(engine.system_status().tick_seq, 0);
}
