//! Single-writer runtime for the engine.
//!
//! The actor owns the [`Engine`] exclusively and interleaves the periodic
//! tick with requests from [`EngineHandle`]s. Each tick and each request
//! runs to completion before the next one starts, so no caller ever sees a
//! half-applied tick.

use rand::Rng;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::logging::{flush_logs, log_tick_summary};
use crate::model::{Agent, Pipeline, TransformerRecord};

use super::facade::SystemStatus;
use super::optimizer::OptimizationReport;
use super::state::StageOutcome;
use super::Engine;

#[derive(Debug)]
pub enum EngineRequest {
    DeployTransformer {
        id: String,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    ActivateAgent {
        id: String,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    ExecuteFlashLoanStrategy {
        strategy_type: String,
        capital: f64,
        reply: oneshot::Sender<Result<StageOutcome, EngineError>>,
    },
    GetSystemStatus {
        reply: oneshot::Sender<SystemStatus>,
    },
    GetAgentPerformance {
        reply: oneshot::Sender<Vec<Agent>>,
    },
    GetTransformerStatus {
        reply: oneshot::Sender<Vec<TransformerRecord>>,
    },
    GetPipelineStatus {
        reply: oneshot::Sender<Vec<Pipeline>>,
    },
    OptimizeNetwork {
        reply: oneshot::Sender<OptimizationReport>,
    },
    StateHash {
        reply: oneshot::Sender<u64>,
    },
    Shutdown,
}

pub struct EngineActor<R> {
    engine: Engine<R>,
    inbox: mpsc::Receiver<EngineRequest>,
    tick_period: Duration,
    summary_every: u64,
}

impl<R: Rng> EngineActor<R> {
    pub fn new(engine: Engine<R>, inbox: mpsc::Receiver<EngineRequest>, cfg: &EngineConfig) -> Self {
        Self {
            engine,
            inbox,
            tick_period: cfg.tick_period(),
            summary_every: cfg.summary_every,
        }
    }

    /// Run until `Shutdown` arrives or every handle is dropped.
    /// Returns the engine so callers can inspect the final state.
    pub async fn run(mut self) -> Engine<R> {
        let mut ticker = interval_at(Instant::now() + self.tick_period, self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.on_tick(),
                request = self.inbox.recv() => match request {
                    Some(EngineRequest::Shutdown) | None => break,
                    Some(request) => self.handle(request),
                },
            }
        }
        flush_logs();
        self.engine
    }

    fn on_tick(&mut self) {
        let report = self.engine.tick();
        if self.summary_every > 0 && report.tick_seq > 0 && report.tick_seq % self.summary_every == 0 {
            let state = self.engine.state();
            log_tick_summary(
                report.tick_seq,
                report.attempted,
                report.succeeded,
                report.faulted,
                report.profit,
                state.total_profit(),
                state.global_coherence,
                state.hash(),
            );
            flush_logs();
        }
    }

    fn handle(&mut self, request: EngineRequest) {
        // Send errors only mean the caller went away.
        match request {
            EngineRequest::DeployTransformer { id, reply } => {
                let _ = reply.send(self.engine.deploy_transformer(&id));
            }
            EngineRequest::ActivateAgent { id, reply } => {
                let _ = reply.send(self.engine.activate_agent(&id));
            }
            EngineRequest::ExecuteFlashLoanStrategy {
                strategy_type,
                capital,
                reply,
            } => {
                let _ = reply.send(self.engine.execute_flash_loan_strategy(&strategy_type, capital));
            }
            EngineRequest::GetSystemStatus { reply } => {
                let _ = reply.send(self.engine.system_status());
            }
            EngineRequest::GetAgentPerformance { reply } => {
                let _ = reply.send(self.engine.agent_performance());
            }
            EngineRequest::GetTransformerStatus { reply } => {
                let _ = reply.send(self.engine.transformer_status());
            }
            EngineRequest::GetPipelineStatus { reply } => {
                let _ = reply.send(self.engine.pipeline_status());
            }
            EngineRequest::OptimizeNetwork { reply } => {
                let _ = reply.send(self.engine.optimize_network());
            }
            EngineRequest::StateHash { reply } => {
                let _ = reply.send(self.engine.state_hash());
            }
            EngineRequest::Shutdown => {}
        }
    }
}

/// Cheap-to-clone handle to a running [`EngineActor`].
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    pub fn new(sender: mpsc::Sender<EngineRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| EngineError::ActorStopped)?;
        rx.await.map_err(|_| EngineError::ActorStopped)
    }

    pub async fn deploy_transformer(&self, id: &str) -> Result<(), EngineError> {
        let id = id.to_string();
        self.request(|reply| EngineRequest::DeployTransformer { id, reply })
            .await?
    }

    pub async fn activate_agent(&self, id: &str) -> Result<(), EngineError> {
        let id = id.to_string();
        self.request(|reply| EngineRequest::ActivateAgent { id, reply })
            .await?
    }

    pub async fn execute_flash_loan_strategy(
        &self,
        strategy_type: &str,
        capital: f64,
    ) -> Result<StageOutcome, EngineError> {
        let strategy_type = strategy_type.to_string();
        self.request(|reply| EngineRequest::ExecuteFlashLoanStrategy {
            strategy_type,
            capital,
            reply,
        })
        .await?
    }

    pub async fn system_status(&self) -> Result<SystemStatus, EngineError> {
        self.request(|reply| EngineRequest::GetSystemStatus { reply }).await
    }

    pub async fn agent_performance(&self) -> Result<Vec<Agent>, EngineError> {
        self.request(|reply| EngineRequest::GetAgentPerformance { reply }).await
    }

    pub async fn transformer_status(&self) -> Result<Vec<TransformerRecord>, EngineError> {
        self.request(|reply| EngineRequest::GetTransformerStatus { reply }).await
    }

    pub async fn pipeline_status(&self) -> Result<Vec<Pipeline>, EngineError> {
        self.request(|reply| EngineRequest::GetPipelineStatus { reply }).await
    }

    pub async fn optimize_network(&self) -> Result<OptimizationReport, EngineError> {
        self.request(|reply| EngineRequest::OptimizeNetwork { reply }).await
    }

    pub async fn state_hash(&self) -> Result<u64, EngineError> {
        self.request(|reply| EngineRequest::StateHash { reply }).await
    }

    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.sender
            .send(EngineRequest::Shutdown)
            .await
            .map_err(|_| EngineError::ActorStopped)
    }
}

/// Spawn the actor on the current runtime.
pub fn spawn_engine<R>(engine: Engine<R>, cfg: &EngineConfig) -> (EngineHandle, JoinHandle<Engine<R>>)
where
    R: Rng + Send + 'static,
{
    let (tx, rx) = mpsc::channel(cfg.request_queue.max(1));
    let actor = EngineActor::new(engine, rx, cfg);
    (EngineHandle::new(tx), tokio::spawn(actor.run()))
}
