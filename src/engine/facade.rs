//! Request/response operations outside the tick cycle.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EntityKind};
use crate::logging::{log_facade_call, log_optimization, log_stage_fault};
use crate::model::{Agent, Pipeline, TransformerRecord};

use super::optimizer::OptimizationReport;
use super::state::StageOutcome;
use super::Engine;

/// Read-only snapshot of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub is_active: bool,
    pub global_coherence: f64,
    pub neural_processing_power: f64,
    pub active_agents: usize,
    pub deployed_transformers: usize,
    pub active_pipelines: usize,
    pub total_profit: f64,
    pub network_count: usize,
    /// None when no agents are registered
    pub average_accuracy: Option<f64>,
    pub tick_seq: u64,
}

impl<R: Rng> Engine<R> {
    pub fn deploy_transformer(&mut self, transformer_id: &str) -> Result<(), EngineError> {
        let result = self.state.transformers.require_mut(transformer_id).map(|t| {
            t.is_deployed = true;
            t.last_training = Some(Utc::now());
        });
        log_facade_call("deploy_transformer", transformer_id, result.is_ok());
        result
    }

    pub fn activate_agent(&mut self, agent_id: &str) -> Result<(), EngineError> {
        let result = self.state.agents.require_mut(agent_id).map(|a| {
            a.deployed = true;
            a.last_execution = Some(Utc::now());
        });
        log_facade_call("activate_agent", agent_id, result.is_ok());
        result
    }

    /// Immediate out-of-band stage attempt for the pipeline routed from
    /// `strategy_type`. `capital` is recorded but does not shape the outcome.
    /// A stage fault is logged and reported as a miss; only unknown ids error.
    pub fn execute_flash_loan_strategy(
        &mut self,
        strategy_type: &str,
        capital: f64,
    ) -> Result<StageOutcome, EngineError> {
        let pipeline_id = match self.tables.route(strategy_type) {
            Some(id) => id.to_string(),
            None => {
                log_facade_call("execute_flash_loan_strategy", strategy_type, false);
                return Err(EngineError::not_found(EntityKind::Strategy, strategy_type));
            }
        };
        let result = match self.run_pipeline_stage(&pipeline_id) {
            Err(EngineError::StageFault { reason, .. }) => {
                log_stage_fault(&pipeline_id, &reason);
                let stage = self
                    .state
                    .pipelines
                    .get(&pipeline_id)
                    .and_then(|p| p.current_stage_name())
                    .unwrap_or_default()
                    .to_string();
                Ok(StageOutcome::miss(&pipeline_id, &stage))
            }
            other => other,
        };
        log_facade_call(
            "execute_flash_loan_strategy",
            &format!("{}:{}@{}", strategy_type, pipeline_id, capital),
            result.is_ok(),
        );
        result
    }

    pub fn system_status(&self) -> SystemStatus {
        let s = &self.state;
        let average_accuracy = if s.agents.is_empty() {
            None
        } else {
            Some(s.agents.iter().map(|a| a.accuracy).sum::<f64>() / s.agents.len() as f64)
        };
        SystemStatus {
            is_active: s.active,
            global_coherence: s.global_coherence,
            neural_processing_power: s.neural_processing_power,
            active_agents: s.agents.iter().filter(|a| a.deployed).count(),
            deployed_transformers: s.transformers.iter().filter(|t| t.is_deployed).count(),
            active_pipelines: s.pipelines.iter().filter(|p| p.is_active).count(),
            total_profit: s.total_profit(),
            network_count: s.networks.len(),
            average_accuracy,
            tick_seq: s.tick_seq,
        }
    }

    pub fn agent_performance(&self) -> Vec<Agent> {
        self.state.agents.snapshot()
    }

    pub fn transformer_status(&self) -> Vec<TransformerRecord> {
        self.state.transformers.snapshot()
    }

    pub fn pipeline_status(&self) -> Vec<Pipeline> {
        self.state.pipelines.snapshot()
    }

    pub fn optimize_network(&mut self) -> OptimizationReport {
        let report = self.state.optimize();
        log_optimization(&report.notes, report.new_coherence, report.new_processing_power);
        report
    }
}
