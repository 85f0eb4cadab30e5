//! Scheduler-driven pipeline executor.
//!
//! A tick attempts the current stage of every active pipeline, then
//! refreshes global coherence and every network. A stage attempt either
//! misses (no mutation at all) or succeeds and commits profit, stage
//! advance and agent credit together.

use chrono::Utc;
use rand::Rng;
use serde_json::json;

use crate::error::EngineError;
use crate::logging::{log_agent_credit, log_stage_fault, log_stage_miss, log_stage_success, ProfileScope};

use super::state::{StageOutcome, TickReport};
use super::Engine;

/// Entanglement growth per successful credit.
pub const CREDIT_ENTANGLEMENT_FACTOR: f64 = 1.001;

impl<R: Rng> Engine<R> {
    /// One full scheduler pass. Inactive engines do nothing.
    pub fn tick(&mut self) -> TickReport {
        if !self.state.active {
            return TickReport {
                tick_seq: self.state.tick_seq,
                ..Default::default()
            };
        }
        let _scope = ProfileScope::with_context("tick", &[("tick_seq", json!(self.state.tick_seq + 1))]);

        let mut report = TickReport::default();
        let active: Vec<String> = self
            .state
            .pipelines
            .iter()
            .filter(|p| p.is_active)
            .map(|p| p.id.clone())
            .collect();

        for pipeline_id in &active {
            report.attempted += 1;
            match self.run_pipeline_stage(pipeline_id) {
                Ok(outcome) if outcome.success => {
                    report.succeeded += 1;
                    report.profit += outcome.profit.unwrap_or(0.0);
                }
                Ok(_) => report.missed += 1,
                Err(err) => {
                    report.faulted += 1;
                    log_stage_fault(pipeline_id, &err.to_string());
                }
            }
        }

        self.state.update_global_coherence();
        self.state.update_networks();

        self.state.tick_seq += 1;
        report.tick_seq = self.state.tick_seq;
        report
    }

    /// Attempt the current stage of one pipeline.
    ///
    /// Everything that can fail is checked before the first mutation, so an
    /// error leaves the pipeline and its agents untouched.
    pub fn run_pipeline_stage(&mut self, pipeline_id: &str) -> Result<StageOutcome, EngineError> {
        let pipeline = self.state.pipelines.require(pipeline_id)?;
        let stage = pipeline
            .current_stage_name()
            .ok_or_else(|| EngineError::StageFault {
                pipeline_id: pipeline_id.to_string(),
                reason: format!(
                    "stage index {} out of range for {} stages",
                    pipeline.current_stage,
                    pipeline.total_stages()
                ),
            })?
            .to_string();
        let probability = (pipeline.success_rate / 100.0).clamp(0.0, 1.0);
        let execution_time_ms = pipeline.execution_time_ms;

        if !self.draw(probability) {
            log_stage_miss(pipeline_id, &stage);
            return Ok(StageOutcome::miss(pipeline_id, &stage));
        }

        let profit = self.tables.base_profit(pipeline_id) * self.state.amplification();

        let pipeline = self.state.pipelines.require_mut(pipeline_id)?;
        pipeline.profit += profit;
        pipeline.advance();
        let next_stage = pipeline.current_stage;

        self.credit_agents(pipeline_id, profit);
        log_stage_success(pipeline_id, &stage, profit, next_stage);

        Ok(StageOutcome {
            pipeline_id: pipeline_id.to_string(),
            stage,
            success: true,
            profit: Some(profit),
            execution_time_ms: Some(execution_time_ms),
        })
    }

    fn draw(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }

    fn credit_agents(&mut self, pipeline_id: &str, profit: f64) {
        let now = Utc::now();
        for agent_id in self.tables.relevant_agents(pipeline_id) {
            if let Some(agent) = self.state.agents.get_mut(agent_id) {
                agent.profit_generated += profit;
                agent.last_execution = Some(now);
                agent.entangle(CREDIT_ENTANGLEMENT_FACTOR);
                log_agent_credit(agent_id, profit, agent.entanglement_strength);
            }
        }
    }
}
