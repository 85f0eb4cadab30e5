//! Engine state with deterministic hashing for replay validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::model::{Agent, Network, Pipeline, TransformerRecord};
use crate::registry::Registry;
use crate::seed::SeedTables;

use super::coherence::neural_processing_power;

/// Every mutable registry plus the process-wide scalars.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub agents: Registry<Agent>,
    pub transformers: Registry<TransformerRecord>,
    pub pipelines: Registry<Pipeline>,
    pub networks: Registry<Network>,

    /// Exponentially smoothed, never reset
    pub global_coherence: f64,

    /// Computed at startup and after each optimization only
    pub neural_processing_power: f64,

    pub active: bool,

    /// Completed ticks
    pub tick_seq: u64,
}

impl EngineState {
    pub fn from_seed(seed: &SeedTables) -> Result<Self, EngineError> {
        let agents = Registry::from_records(seed.agents.clone())?;
        let transformers = Registry::from_records(seed.transformers.clone())?;
        let neural_processing_power = neural_processing_power(&transformers, &agents);

        Ok(Self {
            agents,
            transformers,
            pipelines: Registry::from_records(seed.pipelines.clone())?,
            networks: Registry::from_records(seed.networks.clone())?,
            global_coherence: seed.initial_coherence,
            neural_processing_power,
            active: true,
            tick_seq: 0,
        })
    }

    pub fn total_profit(&self) -> f64 {
        self.pipelines.iter().map(|p| p.profit).sum()
    }

    /// Compute deterministic state hash for replay validation
    pub fn hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let q = |v: f64| (v * 1e8) as i64;
        let mut h = DefaultHasher::new();

        self.tick_seq.hash(&mut h);
        self.active.hash(&mut h);
        q(self.global_coherence).hash(&mut h);
        q(self.neural_processing_power).hash(&mut h);

        for p in self.pipelines.iter() {
            p.id.hash(&mut h);
            p.current_stage.hash(&mut h);
            q(p.profit).hash(&mut h);
        }
        for a in self.agents.iter() {
            a.id.hash(&mut h);
            a.deployed.hash(&mut h);
            q(a.accuracy).hash(&mut h);
            q(a.profit_generated).hash(&mut h);
            q(a.entanglement_strength).hash(&mut h);
        }
        for t in self.transformers.iter() {
            t.id.hash(&mut h);
            t.is_deployed.hash(&mut h);
            q(t.accuracy).hash(&mut h);
        }
        for n in self.networks.iter() {
            n.id.hash(&mut h);
            q(n.coherence_level).hash(&mut h);
        }

        h.finish()
    }
}

/// Static per-pipeline lookups, immutable after load.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    pub base_profit: BTreeMap<String, f64>,
    pub relevant_agents: BTreeMap<String, Vec<String>>,
    pub strategy_routes: BTreeMap<String, String>,
}

impl LookupTables {
    pub const DEFAULT_BASE_PROFIT: f64 = 1.0;

    pub fn from_seed(seed: &SeedTables) -> Self {
        Self {
            base_profit: seed.base_profit.clone(),
            relevant_agents: seed.relevant_agents.clone(),
            strategy_routes: seed.strategy_routes.clone(),
        }
    }

    pub fn base_profit(&self, pipeline_id: &str) -> f64 {
        self.base_profit
            .get(pipeline_id)
            .copied()
            .unwrap_or(Self::DEFAULT_BASE_PROFIT)
    }

    pub fn relevant_agents(&self, pipeline_id: &str) -> &[String] {
        self.relevant_agents
            .get(pipeline_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn route(&self, strategy_type: &str) -> Option<&str> {
        self.strategy_routes.get(strategy_type).map(String::as_str)
    }
}

/// Aggregate result of one scheduler tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick_seq: u64,
    pub attempted: usize,
    pub succeeded: usize,
    pub missed: usize,
    pub faulted: usize,
    pub profit: f64,
}

/// Result of a single stage attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageOutcome {
    pub pipeline_id: String,
    pub stage: String,
    pub success: bool,
    pub profit: Option<f64>,
    pub execution_time_ms: Option<u64>,
}

impl StageOutcome {
    pub fn miss(pipeline_id: &str, stage: &str) -> Self {
        Self {
            pipeline_id: pipeline_id.to_string(),
            stage: stage.to_string(),
            success: false,
            profit: None,
            execution_time_ms: None,
        }
    }
}
