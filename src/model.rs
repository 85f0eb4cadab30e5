//! Records held by the engine registries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EntityKind;
use crate::registry::Keyed;

pub type Timestamp = DateTime<Utc>;

/// Closed set of agent roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    QuantumPhoenix,
    Ghostwire,
    DarkDiamond,
    FlashHustle,
    VoidSage,
    FibroX,
    CipherOracle,
    NeuroVault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformerKind {
    FlashLoan,
    Perpetuals,
    HybridLstm,
    MevExtraction,
    ArbitrageNeural,
    MemecoinNeural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantumState {
    Superposition,
    Entangled,
    Collapsed,
}

/// Scored actor credited with pipeline outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: AgentRole,
    /// 0..=100; only the optimizer path ever touches it, and never downward
    pub accuracy: f64,
    #[serde(default = "default_true")]
    pub deployed: bool,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub profit_generated: f64,
    #[serde(default)]
    pub last_execution: Option<Timestamp>,
    /// Advisory topology only
    #[serde(default)]
    pub links: Vec<String>,
    /// Always within [0, 1]
    pub entanglement_strength: f64,
}

impl Agent {
    /// Grow entanglement by `factor`, saturating at 1.0.
    pub fn entangle(&mut self, factor: f64) {
        self.entanglement_strength = (self.entanglement_strength * factor).min(1.0);
    }

    pub fn weighted_accuracy(&self) -> f64 {
        self.accuracy * self.entanglement_strength
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformerRecord {
    pub id: String,
    pub name: String,
    pub kind: TransformerKind,
    #[serde(default = "default_training_progress")]
    pub training_progress: f64,
    pub accuracy: f64,
    #[serde(default)]
    pub is_deployed: bool,
    #[serde(default)]
    pub specialization: Vec<String>,
    pub layers: u64,
    pub parameters: u64,
    #[serde(default)]
    pub last_training: Option<Timestamp>,
}

impl TransformerRecord {
    /// Contribution to neural processing power before the final /1000 scale.
    pub fn power(&self) -> f64 {
        let layer_power = self.layers as f64 * self.parameters as f64 / 1_000_000.0;
        layer_power * (self.accuracy / 100.0)
    }
}

/// Ordered-stage execution record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: String,
    pub name: String,
    pub stages: Vec<String>,
    #[serde(default)]
    pub current_stage: usize,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub profit: f64,
    /// Nominal, descriptive only
    pub execution_time_ms: u64,
    /// 0..=100, Bernoulli parameter for each stage attempt
    pub success_rate: f64,
}

impl Pipeline {
    pub fn total_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn current_stage_name(&self) -> Option<&str> {
        self.stages.get(self.current_stage).map(String::as_str)
    }

    pub fn advance(&mut self) {
        if !self.stages.is_empty() {
            self.current_stage = (self.current_stage + 1) % self.stages.len();
        }
    }
}

/// Group of agent references with derived coherence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub members: Vec<String>,
    #[serde(default)]
    pub adjacency: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub coherence_level: f64,
    pub quantum_state: QuantumState,
    #[serde(default)]
    pub information_flow: f64,
}

fn default_true() -> bool {
    true
}

fn default_training_progress() -> f64 {
    100.0
}

impl Keyed for Agent {
    const KIND: EntityKind = EntityKind::Agent;
    fn id(&self) -> &str {
        &self.id
    }
}

impl Keyed for TransformerRecord {
    const KIND: EntityKind = EntityKind::Transformer;
    fn id(&self) -> &str {
        &self.id
    }
}

impl Keyed for Pipeline {
    const KIND: EntityKind = EntityKind::Pipeline;
    fn id(&self) -> &str {
        &self.id
    }
}

impl Keyed for Network {
    const KIND: EntityKind = EntityKind::Network;
    fn id(&self) -> &str {
        &self.id
    }
}
