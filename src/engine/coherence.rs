//! Global coherence tracker, network coherence updater, processing power.

use crate::model::{Agent, TransformerRecord};
use crate::registry::Registry;

use super::state::EngineState;

/// Smoothing weights: previous value, target.
pub const COHERENCE_RETENTION: f64 = 0.99;
pub const COHERENCE_GAIN: f64 = 0.01;

/// Target coherence for a mean pipeline success rate (0..=100).
pub fn target_coherence(mean_success_rate: f64) -> f64 {
    (mean_success_rate / 100.0) * 0.9 + 0.1
}

/// Transformer term plus agent term, scaled by 1/1000.
pub fn neural_processing_power(
    transformers: &Registry<TransformerRecord>,
    agents: &Registry<Agent>,
) -> f64 {
    let transformer_power: f64 = transformers.iter().map(TransformerRecord::power).sum();
    let agent_power: f64 = agents.iter().map(|a| a.weighted_accuracy() * 10.0).sum();
    (transformer_power + agent_power) / 1000.0
}

impl EngineState {
    /// One smoothing step toward the target. No pipelines: unchanged.
    pub fn update_global_coherence(&mut self) {
        if self.pipelines.is_empty() {
            return;
        }
        let total: f64 = self.pipelines.iter().map(|p| p.success_rate).sum();
        let mean = total / self.pipelines.len() as f64;
        let target = target_coherence(mean);
        self.global_coherence =
            self.global_coherence * COHERENCE_RETENTION + target * COHERENCE_GAIN;
    }

    /// Full recompute of every network from its member agents.
    pub fn update_networks(&mut self) {
        let agents = &self.agents;
        for network in self.networks.iter_mut() {
            if network.members.is_empty() {
                continue;
            }
            let performance: f64 = network
                .members
                .iter()
                .filter_map(|id| agents.get(id))
                .map(Agent::weighted_accuracy)
                .sum();
            network.coherence_level = performance / (network.members.len() as f64 * 100.0);
            network.information_flow = network.coherence_level * 1000.0;
        }
    }

    /// Mean over networks of `coherence × flow/1000 × 0.2`; 0 with no networks.
    pub fn entanglement_bonus(&self) -> f64 {
        if self.networks.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .networks
            .iter()
            .map(|n| n.coherence_level * (n.information_flow / 1000.0) * 0.2)
            .sum();
        total / self.networks.len() as f64
    }

    /// Multiplier applied to a base stage profit.
    pub fn amplification(&self) -> f64 {
        let coherence_bonus = self.global_coherence * 0.5;
        let power_bonus = (self.neural_processing_power / 100.0) * 0.3;
        1.0 + coherence_bonus + self.entanglement_bonus() + power_bonus
    }

    pub fn recompute_processing_power(&mut self) {
        self.neural_processing_power = neural_processing_power(&self.transformers, &self.agents);
    }
}
