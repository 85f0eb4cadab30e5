//! On-demand optimizer. Never scheduled.

use serde::{Deserialize, Serialize};

use super::state::EngineState;

pub const AGENT_ENTANGLEMENT_FLOOR: f64 = 0.9;
pub const AGENT_ENTANGLEMENT_FACTOR: f64 = 1.05;
pub const TRANSFORMER_ACCURACY_FLOOR: f64 = 98.0;
pub const TRANSFORMER_ACCURACY_FACTOR: f64 = 1.02;
pub const TRANSFORMER_ACCURACY_CEILING: f64 = 99.5;
pub const COHERENCE_FACTOR: f64 = 1.01;
pub const COHERENCE_CEILING: f64 = 0.99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    pub notes: Vec<String>,
    pub new_coherence: f64,
    pub new_processing_power: f64,
}

impl EngineState {
    /// Nudge under-performing agents and transformers, lift global
    /// coherence toward its ceiling, then recompute processing power.
    pub fn optimize(&mut self) -> OptimizationReport {
        let mut notes = Vec::new();

        for agent in self.agents.iter_mut() {
            if agent.entanglement_strength < AGENT_ENTANGLEMENT_FLOOR {
                agent.entangle(AGENT_ENTANGLEMENT_FACTOR);
                notes.push(format!("Enhanced {} entanglement", agent.name));
            }
        }

        for transformer in self.transformers.iter_mut() {
            if transformer.accuracy < TRANSFORMER_ACCURACY_FLOOR {
                transformer.accuracy = (transformer.accuracy * TRANSFORMER_ACCURACY_FACTOR)
                    .min(TRANSFORMER_ACCURACY_CEILING);
                notes.push(format!("Improved {} accuracy", transformer.name));
            }
        }

        self.global_coherence = (self.global_coherence * COHERENCE_FACTOR).min(COHERENCE_CEILING);
        self.recompute_processing_power();

        OptimizationReport {
            notes,
            new_coherence: self.global_coherence,
            new_processing_power: self.neural_processing_power,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedTables;

    #[test]
    fn test_builtin_first_pass_notes() {
        let mut state = EngineState::from_seed(&SeedTables::builtin()).unwrap();
        let report = state.optimize();
        // void_sage 0.89, neuro_vault 0.88; perpetuals 97.8, memecoin 96.7
        assert_eq!(
            report.notes,
            vec![
                "Enhanced VoidSage entanglement",
                "Enhanced NeuroVault entanglement",
                "Improved Perpetuals Trading Transformer accuracy",
                "Improved Memecoin Launch Sniper Neural accuracy",
            ]
        );
        assert!((report.new_coherence - 0.847 * 1.01).abs() < 1e-12);
        assert_eq!(report.new_processing_power, state.neural_processing_power);
    }

    #[test]
    fn test_second_pass_has_no_notes() {
        let mut state = EngineState::from_seed(&SeedTables::builtin()).unwrap();
        state.optimize();
        let second = state.optimize();
        assert!(second.notes.is_empty());
        assert!(second.new_coherence > 0.847 * 1.01);
    }

    #[test]
    fn test_coherence_ceiling() {
        let mut state = EngineState::from_seed(&SeedTables::builtin()).unwrap();
        for _ in 0..50 {
            state.optimize();
        }
        assert_eq!(state.global_coherence, COHERENCE_CEILING);
    }

    #[test]
    fn test_transformer_accuracy_ceiling() {
        let mut seed = SeedTables::builtin();
        seed.transformers[0].accuracy = 97.9;
        let mut state = EngineState::from_seed(&seed).unwrap();
        state.optimize();
        assert_eq!(state.transformers.get(&seed.transformers[0].id).unwrap().accuracy, 99.5);
    }

    #[test]
    fn test_optimizer_refreshes_processing_power() {
        let mut state = EngineState::from_seed(&SeedTables::builtin()).unwrap();
        let before = state.neural_processing_power;
        state.optimize();
        assert!(state.neural_processing_power > before);
    }
}
