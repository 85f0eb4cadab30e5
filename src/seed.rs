//! Startup seed tables.
//!
//! The engine consumes these once at construction. After `validate()` the
//! lookup tables are treated as immutable constants.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::EngineError;
use crate::model::{
    Agent, AgentRole, Network, Pipeline, QuantumState, TransformerKind, TransformerRecord,
};

/// Global coherence before the first tick.
pub const DEFAULT_INITIAL_COHERENCE: f64 = 0.847;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedTables {
    pub agents: Vec<Agent>,
    pub transformers: Vec<TransformerRecord>,
    pub pipelines: Vec<Pipeline>,
    pub networks: Vec<Network>,
    /// pipeline id -> base stage profit
    #[serde(default)]
    pub base_profit: BTreeMap<String, f64>,
    /// pipeline id -> agent ids credited on success
    #[serde(default)]
    pub relevant_agents: BTreeMap<String, Vec<String>>,
    /// strategy type -> pipeline id
    #[serde(default)]
    pub strategy_routes: BTreeMap<String, String>,
    #[serde(default = "default_coherence")]
    pub initial_coherence: f64,
}

fn default_coherence() -> f64 {
    DEFAULT_INITIAL_COHERENCE
}

impl SeedTables {
    /// Empty tables; useful as a base for hand-built test fixtures.
    pub fn empty() -> Self {
        Self {
            agents: Vec::new(),
            transformers: Vec::new(),
            pipelines: Vec::new(),
            networks: Vec::new(),
            base_profit: BTreeMap::new(),
            relevant_agents: BTreeMap::new(),
            strategy_routes: BTreeMap::new(),
            initial_coherence: DEFAULT_INITIAL_COHERENCE,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let tables: SeedTables = serde_json::from_str(raw).context("parse seed tables")?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read seed file {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("load seed file {}", path.display()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize seed tables")
    }

    /// Hex SHA-256 of the canonical JSON encoding.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }

    /// Check every lookup table against the registries it refers to.
    pub fn validate(&self) -> Result<(), EngineError> {
        let has_pipeline = |id: &str| self.pipelines.iter().any(|p| p.id == id);
        let has_agent = |id: &str| self.agents.iter().any(|a| a.id == id);

        for p in &self.pipelines {
            if p.stages.is_empty() {
                return Err(EngineError::InvalidSeed(format!(
                    "pipeline {} has no stages",
                    p.id
                )));
            }
            if !(0.0..=100.0).contains(&p.success_rate) {
                return Err(EngineError::InvalidSeed(format!(
                    "pipeline {} success rate {} outside 0..=100",
                    p.id, p.success_rate
                )));
            }
            if p.current_stage >= p.stages.len() {
                return Err(EngineError::InvalidSeed(format!(
                    "pipeline {} starts at stage {} of {}",
                    p.id,
                    p.current_stage,
                    p.stages.len()
                )));
            }
        }
        for a in &self.agents {
            if !(0.0..=1.0).contains(&a.entanglement_strength) {
                return Err(EngineError::InvalidSeed(format!(
                    "agent {} entanglement {} outside 0..=1",
                    a.id, a.entanglement_strength
                )));
            }
        }
        for id in self.base_profit.keys() {
            if !has_pipeline(id.as_str()) {
                return Err(EngineError::InvalidSeed(format!(
                    "base profit entry for unknown pipeline {}",
                    id
                )));
            }
        }
        for (pipeline_id, agents) in &self.relevant_agents {
            if !has_pipeline(pipeline_id.as_str()) {
                return Err(EngineError::InvalidSeed(format!(
                    "relevant agents entry for unknown pipeline {}",
                    pipeline_id
                )));
            }
            if let Some(missing) = agents.iter().find(|a| !has_agent(a.as_str())) {
                return Err(EngineError::InvalidSeed(format!(
                    "pipeline {} credits unknown agent {}",
                    pipeline_id, missing
                )));
            }
        }
        for (strategy, pipeline_id) in &self.strategy_routes {
            if !has_pipeline(pipeline_id.as_str()) {
                return Err(EngineError::InvalidSeed(format!(
                    "strategy {} routes to unknown pipeline {}",
                    strategy, pipeline_id
                )));
            }
        }
        Ok(())
    }

    /// Production seed set.
    pub fn builtin() -> Self {
        let agents = vec![
            agent("quantum_phoenix", "Quantum Phoenix", AgentRole::QuantumPhoenix, 99.2,
                "transformer_training_reinforcement", &["ghostwire", "dark_diamond"], 0.95),
            agent("ghostwire", "GhostWire", AgentRole::Ghostwire, 98.7,
                "signal_architecture_generation", &["quantum_phoenix", "cipher_oracle"], 0.92),
            agent("dark_diamond", "Dark Diamond", AgentRole::DarkDiamond, 99.1,
                "transaction_routing_stealth", &["flash_hustle", "void_sage"], 0.97),
            agent("flash_hustle", "FlashHustle", AgentRole::FlashHustle, 99.3,
                "arbitrage_flash_loan_specialist", &["dark_diamond", "fibro_x"], 0.94),
            agent("void_sage", "VoidSage", AgentRole::VoidSage, 97.8,
                "chaos_modeling_dataset", &["neuro_vault", "quantum_phoenix"], 0.89),
            agent("fibro_x", "FibroX", AgentRole::FibroX, 98.4,
                "golden_ratio_market_timing", &["flash_hustle", "cipher_oracle"], 0.91),
            agent("cipher_oracle", "CipherOracle", AgentRole::CipherOracle, 99.0,
                "smart_contract_transaction_analysis", &["ghostwire", "neuro_vault"], 0.96),
            agent("neuro_vault", "NeuroVault", AgentRole::NeuroVault, 97.6,
                "pattern_recognition_retail_intelligence", &["void_sage", "fibro_x"], 0.88),
        ];

        let transformers = vec![
            transformer("solana_flash_loan_transformer", "Solana Flash Loan Transformer",
                TransformerKind::FlashLoan, 98.9,
                &["raydium", "orca", "mango", "solend", "marginfi"], 24, 340_000_000),
            transformer("perpetuals_trading_transformer", "Perpetuals Trading Transformer",
                TransformerKind::Perpetuals, 97.8,
                &["mango_markets", "drift", "zeta", "01", "phoenix"], 32, 520_000_000),
            transformer("hybrid_lstm_quantum", "Hybrid LSTM Quantum Enhanced",
                TransformerKind::HybridLstm, 98.5,
                &["price_prediction", "volatility_modeling", "risk_assessment"], 16, 180_000_000),
            transformer("mev_extraction_transformer", "MEV Extraction Neural Network",
                TransformerKind::MevExtraction, 99.1,
                &["jito_bundles", "frontrunning", "sandwich_attacks", "arbitrage_mev"], 28, 420_000_000),
            transformer("arbitrage_neural_engine", "Cross-DEX Arbitrage Neural Engine",
                TransformerKind::ArbitrageNeural, 98.3,
                &["cross_dex", "triangular_arb", "flash_arbitrage"], 20, 280_000_000),
            transformer("memecoin_sniper_neural", "Memecoin Launch Sniper Neural",
                TransformerKind::MemecoinNeural, 96.7,
                &["launch_detection", "liquidity_analysis", "rug_detection"], 18, 220_000_000),
        ];

        let pipelines = vec![
            pipeline("cascade_flash_pipeline", "Cascade Flash Loan Execution Pipeline",
                &["opportunity_detection", "risk_assessment", "capital_allocation", "execution", "profit_extraction"],
                150, 98.5),
            pipeline("triangular_arb_pipeline", "Triangular Arbitrage Neural Pipeline",
                &["price_monitoring", "opportunity_calculation", "path_optimization", "execution", "settlement"],
                200, 97.8),
            pipeline("mev_extraction_pipeline", "MEV Bundle Extraction Pipeline",
                &["mempool_monitoring", "bundle_construction", "priority_fee_calculation", "jito_submission", "profit_capture"],
                50, 99.2),
            pipeline("memecoin_sniper_pipeline", "Memecoin Launch Sniper Pipeline",
                &["launch_detection", "liquidity_analysis", "timing_optimization", "instant_execution", "exit_strategy"],
                25, 94.3),
            pipeline("stake_arb_glitch_pipeline", "Staking Arbitrage Money Glitch Pipeline",
                &["flash_loan_initiation", "staking_execution", "collateral_borrowing", "arbitrage_execution", "compound_reinvestment"],
                500, 96.1),
        ];

        let networks = vec![
            network("primary_neural_network",
                &["quantum_phoenix", "ghostwire", "dark_diamond", "flash_hustle"],
                &[
                    ("quantum_phoenix", &["ghostwire", "dark_diamond"]),
                    ("ghostwire", &["quantum_phoenix", "cipher_oracle"]),
                    ("dark_diamond", &["flash_hustle", "void_sage"]),
                    ("flash_hustle", &["dark_diamond", "fibro_x"]),
                ],
                0.94, 847.0),
            network("secondary_neural_network",
                &["void_sage", "fibro_x", "cipher_oracle", "neuro_vault"],
                &[
                    ("void_sage", &["neuro_vault", "quantum_phoenix"]),
                    ("fibro_x", &["flash_hustle", "cipher_oracle"]),
                    ("cipher_oracle", &["ghostwire", "neuro_vault"]),
                    ("neuro_vault", &["void_sage", "fibro_x"]),
                ],
                0.89, 618.0),
        ];

        let base_profit = [
            ("cascade_flash_pipeline", 2.5),
            ("triangular_arb_pipeline", 1.8),
            ("mev_extraction_pipeline", 4.2),
            ("memecoin_sniper_pipeline", 8.7),
            ("stake_arb_glitch_pipeline", 3.1),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let relevant_agents = [
            ("cascade_flash_pipeline", ["flash_hustle", "dark_diamond"]),
            ("triangular_arb_pipeline", ["ghostwire", "cipher_oracle"]),
            ("mev_extraction_pipeline", ["dark_diamond", "quantum_phoenix"]),
            ("memecoin_sniper_pipeline", ["neuro_vault", "void_sage"]),
            ("stake_arb_glitch_pipeline", ["fibro_x", "flash_hustle"]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
        .collect();

        let strategy_routes = [
            ("cascade", "cascade_flash_pipeline"),
            ("triangular", "triangular_arb_pipeline"),
            ("mev", "mev_extraction_pipeline"),
            ("memecoin", "memecoin_sniper_pipeline"),
            ("stake_arb", "stake_arb_glitch_pipeline"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            agents,
            transformers,
            pipelines,
            networks,
            base_profit,
            relevant_agents,
            strategy_routes,
            initial_coherence: DEFAULT_INITIAL_COHERENCE,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn agent(
    id: &str,
    name: &str,
    role: AgentRole,
    accuracy: f64,
    strategy: &str,
    links: &[&str],
    entanglement_strength: f64,
) -> Agent {
    Agent {
        id: id.to_string(),
        name: name.to_string(),
        role,
        accuracy,
        deployed: true,
        strategy: strategy.to_string(),
        profit_generated: 0.0,
        last_execution: None,
        links: strings(links),
        entanglement_strength,
    }
}

fn transformer(
    id: &str,
    name: &str,
    kind: TransformerKind,
    accuracy: f64,
    specialization: &[&str],
    layers: u64,
    parameters: u64,
) -> TransformerRecord {
    TransformerRecord {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        training_progress: 100.0,
        accuracy,
        is_deployed: true,
        specialization: strings(specialization),
        layers,
        parameters,
        last_training: None,
    }
}

fn pipeline(id: &str, name: &str, stages: &[&str], execution_time_ms: u64, success_rate: f64) -> Pipeline {
    Pipeline {
        id: id.to_string(),
        name: name.to_string(),
        stages: strings(stages),
        current_stage: 0,
        is_active: true,
        profit: 0.0,
        execution_time_ms,
        success_rate,
    }
}

fn network(
    id: &str,
    members: &[&str],
    adjacency: &[(&str, &[&str])],
    coherence_level: f64,
    information_flow: f64,
) -> Network {
    Network {
        id: id.to_string(),
        members: strings(members),
        adjacency: adjacency
            .iter()
            .map(|(k, v)| (k.to_string(), strings(v)))
            .collect(),
        coherence_level,
        quantum_state: QuantumState::Entangled,
        information_flow,
    }
}
