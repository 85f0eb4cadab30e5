//! Error types for engine operations.

use std::fmt;
use thiserror::Error;

/// Registry a missing or duplicated id was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Agent,
    Transformer,
    Pipeline,
    Network,
    Strategy,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Agent => "agent",
            EntityKind::Transformer => "transformer",
            EntityKind::Pipeline => "pipeline",
            EntityKind::Network => "network",
            EntityKind::Strategy => "strategy",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("duplicate {kind} id in seed tables: {id}")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("stage fault in pipeline {pipeline_id}: {reason}")]
    StageFault { pipeline_id: String, reason: String },

    #[error("invalid seed tables: {0}")]
    InvalidSeed(String),

    #[error("engine actor stopped")]
    ActorStopped,
}

impl EngineError {
    pub fn not_found(kind: EntityKind, id: &str) -> Self {
        EngineError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}
