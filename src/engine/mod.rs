//! Pipeline orchestration engine.
//!
//! [`Engine`] owns the registries, the lookup tables and the random source.
//! Every mutation goes through `&mut Engine`, so a single owner (the
//! [`actor`]) serializes ticks and facade calls without extra locking.

pub mod actor;
pub mod coherence;
pub mod executor;
pub mod facade;
pub mod optimizer;
pub mod state;

use rand::Rng;

use crate::error::EngineError;
use crate::seed::SeedTables;

use self::state::{EngineState, LookupTables};

pub struct Engine<R> {
    state: EngineState,
    tables: LookupTables,
    rng: R,
}

impl<R: Rng> Engine<R> {
    /// Validate the seed tables and build the starting state.
    pub fn new(seed: &SeedTables, rng: R) -> Result<Self, EngineError> {
        seed.validate()?;
        Ok(Self {
            state: EngineState::from_seed(seed)?,
            tables: LookupTables::from_seed(seed),
            rng,
        })
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn state_hash(&self) -> u64 {
        self.state.hash()
    }

    /// Suspend or resume scheduled ticks. Facade calls keep working.
    pub fn set_active(&mut self, active: bool) {
        self.state.active = active;
    }
}
