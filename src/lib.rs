//! Black Diamond pipeline orchestration engine.
//!
//! A fixed-period scheduler advances every active execution pipeline one
//! stage per tick. Successful stages earn profit amplified by the engine's
//! coherence scores and credit the agents bound to that pipeline, whose
//! entanglement in turn feeds back into network and global coherence.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │    Timer     │────►│   Executor   │────►│    Agents    │
//! │  (interval)  │     │ (per stage)  │     │  (credited)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        ▲                                         │
//!        │                                         ▼
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │    Actor     │◄────│    Global    │◄────│   Networks   │
//! │   (inbox)    │     │  Coherence   │     │ (recomputed) │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod registry;
pub mod seed;
