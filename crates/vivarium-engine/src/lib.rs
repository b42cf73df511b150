//! Vivarium engine -- the phased simulation driver.
//!
//! This crate builds on [`vivarium_core`] to provide the
//! [`SimulationEngine`](engine::SimulationEngine): a headless, deterministic
//! update loop that runs a fixed sequence of phases per frame, commits
//! deferred entity mutations at designated points, and exposes per-frame
//! delta streams keyed by stable IDs. World modes plug in through the
//! [`WorldPack`](pack::WorldPack) contract; `tank` and `petri` ship in
//! [`worlds`].
//!
//! # Quick Start
//!
//! ```
//! use vivarium_engine::prelude::*;
//!
//! let config = KernelConfig::seeded(42);
//! let mut pack = WorldRegistry::create_pack(WorldType::Tank, &config);
//! let mut engine = SimulationEngine::new(config).unwrap();
//! engine.setup(pack.as_mut()).unwrap();
//!
//! for _ in 0..10 {
//!     engine.update().unwrap();
//!     let outputs = engine.drain_frame_outputs();
//!     let _ = outputs.energy_deltas;
//! }
//! assert_eq!(engine.frame_count(), 10);
//! ```

#![deny(unsafe_code)]

pub mod engine;
pub mod frame;
pub mod hooks;
pub mod pack;
pub mod pipeline;
pub mod snapshot;
pub mod systems;
pub mod worlds;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the kernel crate for convenience.
pub use vivarium_core;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Kernel primitives.
    pub use vivarium_core::prelude::*;

    // Engine-specific exports.
    pub use crate::engine::{FrameOutputs, SimulationEngine};
    pub use crate::frame::FrameContext;
    pub use crate::hooks::{NoOpPhaseHooks, PhaseHooks, SpawnDecision};
    pub use crate::pack::{
        AgentContract, ContractRegistry, WorldPack, WorldRegistry, WorldType, REQUIRED_SYSTEMS,
    };
    pub use crate::pipeline::{default_pipeline, Pipeline, PipelineStep, StepFn};
    pub use crate::snapshot::{RenderHint, WorldSnapshot};
}
