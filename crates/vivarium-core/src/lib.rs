//! Vivarium core -- deterministic simulation kernel primitives.
//!
//! This crate provides the building blocks of the Vivarium simulation
//! kernel: an opaque entity protocol addressed by generational handles, the
//! authoritative [`EntityManager`](manager::EntityManager), a deferred
//! [`MutationTransaction`](mutation::MutationTransaction) with explicit
//! commit points, a uniform-grid [`SpatialGrid`](spatial::SpatialGrid),
//! stable cross-frame [`IdentityProvider`](identity::IdentityProvider)s, a
//! synchronous [`EventBus`](events::EventBus) with a pure
//! [`EnergyLedger`](ledger::EnergyLedger), and the
//! [`System`](system::System) contract with its registry.
//!
//! The driver that sequences these into the phased update loop lives in the
//! `vivarium-engine` crate. Everything here is deterministic by
//! construction: one seeded RNG per engine, canonical iteration orders, and
//! no wall-clock or global state.

#![deny(unsafe_code)]

pub mod config;
pub mod entity;
pub mod env;
pub mod events;
pub mod identity;
pub mod ledger;
pub mod manager;
pub mod mutation;
pub mod phase;
pub mod rng;
pub mod spatial;
pub mod system;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by kernel operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Privileged mutation attempted while a pipeline phase is running.
    /// Collaborators must use the request API inside the tick.
    #[error("unsafe mutation during phase '{phase}': use the request API inside a tick")]
    UnsafeMutation { phase: String },

    /// Direct collection mutation attempted while the mutation lock is held.
    #[error("entity collection is locked during phase '{phase}'")]
    MutationLock { phase: String },

    /// Required wiring missing at the end of setup, or invalid configuration.
    #[error("setup incomplete: {missing}")]
    Setup { missing: String },

    /// A kernel invariant failed (pending mutations at frame end, spatial or
    /// identity drift in debug builds).
    #[error("invariant violated at {stage}: {details}")]
    InvariantViolation { stage: String, details: String },

    /// A system's update failed; the tick was aborted.
    #[error("system '{system}' failed")]
    SystemFailure {
        system: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::{DisplayConfig, FoodSpawnConfig, KernelConfig};
    pub use crate::entity::{aabb_overlap, kind_of, Entity, EntityHandle, UpdateResult, Vec2};
    pub use crate::env::Environment;
    pub use crate::events::{EventBus, EventKind, SimEvent, SubscriptionId};
    pub use crate::identity::{Identity, IdentityProvider, OffsetIdentityProvider};
    pub use crate::ledger::{EnergyDelta, EnergyDeltaRecord, EnergyLedger};
    pub use crate::manager::{CapacityOracle, EntityManager};
    pub use crate::mutation::{MutationTransaction, RemovalRequest, SpawnRequest};
    pub use crate::phase::Phase;
    pub use crate::rng::SimRng;
    pub use crate::spatial::SpatialGrid;
    pub use crate::system::{KernelCtx, System, SystemError, SystemRegistry, SystemResult};
    pub use crate::EngineError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
