//! World pack contract and the mode registry.
//!
//! A [`WorldPack`] assembles a world mode on top of the kernel: it builds
//! the core systems and the environment, registers mode systems and action
//! contracts, seeds the initial entities, and supplies the identity
//! provider, the phase hooks, and (optionally) a custom pipeline. The
//! engine calls the pack's methods in a fixed order during `setup`.
//!
//! The set of modes is closed ([`WorldType`]); [`WorldRegistry`] is the
//! factory.

use serde_json::json;

use vivarium_core::config::KernelConfig;
use vivarium_core::env::Environment;
use vivarium_core::identity::IdentityProvider;
use vivarium_core::manager::CapacityOracle;
use vivarium_core::system::System;
use vivarium_core::EngineError;

use crate::engine::SimulationEngine;
use crate::hooks::PhaseHooks;
use crate::pipeline::Pipeline;
use crate::snapshot::RenderHint;
use crate::worlds::petri::PetriPack;
use crate::worlds::tank::TankPack;

// ---------------------------------------------------------------------------
// WorldType
// ---------------------------------------------------------------------------

/// The closed set of world modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorldType {
    Tank,
    Petri,
}

impl WorldType {
    pub fn id(self) -> &'static str {
        match self {
            WorldType::Tank => "tank",
            WorldType::Petri => "petri",
        }
    }

    pub fn from_id(id: &str) -> Option<WorldType> {
        match id {
            "tank" => Some(WorldType::Tank),
            "petri" => Some(WorldType::Petri),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// WorldPack
// ---------------------------------------------------------------------------

/// Names the engine requires in the system registry at the end of setup.
pub const REQUIRED_SYSTEMS: [&str; 5] = [
    "lifecycle",
    "collision",
    "reproduction",
    "interaction_proximity",
    "interaction",
];

/// The plug-in surface a mode implements to compose a kernel.
pub trait WorldPack {
    /// Unique mode identifier, surfaced in snapshots as `world_type`.
    fn mode_id(&self) -> &str;

    fn world_type(&self) -> WorldType;

    /// Build the core systems. They are registered in the returned order,
    /// ahead of anything `register_systems` adds, and must cover
    /// [`REQUIRED_SYSTEMS`].
    fn build_core_systems(&mut self, engine: &mut SimulationEngine) -> Vec<Box<dyn System>>;

    /// Build the environment (bounds, detection modifier, geometry).
    fn build_environment(&mut self, engine: &mut SimulationEngine) -> Box<dyn Environment>;

    /// Admission policy installed on the entity manager. `None` admits all.
    fn capacity_oracle(&self) -> Option<Box<dyn CapacityOracle>> {
        None
    }

    /// Register mode-specific extra systems. Core systems are already in.
    fn register_systems(&mut self, _engine: &mut SimulationEngine) {}

    /// Register action/observation translators for external policy control.
    /// Opaque to the kernel.
    fn register_contracts(&mut self, _engine: &mut SimulationEngine) {}

    /// Enqueue the initial population through the request API.
    fn seed_entities(&mut self, engine: &mut SimulationEngine);

    /// Custom pipeline, or `None` for the canonical one.
    fn pipeline(&self) -> Option<Pipeline> {
        None
    }

    /// The identity provider for stable delta IDs.
    fn identity_provider(&self) -> Box<dyn IdentityProvider>;

    /// Phase hooks, or `None` for no-ops.
    fn phase_hooks(&self) -> Option<Box<dyn PhaseHooks>> {
        None
    }

    /// Mode metadata surfaced in snapshots.
    fn metadata(&self) -> serde_json::Value {
        json!({})
    }

    /// Rendering metadata. Required in every snapshot.
    fn render_hint(&self) -> RenderHint;
}

// ---------------------------------------------------------------------------
// AgentContract
// ---------------------------------------------------------------------------

/// Action translator for externally controlled agents. The kernel stores and
/// surfaces these; it never interprets them.
pub trait AgentContract {
    fn name(&self) -> &str;

    /// Translate an external action payload into a mode-internal one.
    fn translate_action(
        &self,
        agent_id: &str,
        action: &serde_json::Value,
    ) -> serde_json::Value;
}

/// Holds registered contracts in registration order.
#[derive(Default)]
pub struct ContractRegistry {
    contracts: Vec<Box<dyn AgentContract>>,
}

impl ContractRegistry {
    pub fn register(&mut self, contract: Box<dyn AgentContract>) {
        tracing::debug!(contract = contract.name(), "registered agent contract");
        self.contracts.push(contract);
    }

    pub fn get(&self, name: &str) -> Option<&dyn AgentContract> {
        self.contracts
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.contracts.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// WorldRegistry
// ---------------------------------------------------------------------------

/// Factory for world packs.
pub struct WorldRegistry;

impl WorldRegistry {
    /// Create the pack for a mode.
    pub fn create_pack(world_type: WorldType, config: &KernelConfig) -> Box<dyn WorldPack> {
        match world_type {
            WorldType::Tank => Box::new(TankPack::new(config.clone())),
            WorldType::Petri => Box::new(PetriPack::new(config.clone())),
        }
    }

    /// Create the pack for a mode id string.
    pub fn create_pack_by_id(
        id: &str,
        config: &KernelConfig,
    ) -> Result<Box<dyn WorldPack>, EngineError> {
        let world_type = WorldType::from_id(id).ok_or_else(|| EngineError::Setup {
            missing: format!("unknown world type '{id}'"),
        })?;
        Ok(Self::create_pack(world_type, config))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
