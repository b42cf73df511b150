//! The petri world mode.
//!
//! A top-down culture dish. Reuses the tank wiring and entity set — the
//! modes differ in identity, render hint, and metadata, which is exactly
//! what the snapshot consumers key on.

use serde_json::json;

use vivarium_core::config::KernelConfig;
use vivarium_core::env::Environment;
use vivarium_core::identity::IdentityProvider;
use vivarium_core::manager::CapacityOracle;
use vivarium_core::system::System;

use crate::engine::SimulationEngine;
use crate::hooks::PhaseHooks;
use crate::pack::{WorldPack, WorldType};
use crate::snapshot::RenderHint;

use super::tank::TankPack;

// ---------------------------------------------------------------------------
// PetriPack
// ---------------------------------------------------------------------------

/// World pack for the petri dish simulation.
pub struct PetriPack {
    inner: TankPack,
}

impl PetriPack {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            inner: TankPack::new(config),
        }
    }
}

impl WorldPack for PetriPack {
    fn mode_id(&self) -> &str {
        "petri"
    }

    fn world_type(&self) -> WorldType {
        WorldType::Petri
    }

    fn build_core_systems(&mut self, engine: &mut SimulationEngine) -> Vec<Box<dyn System>> {
        self.inner.build_core_systems(engine)
    }

    fn build_environment(&mut self, engine: &mut SimulationEngine) -> Box<dyn Environment> {
        self.inner.build_environment(engine)
    }

    fn capacity_oracle(&self) -> Option<Box<dyn CapacityOracle>> {
        self.inner.capacity_oracle()
    }

    fn register_systems(&mut self, engine: &mut SimulationEngine) {
        self.inner.register_systems(engine);
    }

    fn register_contracts(&mut self, engine: &mut SimulationEngine) {
        self.inner.register_contracts(engine);
    }

    fn seed_entities(&mut self, engine: &mut SimulationEngine) {
        self.inner.seed_entities(engine);
    }

    fn identity_provider(&self) -> Box<dyn IdentityProvider> {
        self.inner.identity_provider()
    }

    fn phase_hooks(&self) -> Option<Box<dyn PhaseHooks>> {
        self.inner.phase_hooks()
    }

    fn metadata(&self) -> serde_json::Value {
        let mut metadata = match self.inner.metadata() {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        metadata.insert("mode".to_owned(), json!("petri"));
        metadata.insert("world_type".to_owned(), json!("petri"));
        serde_json::Value::Object(metadata)
    }

    fn render_hint(&self) -> RenderHint {
        RenderHint::new("topdown", "microbe")
    }
}
