//! The tank world mode.
//!
//! A side-view open water column: swimmers wander and graze, rooted flora
//! sprout nectar, pellets drop in from the surface and sink out the bottom.

use serde_json::json;

use vivarium_core::config::KernelConfig;
use vivarium_core::env::Environment;
use vivarium_core::identity::{IdentityProvider, OffsetIdentityProvider};
use vivarium_core::manager::CapacityOracle;
use vivarium_core::system::System;

use crate::engine::SimulationEngine;
use crate::hooks::PhaseHooks;
use crate::pack::{WorldPack, WorldType};
use crate::snapshot::RenderHint;
use crate::systems::collision::CollisionSystem;
use crate::systems::interaction::{
    encounter_queue, EncounterQueue, InteractionProximitySystem, InteractionSystem,
};
use crate::systems::lifecycle::LifecycleSystem;
use crate::systems::reproduction::ReproductionSystem;
use crate::systems::spawning::FoodSpawningSystem;

use super::shared::{
    identity_offsets, id_counter, seed_population, ContestDriver, EcosystemPhaseHooks,
    GrazeCollisionPolicy, IdCounter, PairReproductionPolicy, PelletFactory, PopulationCap,
    SeedPlan, StageEncounters, SteeringContract, TankEnvironment, FISH_TAG, FOOD_TAG, NECTAR_TAG,
    PLANT_TAG,
};

/// Contact radius for the collision candidate query.
const COLLISION_RADIUS: f64 = 60.0;
/// Base sensing radius for interactions (scaled by detection modifier).
const INTERACTION_RADIUS: f64 = 90.0;

// ---------------------------------------------------------------------------
// TankPack
// ---------------------------------------------------------------------------

/// World pack for the standard tank simulation.
pub struct TankPack {
    config: KernelConfig,
    fish_ids: IdCounter,
    plant_ids: IdCounter,
    encounters: EncounterQueue,
    seed_plan: SeedPlan,
}

impl TankPack {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            fish_ids: id_counter(),
            plant_ids: id_counter(),
            encounters: encounter_queue(),
            seed_plan: SeedPlan::default(),
        }
    }

    /// Override the initial population (tests use small worlds).
    pub fn with_seed_plan(mut self, plan: SeedPlan) -> Self {
        self.seed_plan = plan;
        self
    }
}

impl WorldPack for TankPack {
    fn mode_id(&self) -> &str {
        "tank"
    }

    fn world_type(&self) -> WorldType {
        WorldType::Tank
    }

    fn build_core_systems(&mut self, _engine: &mut SimulationEngine) -> Vec<Box<dyn System>> {
        vec![
            Box::new(LifecycleSystem::new(self.config.death_effect_frames)),
            Box::new(CollisionSystem::new(
                FISH_TAG,
                &[FOOD_TAG, NECTAR_TAG],
                COLLISION_RADIUS,
                Box::new(GrazeCollisionPolicy),
            )),
            Box::new(InteractionProximitySystem::new(
                FISH_TAG,
                &[FISH_TAG, PLANT_TAG],
                INTERACTION_RADIUS,
                Box::new(StageEncounters::new(self.encounters.clone())),
            )),
            Box::new(InteractionSystem::new(Box::new(ContestDriver::new(
                self.encounters.clone(),
            )))),
            Box::new(ReproductionSystem::new(Box::new(
                PairReproductionPolicy::new(self.fish_ids.clone()),
            ))),
        ]
    }

    fn build_environment(&mut self, engine: &mut SimulationEngine) -> Box<dyn Environment> {
        let display = &engine.config().display;
        let mut env = TankEnvironment::new(f64::from(display.width), f64::from(display.height));
        // Spatial fast lanes for the hot kinds.
        // (Declared here so a custom pack can choose different ones.)
        engine.spatial_mut().add_fast_lane(FISH_TAG);
        engine.spatial_mut().add_fast_lane(FOOD_TAG);
        env.update_detection_modifier(0.5);
        Box::new(env)
    }

    fn capacity_oracle(&self) -> Option<Box<dyn CapacityOracle>> {
        Some(Box::new(PopulationCap {
            tag: FISH_TAG.to_owned(),
            max: self.config.max_population,
        }))
    }

    fn register_systems(&mut self, engine: &mut SimulationEngine) {
        engine.register_system(Box::new(FoodSpawningSystem::new(
            FOOD_TAG,
            FISH_TAG,
            Box::new(PelletFactory),
        )));
    }

    fn register_contracts(&mut self, engine: &mut SimulationEngine) {
        engine.contracts_mut().register(Box::new(SteeringContract));
    }

    fn seed_entities(&mut self, engine: &mut SimulationEngine) {
        seed_population(engine, &self.seed_plan, &self.fish_ids, &self.plant_ids);
    }

    fn identity_provider(&self) -> Box<dyn IdentityProvider> {
        Box::new(OffsetIdentityProvider::new(identity_offsets()))
    }

    fn phase_hooks(&self) -> Option<Box<dyn PhaseHooks>> {
        Some(Box::new(EcosystemPhaseHooks::new()))
    }

    fn metadata(&self) -> serde_json::Value {
        json!({
            "mode": "tank",
            "max_population": self.config.max_population,
        })
    }

    fn render_hint(&self) -> RenderHint {
        RenderHint::new("side", "fish")
    }
}
