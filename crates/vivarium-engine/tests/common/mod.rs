//! Shared fixtures for the engine integration tests.
#![allow(dead_code)]

use serde_json::json;

use vivarium_engine::prelude::*;
use vivarium_engine::worlds::shared::SeedPlan;
use vivarium_engine::worlds::tank::TankPack;

// ---------------------------------------------------------------------------
// Engine builders
// ---------------------------------------------------------------------------

/// A compact world config for tests.
pub fn small_config(seed: u64) -> KernelConfig {
    let mut config = KernelConfig::seeded(seed);
    config.display.width = 400;
    config.display.height = 300;
    config.spatial_cell_size = 50;
    config
}

/// Build a tank engine with the default seed plan.
pub fn tank_engine(seed: u64) -> SimulationEngine {
    tank_engine_with_plan(
        small_config(seed),
        SeedPlan {
            swimmers: 12,
            flora: 3,
            pellets: 6,
        },
    )
}

/// Build a tank engine with an explicit config and seed plan.
pub fn tank_engine_with_plan(config: KernelConfig, plan: SeedPlan) -> SimulationEngine {
    let mut pack = TankPack::new(config.clone()).with_seed_plan(plan);
    let mut engine = SimulationEngine::new(config).expect("config is valid");
    engine.setup(&mut pack).expect("tank setup succeeds");
    engine
}

// ---------------------------------------------------------------------------
// Blob: a minimal test entity
// ---------------------------------------------------------------------------

pub struct Blob {
    pub pos: Vec2,
    pub dead: bool,
}

impl Blob {
    pub fn boxed(x: f64, y: f64) -> Box<dyn Entity> {
        Box::new(Blob {
            pos: Vec2::new(x, y),
            dead: false,
        })
    }
}

impl Entity for Blob {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn size(&self) -> (f64, f64) {
        (4.0, 4.0)
    }
    fn is_dead(&self) -> bool {
        self.dead
    }
    fn update(&mut self, _f: u64, _tm: f64, _tod: f64) -> UpdateResult {
        UpdateResult::none()
    }
    fn constrain_to_bounds(&mut self, w: f64, h: f64) {
        self.pos.x = self.pos.x.clamp(0.0, w - 4.0);
        self.pos.y = self.pos.y.clamp(0.0, h - 4.0);
    }
    fn snapshot_type(&self) -> Option<&str> {
        Some("blob")
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Pack wrapper with overridable pipeline and hooks
// ---------------------------------------------------------------------------

/// Wraps the tank pack so a test can substitute the pipeline or the hooks
/// while keeping the rest of the wiring.
pub struct WrappedTankPack {
    pub inner: TankPack,
    pub pipeline_override: Option<Pipeline>,
    pub hooks_override: Option<fn() -> Box<dyn PhaseHooks>>,
}

impl WrappedTankPack {
    pub fn new(config: KernelConfig, plan: SeedPlan) -> Self {
        Self {
            inner: TankPack::new(config).with_seed_plan(plan),
            pipeline_override: None,
            hooks_override: None,
        }
    }
}

impl WorldPack for WrappedTankPack {
    fn mode_id(&self) -> &str {
        self.inner.mode_id()
    }
    fn world_type(&self) -> WorldType {
        self.inner.world_type()
    }
    fn build_core_systems(
        &mut self,
        engine: &mut SimulationEngine,
    ) -> Vec<Box<dyn vivarium_core::system::System>> {
        self.inner.build_core_systems(engine)
    }
    fn build_environment(
        &mut self,
        engine: &mut SimulationEngine,
    ) -> Box<dyn vivarium_core::env::Environment> {
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
    fn pipeline(&self) -> Option<Pipeline> {
        self.pipeline_override
            .clone()
            .or_else(|| self.inner.pipeline())
    }
    fn identity_provider(&self) -> Box<dyn IdentityProvider> {
        self.inner.identity_provider()
    }
    fn phase_hooks(&self) -> Option<Box<dyn PhaseHooks>> {
        match self.hooks_override {
            Some(build) => Some(build()),
            None => self.inner.phase_hooks(),
        }
    }
    fn metadata(&self) -> serde_json::Value {
        self.inner.metadata()
    }
    fn render_hint(&self) -> RenderHint {
        self.inner.render_hint()
    }
}

/// Convenience: request-spawn a blob with a marker reason.
pub fn spawn_blob(engine: &mut SimulationEngine, x: f64, y: f64) -> EntityHandle {
    engine.request_spawn(Blob::boxed(x, y), "test_blob", json!({}))
}
