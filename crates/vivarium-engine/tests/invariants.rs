//! Engine invariant tests: the mutation-trap scenarios, queue round-trip
//! laws at the engine surface, capacity behavior, and the death-animation
//! window.

mod common;

use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

use common::{small_config, spawn_blob, tank_engine_with_plan, Blob, WrappedTankPack};
use vivarium_engine::prelude::*;
use vivarium_engine::worlds::shared::{SeedPlan, Swimmer};

fn tiny_plan() -> SeedPlan {
    SeedPlan {
        swimmers: 3,
        flora: 1,
        pellets: 2,
    }
}

// -- 1. S2: privileged mutation mid-tick is trapped --------------------------

fn rogue_step(
    engine: &mut SimulationEngine,
    _fc: &mut FrameContext,
) -> Result<(), vivarium_core::EngineError> {
    // Direct add while a phase is running: must fail, and the error must
    // abort the tick.
    engine.add_entity(Blob::boxed(10.0, 10.0)).map(|_| ())
}

#[test]
fn direct_mutation_during_phase_aborts_tick() {
    let mut steps = default_pipeline().steps().to_vec();
    steps.insert(
        1,
        PipelineStep {
            name: "rogue",
            run: rogue_step,
        },
    );
    let mut pack = WrappedTankPack::new(small_config(1), tiny_plan());
    pack.pipeline_override = Some(Pipeline::new(steps));

    let mut engine = SimulationEngine::new(small_config(1)).unwrap();
    engine.setup(&mut pack).unwrap();
    let population = engine.entities().len();

    let err = engine.update().unwrap_err();
    assert!(matches!(err, EngineError::UnsafeMutation { .. }), "got {err:?}");
    // Tick aborted: frame counter restored, no entity added, phase cleared.
    assert_eq!(engine.frame_count(), 0);
    assert_eq!(engine.entities().len(), population);
    assert_eq!(engine.current_phase(), None);
}

#[test]
fn privileged_mutation_outside_tick_is_fine() {
    let mut engine = tank_engine_with_plan(small_config(2), tiny_plan());
    let handle = engine.add_entity(Blob::boxed(10.0, 10.0)).unwrap().unwrap();
    assert!(engine.entities().contains(handle));
    assert!(engine.remove_entity(handle).unwrap());
    assert!(!engine.entities().contains(handle));
}

// -- 2. S3: spawn then remove before commit annihilates ----------------------

#[test]
fn spawn_then_remove_before_commit_leaves_no_trace() {
    // An empty, quiet world: the only mutations in flight are the test's.
    let mut engine = tank_engine_with_plan(
        small_config(3),
        SeedPlan {
            swimmers: 0,
            flora: 0,
            pellets: 0,
        },
    );
    engine.set_system_enabled("food_spawning", false);
    engine.set_system_enabled("reproduction", false);

    let rejected = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&rejected);
    engine
        .bus_mut()
        .subscribe(EventKind::SpawnRejected, move |_| {
            *sink.borrow_mut() += 1;
        });

    let size_before = engine.entities().len();
    let handle = spawn_blob(&mut engine, 50.0, 50.0);
    assert!(engine.request_remove(handle, "changed_mind", json!({})));

    engine.update().unwrap();
    let outputs = engine.drain_frame_outputs();

    assert!(
        outputs.spawns.iter().all(|s| s.reason != "test_blob"),
        "canceled spawn must not be recorded"
    );
    assert!(
        outputs.removals.iter().all(|r| r.reason != "changed_mind"),
        "canceled spawn must not produce a removal record"
    );
    assert!(!engine.entities().contains(handle));
    assert_eq!(engine.entities().count_type("blob"), 0);
    assert_eq!(*rejected.borrow(), 0, "annihilation is not a rejection");
    // No unrelated churn either (the tank was quieted).
    assert_eq!(engine.entities().len(), size_before);
}

#[test]
fn spawn_commit_remove_commit_yields_ordered_records() {
    let mut engine = tank_engine_with_plan(small_config(4), tiny_plan());
    engine.set_system_enabled("food_spawning", false);
    engine.set_system_enabled("reproduction", false);

    let handle = spawn_blob(&mut engine, 50.0, 50.0);
    engine.update().unwrap();
    let first = engine.drain_frame_outputs();
    let spawn_record = first
        .spawns
        .iter()
        .find(|s| s.reason == "test_blob")
        .expect("spawn record present");
    let stable_id = spawn_record.entity_id.clone();
    assert!(engine.entities().contains(handle));

    assert!(engine.request_remove(handle, "test_done", json!({})));
    engine.update().unwrap();
    let second = engine.drain_frame_outputs();
    let removal_record = second
        .removals
        .iter()
        .find(|r| r.reason == "test_done")
        .expect("removal record present");
    assert_eq!(removal_record.entity_id, stable_id);
    assert!(!engine.entities().contains(handle));
}

// -- 3. S6: pending mutations at frame end violate the invariant -------------

struct LeakyHooks;

impl PhaseHooks for LeakyHooks {
    fn on_frame_end(&mut self, ctx: &mut KernelCtx<'_>) {
        // Request a spawn after the final commit of the frame.
        ctx.request_spawn(Blob::boxed(1.0, 1.0), "leak", json!({}));
    }
}

#[test]
fn pending_mutation_at_frame_end_is_invariant_violation() {
    let mut pack = WrappedTankPack::new(small_config(5), tiny_plan());
    pack.hooks_override = Some(|| Box::new(LeakyHooks));

    let mut engine = SimulationEngine::new(small_config(5)).unwrap();
    engine.setup(&mut pack).unwrap();

    let err = engine.update().unwrap_err();
    assert!(
        matches!(err, EngineError::InvariantViolation { .. }),
        "got {err:?}"
    );
}

// -- 4. Population cap: rejection event, no spatial entry ---------------------

#[test]
fn capacity_rejections_emit_events_not_errors() {
    let mut config = small_config(6);
    config.max_population = 2;

    let rejected = Rc::new(RefCell::new(0u32));
    let mut pack = WrappedTankPack::new(
        config.clone(),
        SeedPlan {
            swimmers: 5,
            flora: 0,
            pellets: 0,
        },
    );
    let mut engine = SimulationEngine::new(config).unwrap();
    let sink = Rc::clone(&rejected);
    engine
        .bus_mut()
        .subscribe(EventKind::SpawnRejected, move |_| {
            *sink.borrow_mut() += 1;
        });
    engine.setup(&mut pack).unwrap();

    assert_eq!(engine.entities().count_type("fish"), 2);
    assert_eq!(*rejected.borrow(), 3, "three seed fish over the cap");
    assert_eq!(engine.spatial().len(), engine.entities().len());
}

// -- 5. Death animation window -----------------------------------------------

#[test]
fn dead_swimmer_lingers_then_leaves() {
    let mut config = small_config(7);
    config.death_effect_frames = 5;
    let mut engine = tank_engine_with_plan(
        config,
        SeedPlan {
            swimmers: 1,
            flora: 0,
            pellets: 0,
        },
    );
    engine.set_system_enabled("food_spawning", false);

    let fish = engine.entities().order()[0];
    {
        let entity = engine.entities_mut().get_mut(fish).unwrap();
        let swimmer = entity.as_any_mut().downcast_mut::<Swimmer>().unwrap();
        swimmer.spend_energy(swimmer.energy() + 1.0);
    }

    // The swimmer is dead but deferred: it stays through the animation
    // window, then the lifecycle system requests removal.
    let mut removal_frame = None;
    for _ in 0..12 {
        engine.update().unwrap();
        let outputs = engine.drain_frame_outputs();
        if let Some(removal) = outputs
            .removals
            .iter()
            .find(|r| r.reason == "death_animation_complete")
        {
            assert_eq!(removal.entity_type, "fish");
            removal_frame = Some(engine.frame_count());
            break;
        }
        assert!(engine.entities().contains(fish), "swimmer left too early");
    }
    let removal_frame = removal_frame.expect("death animation must end in a removal");
    assert!(
        (6..=9).contains(&removal_frame),
        "removal at frame {removal_frame}, expected shortly after the 5-frame window"
    );
    assert!(!engine.entities().contains(fish));
}

// -- 6. Offspring paths: reproduction and entity_act spawns -------------------

#[test]
fn reproduction_and_nectar_spawns_flow_through_the_queue() {
    let mut engine = tank_engine_with_plan(
        small_config(20),
        SeedPlan {
            swimmers: 2,
            flora: 1,
            pellets: 0,
        },
    );

    let mut nectar_spawn_seen = false;
    for _ in 0..301 {
        engine.update().unwrap();
        let outputs = engine.drain_frame_outputs();
        nectar_spawn_seen |= outputs
            .spawns
            .iter()
            .any(|s| s.entity_type == "nectar" && s.reason == "entity_act");
    }
    assert!(
        nectar_spawn_seen,
        "flora offspring must enter via the entity_act spawn path"
    );

    // Make both swimmers eligible parents, then run one more frame.
    let fish: Vec<EntityHandle> = engine.entities_mut().view("fish").to_vec();
    assert_eq!(fish.len(), 2, "both seed swimmers should have survived");
    for handle in &fish {
        let entity = engine.entities_mut().get_mut(*handle).unwrap();
        let swimmer = entity.as_any_mut().downcast_mut::<Swimmer>().unwrap();
        swimmer.gain_energy(200.0);
    }

    engine.update().unwrap();
    let outputs = engine.drain_frame_outputs();
    let child = outputs
        .spawns
        .iter()
        .find(|s| s.reason == "reproduction")
        .expect("an offspring spawn record");
    assert_eq!(child.entity_type, "fish");
    assert_eq!(engine.entities().count_type("fish"), 3);
}

// -- 7. Unknown system toggles are reported ----------------------------------

#[test]
fn system_toggles() {
    let mut engine = tank_engine_with_plan(small_config(8), tiny_plan());
    assert!(engine.set_system_enabled("collision", false));
    assert!(!engine.set_system_enabled("not_a_system", false));
    assert_eq!(engine.systems().is_enabled("collision"), Some(false));
}

// -- 8. Setup without required systems fails ----------------------------------

struct HollowPack {
    inner: WrappedTankPack,
}

impl WorldPack for HollowPack {
    fn mode_id(&self) -> &str {
        "hollow"
    }
    fn world_type(&self) -> WorldType {
        WorldType::Tank
    }
    fn build_core_systems(
        &mut self,
        _engine: &mut SimulationEngine,
    ) -> Vec<Box<dyn vivarium_core::system::System>> {
        Vec::new() // deliberately missing everything
    }
    fn build_environment(
        &mut self,
        engine: &mut SimulationEngine,
    ) -> Box<dyn vivarium_core::env::Environment> {
        self.inner.build_environment(engine)
    }
    fn seed_entities(&mut self, _engine: &mut SimulationEngine) {}
    fn identity_provider(&self) -> Box<dyn IdentityProvider> {
        self.inner.identity_provider()
    }
    fn render_hint(&self) -> RenderHint {
        RenderHint::new("side", "fish")
    }
}

#[test]
fn missing_required_systems_is_setup_error() {
    let config = small_config(9);
    let mut pack = HollowPack {
        inner: WrappedTankPack::new(config.clone(), tiny_plan()),
    };
    let mut engine = SimulationEngine::new(config).unwrap();
    let err = engine.setup(&mut pack).unwrap_err();
    assert!(matches!(err, EngineError::Setup { .. }), "got {err:?}");
}
