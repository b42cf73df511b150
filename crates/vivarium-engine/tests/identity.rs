//! Stable-identity tests: IDs survive across frames, removals reuse the
//! same ID, pruning retires reverse lookups, and no raw handle ever leaks
//! into the external streams.

mod common;

use serde_json::json;

use common::{small_config, tank_engine, tank_engine_with_plan};
use vivarium_engine::prelude::*;
use vivarium_engine::worlds::shared::SeedPlan;

// -- 1. S4: one food entity, tracked through its whole life -------------------

#[test]
fn stable_id_survives_frames_and_names_the_removal() {
    let mut engine = tank_engine_with_plan(
        small_config(11),
        SeedPlan {
            swimmers: 0,
            flora: 0,
            pellets: 1,
        },
    );
    engine.set_system_enabled("food_spawning", false);

    // Note the pellet's stable ID from the first snapshot.
    let snapshot = engine.get_snapshot();
    assert_eq!(snapshot.entities.len(), 1);
    let stable_id = snapshot.entities[0]["id"].as_str().unwrap().to_owned();
    let band: u64 = stable_id.parse().unwrap();
    assert!((3_000_000..4_000_000).contains(&band), "food band id");

    // Five quiet frames: same ID every frame.
    for _ in 0..5 {
        engine.update().unwrap();
        engine.drain_frame_outputs();
        let snapshot = engine.get_snapshot();
        assert_eq!(snapshot.entities.len(), 1, "nothing eats the pellet");
        assert_eq!(snapshot.entities[0]["id"].as_str().unwrap(), stable_id);
    }

    // Remove it; the removal record carries the same stable ID.
    let handle = engine
        .identity_mut()
        .get_entity_by_id(&stable_id)
        .expect("reverse lookup resolves while the pellet lives");
    assert!(engine.request_remove(handle, "test_cleanup", json!({})));
    engine.update().unwrap();
    let outputs = engine.drain_frame_outputs();
    let removal = outputs
        .removals
        .iter()
        .find(|r| r.reason == "test_cleanup")
        .expect("removal recorded");
    assert_eq!(removal.entity_id, stable_id);
    assert_eq!(removal.entity_type, "food");

    // After the frame-end prune, the reverse lookup goes dark.
    assert_eq!(engine.identity_mut().get_entity_by_id(&stable_id), None);
}

// -- 2. IDs are unique within every frame -------------------------------------

#[test]
fn snapshot_ids_are_unique_per_frame() {
    let mut engine = tank_engine(12);
    for _ in 0..60 {
        engine.update().unwrap();
        let snapshot = engine.get_snapshot();
        let mut seen = std::collections::HashSet::new();
        for entity in &snapshot.entities {
            let id = entity["id"].as_str().unwrap().to_owned();
            assert!(seen.insert(id), "duplicate stable id in frame");
        }
    }
}

// -- 3. No raw handles in any external stream ---------------------------------

#[test]
fn delta_streams_use_band_ids_only() {
    let bands: &[(&str, u64, u64)] = &[
        ("fish", 0, 1_000_000),
        ("plant", 1_000_000, 3_000_000),
        ("food", 3_000_000, 4_000_000),
        ("nectar", 4_000_000, 5_000_000),
    ];
    let band_of = |tag: &str| bands.iter().find(|(t, _, _)| *t == tag).copied();

    let mut engine = tank_engine(13);
    for _ in 0..150 {
        engine.update().unwrap();
        let outputs = engine.drain_frame_outputs();

        let ids = outputs
            .spawns
            .iter()
            .map(|s| (s.entity_type.clone(), s.entity_id.clone()))
            .chain(
                outputs
                    .removals
                    .iter()
                    .map(|r| (r.entity_type.clone(), r.entity_id.clone())),
            )
            .chain(
                outputs
                    .energy_deltas
                    .iter()
                    .map(|d| (d.entity_type.clone(), d.entity_id.clone())),
            );
        for (entity_type, id) in ids {
            let numeric: u64 = id.parse().expect("stable ids are numeric strings");
            assert!(numeric < 10_000_000, "id {numeric} outside stable range");
            if let Some((_, lo, hi)) = band_of(&entity_type) {
                assert!(
                    (lo..hi).contains(&numeric),
                    "{entity_type} id {numeric} outside its band"
                );
            }
        }

        // Energy records mirror entity_id into stable_id.
        for delta in &outputs.energy_deltas {
            assert_eq!(delta.entity_id, delta.stable_id);
        }
    }
}

// -- 4. Snapshot ids resolve through the reverse lookup ------------------------

#[test]
fn snapshot_ids_resolve_to_live_entities() {
    let mut engine = tank_engine(14);
    for _ in 0..30 {
        engine.update().unwrap();
    }
    let snapshot = engine.get_snapshot();
    assert!(!snapshot.entities.is_empty());
    for entity in &snapshot.entities {
        let id = entity["id"].as_str().unwrap();
        let handle = engine
            .identity_mut()
            .get_entity_by_id(id)
            .expect("snapshot id resolves");
        assert!(engine.entities().contains(handle));
    }
}

// -- 5. Render hint and world type are present ---------------------------------

#[test]
fn snapshot_carries_render_hint_and_world_type() {
    let mut tank = tank_engine(15);
    tank.update().unwrap();
    let snapshot = tank.get_snapshot();
    assert_eq!(snapshot.world_type, "tank");
    assert_eq!(snapshot.render_hint.style, "side");
    assert_eq!(snapshot.render_hint.entity_style, "fish");

    let config = small_config(16);
    let mut pack = WorldRegistry::create_pack(WorldType::Petri, &config);
    let mut petri = SimulationEngine::new(config).unwrap();
    petri.setup(pack.as_mut()).unwrap();
    petri.update().unwrap();
    let snapshot = petri.get_snapshot();
    assert_eq!(snapshot.world_type, "petri");
    assert_eq!(snapshot.render_hint.style, "topdown");
    assert_eq!(snapshot.render_hint.entity_style, "microbe");
    assert_eq!(snapshot.metadata["world_type"], serde_json::json!("petri"));
}
