//! Property tests for the spatial grid.
//!
//! These tests generate random sequences of add/move/remove operations and
//! verify the grid invariants after each sequence: every live entity sits in
//! exactly the cell its position maps to, queries never surface removed
//! entities, and a grid rebuilt from scratch answers queries identically to
//! one maintained incrementally.

use proptest::prelude::*;
use vivarium_core::prelude::*;

// ---------------------------------------------------------------------------
// Test entity
// ---------------------------------------------------------------------------

struct Dot {
    pos: Vec2,
    kind: &'static str,
}

impl Entity for Dot {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn size(&self) -> (f64, f64) {
        (2.0, 2.0)
    }
    fn is_dead(&self) -> bool {
        false
    }
    fn update(&mut self, _f: u64, _tm: f64, _tod: f64) -> UpdateResult {
        UpdateResult::none()
    }
    fn constrain_to_bounds(&mut self, _w: f64, _h: f64) {}
    fn snapshot_type(&self) -> Option<&str> {
        Some(self.kind)
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

const KINDS: [&str; 3] = ["fish", "food", "plant"];

/// Operations we can perform on the grid.
#[derive(Debug, Clone)]
enum GridOp {
    Add { x: f64, y: f64, kind: usize },
    Move { slot: usize, x: f64, y: f64 },
    Remove { slot: usize },
}

fn coord() -> impl Strategy<Value = f64> {
    // Includes out-of-bounds values to exercise clamping, quantized so cell
    // boundary hits actually occur.
    (-40i32..440i32).prop_map(|v| v as f64 * 2.5)
}

fn grid_op() -> impl Strategy<Value = GridOp> {
    prop_oneof![
        (coord(), coord(), 0..KINDS.len()).prop_map(|(x, y, kind)| GridOp::Add { x, y, kind }),
        (0..64usize, coord(), coord()).prop_map(|(slot, x, y)| GridOp::Move { slot, x, y }),
        (0..64usize).prop_map(|slot| GridOp::Remove { slot }),
    ]
}

fn apply_ops(
    ops: &[GridOp],
    em: &mut EntityManager,
    grid: &mut SpatialGrid,
) -> Vec<EntityHandle> {
    let mut live: Vec<EntityHandle> = Vec::new();
    for op in ops {
        match op {
            GridOp::Add { x, y, kind } => {
                let handle = em
                    .add(
                        Box::new(Dot {
                            pos: Vec2::new(*x, *y),
                            kind: KINDS[*kind],
                        }),
                        grid,
                    )
                    .unwrap()
                    .expect("no capacity oracle installed");
                live.push(handle);
            }
            GridOp::Move { slot, x, y } => {
                if live.is_empty() {
                    continue;
                }
                let handle = live[slot % live.len()];
                let pos = Vec2::new(*x, *y);
                em.get_mut(handle)
                    .unwrap()
                    .as_any_mut()
                    .downcast_mut::<Dot>()
                    .unwrap()
                    .pos = pos;
                grid.update(handle, pos);
            }
            GridOp::Remove { slot } => {
                if live.is_empty() {
                    continue;
                }
                let handle = live.remove(slot % live.len());
                em.remove(handle, grid).unwrap();
            }
        }
    }
    live
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn grid_mirrors_collection_exactly(ops in prop::collection::vec(grid_op(), 1..80)) {
        let mut em = EntityManager::new();
        let mut grid = SpatialGrid::new(1000.0, 1000.0, 100);
        grid.add_fast_lane("fish");

        let live = apply_ops(&ops, &mut em, &mut grid);

        // Every live entity indexed exactly once, in the right cell.
        prop_assert!(grid.check_consistency(&em).is_ok());
        prop_assert_eq!(grid.len(), live.len());
    }

    #[test]
    fn rebuild_answers_like_incremental(ops in prop::collection::vec(grid_op(), 1..60)) {
        let mut em = EntityManager::new();
        let mut grid = SpatialGrid::new(1000.0, 1000.0, 100);
        grid.add_fast_lane("fish");

        let live = apply_ops(&ops, &mut em, &mut grid);
        prop_assume!(!live.is_empty());
        let probe = live[0];

        let mut incremental = grid.query_radius(&em, probe, 250.0);
        grid.rebuild(&em);
        let mut rebuilt = grid.query_radius(&em, probe, 250.0);

        incremental.sort();
        rebuilt.sort();
        prop_assert_eq!(incremental, rebuilt);
    }

    #[test]
    fn queries_match_brute_force(ops in prop::collection::vec(grid_op(), 1..60), radius in 0.0f64..400.0) {
        let mut em = EntityManager::new();
        let mut grid = SpatialGrid::new(1000.0, 1000.0, 100);
        grid.add_fast_lane("fish");

        let live = apply_ops(&ops, &mut em, &mut grid);
        prop_assume!(!live.is_empty());
        let probe = live[0];
        let origin = em.get(probe).unwrap().position();

        let mut queried = grid.query_radius(&em, probe, radius);
        queried.sort();

        let mut expected: Vec<EntityHandle> = em
            .iter()
            .filter(|(h, e)| *h != probe && origin.dist_sq(e.position()) <= radius * radius)
            .map(|(h, _)| h)
            .collect();
        expected.sort();

        prop_assert_eq!(queried, expected);
    }
}
