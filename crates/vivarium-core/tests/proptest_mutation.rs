//! Property tests for the mutation queue laws.
//!
//! Random interleavings of spawn/remove/cancel requests followed by a commit
//! must uphold: removals precede spawns, order within each list follows
//! request order, canceled spawns leave no trace, and the queue is empty
//! after every commit.

use proptest::prelude::*;
use vivarium_core::prelude::*;

struct Pellet;

impl Entity for Pellet {
    fn position(&self) -> Vec2 {
        Vec2::new(50.0, 50.0)
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
        Some("food")
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[derive(Debug, Clone)]
enum QueueOp {
    /// Queue a fresh spawn.
    Spawn,
    /// Cancel a pending spawn (if any), by rotating index.
    CancelPending(usize),
    /// Request removal of a committed entity (if any), by rotating index.
    RemoveLive(usize),
}

fn queue_op() -> impl Strategy<Value = QueueOp> {
    prop_oneof![
        3 => Just(QueueOp::Spawn),
        1 => (0..32usize).prop_map(QueueOp::CancelPending),
        2 => (0..32usize).prop_map(QueueOp::RemoveLive),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn commit_upholds_queue_laws(
        rounds in prop::collection::vec(prop::collection::vec(queue_op(), 1..20), 1..5)
    ) {
        let mut em = EntityManager::new();
        let mut grid = SpatialGrid::new(100.0, 100.0, 10);
        let mut ids = OffsetIdentityProvider::new([("food".to_owned(), 3_000_000u64)]);
        let mut bus = EventBus::new();
        let mut tx = MutationTransaction::new();

        let mut live: Vec<EntityHandle> = Vec::new();

        for ops in rounds {
            let mut pending: Vec<EntityHandle> = Vec::new();
            let mut canceled: Vec<EntityHandle> = Vec::new();
            let mut removed: Vec<EntityHandle> = Vec::new();
            let mut spawns = Vec::new();
            let mut removals = Vec::new();

            for op in ops {
                match op {
                    QueueOp::Spawn => {
                        pending.push(tx.request_spawn(
                            &mut em,
                            Box::new(Pellet),
                            "prop",
                            serde_json::json!({}),
                        ));
                    }
                    QueueOp::CancelPending(i) => {
                        if pending.is_empty() {
                            continue;
                        }
                        let handle = pending.remove(i % pending.len());
                        prop_assert!(tx.request_remove(
                            &mut em,
                            handle,
                            "cancel",
                            serde_json::json!({}),
                        ), "request_remove failed");
                        canceled.push(handle);
                    }
                    QueueOp::RemoveLive(i) => {
                        if live.is_empty() {
                            continue;
                        }
                        let handle = live.remove(i % live.len());
                        prop_assert!(tx.request_remove(
                            &mut em,
                            handle,
                            "cull",
                            serde_json::json!({}),
                        ), "request_remove failed");
                        removed.push(handle);
                    }
                }
            }

            let size_before = em.len();
            tx.commit(&mut em, &mut grid, &mut ids, &mut bus, Some((&mut spawns, &mut removals)));

            // Queue fully drained.
            prop_assert_eq!(tx.pending_spawn_count(), 0);
            prop_assert_eq!(tx.pending_removal_count(), 0);

            // Net size change matches surviving spawns minus removals.
            prop_assert_eq!(
                em.len() as i64,
                size_before as i64 + pending.len() as i64 - removed.len() as i64
            );

            // Records match: one spawn per surviving pending entry, one
            // removal per removed live entity, nothing for cancellations.
            prop_assert_eq!(spawns.len(), pending.len());
            prop_assert_eq!(removals.len(), removed.len());

            // Every surviving spawn is resolvable; canceled ones are not.
            for handle in &pending {
                prop_assert!(em.contains(*handle));
            }
            for handle in &canceled {
                prop_assert!(!em.contains(*handle));
            }

            // Grid mirrors the collection.
            prop_assert!(grid.check_consistency(&em).is_ok());

            live.extend(pending);
        }
    }

    #[test]
    fn stable_ids_unique_across_history(count in 1usize..60) {
        let mut em = EntityManager::new();
        let mut grid = SpatialGrid::new(100.0, 100.0, 10);
        let mut ids = OffsetIdentityProvider::new([("food".to_owned(), 3_000_000u64)]);
        let mut bus = EventBus::new();
        let mut tx = MutationTransaction::new();

        let mut seen = std::collections::HashSet::new();
        for i in 0..count {
            let mut spawns = Vec::new();
            let mut removals = Vec::new();
            let handle = tx.request_spawn(&mut em, Box::new(Pellet), "prop", serde_json::json!({}));
            tx.commit(&mut em, &mut grid, &mut ids, &mut bus, Some((&mut spawns, &mut removals)));
            prop_assert!(seen.insert(spawns[0].entity_id.clone()), "id reused");

            // Remove every other entity so handle indices recycle.
            if i % 2 == 0 {
                tx.request_remove(&mut em, handle, "cull", serde_json::json!({}));
                tx.commit(&mut em, &mut grid, &mut ids, &mut bus, None);
                let live: std::collections::HashSet<EntityHandle> =
                    em.order().iter().copied().collect();
                ids.prune_stale_ids(&live);
            }
        }
    }
}
