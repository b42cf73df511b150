//! Deferred entity mutations and the commit transaction.
//!
//! Systems never edit the entity collection mid-phase. They queue spawn and
//! removal requests on the [`MutationTransaction`]; the kernel drains the
//! queue into the [`EntityManager`] at designated commit points between
//! pipeline steps.
//!
//! A spawn request *reserves* a handle up front, so the pending entity can
//! be referenced (and canceled) before it ever enters the collection. The
//! queue de-duplicates by handle:
//!
//! - a handle already queued for removal cannot be queued again,
//! - removing a handle whose spawn is still pending annihilates the pair —
//!   the entity never enters, the reservation is released, and **neither** a
//!   spawn record nor a removal record is emitted.
//!
//! Within one commit, removals are applied strictly before spawns, and each
//! list follows request order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::entity::{kind_of, Entity, EntityHandle};
use crate::events::{EventBus, SimEvent};
use crate::identity::IdentityProvider;
use crate::manager::EntityManager;
use crate::spatial::SpatialGrid;

// ---------------------------------------------------------------------------
// Frame output records
// ---------------------------------------------------------------------------

/// Externalized record of a committed spawn. Part of the per-frame output
/// contract; `entity_id` is an IdentityProvider stable ID, never a handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub entity_type: String,
    pub entity_id: String,
    pub reason: String,
    pub metadata: serde_json::Value,
}

/// Externalized record of a committed removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalRequest {
    pub entity_type: String,
    pub entity_id: String,
    pub reason: String,
    pub metadata: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Pending mutations
// ---------------------------------------------------------------------------

struct PendingSpawn {
    handle: EntityHandle,
    entity: Box<dyn Entity>,
    reason: String,
    metadata: serde_json::Value,
}

struct PendingRemoval {
    handle: EntityHandle,
    reason: String,
    metadata: serde_json::Value,
}

// ---------------------------------------------------------------------------
// MutationQueue
// ---------------------------------------------------------------------------

/// Collects spawn/removal requests for deferred application.
#[derive(Default)]
struct MutationQueue {
    pending_spawns: Vec<PendingSpawn>,
    pending_removals: Vec<PendingRemoval>,
    spawn_handles: HashSet<EntityHandle>,
    removal_handles: HashSet<EntityHandle>,
}

// ---------------------------------------------------------------------------
// MutationTransaction
// ---------------------------------------------------------------------------

/// Owns the queue and knows how to commit it.
#[derive(Default)]
pub struct MutationTransaction {
    queue: MutationQueue,
}

impl MutationTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entity spawn. Reserves and returns the handle the entity
    /// will occupy once committed. Ownership of the box makes duplicate
    /// submission of the same entity unrepresentable.
    pub fn request_spawn(
        &mut self,
        manager: &mut EntityManager,
        entity: Box<dyn Entity>,
        reason: &str,
        metadata: serde_json::Value,
    ) -> EntityHandle {
        let handle = manager.reserve();
        self.queue.spawn_handles.insert(handle);
        self.queue.pending_spawns.push(PendingSpawn {
            handle,
            entity,
            reason: reason.to_owned(),
            metadata,
        });
        handle
    }

    /// Queue an entity removal.
    ///
    /// Returns `false` when the request is deliberately declined (the handle
    /// is already queued for removal). Canceling a pending spawn returns
    /// `true`: the request was honored, by annihilation.
    pub fn request_remove(
        &mut self,
        manager: &mut EntityManager,
        handle: EntityHandle,
        reason: &str,
        metadata: serde_json::Value,
    ) -> bool {
        if self.queue.removal_handles.contains(&handle) {
            return false;
        }

        if self.queue.spawn_handles.remove(&handle) {
            // The entity never entered the collection: drop the spawn and
            // release the reservation. No records on either side.
            self.queue.pending_spawns.retain(|p| p.handle != handle);
            manager.release_reserved(handle);
            self.queue.removal_handles.insert(handle);
            return true;
        }

        self.queue.removal_handles.insert(handle);
        self.queue.pending_removals.push(PendingRemoval {
            handle,
            reason: reason.to_owned(),
            metadata,
        });
        true
    }

    /// Whether `handle` is queued for removal.
    pub fn is_pending_removal(&self, handle: EntityHandle) -> bool {
        self.queue.removal_handles.contains(&handle)
    }

    /// Whether `handle` is a reservation waiting to be committed.
    pub fn is_pending_spawn(&self, handle: EntityHandle) -> bool {
        self.queue.spawn_handles.contains(&handle)
    }

    pub fn pending_spawn_count(&self) -> usize {
        self.queue.pending_spawns.len()
    }

    pub fn pending_removal_count(&self) -> usize {
        self.queue.pending_removals.len()
    }

    /// Apply all pending mutations to the entity manager.
    ///
    /// Removals first, then spawns, each in request order. When `outputs` is
    /// provided, committed mutations are externalized as
    /// [`RemovalRequest`]/[`SpawnRequest`] records with stable IDs; setup
    /// commits pass `None` so seeding does not appear in frame deltas.
    ///
    /// A removal whose handle is no longer present produces no record. A
    /// spawn the capacity oracle rejects releases its reservation and emits
    /// a [`SimEvent::SpawnRejected`] instead of a phantom spawn record.
    pub fn commit(
        &mut self,
        manager: &mut EntityManager,
        spatial: &mut SpatialGrid,
        identity: &mut dyn IdentityProvider,
        bus: &mut EventBus,
        mut outputs: Option<(&mut Vec<SpawnRequest>, &mut Vec<RemovalRequest>)>,
    ) {
        // -- removals --
        for removal in std::mem::take(&mut self.queue.pending_removals) {
            if let Some(entity) = manager.get(removal.handle) {
                if let Some((_, removals_out)) = outputs.as_mut() {
                    let id = identity.get_identity(removal.handle, entity);
                    removals_out.push(RemovalRequest {
                        entity_type: id.type_name,
                        entity_id: id.stable_id,
                        reason: removal.reason,
                        metadata: removal.metadata,
                    });
                }
                manager.remove_internal(removal.handle, spatial);
            } else {
                tracing::debug!(
                    handle = %removal.handle,
                    reason = %removal.reason,
                    "removal target already gone, skipping"
                );
            }
        }

        // -- spawns --
        for spawn in std::mem::take(&mut self.queue.pending_spawns) {
            match manager.insert_reserved(spawn.handle, spawn.entity, spatial) {
                Ok(()) => {
                    if let Some((spawns_out, _)) = outputs.as_mut() {
                        if let Some(entity) = manager.get(spawn.handle) {
                            let id = identity.get_identity(spawn.handle, entity);
                            spawns_out.push(SpawnRequest {
                                entity_type: id.type_name,
                                entity_id: id.stable_id,
                                reason: spawn.reason,
                                metadata: spawn.metadata,
                            });
                        }
                    }
                }
                Err(rejected) => {
                    let entity_type = kind_of(rejected.as_ref()).to_owned();
                    manager.release_reserved(spawn.handle);
                    tracing::debug!(
                        entity_type = %entity_type,
                        reason = %spawn.reason,
                        "spawn rejected by capacity policy"
                    );
                    bus.emit(&SimEvent::SpawnRejected {
                        entity_type,
                        reason: "capacity".to_owned(),
                    });
                }
            }
        }

        self.queue.spawn_handles.clear();
        self.queue.removal_handles.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
