//! Stable cross-frame entity identity.
//!
//! External consumers (delta streams, snapshots) must never see raw handles:
//! a handle's index can be recycled, and its numeric value is an accident of
//! allocation order. The [`IdentityProvider`] assigns each entity a stable
//! `(type_name, stable_id)` pair that survives for the entity's whole life
//! and is rendered as a string in every output.
//!
//! [`OffsetIdentityProvider`] implements the band scheme: each kind tag owns
//! a numeric band (`fish: 0`, `plant: 1_000_000`, ...). Entities exposing an
//! intrinsic ID map to `intrinsic + band`; entities without one draw from a
//! monotonically increasing per-band counter. A kind must use one scheme or
//! the other consistently, otherwise the bands overlap.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::entity::{kind_of, Entity, EntityHandle};
use crate::manager::EntityManager;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The externally visible identity of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Lowercase kind tag (`"fish"`, `"food"`, ...).
    pub type_name: String,
    /// Band-offset stable ID, stringified.
    pub stable_id: String,
}

// ---------------------------------------------------------------------------
// IdentityProvider
// ---------------------------------------------------------------------------

/// Produces stable identities and supports reverse lookup.
///
/// Implementations must be deterministic and idempotent: the same entity
/// resolves to the same identity in every frame it exists, and two distinct
/// coexisting entities never share a stable ID.
pub trait IdentityProvider {
    /// Resolve (and cache) the identity of an entity.
    fn get_identity(&mut self, handle: EntityHandle, entity: &dyn Entity) -> Identity;

    /// O(1) reverse lookup from a stable ID to the entity's handle.
    fn get_entity_by_id(&self, stable_id: &str) -> Option<EntityHandle>;

    /// Rebuild the reverse map against the current collection. Called before
    /// batch operations that need reverse lookup.
    fn sync_entities(&mut self, manager: &EntityManager);

    /// Drop cached entries whose handle is no longer live. Called at
    /// `frame_end` — without pruning, a recycled handle index could inherit
    /// a dead entity's stable ID.
    fn prune_stale_ids(&mut self, live: &HashSet<EntityHandle>);
}

// ---------------------------------------------------------------------------
// OffsetIdentityProvider
// ---------------------------------------------------------------------------

/// Band offset for kinds not present in the configured table.
pub const OTHER_OFFSET: u64 = 5_000_000;

/// Identity provider using per-kind numeric ID bands.
pub struct OffsetIdentityProvider {
    /// Kind tag -> band offset. Injective by construction of the caller.
    offsets: BTreeMap<String, u64>,
    /// Cached assignment for entities without intrinsic IDs.
    assigned: HashMap<EntityHandle, u64>,
    /// Next counter value per band offset.
    counters: HashMap<u64, u64>,
    /// Reverse map stable ID -> handle.
    reverse: HashMap<String, EntityHandle>,
}

impl OffsetIdentityProvider {
    /// Build a provider with the given kind-to-band table.
    pub fn new(offsets: impl IntoIterator<Item = (String, u64)>) -> Self {
        Self {
            offsets: offsets.into_iter().collect(),
            assigned: HashMap::new(),
            counters: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    fn band_of(&self, tag: &str) -> u64 {
        self.offsets.get(tag).copied().unwrap_or(OTHER_OFFSET)
    }
}

impl IdentityProvider for OffsetIdentityProvider {
    fn get_identity(&mut self, handle: EntityHandle, entity: &dyn Entity) -> Identity {
        let type_name = kind_of(entity).to_owned();
        let band = self.band_of(&type_name);

        let stable = if let Some(intrinsic) = entity.entity_id() {
            intrinsic + band
        } else {
            match self.assigned.get(&handle) {
                Some(id) => *id,
                None => {
                    let counter = self.counters.entry(band).or_insert(0);
                    let id = band + *counter;
                    *counter += 1;
                    self.assigned.insert(handle, id);
                    id
                }
            }
        };

        let stable_id = stable.to_string();
        self.reverse.insert(stable_id.clone(), handle);
        Identity {
            type_name,
            stable_id,
        }
    }

    fn get_entity_by_id(&self, stable_id: &str) -> Option<EntityHandle> {
        self.reverse.get(stable_id).copied()
    }

    fn sync_entities(&mut self, manager: &EntityManager) {
        self.reverse.clear();
        let roster: Vec<EntityHandle> = manager.order().to_vec();
        for handle in roster {
            if let Some(entity) = manager.get(handle) {
                self.get_identity(handle, entity);
            }
        }
    }

    fn prune_stale_ids(&mut self, live: &HashSet<EntityHandle>) {
        self.assigned.retain(|handle, _| live.contains(handle));
        self.reverse.retain(|_, handle| live.contains(handle));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
