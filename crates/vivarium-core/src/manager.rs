//! Authoritative entity collection.
//!
//! The [`EntityManager`] owns the backing store for every simulated entity.
//! Entities live in a slot arena addressed by [`EntityHandle`]s; a separate
//! roster records canonical insertion order, which is part of the
//! determinism contract (entity iteration during `entity_act` follows it).
//!
//! Collection membership changes only through two doors:
//!
//! - the mutation queue's commit (`insert_reserved` / `remove_internal`),
//! - the privileged out-of-tick `add` / `remove` used by setup and
//!   persistence paths.
//!
//! A mutation lock is held during `entity_act`; `add`/`remove` fail with
//! [`EngineError::MutationLock`] while it is set. Spatial-grid membership is
//! maintained at the same call sites so the grid never drifts from the
//! collection.

use std::collections::HashMap;

use crate::entity::{kind_of, Entity, EntityHandle, HandleAllocator};
use crate::spatial::SpatialGrid;
use crate::EngineError;

// ---------------------------------------------------------------------------
// CapacityOracle
// ---------------------------------------------------------------------------

/// Mode-provided admission policy consulted by [`EntityManager::add`] and by
/// the commit path. Returning `false` rejects the entity; the energy the
/// caller invested in it is lost by contract.
pub trait CapacityOracle {
    fn admit(&self, manager: &EntityManager, entity: &dyn Entity) -> bool;
}

// ---------------------------------------------------------------------------
// EntityManager
// ---------------------------------------------------------------------------

/// Owns the authoritative entity collection and its cached type views.
pub struct EntityManager {
    slots: Vec<Option<Box<dyn Entity>>>,
    alloc: HandleAllocator,
    /// Canonical insertion order. Iteration order is part of determinism.
    order: Vec<EntityHandle>,
    /// Lazily rebuilt per-type views, keyed by kind tag.
    views: HashMap<String, Vec<EntityHandle>>,
    dirty: bool,
    /// Phase name while the mutation lock is held.
    lock: Option<String>,
    capacity: Option<Box<dyn CapacityOracle>>,
}

impl EntityManager {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            alloc: HandleAllocator::new(),
            order: Vec::new(),
            views: HashMap::new(),
            dirty: false,
            lock: None,
            capacity: None,
        }
    }

    /// Install the mode's admission policy. `None` admits everything.
    pub fn set_capacity_oracle(&mut self, oracle: Option<Box<dyn CapacityOracle>>) {
        self.capacity = oracle;
    }

    // -- reservation (used by the mutation queue) ---------------------------

    /// Reserve a handle for an entity that has not entered the collection
    /// yet. The slot stays empty until [`insert_reserved`](Self::insert_reserved).
    pub(crate) fn reserve(&mut self) -> EntityHandle {
        let handle = self.alloc.reserve();
        let idx = handle.index() as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        handle
    }

    /// Release a reservation that will never be fulfilled (canceled spawn or
    /// capacity rejection). Bumps the generation so the handle goes stale.
    pub(crate) fn release_reserved(&mut self, handle: EntityHandle) {
        self.alloc.release(handle);
    }

    /// Fill a reserved slot, append to the canonical order, and mirror the
    /// entity into the spatial grid. Returns the entity back if the capacity
    /// oracle rejects it (the reservation is left for the caller to release).
    pub(crate) fn insert_reserved(
        &mut self,
        handle: EntityHandle,
        entity: Box<dyn Entity>,
        spatial: &mut SpatialGrid,
    ) -> Result<(), Box<dyn Entity>> {
        // Take the oracle out so it can inspect the manager without aliasing.
        let oracle = self.capacity.take();
        let admitted = oracle.as_ref().map_or(true, |o| o.admit(self, entity.as_ref()));
        self.capacity = oracle;
        if !admitted {
            return Err(entity);
        }

        if !self.alloc.occupy(handle) {
            tracing::warn!(handle = %handle, "insert on stale or unreserved handle dropped");
            return Err(entity);
        }
        spatial.add(handle, kind_of(entity.as_ref()), entity.position());
        self.slots[handle.index() as usize] = Some(entity);
        self.order.push(handle);
        self.dirty = true;
        Ok(())
    }

    /// Remove an entity regardless of the mutation lock. Used by the commit
    /// path. Runs `on_before_remove`, frees the slot (bumping the
    /// generation), and removes the spatial mirror.
    pub(crate) fn remove_internal(
        &mut self,
        handle: EntityHandle,
        spatial: &mut SpatialGrid,
    ) -> Option<Box<dyn Entity>> {
        if !self.alloc.is_occupied(handle) {
            return None;
        }
        let mut entity = self.slots[handle.index() as usize].take()?;
        entity.on_before_remove();
        self.alloc.release(handle);
        self.order.retain(|h| *h != handle);
        spatial.remove(handle);
        self.dirty = true;
        Some(entity)
    }

    // -- privileged membership (setup / persistence) ------------------------

    /// Add an entity directly. Fails with [`EngineError::MutationLock`] while
    /// the lock is held; returns `Ok(None)` when the capacity oracle rejects.
    pub fn add(
        &mut self,
        entity: Box<dyn Entity>,
        spatial: &mut SpatialGrid,
    ) -> Result<Option<EntityHandle>, EngineError> {
        if let Some(phase) = &self.lock {
            return Err(EngineError::MutationLock {
                phase: phase.clone(),
            });
        }
        let handle = self.reserve();
        match self.insert_reserved(handle, entity, spatial) {
            Ok(()) => Ok(Some(handle)),
            Err(_rejected) => {
                self.release_reserved(handle);
                Ok(None)
            }
        }
    }

    /// Remove an entity directly. Fails with [`EngineError::MutationLock`]
    /// while the lock is held; returns whether the entity was present.
    pub fn remove(
        &mut self,
        handle: EntityHandle,
        spatial: &mut SpatialGrid,
    ) -> Result<bool, EngineError> {
        if let Some(phase) = &self.lock {
            return Err(EngineError::MutationLock {
                phase: phase.clone(),
            });
        }
        Ok(self.remove_internal(handle, spatial).is_some())
    }

    /// Drop every entity (and its spatial mirror).
    pub fn clear(&mut self, spatial: &mut SpatialGrid) {
        for handle in std::mem::take(&mut self.order) {
            if let Some(mut entity) = self.slots[handle.index() as usize].take() {
                entity.on_before_remove();
                self.alloc.release(handle);
                spatial.remove(handle);
            }
        }
        self.dirty = true;
    }

    // -- access -------------------------------------------------------------

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.alloc.is_occupied(handle)
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&dyn Entity> {
        if !self.alloc.is_occupied(handle) {
            return None;
        }
        self.slots[handle.index() as usize].as_deref()
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut dyn Entity> {
        if !self.alloc.is_occupied(handle) {
            return None;
        }
        self.slots[handle.index() as usize].as_deref_mut()
    }

    /// Mutable access to two distinct entities at once (e.g. an eater and
    /// its meal). Returns `None` if the handles alias or either is stale.
    pub fn get_pair_mut(
        &mut self,
        a: EntityHandle,
        b: EntityHandle,
    ) -> Option<(&mut dyn Entity, &mut dyn Entity)> {
        if a == b || !self.alloc.is_occupied(a) || !self.alloc.is_occupied(b) {
            return None;
        }
        let (ia, ib) = (a.index() as usize, b.index() as usize);
        if ia < ib {
            let (left, right) = self.slots.split_at_mut(ib);
            Some((left[ia].as_deref_mut()?, right[0].as_deref_mut()?))
        } else {
            let (left, right) = self.slots.split_at_mut(ia);
            Some((right[0].as_deref_mut()?, left[ib].as_deref_mut()?))
        }
    }

    /// Canonical insertion-order roster.
    pub fn order(&self) -> &[EntityHandle] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate entities in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &dyn Entity)> {
        self.order
            .iter()
            .filter_map(|h| self.get(*h).map(|e| (*h, e)))
    }

    /// Cached view of handles whose kind tag equals `tag`. Stale views are
    /// dropped on first access after an invalidation and rebuilt per tag on
    /// demand.
    pub fn view(&mut self, tag: &str) -> &[EntityHandle] {
        if self.dirty {
            self.views.clear();
            self.dirty = false;
        }
        if !self.views.contains_key(tag) {
            let list: Vec<EntityHandle> = self
                .order
                .iter()
                .filter(|h| {
                    self.slots[h.index() as usize]
                        .as_deref()
                        .map(|e| kind_of(e) == tag)
                        .unwrap_or(false)
                })
                .copied()
                .collect();
            self.views.insert(tag.to_owned(), list);
        }
        self.views
            .get(tag)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Count entities of a kind without touching the view cache.
    pub fn count_type(&self, tag: &str) -> usize {
        self.iter().filter(|(_, e)| kind_of(*e) == tag).count()
    }

    /// Sum the energy of every entity of a kind that reports one.
    pub fn total_energy_of(&self, tag: &str) -> f64 {
        self.iter()
            .filter(|(_, e)| kind_of(*e) == tag)
            .filter_map(|(_, e)| e.energy())
            .sum()
    }

    /// Whether the cached views are stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drop stale view caches; they repopulate lazily on next access.
    pub fn rebuild_views_if_dirty(&mut self) {
        if self.dirty {
            self.views.clear();
            self.dirty = false;
        }
    }

    // -- mutation lock -------------------------------------------------------

    pub fn lock_mutations(&mut self, phase_name: &str) {
        self.lock = Some(phase_name.to_owned());
    }

    pub fn unlock_mutations(&mut self) {
        self.lock = None;
    }

    pub fn locked_phase(&self) -> Option<&str> {
        self.lock.as_deref()
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
