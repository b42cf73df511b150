//! Entity protocol and generational handles.
//!
//! The kernel treats entities as opaque trait objects: it can ask where they
//! are, how big they are, whether they are dead, and it can step them once
//! per frame. Everything else (energy models, genomes, behavior) belongs to
//! the world mode that created them.
//!
//! An [`EntityHandle`] pairs a slot index with a per-slot *generation*
//! counter. Recycling a slot bumps its generation, so a handle held across a
//! removal becomes stale instead of silently pointing at a different entity.
//! Handles are the only cross-component entity reference in the kernel;
//! external outputs carry IdentityProvider stable IDs instead.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// Vec2
// ---------------------------------------------------------------------------

/// A 2D position in world coordinates (top-left corner of the entity's
/// bounding box).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    pub fn dist_sq(&self, other: Vec2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

// ---------------------------------------------------------------------------
// UpdateResult
// ---------------------------------------------------------------------------

/// Outcome of a single [`Entity::update`] call.
///
/// Entities report offspring (or any other entities they create) here; the
/// kernel routes them through the spawn-decision hook and the mutation
/// queue. Death is polled separately via [`Entity::is_dead`].
#[derive(Default)]
pub struct UpdateResult {
    /// Entities created during this update, in creation order.
    pub spawned: Vec<Box<dyn Entity>>,
}

impl UpdateResult {
    /// An update that produced nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// An update that produced the given offspring.
    pub fn with_spawned(spawned: Vec<Box<dyn Entity>>) -> Self {
        Self { spawned }
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// The minimal protocol the kernel imposes on simulated entities.
///
/// Required: position, size, liveness, the per-frame `update`, and bounds
/// constraint. Optional capabilities have defaults: a snapshot type tag
/// (falls back to `"entity"`), an intrinsic stable ID, an energy readout,
/// a pre-removal callback, and extra snapshot fields.
///
/// `as_any`/`as_any_mut` exist so world-mode code (collision policies,
/// reproduction policies) can downcast to its own concrete types; the
/// kernel itself never does.
pub trait Entity: Any {
    /// Current position (top-left corner).
    fn position(&self) -> Vec2;

    /// Bounding-box size as `(width, height)`.
    fn size(&self) -> (f64, f64);

    /// Whether this entity has died. Dead entities may linger for a bounded
    /// number of frames (death animation) before the lifecycle system
    /// requests their removal.
    fn is_dead(&self) -> bool;

    /// Advance the entity by one frame.
    fn update(&mut self, frame: u64, time_modifier: f64, time_of_day: f64) -> UpdateResult;

    /// Clamp the entity into the world rectangle. Called by the kernel after
    /// every `update`.
    fn constrain_to_bounds(&mut self, width: f64, height: f64);

    /// Lowercase kind tag used for type-indexed views, spatial buckets, and
    /// identity. `None` means the generic `"entity"` tag.
    fn snapshot_type(&self) -> Option<&str> {
        None
    }

    /// Intrinsic stable ID, if the entity owns one (e.g. a mode-assigned
    /// monotonic counter). Entities without one get counter-based stable IDs
    /// from the identity provider.
    fn entity_id(&self) -> Option<u64> {
        None
    }

    /// Current energy, if the entity models energy at all.
    fn energy(&self) -> Option<f64> {
        None
    }

    /// Called once, just before the entity leaves the collection.
    fn on_before_remove(&mut self) {}

    /// Extra mode-defined fields merged into the per-entity snapshot object.
    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Object(serde_json::Map::new())
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The kind tag for an entity: its `snapshot_type` or the generic fallback.
pub fn kind_of(entity: &dyn Entity) -> &str {
    entity.snapshot_type().unwrap_or("entity")
}

/// Axis-aligned bounding-box overlap test between two entities.
pub fn aabb_overlap(a: &dyn Entity, b: &dyn Entity) -> bool {
    let pa = a.position();
    let (wa, ha) = a.size();
    let pb = b.position();
    let (wb, hb) = b.size();
    pa.x < pb.x + wb && pa.x + wa > pb.x && pa.y < pb.y + hb && pa.y + ha > pb.y
}

// ---------------------------------------------------------------------------
// EntityHandle
// ---------------------------------------------------------------------------

/// Names one occupancy of one entity slot.
///
/// A handle is a slot index paired with the generation the slot carried
/// when the handle was issued. Every release bumps the slot's generation,
/// so a handle held across a removal stops resolving instead of silently
/// aliasing the slot's next tenant. Handles sort and hash by `(index,
/// generation)`; the ordering has no meaning beyond being deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle {
    index: u32,
    generation: u32,
}

impl EntityHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Which slot this handle points at.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Which occupancy of that slot it names.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}:{}", self.index, self.generation)
    }
}

// ---------------------------------------------------------------------------
// HandleAllocator
// ---------------------------------------------------------------------------

/// Slot lifecycle state tracked by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    Free,
    /// Reserved by a pending spawn: the handle is live but the slot holds no
    /// entity yet.
    Reserved,
    Occupied,
}

/// Walks each slot through its reserve → occupy → release lifecycle and
/// issues the [`EntityHandle`]s that name each occupancy.
///
/// Reservation is what lets the mutation queue hand out a handle for an
/// entity that has not entered the collection yet: the slot is claimed (and
/// its handle live) while the slot itself stays empty until commit.
/// Released indices join the back of a reuse queue and come back under a
/// bumped generation, whether the occupancy was fulfilled or canceled — a
/// reservation that never commits still burns a generation, so its handle
/// can never collide with a later one.
#[derive(Debug)]
pub(crate) struct HandleAllocator {
    generations: Vec<u32>,
    states: Vec<SlotState>,
    free_indices: VecDeque<u32>,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            states: Vec::new(),
            free_indices: VecDeque::new(),
        }
    }

    /// Reserve a fresh handle. The slot stays [`SlotState::Reserved`] until
    /// it is either occupied (commit) or released (cancel / rejection).
    pub fn reserve(&mut self) -> EntityHandle {
        if let Some(index) = self.free_indices.pop_front() {
            // The stored generation is already the post-release one.
            self.states[index as usize] = SlotState::Reserved;
            EntityHandle::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.states.push(SlotState::Reserved);
            EntityHandle::new(index, 0)
        }
    }

    /// Promote a reserved handle to occupied. Returns `false` for stale or
    /// non-reserved handles.
    pub fn occupy(&mut self, handle: EntityHandle) -> bool {
        if !self.matches(handle) || self.states[handle.index() as usize] != SlotState::Reserved {
            return false;
        }
        self.states[handle.index() as usize] = SlotState::Occupied;
        true
    }

    /// Release a handle (reserved or occupied), bumping the generation so
    /// outstanding copies become stale. Returns `false` for stale handles.
    pub fn release(&mut self, handle: EntityHandle) -> bool {
        if !self.matches(handle) || self.states[handle.index() as usize] == SlotState::Free {
            return false;
        }
        let idx = handle.index() as usize;
        self.states[idx] = SlotState::Free;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(handle.index());
        true
    }

    /// Whether `handle` refers to a currently occupied slot.
    pub fn is_occupied(&self, handle: EntityHandle) -> bool {
        self.matches(handle) && self.states[handle.index() as usize] == SlotState::Occupied
    }

    fn matches(&self, handle: EntityHandle) -> bool {
        let idx = handle.index() as usize;
        idx < self.generations.len() && self.generations[idx] == handle.generation()
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
