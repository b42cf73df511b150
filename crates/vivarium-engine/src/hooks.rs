//! Phase hooks for mode-specific behavior in the update loop.
//!
//! Hooks are the mode's fingers inside the canonical pipeline: spawn
//! admission during `entity_act`, death handling, lifecycle cleanup, and
//! end-of-phase bookkeeping. Every slot has a no-op default so modes
//! override only what they need. Hooks receive the same [`KernelCtx`] as
//! systems — there is no privileged path through a hook.

use vivarium_core::entity::{Entity, EntityHandle};
use vivarium_core::system::KernelCtx;

// ---------------------------------------------------------------------------
// SpawnDecision
// ---------------------------------------------------------------------------

/// Result of evaluating whether a freshly produced entity should be added.
///
/// The hook owns the entity while deciding and must hand it back (possibly
/// modified); a rejected entity is simply dropped.
pub struct SpawnDecision {
    pub accept: bool,
    pub entity: Box<dyn Entity>,
    pub reason: String,
}

impl SpawnDecision {
    pub fn accept(entity: Box<dyn Entity>) -> Self {
        Self {
            accept: true,
            entity,
            reason: String::new(),
        }
    }

    pub fn reject(entity: Box<dyn Entity>, reason: &str) -> Self {
        Self {
            accept: false,
            entity,
            reason: reason.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// PhaseHooks
// ---------------------------------------------------------------------------

/// Mode-specific slots invoked by the kernel during the canonical pipeline.
pub trait PhaseHooks {
    /// Called for every entity produced by an `update()` during
    /// `entity_act`. Default: accept.
    fn on_entity_spawned(
        &mut self,
        _ctx: &mut KernelCtx<'_>,
        spawned: Box<dyn Entity>,
        _parent: EntityHandle,
    ) -> SpawnDecision {
        SpawnDecision::accept(spawned)
    }

    /// Called when an entity's `is_dead()` turns true during `entity_act`.
    /// Return whether removal should be requested now; returning `false`
    /// defers to the lifecycle system (death animation). Default: remove.
    fn on_entity_died(&mut self, _ctx: &mut KernelCtx<'_>, _entity: EntityHandle) -> bool {
        true
    }

    /// Mode bookkeeping during the lifecycle step (expiry policies, pool
    /// maintenance). Default: nothing.
    fn on_lifecycle_cleanup(&mut self, _ctx: &mut KernelCtx<'_>) {}

    /// End of the reproduction phase (stats snapshots). Default: nothing.
    fn on_reproduction_complete(&mut self, _ctx: &mut KernelCtx<'_>) {}

    /// End of frame (periodic tasks, benchmarks). Default: nothing.
    fn on_frame_end(&mut self, _ctx: &mut KernelCtx<'_>) {}
}

/// The hooks used when a pack provides none.
pub struct NoOpPhaseHooks;

impl PhaseHooks for NoOpPhaseHooks {}
