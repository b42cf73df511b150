//! Entity lifecycle bookkeeping.
//!
//! Runs at `frame_start`. Two jobs:
//!
//! 1. Reset per-frame counters.
//! 2. Manage the death-animation window: entities whose `is_dead()` turned
//!    true but whose removal the phase hooks deferred stay in the collection
//!    until the configured timer lapses, then this system requests their
//!    removal. Entities that leave the collection by other means drop out of
//!    tracking.

use serde_json::json;
use std::collections::BTreeMap;

use vivarium_core::entity::EntityHandle;
use vivarium_core::phase::Phase;
use vivarium_core::system::{KernelCtx, System, SystemError, SystemResult};

// ---------------------------------------------------------------------------
// LifecycleSystem
// ---------------------------------------------------------------------------

/// Tracks dying entities and requests their removal on expiry.
pub struct LifecycleSystem {
    /// Handle -> frame at which removal should be requested. BTreeMap keeps
    /// request order deterministic.
    dying: BTreeMap<EntityHandle, u64>,
    death_effect_frames: u32,
    deaths_tracked: u64,
    removals_requested: u64,
    /// Reset at the top of every frame.
    deaths_this_frame: u32,
    removals_this_frame: u32,
}

impl LifecycleSystem {
    pub fn new(death_effect_frames: u32) -> Self {
        Self {
            dying: BTreeMap::new(),
            death_effect_frames,
            deaths_tracked: 0,
            removals_requested: 0,
            deaths_this_frame: 0,
            removals_this_frame: 0,
        }
    }

    /// Number of entities currently in their death animation.
    pub fn dying_count(&self) -> usize {
        self.dying.len()
    }
}

impl System for LifecycleSystem {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::FrameStart)
    }

    fn update(&mut self, ctx: &mut KernelCtx<'_>) -> Result<SystemResult, SystemError> {
        let mut result = SystemResult::default();
        self.deaths_this_frame = 0;
        self.removals_this_frame = 0;

        // Forget entities that already left the collection.
        self.dying.retain(|handle, _| ctx.entities.contains(*handle));

        // Start timers for newly dead entities that nobody removed.
        let newly_dead: Vec<EntityHandle> = ctx
            .entities
            .iter()
            .filter(|(handle, entity)| {
                entity.is_dead()
                    && !self.dying.contains_key(handle)
                    && !ctx.mutations.is_pending_removal(*handle)
            })
            .map(|(handle, _)| handle)
            .collect();
        for handle in newly_dead {
            self.dying
                .insert(handle, ctx.frame + u64::from(self.death_effect_frames));
            self.deaths_tracked += 1;
            self.deaths_this_frame += 1;
            result.entities_affected += 1;
        }

        // Request removal for expired timers.
        let expired: Vec<EntityHandle> = self
            .dying
            .iter()
            .filter(|(_, expiry)| ctx.frame >= **expiry)
            .map(|(handle, _)| *handle)
            .collect();
        for handle in expired {
            self.dying.remove(&handle);
            if ctx.request_remove(handle, "death_animation_complete", json!({})) {
                self.removals_requested += 1;
                self.removals_this_frame += 1;
                result.entities_removed += 1;
            }
        }

        result
            .details
            .insert("dying".to_owned(), json!(self.dying.len()));
        Ok(result)
    }

    fn debug_info(&self) -> serde_json::Value {
        json!({
            "dying": self.dying.len(),
            "deaths_tracked": self.deaths_tracked,
            "removals_requested": self.removals_requested,
            "deaths_this_frame": self.deaths_this_frame,
            "removals_this_frame": self.removals_this_frame,
            "death_effect_frames": self.death_effect_frames,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests live in the engine integration suite: the lifecycle system needs a
// full kernel context, which `SimulationEngine` provides.
// ---------------------------------------------------------------------------
