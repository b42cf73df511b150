//! Per-frame pipeline state.
//!
//! A fresh [`FrameContext`] is created at the top of every `update()` and
//! threaded through the pipeline steps, making the data flow between steps
//! explicit: `time_update` fills the time values, `entity_act` stages
//! offspring and deaths, `lifecycle` turns them into mutation requests.

use vivarium_core::entity::{Entity, EntityHandle};

/// An offspring staged during `entity_act`, waiting for the lifecycle step.
pub(crate) struct StagedSpawn {
    pub entity: Box<dyn Entity>,
    /// The entity whose update produced this one.
    pub parent: EntityHandle,
}

/// Explicit per-frame state passed through pipeline steps.
pub struct FrameContext {
    /// Activity modifier from the day/night cycle. 1.0 until `time_update`.
    pub time_modifier: f64,
    /// Normalized time of day in `[0, 1)`. 0.5 (noon) until `time_update`.
    pub time_of_day: f64,

    /// Offspring accepted by the spawn hook during `entity_act`.
    pub(crate) staged_spawns: Vec<StagedSpawn>,
    /// Deaths confirmed by the death hook during `entity_act`.
    pub(crate) staged_removals: Vec<EntityHandle>,
}

impl FrameContext {
    pub(crate) fn new() -> Self {
        Self {
            time_modifier: 1.0,
            time_of_day: 0.5,
            staged_spawns: Vec::new(),
            staged_removals: Vec::new(),
        }
    }
}
