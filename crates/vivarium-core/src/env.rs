//! Environment protocol.
//!
//! The environment is mode-owned geometry and ambient state: world bounds,
//! the detection modifier (how far agents can sense, varying with the time
//! of day), and the position-refresh hook the kernel calls after the spawn
//! commit. The kernel only ever talks to it through this trait.

use crate::entity::{Entity, EntityHandle};
use crate::spatial::SpatialGrid;

/// Mode-provided environment.
pub trait Environment {
    /// World extents as `(width, height)`.
    fn bounds(&self) -> (f64, f64);

    /// Refresh ambient modifiers for the current time of day.
    fn update_detection_modifier(&mut self, time_of_day: f64);

    /// Current sensing-range multiplier (1.0 = nominal).
    fn detection_modifier(&self) -> f64;

    /// Refresh one entity's spatial-index position. The default simply moves
    /// the handle to the entity's current cell; modes with exotic geometry
    /// can override.
    fn update_agent_position(
        &mut self,
        spatial: &mut SpatialGrid,
        handle: EntityHandle,
        entity: &dyn Entity,
    ) {
        spatial.update(handle, entity.position());
    }
}
