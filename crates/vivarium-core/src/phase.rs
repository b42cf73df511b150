//! Canonical update phases.
//!
//! Every frame runs the same fixed cycle:
//!
//! `FrameStart → TimeUpdate → Environment → EntityAct → Lifecycle → Spawn →
//! Collision → Interaction → Reproduction → FrameEnd`
//!
//! Systems declare the phase they intend to run in; the registry executes a
//! phase's systems in registration order. The mutation lock on the entity
//! collection is held for `EntityAct` only.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// A named step of the simulation update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Reset per-frame counters, increment the frame, clear delta buffers.
    FrameStart,
    /// Advance the day/night cycle; produce time modifiers.
    TimeUpdate,
    /// Refresh environment-wide modifiers.
    Environment,
    /// Step every entity in canonical order. Mutation lock held.
    EntityAct,
    /// Request the spawns and removals collected during `EntityAct`.
    Lifecycle,
    /// Run spawning systems; refresh spatial positions afterwards.
    Spawn,
    /// Physical collision handling.
    Collision,
    /// Proximity-driven social interactions.
    Interaction,
    /// Mating and offspring.
    Reproduction,
    /// Bookkeeping: identity pruning, invariant checks, view rebuild.
    FrameEnd,
}

impl Phase {
    /// All phases in execution order.
    pub const ORDER: [Phase; 10] = [
        Phase::FrameStart,
        Phase::TimeUpdate,
        Phase::Environment,
        Phase::EntityAct,
        Phase::Lifecycle,
        Phase::Spawn,
        Phase::Collision,
        Phase::Interaction,
        Phase::Reproduction,
        Phase::FrameEnd,
    ];

    /// Snake-case step name, matching the canonical pipeline step names.
    pub fn name(self) -> &'static str {
        match self {
            Phase::FrameStart => "frame_start",
            Phase::TimeUpdate => "time_update",
            Phase::Environment => "environment",
            Phase::EntityAct => "entity_act",
            Phase::Lifecycle => "lifecycle",
            Phase::Spawn => "spawn",
            Phase::Collision => "collision",
            Phase::Interaction => "interaction",
            Phase::Reproduction => "reproduction",
            Phase::FrameEnd => "frame_end",
        }
    }

    /// Human-readable description for debugging.
    pub fn description(self) -> &'static str {
        match self {
            Phase::FrameStart => "initializing frame, resetting counters",
            Phase::TimeUpdate => "advancing day/night cycle",
            Phase::Environment => "updating environmental modifiers",
            Phase::EntityAct => "entities performing actions",
            Phase::Lifecycle => "processing deaths and births",
            Phase::Spawn => "spawning new entities",
            Phase::Collision => "detecting and handling collisions",
            Phase::Interaction => "processing entity interactions",
            Phase::Reproduction => "handling reproduction",
            Phase::FrameEnd => "statistics and invariant checks",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_covers_all_phases_once() {
        let mut seen = std::collections::HashSet::new();
        for phase in Phase::ORDER {
            assert!(seen.insert(phase), "{phase} appears twice");
        }
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn frame_boundaries() {
        assert_eq!(Phase::ORDER[0], Phase::FrameStart);
        assert_eq!(Phase::ORDER[9], Phase::FrameEnd);
    }

    #[test]
    fn names_are_snake_case() {
        for phase in Phase::ORDER {
            let name = phase.name();
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
