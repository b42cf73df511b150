//! Energy accounting from domain events.
//!
//! The [`EnergyLedger`] is a pure function from a [`SimEvent`] to zero or
//! more [`EnergyDelta`]s. It never touches entities; a small adapter in the
//! kernel resolves each delta's handle through the identity provider and
//! appends an [`EnergyDeltaRecord`] to the current frame.
//!
//! Per-event behavior (the authoritative table):
//!
//! | event | deltas |
//! |---|---|
//! | `AteFood` | one, `+energy_gained`, source `"ate_food"` |
//! | `Moved` | one, `-|energy_cost|`, source `"movement"` |
//! | `EnergyBurned` | none — telemetry only, the emitter already applied it |
//! | `GamePlayed` | one, signed `energy_change`, source `"interaction_game"` |
//! | `EntityDied`, `SpawnRejected` | none |

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entity::EntityHandle;
use crate::events::SimEvent;

// ---------------------------------------------------------------------------
// EnergyDelta
// ---------------------------------------------------------------------------

/// A signed energy change attributed to an entity, in kernel-internal terms
/// (handle, not stable ID).
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyDelta {
    pub entity: EntityHandle,
    pub delta: f64,
    pub source: &'static str,
    pub metadata: serde_json::Value,
}

// ---------------------------------------------------------------------------
// EnergyDeltaRecord
// ---------------------------------------------------------------------------

/// The externalized form of an energy delta, keyed by stable IDs. Part of
/// the per-frame output contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyDeltaRecord {
    pub entity_id: String,
    pub stable_id: String,
    pub entity_type: String,
    pub delta: f64,
    pub source: String,
    pub metadata: serde_json::Value,
}

// ---------------------------------------------------------------------------
// EnergyLedger
// ---------------------------------------------------------------------------

/// Pure event-to-delta translation. Stateless by design.
#[derive(Debug, Clone, Default)]
pub struct EnergyLedger;

impl EnergyLedger {
    pub fn new() -> Self {
        Self
    }

    /// Translate one event into its energy deltas.
    pub fn apply(&self, event: &SimEvent) -> Vec<EnergyDelta> {
        match event {
            SimEvent::AteFood {
                entity,
                food: _,
                food_type,
                energy_gained,
            } => vec![EnergyDelta {
                entity: *entity,
                delta: *energy_gained,
                source: "ate_food",
                metadata: json!({ "food_type": food_type }),
            }],

            SimEvent::Moved {
                entity,
                distance,
                energy_cost,
                speed,
            } => vec![EnergyDelta {
                entity: *entity,
                delta: -energy_cost.abs(),
                source: "movement",
                metadata: json!({ "distance": distance, "speed": speed }),
            }],

            // Emitted for telemetry only; the source component already
            // changed the entity's energy. A delta here would double-count.
            SimEvent::EnergyBurned { .. } => Vec::new(),

            SimEvent::GamePlayed {
                entity,
                opponent_type,
                energy_change,
                won,
            } => vec![EnergyDelta {
                entity: *entity,
                delta: *energy_change,
                source: "interaction_game",
                metadata: json!({ "opponent_type": opponent_type, "won": won }),
            }],

            SimEvent::EntityDied { .. } | SimEvent::SpawnRejected { .. } => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
