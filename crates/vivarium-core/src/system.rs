//! System contract, registry, and the kernel context.
//!
//! A system is a named unit of per-phase logic. Systems read the world
//! through the [`KernelCtx`] borrow bundle and surface every mutation
//! through the request API — they never edit the collection directly. The
//! registry executes a phase's systems in registration order, owns the
//! enabled flags and update counters, and aggregates debug info.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::KernelConfig;
use crate::entity::{Entity, EntityHandle};
use crate::env::Environment;
use crate::events::{EventBus, SimEvent};
use crate::identity::IdentityProvider;
use crate::ledger::{EnergyDeltaRecord, EnergyLedger};
use crate::manager::EntityManager;
use crate::mutation::MutationTransaction;
use crate::phase::Phase;
use crate::rng::SimRng;
use crate::spatial::SpatialGrid;
use crate::EngineError;

/// Error type systems may fail with; wrapped into
/// [`EngineError::SystemFailure`] by the registry.
pub type SystemError = Box<dyn std::error::Error + Send + Sync>;

// ---------------------------------------------------------------------------
// KernelCtx
// ---------------------------------------------------------------------------

/// The borrow bundle handed to systems and phase hooks.
///
/// Holding disjoint mutable borrows of the kernel components keeps the
/// contract honest: there is no path from here to the privileged membership
/// API or the pipeline state.
pub struct KernelCtx<'a> {
    pub frame: u64,
    pub time_modifier: f64,
    pub time_of_day: f64,
    pub config: &'a KernelConfig,
    pub entities: &'a mut EntityManager,
    pub spatial: &'a SpatialGrid,
    pub mutations: &'a mut MutationTransaction,
    pub bus: &'a mut EventBus,
    pub ledger: &'a EnergyLedger,
    pub identity: &'a mut dyn IdentityProvider,
    pub env: &'a mut dyn Environment,
    pub rng: &'a mut SimRng,
    pub energy_deltas: &'a mut Vec<EnergyDeltaRecord>,
}

impl<'a> KernelCtx<'a> {
    /// Queue a spawn through the mutation transaction. Returns the reserved
    /// handle the entity will occupy after the next commit.
    pub fn request_spawn(
        &mut self,
        entity: Box<dyn Entity>,
        reason: &str,
        metadata: serde_json::Value,
    ) -> EntityHandle {
        self.mutations
            .request_spawn(self.entities, entity, reason, metadata)
    }

    /// Queue a removal. Returns `false` when deliberately declined
    /// (duplicate request).
    pub fn request_remove(
        &mut self,
        handle: EntityHandle,
        reason: &str,
        metadata: serde_json::Value,
    ) -> bool {
        self.mutations
            .request_remove(self.entities, handle, reason, metadata)
    }

    /// Emit a domain event: ledger deltas land in the frame's energy-delta
    /// buffer (keyed by stable IDs), then bus subscribers run. Deltas for
    /// entities that already left the collection are skipped with a warning.
    pub fn emit(&mut self, event: SimEvent) {
        for delta in self.ledger.apply(&event) {
            match self.entities.get(delta.entity) {
                Some(entity) => {
                    let id = self.identity.get_identity(delta.entity, entity);
                    self.energy_deltas.push(EnergyDeltaRecord {
                        entity_id: id.stable_id.clone(),
                        stable_id: id.stable_id,
                        entity_type: id.type_name,
                        delta: delta.delta,
                        source: delta.source.to_owned(),
                        metadata: delta.metadata,
                    });
                }
                None => {
                    tracing::warn!(
                        handle = %delta.entity,
                        source = delta.source,
                        "energy delta for absent entity dropped"
                    );
                }
            }
        }
        self.bus.emit(&event);
    }
}

// ---------------------------------------------------------------------------
// SystemResult
// ---------------------------------------------------------------------------

/// Per-update report emitted by a system. Aggregable by addition: counts sum
/// component-wise, `details` merge with per-key numeric sums (right wins for
/// non-numeric values), and adding a skipped result yields the other
/// operand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemResult {
    pub entities_affected: u32,
    pub entities_spawned: u32,
    pub entities_removed: u32,
    pub events_emitted: u32,
    pub skipped: bool,
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl SystemResult {
    /// The report of a disabled system.
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

impl std::ops::AddAssign for SystemResult {
    fn add_assign(&mut self, rhs: Self) {
        if rhs.skipped {
            return;
        }
        if self.skipped {
            *self = rhs;
            return;
        }
        self.entities_affected += rhs.entities_affected;
        self.entities_spawned += rhs.entities_spawned;
        self.entities_removed += rhs.entities_removed;
        self.events_emitted += rhs.events_emitted;
        for (key, value) in rhs.details {
            match (self.details.get(&key).and_then(|v| v.as_f64()), value.as_f64()) {
                (Some(a), Some(b)) => {
                    self.details.insert(key, json!(a + b));
                }
                _ => {
                    self.details.insert(key, value);
                }
            }
        }
    }
}

impl std::ops::Add for SystemResult {
    type Output = SystemResult;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// The contract every simulation system implements.
pub trait System {
    /// Unique name, used for lookup, enable/disable, and logging.
    fn name(&self) -> &str;

    /// The phase this system intends to run in. Cross-checked against the
    /// pipeline at setup; `None` opts out of the check.
    fn phase(&self) -> Option<Phase>;

    /// Per-frame logic. Errors abort the tick.
    fn update(&mut self, ctx: &mut KernelCtx<'_>) -> Result<SystemResult, SystemError>;

    /// System-specific state for debugging and monitoring.
    fn debug_info(&self) -> serde_json::Value {
        serde_json::Value::Object(serde_json::Map::new())
    }
}

// ---------------------------------------------------------------------------
// SystemRegistry
// ---------------------------------------------------------------------------

struct Entry {
    system: Box<dyn System>,
    enabled: bool,
    update_count: u64,
}

/// Registers systems in execution order and drives them per phase.
#[derive(Default)]
pub struct SystemRegistry {
    entries: Vec<Entry>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system. Systems registered first run first within their
    /// phase.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn register(&mut self, system: Box<dyn System>) {
        assert!(
            !self.entries.iter().any(|e| e.system.name() == system.name()),
            "duplicate system name: {:?}",
            system.name()
        );
        tracing::debug!(system = system.name(), "registered system");
        self.entries.push(Entry {
            system,
            enabled: true,
            update_count: 0,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.system.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn System> {
        self.entries
            .iter()
            .find(|e| e.system.name() == name)
            .map(|e| e.system.as_ref())
    }

    /// Registered names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.system.name()).collect()
    }

    /// Enable or disable a system at runtime. Returns whether it was found.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        for entry in &mut self.entries {
            if entry.system.name() == name {
                entry.enabled = enabled;
                tracing::debug!(system = name, enabled, "system toggled");
                return true;
            }
        }
        false
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| e.system.name() == name)
            .map(|e| e.enabled)
    }

    pub fn update_count(&self, name: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.system.name() == name)
            .map(|e| e.update_count)
    }

    /// Run every system declared for `phase`, in registration order.
    /// Disabled systems contribute a skipped result. A system error wraps
    /// into [`EngineError::SystemFailure`] and aborts the run.
    pub fn run_phase(
        &mut self,
        phase: Phase,
        ctx: &mut KernelCtx<'_>,
    ) -> Result<SystemResult, EngineError> {
        let mut total = SystemResult::default();
        for entry in &mut self.entries {
            if entry.system.phase() != Some(phase) {
                continue;
            }
            if !entry.enabled {
                total += SystemResult::skipped();
                continue;
            }
            let result =
                entry
                    .system
                    .update(ctx)
                    .map_err(|source| EngineError::SystemFailure {
                        system: entry.system.name().to_owned(),
                        source,
                    })?;
            entry.update_count += 1;
            total += result;
        }
        Ok(total)
    }

    /// Debug info from every system, keyed by name, with registry-level
    /// enabled/update-count fields merged in.
    pub fn debug_info(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for entry in &self.entries {
            let mut info = match entry.system.debug_info() {
                serde_json::Value::Object(map) => map,
                other => {
                    let mut m = serde_json::Map::new();
                    m.insert("state".to_owned(), other);
                    m
                }
            };
            info.insert("enabled".to_owned(), json!(entry.enabled));
            info.insert("update_count".to_owned(), json!(entry.update_count));
            map.insert(entry.system.name().to_owned(), serde_json::Value::Object(info));
        }
        serde_json::Value::Object(map)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
