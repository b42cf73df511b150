//! The simulation engine.
//!
//! [`SimulationEngine`] wires the kernel components together and drives the
//! phased update pipeline. Each `update()` runs the configured pipeline's
//! steps in order; the engine sets `current_phase` around every step,
//! commits the mutation queue at the designated stages, holds the mutation
//! lock for `entity_act`, and drains per-frame delta buffers to the caller
//! through [`drain_frame_outputs`](SimulationEngine::drain_frame_outputs).
//!
//! # Determinism
//!
//! Given the same seed, the same pack, and the same inputs, two engines
//! produce identical frame counts, delta streams, and snapshots. This rests
//! on: one seeded RNG per engine (collaborators fork from it), canonical
//! entity iteration order, FIFO mutation commits, and time-of-day derived
//! purely from the frame counter. Engines share no state — interleaving two
//! of them cannot perturb either one.
//!
//! # Failure semantics
//!
//! A failing step aborts the tick: the engine releases the mutation lock,
//! clears `current_phase`, restores the pre-tick frame counter, and
//! propagates the error. The frame is not atomic — partial state from the
//! aborted tick remains, which is why these errors are fatal.

use serde_json::json;
use std::collections::HashSet;

use vivarium_core::config::KernelConfig;
use vivarium_core::entity::{kind_of, Entity, EntityHandle};
use vivarium_core::env::Environment;
use vivarium_core::events::{EventBus, SimEvent};
use vivarium_core::identity::{IdentityProvider, OffsetIdentityProvider};
use vivarium_core::ledger::{EnergyDeltaRecord, EnergyLedger};
use vivarium_core::manager::EntityManager;
use vivarium_core::mutation::{MutationTransaction, RemovalRequest, SpawnRequest};
use vivarium_core::phase::Phase;
use vivarium_core::rng::SimRng;
use vivarium_core::spatial::SpatialGrid;
use vivarium_core::system::{KernelCtx, SystemRegistry};
use vivarium_core::EngineError;

use crate::frame::{FrameContext, StagedSpawn};
use crate::hooks::{NoOpPhaseHooks, PhaseHooks};
use crate::pack::{ContractRegistry, WorldPack, REQUIRED_SYSTEMS};
use crate::pipeline::{default_pipeline, Pipeline};
use crate::snapshot::{RenderHint, WorldSnapshot};
use crate::systems::time::TimeSystem;

// ---------------------------------------------------------------------------
// FrameOutputs
// ---------------------------------------------------------------------------

/// The three ordered per-frame delta lists, drained once per frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameOutputs {
    pub spawns: Vec<SpawnRequest>,
    pub removals: Vec<RemovalRequest>,
    pub energy_deltas: Vec<EnergyDeltaRecord>,
}

// ---------------------------------------------------------------------------
// SimulationEngine
// ---------------------------------------------------------------------------

/// Split-borrow bundle for phase bodies: the kernel context plus the two
/// engine parts that cannot live inside it.
struct Split<'a> {
    ctx: KernelCtx<'a>,
    registry: &'a mut SystemRegistry,
    hooks: &'a mut dyn PhaseHooks,
}

/// Headless, deterministic multi-agent simulation engine.
pub struct SimulationEngine {
    config: KernelConfig,
    frame_count: u64,
    paused: bool,
    current_phase: Option<Phase>,
    seed: u64,
    run_id: String,
    rng: SimRng,
    time: TimeSystem,

    entities: EntityManager,
    spatial: SpatialGrid,
    mutations: MutationTransaction,
    identity: Box<dyn IdentityProvider>,
    bus: EventBus,
    ledger: EnergyLedger,
    registry: SystemRegistry,
    contracts: ContractRegistry,
    environment: Option<Box<dyn Environment>>,
    pipeline: Option<Pipeline>,
    hooks: Box<dyn PhaseHooks>,

    mode_id: String,
    metadata: serde_json::Value,
    render_hint: Option<RenderHint>,

    frame_spawns: Vec<SpawnRequest>,
    frame_removals: Vec<RemovalRequest>,
    frame_energy_deltas: Vec<EnergyDeltaRecord>,

    phase_debug: bool,
}

impl SimulationEngine {
    /// Build an engine from a validated config. Draws a seed from entropy
    /// when the config provides none; either way the seed is recorded in
    /// `run_id`.
    pub fn new(config: KernelConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let (rng, seed) = match config.seed {
            Some(seed) => (SimRng::from_seed(seed), seed),
            None => SimRng::from_entropy(),
        };
        let run_id = format!("run-{seed:016x}");
        tracing::info!(run_id = %run_id, "simulation engine initialized");

        let spatial = SpatialGrid::new(
            f64::from(config.display.width),
            f64::from(config.display.height),
            config.spatial_cell_size,
        );
        let time = TimeSystem::new(config.time_cycle_frames);
        let phase_debug = config.phase_debug_effective();

        Ok(Self {
            config,
            frame_count: 0,
            paused: false,
            current_phase: None,
            seed,
            run_id,
            rng,
            time,
            entities: EntityManager::new(),
            spatial,
            mutations: MutationTransaction::new(),
            identity: Box::new(OffsetIdentityProvider::new([])),
            bus: EventBus::new(),
            ledger: EnergyLedger::new(),
            registry: SystemRegistry::new(),
            contracts: ContractRegistry::default(),
            environment: None,
            pipeline: None,
            hooks: Box::new(NoOpPhaseHooks),
            mode_id: String::new(),
            metadata: json!({}),
            render_hint: None,
            frame_spawns: Vec::new(),
            frame_removals: Vec::new(),
            frame_energy_deltas: Vec::new(),
            phase_debug,
        })
    }

    // -----------------------------------------------------------------------
    // Setup
    // -----------------------------------------------------------------------

    /// Assemble a world mode onto this engine.
    ///
    /// Calls, in order: `build_core_systems`, `build_environment`,
    /// `register_systems`, `register_contracts`; captures the pipeline,
    /// identity provider, phase hooks, and metadata; then `seed_entities`
    /// and a final commit with `record_outputs = false` so seeding does not
    /// appear in frame deltas. Fails with [`EngineError::Setup`] when a
    /// required system is missing afterwards.
    pub fn setup(&mut self, pack: &mut dyn WorldPack) -> Result<(), EngineError> {
        self.mode_id = pack.mode_id().to_owned();

        for system in pack.build_core_systems(self) {
            self.registry.register(system);
        }
        let environment = pack.build_environment(self);
        self.environment = Some(environment);
        self.entities.set_capacity_oracle(pack.capacity_oracle());

        pack.register_systems(self);
        pack.register_contracts(self);

        self.pipeline = Some(pack.pipeline().unwrap_or_else(default_pipeline));
        self.identity = pack.identity_provider();
        self.hooks = pack
            .phase_hooks()
            .unwrap_or_else(|| Box::new(NoOpPhaseHooks));
        self.metadata = pack.metadata();
        self.render_hint = Some(pack.render_hint());

        pack.seed_entities(self);
        self.commit(false);

        self.assert_required_systems()?;
        self.validate_phase_declarations();
        self.entities.rebuild_views_if_dirty();
        tracing::info!(mode = %self.mode_id, systems = self.registry.len(), "setup complete");
        Ok(())
    }

    fn assert_required_systems(&self) -> Result<(), EngineError> {
        let missing: Vec<&str> = REQUIRED_SYSTEMS
            .iter()
            .copied()
            .filter(|name| !self.registry.has(name))
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::Setup {
                missing: format!("world pack did not register required systems: {missing:?}"),
            });
        }
        Ok(())
    }

    /// Cross-check declared system phases against the canonical pipeline.
    /// Mismatches are logged, not fatal: a custom pipeline may legitimately
    /// run a system elsewhere.
    fn validate_phase_declarations(&self) {
        let step_names: Vec<&str> = self
            .pipeline
            .as_ref()
            .map(|p| p.step_names())
            .unwrap_or_default();
        for name in self.registry.names() {
            let Some(system) = self.registry.get(name) else {
                continue;
            };
            let Some(phase) = system.phase() else {
                continue;
            };
            if !step_names.contains(&phase.name()) {
                tracing::warn!(
                    system = name,
                    declared_phase = phase.name(),
                    "system declares a phase the pipeline never runs"
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Update loop
    // -----------------------------------------------------------------------

    /// Advance one frame. A no-op while paused.
    pub fn update(&mut self) -> Result<(), EngineError> {
        if self.paused {
            return Ok(());
        }
        let pipeline = self
            .pipeline
            .clone()
            .ok_or_else(|| EngineError::Setup {
                missing: "pipeline not configured; call setup() first".to_owned(),
            })?;

        let frame_before = self.frame_count;
        let mut fc = FrameContext::new();
        for step in pipeline.steps() {
            if let Err(err) = (step.run)(self, &mut fc) {
                // Abort the tick: release the lock, reset phase tracking,
                // and restore the frame counter so callers can tell the
                // frame never completed.
                self.entities.unlock_mutations();
                self.current_phase = None;
                self.frame_count = frame_before;
                tracing::warn!(step = step.name, error = %err, "tick aborted");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Build the disjoint-borrow bundle for a phase body.
    fn split(&mut self, time_modifier: f64, time_of_day: f64) -> Result<Split<'_>, EngineError> {
        let env = self
            .environment
            .as_deref_mut()
            .ok_or_else(|| EngineError::Setup {
                missing: "environment not built; call setup() first".to_owned(),
            })?;
        Ok(Split {
            ctx: KernelCtx {
                frame: self.frame_count,
                time_modifier,
                time_of_day,
                config: &self.config,
                entities: &mut self.entities,
                spatial: &self.spatial,
                mutations: &mut self.mutations,
                bus: &mut self.bus,
                ledger: &self.ledger,
                identity: self.identity.as_mut(),
                env,
                rng: &mut self.rng,
                energy_deltas: &mut self.frame_energy_deltas,
            },
            registry: &mut self.registry,
            hooks: self.hooks.as_mut(),
        })
    }

    /// Drain the mutation queue into the entity manager. `record` selects
    /// whether committed mutations appear in the frame's delta buffers.
    fn commit(&mut self, record: bool) {
        let outputs = if record {
            Some((&mut self.frame_spawns, &mut self.frame_removals))
        } else {
            None
        };
        self.mutations.commit(
            &mut self.entities,
            &mut self.spatial,
            self.identity.as_mut(),
            &mut self.bus,
            outputs,
        );
    }

    // -----------------------------------------------------------------------
    // Pipeline steps
    // -----------------------------------------------------------------------

    /// `frame_start`: bump the frame, clear delta buffers, run frame-start
    /// systems, commit.
    pub fn step_frame_start(&mut self, fc: &mut FrameContext) -> Result<(), EngineError> {
        self.current_phase = Some(Phase::FrameStart);
        self.frame_count += 1;
        self.frame_spawns.clear();
        self.frame_removals.clear();
        self.frame_energy_deltas.clear();

        let mut split = self.split(fc.time_modifier, fc.time_of_day)?;
        split.registry.run_phase(Phase::FrameStart, &mut split.ctx)?;
        drop(split);

        self.commit(true);
        Ok(())
    }

    /// `time_update`: advance the clock and publish time values into the
    /// frame context.
    pub fn step_time_update(&mut self, fc: &mut FrameContext) -> Result<(), EngineError> {
        self.current_phase = Some(Phase::TimeUpdate);
        self.time.advance(self.frame_count);
        fc.time_modifier = self.time.activity_modifier(self.frame_count);
        fc.time_of_day = self.time.time_of_day(self.frame_count);

        let mut split = self.split(fc.time_modifier, fc.time_of_day)?;
        split.registry.run_phase(Phase::TimeUpdate, &mut split.ctx)?;
        drop(split);

        self.commit(true);
        Ok(())
    }

    /// `environment`: refresh ambient modifiers.
    pub fn step_environment(&mut self, fc: &mut FrameContext) -> Result<(), EngineError> {
        self.current_phase = Some(Phase::Environment);
        if let Some(env) = self.environment.as_deref_mut() {
            env.update_detection_modifier(fc.time_of_day);
        }

        let mut split = self.split(fc.time_modifier, fc.time_of_day)?;
        split.registry.run_phase(Phase::Environment, &mut split.ctx)?;
        drop(split);

        self.commit(true);
        Ok(())
    }

    /// `entity_act`: step every entity in canonical order under the
    /// mutation lock; stage offspring and deaths through the hooks.
    pub fn step_entity_act(&mut self, fc: &mut FrameContext) -> Result<(), EngineError> {
        self.current_phase = Some(Phase::EntityAct);
        let (world_w, world_h) = self
            .environment
            .as_ref()
            .map(|e| e.bounds())
            .ok_or_else(|| EngineError::Setup {
                missing: "environment not built; call setup() first".to_owned(),
            })?;

        self.entities.lock_mutations(Phase::EntityAct.name());
        let roster: Vec<EntityHandle> = self.entities.order().to_vec();

        let mut produced: Vec<(Box<dyn Entity>, EntityHandle)> = Vec::new();
        let mut died: Vec<EntityHandle> = Vec::new();
        for handle in &roster {
            let Some(entity) = self.entities.get_mut(*handle) else {
                continue;
            };
            let result = entity.update(self.frame_count, fc.time_modifier, fc.time_of_day);
            entity.constrain_to_bounds(world_w, world_h);
            for spawned in result.spawned {
                produced.push((spawned, *handle));
            }
            if entity.is_dead() {
                died.push(*handle);
            }
        }

        // Filter through the mode hooks while the lock is still held.
        let mut staged_spawns: Vec<StagedSpawn> = Vec::new();
        let mut staged_removals: Vec<EntityHandle> = Vec::new();
        {
            let mut split = self.split(fc.time_modifier, fc.time_of_day)?;
            for (spawned, parent) in produced {
                let decision = split.hooks.on_entity_spawned(&mut split.ctx, spawned, parent);
                if decision.accept {
                    staged_spawns.push(StagedSpawn {
                        entity: decision.entity,
                        parent,
                    });
                } else {
                    tracing::debug!(reason = %decision.reason, "offspring declined by spawn hook");
                }
            }
            for handle in died {
                if split.hooks.on_entity_died(&mut split.ctx, handle) {
                    staged_removals.push(handle);
                }
            }
        }
        fc.staged_spawns = staged_spawns;
        fc.staged_removals = staged_removals;

        if self.phase_debug && self.entities.order() != roster.as_slice() {
            self.entities.unlock_mutations();
            return Err(EngineError::InvariantViolation {
                stage: Phase::EntityAct.name().to_owned(),
                details: "entity roster changed during entity_act".to_owned(),
            });
        }
        self.entities.unlock_mutations();
        Ok(())
    }

    /// `lifecycle`: turn staged deaths and offspring into mutation requests,
    /// run the cleanup hook, commit.
    pub fn step_lifecycle(&mut self, fc: &mut FrameContext) -> Result<(), EngineError> {
        self.current_phase = Some(Phase::Lifecycle);
        let removals = std::mem::take(&mut fc.staged_removals);
        let spawns = std::mem::take(&mut fc.staged_spawns);

        {
            let mut split = self.split(fc.time_modifier, fc.time_of_day)?;
            for handle in removals {
                split.ctx.request_remove(handle, "entity_act", json!({}));
            }
            split.hooks.on_lifecycle_cleanup(&mut split.ctx);
            for staged in spawns {
                let metadata = if let Some(parent) = split.ctx.entities.get(staged.parent) {
                    let parent_id = split.ctx.identity.get_identity(staged.parent, parent);
                    json!({ "parent": parent_id.stable_id })
                } else {
                    json!({})
                };
                split.ctx.request_spawn(staged.entity, "entity_act", metadata);
            }
        }

        self.commit(true);
        Ok(())
    }

    /// `spawn`: run spawning systems, commit, then refresh spatial positions
    /// for everything that moved this frame.
    pub fn step_spawn(&mut self, fc: &mut FrameContext) -> Result<(), EngineError> {
        self.current_phase = Some(Phase::Spawn);
        let mut split = self.split(fc.time_modifier, fc.time_of_day)?;
        split.registry.run_phase(Phase::Spawn, &mut split.ctx)?;
        drop(split);

        self.commit(true);

        let roster: Vec<EntityHandle> = self.entities.order().to_vec();
        let env = self
            .environment
            .as_deref_mut()
            .ok_or_else(|| EngineError::Setup {
                missing: "environment not built; call setup() first".to_owned(),
            })?;
        for handle in roster {
            if let Some(entity) = self.entities.get(handle) {
                env.update_agent_position(&mut self.spatial, handle, entity);
            }
        }
        Ok(())
    }

    /// `collision`: run collision systems, commit.
    pub fn step_collision(&mut self, fc: &mut FrameContext) -> Result<(), EngineError> {
        self.current_phase = Some(Phase::Collision);
        let mut split = self.split(fc.time_modifier, fc.time_of_day)?;
        split.registry.run_phase(Phase::Collision, &mut split.ctx)?;
        drop(split);

        self.commit(true);
        Ok(())
    }

    /// `interaction`: run proximity and interaction systems, commit.
    pub fn step_interaction(&mut self, fc: &mut FrameContext) -> Result<(), EngineError> {
        self.current_phase = Some(Phase::Interaction);
        let mut split = self.split(fc.time_modifier, fc.time_of_day)?;
        split.registry.run_phase(Phase::Interaction, &mut split.ctx)?;
        drop(split);

        self.commit(true);
        Ok(())
    }

    /// `reproduction`: run reproduction systems, commit, then the
    /// completion hook.
    pub fn step_reproduction(&mut self, fc: &mut FrameContext) -> Result<(), EngineError> {
        self.current_phase = Some(Phase::Reproduction);
        let mut split = self.split(fc.time_modifier, fc.time_of_day)?;
        split.registry.run_phase(Phase::Reproduction, &mut split.ctx)?;
        drop(split);

        self.commit(true);

        let mut split = self.split(fc.time_modifier, fc.time_of_day)?;
        split.hooks.on_reproduction_complete(&mut split.ctx);
        Ok(())
    }

    /// `frame_end`: frame-end hook, identity pruning, invariant checks,
    /// view rebuild, phase reset.
    pub fn step_frame_end(&mut self, fc: &mut FrameContext) -> Result<(), EngineError> {
        self.current_phase = Some(Phase::FrameEnd);
        {
            let mut split = self.split(fc.time_modifier, fc.time_of_day)?;
            split.hooks.on_frame_end(&mut split.ctx);
        }

        let live: HashSet<EntityHandle> = self.entities.order().iter().copied().collect();
        self.identity.prune_stale_ids(&live);

        if self.phase_debug {
            let pending_spawns = self.mutations.pending_spawn_count();
            let pending_removals = self.mutations.pending_removal_count();
            if pending_spawns + pending_removals > 0 {
                return Err(EngineError::InvariantViolation {
                    stage: Phase::FrameEnd.name().to_owned(),
                    details: format!(
                        "pending entity mutations remain (spawns={pending_spawns}, removals={pending_removals})"
                    ),
                });
            }
            if let Err(drift) = self.spatial.check_consistency(&self.entities) {
                return Err(EngineError::InvariantViolation {
                    stage: Phase::FrameEnd.name().to_owned(),
                    details: drift,
                });
            }
        }

        self.entities.rebuild_views_if_dirty();
        self.current_phase = None;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mutation API
    // -----------------------------------------------------------------------

    /// Queue a spawn for the next commit point. Safe inside the tick.
    pub fn request_spawn(
        &mut self,
        entity: Box<dyn Entity>,
        reason: &str,
        metadata: serde_json::Value,
    ) -> EntityHandle {
        self.mutations
            .request_spawn(&mut self.entities, entity, reason, metadata)
    }

    /// Queue a removal for the next commit point. Safe inside the tick.
    pub fn request_remove(
        &mut self,
        handle: EntityHandle,
        reason: &str,
        metadata: serde_json::Value,
    ) -> bool {
        self.mutations
            .request_remove(&mut self.entities, handle, reason, metadata)
    }

    pub fn is_pending_removal(&self, handle: EntityHandle) -> bool {
        self.mutations.is_pending_removal(handle)
    }

    /// Privileged direct add for setup and persistence paths.
    ///
    /// Fails with [`EngineError::UnsafeMutation`] during a tick; returns
    /// `Ok(None)` (plus a `SpawnRejected` event) on capacity denial.
    pub fn add_entity(
        &mut self,
        entity: Box<dyn Entity>,
    ) -> Result<Option<EntityHandle>, EngineError> {
        if let Some(phase) = self.current_phase {
            return Err(EngineError::UnsafeMutation {
                phase: phase.name().to_owned(),
            });
        }
        let entity_type = kind_of(entity.as_ref()).to_owned();
        let added = self.entities.add(entity, &mut self.spatial)?;
        if added.is_none() {
            self.bus.emit(&SimEvent::SpawnRejected {
                entity_type,
                reason: "capacity".to_owned(),
            });
        }
        Ok(added)
    }

    /// Privileged direct remove for setup and persistence paths.
    pub fn remove_entity(&mut self, handle: EntityHandle) -> Result<bool, EngineError> {
        if let Some(phase) = self.current_phase {
            return Err(EngineError::UnsafeMutation {
                phase: phase.name().to_owned(),
            });
        }
        self.entities.remove(handle, &mut self.spatial)
    }

    /// Emit a domain event from outside a system (packs, backends). Ledger
    /// deltas land in the current frame's buffer.
    pub fn emit_event(&mut self, event: SimEvent) {
        for delta in self.ledger.apply(&event) {
            match self.entities.get(delta.entity) {
                Some(entity) => {
                    let id = self.identity.get_identity(delta.entity, entity);
                    self.frame_energy_deltas.push(EnergyDeltaRecord {
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

    // -----------------------------------------------------------------------
    // Outputs
    // -----------------------------------------------------------------------

    /// Return this frame's delta lists and clear the internal buffers.
    pub fn drain_frame_outputs(&mut self) -> FrameOutputs {
        FrameOutputs {
            spawns: std::mem::take(&mut self.frame_spawns),
            removals: std::mem::take(&mut self.frame_removals),
            energy_deltas: std::mem::take(&mut self.frame_energy_deltas),
        }
    }

    /// Read-only world snapshot. Entity IDs are IdentityProvider stable IDs.
    pub fn get_snapshot(&mut self) -> WorldSnapshot {
        let (width, height) = self
            .environment
            .as_ref()
            .map(|e| e.bounds())
            .unwrap_or((
                f64::from(self.config.display.width),
                f64::from(self.config.display.height),
            ));

        let mut entities = Vec::with_capacity(self.entities.len());
        let roster: Vec<EntityHandle> = self.entities.order().to_vec();
        for handle in roster {
            let Some(entity) = self.entities.get(handle) else {
                continue;
            };
            let id = self.identity.get_identity(handle, entity);
            let pos = entity.position();
            let (w, h) = entity.size();
            let mut object = serde_json::Map::new();
            object.insert("id".to_owned(), json!(id.stable_id));
            object.insert("type".to_owned(), json!(id.type_name));
            object.insert("x".to_owned(), json!(pos.x));
            object.insert("y".to_owned(), json!(pos.y));
            object.insert("width".to_owned(), json!(w));
            object.insert("height".to_owned(), json!(h));
            if let serde_json::Value::Object(extra) = entity.snapshot() {
                for (key, value) in extra {
                    object.entry(key).or_insert(value);
                }
            }
            entities.push(serde_json::Value::Object(object));
        }

        WorldSnapshot {
            frame: self.frame_count,
            paused: self.paused,
            width,
            height,
            world_type: self.mode_id.clone(),
            render_hint: self
                .render_hint
                .clone()
                .unwrap_or_else(|| RenderHint::new("side", "entity")),
            entities,
            metadata: self.metadata.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn mode_id(&self) -> &str {
        &self.mode_id
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume. Consulted only at the top of `update()`.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn current_phase(&self) -> Option<Phase> {
        self.current_phase
    }

    pub fn phase_description(&self) -> &'static str {
        self.current_phase
            .map(Phase::description)
            .unwrap_or("idle (outside update)")
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    /// Mutable entity access for out-of-tick collaborator state changes.
    /// Collection membership still goes through the request or privileged
    /// APIs.
    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    pub fn spatial(&self) -> &SpatialGrid {
        &self.spatial
    }

    /// Mutable spatial-grid access for setup-time configuration (fast
    /// lanes). Membership maintenance stays with the kernel.
    pub fn spatial_mut(&mut self) -> &mut SpatialGrid {
        &mut self.spatial
    }

    pub fn time(&self) -> &TimeSystem {
        &self.time
    }

    pub fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn identity_mut(&mut self) -> &mut dyn IdentityProvider {
        self.identity.as_mut()
    }

    pub fn contracts(&self) -> &ContractRegistry {
        &self.contracts
    }

    pub fn contracts_mut(&mut self) -> &mut ContractRegistry {
        &mut self.contracts
    }

    pub fn systems(&self) -> &SystemRegistry {
        &self.registry
    }

    /// Register an additional system. Used by packs for mode-specific
    /// systems beyond the core set.
    pub fn register_system(&mut self, system: Box<dyn vivarium_core::system::System>) {
        self.registry.register(system);
    }

    pub fn set_system_enabled(&mut self, name: &str, enabled: bool) -> bool {
        self.registry.set_enabled(name, enabled)
    }

    /// Aggregate debug info: registry systems plus the engine-owned clock.
    pub fn debug_info(&self) -> serde_json::Value {
        let mut info = match self.registry.debug_info() {
            serde_json::Value::Object(map) => map,
            other => {
                let mut m = serde_json::Map::new();
                m.insert("systems".to_owned(), other);
                m
            }
        };
        info.insert("time".to_owned(), self.time.debug_info(self.frame_count));
        info.insert("frame".to_owned(), json!(self.frame_count));
        info.insert("entities".to_owned(), json!(self.entities.len()));
        serde_json::Value::Object(info)
    }
}
