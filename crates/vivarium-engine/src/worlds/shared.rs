//! Shared building blocks for the tank-like world modes.
//!
//! Everything here is mode territory: concrete entity types (swimmers,
//! flora, nectar, pellets), the phase hooks, the population cap, and the
//! policies plugged into the built-in systems. The kernel sees none of
//! these types — only the protocols they implement.
//!
//! Entities that need randomness own a [`SimRng`] forked from the engine
//! RNG at construction, which keeps interleaved multi-engine runs
//! deterministic.

use rand::Rng;
use serde_json::json;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use vivarium_core::entity::{kind_of, Entity, EntityHandle, UpdateResult, Vec2};
use vivarium_core::env::Environment;
use vivarium_core::events::SimEvent;
use vivarium_core::manager::{CapacityOracle, EntityManager};
use vivarium_core::rng::SimRng;
use vivarium_core::system::{KernelCtx, SystemError, SystemResult};

use crate::hooks::{PhaseHooks, SpawnDecision};
use crate::pack::AgentContract;
use crate::systems::collision::CollisionPolicy;
use crate::systems::interaction::{Encounter, EncounterQueue, InteractionDriver, ProximityPolicy};
use crate::systems::reproduction::ReproductionPolicy;
use crate::systems::spawning::FoodFactory;

// ---------------------------------------------------------------------------
// Kind tags and identity bands
// ---------------------------------------------------------------------------

pub const FISH_TAG: &str = "fish";
pub const PLANT_TAG: &str = "plant";
pub const FOOD_TAG: &str = "food";
pub const NECTAR_TAG: &str = "nectar";

/// ID band offsets shared by the tank-like modes.
pub fn identity_offsets() -> Vec<(String, u64)> {
    vec![
        (FISH_TAG.to_owned(), 0),
        (PLANT_TAG.to_owned(), 1_000_000),
        (FOOD_TAG.to_owned(), 3_000_000),
        (NECTAR_TAG.to_owned(), 4_000_000),
    ]
}

/// Monotonic intrinsic-ID source shared between seeding and reproduction.
pub type IdCounter = Rc<RefCell<u64>>;

pub fn id_counter() -> IdCounter {
    Rc::new(RefCell::new(0))
}

fn next_id(counter: &IdCounter) -> u64 {
    let mut slot = counter.borrow_mut();
    let id = *slot;
    *slot += 1;
    id
}

// ---------------------------------------------------------------------------
// Swimmer
// ---------------------------------------------------------------------------

/// The mobile agent. Wanders with its own forked RNG, burns energy while
/// moving, dies when the tank runs it dry.
pub struct Swimmer {
    id: u64,
    pos: Vec2,
    heading: Vec2,
    energy: f64,
    age: u64,
    rng: SimRng,
}

impl Swimmer {
    pub const WIDTH: f64 = 26.0;
    pub const HEIGHT: f64 = 14.0;

    pub fn new(id: u64, pos: Vec2, energy: f64, rng: SimRng) -> Self {
        Self {
            id,
            pos,
            heading: Vec2::new(0.6, 0.0),
            energy,
            age: 0,
            rng,
        }
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn gain_energy(&mut self, amount: f64) {
        self.energy += amount;
    }

    pub fn spend_energy(&mut self, amount: f64) {
        self.energy -= amount;
    }
}

impl Entity for Swimmer {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> (f64, f64) {
        (Self::WIDTH, Self::HEIGHT)
    }

    fn is_dead(&self) -> bool {
        self.energy <= 0.0
    }

    fn update(&mut self, _frame: u64, time_modifier: f64, _time_of_day: f64) -> UpdateResult {
        self.age += 1;
        if self.is_dead() {
            // Dying animation: drift in place until the lifecycle system
            // removes us.
            return UpdateResult::none();
        }

        // Re-pick a heading now and then.
        if self.rng.gen_range(0u32..24) == 0 {
            let angle = self.rng.gen_range(0.0..std::f64::consts::TAU);
            let speed = self.rng.gen_range(0.4..1.6);
            self.heading = Vec2::new(angle.cos() * speed, angle.sin() * speed);
        }
        self.pos.x += self.heading.x * time_modifier;
        self.pos.y += self.heading.y * time_modifier;

        // Base metabolism plus activity-scaled movement cost.
        self.energy -= 0.05 + 0.03 * time_modifier;

        UpdateResult::none()
    }

    fn constrain_to_bounds(&mut self, width: f64, height: f64) {
        self.pos.x = self.pos.x.clamp(0.0, width - Self::WIDTH);
        self.pos.y = self.pos.y.clamp(0.0, height - Self::HEIGHT);
    }

    fn snapshot_type(&self) -> Option<&str> {
        Some(FISH_TAG)
    }

    fn entity_id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn energy(&self) -> Option<f64> {
        Some(self.energy)
    }

    fn snapshot(&self) -> serde_json::Value {
        json!({ "energy": self.energy, "age": self.age })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Flora
// ---------------------------------------------------------------------------

/// Rooted producer. Photosynthesizes with daylight and periodically sprouts
/// nectar through `UpdateResult::spawned`.
pub struct Flora {
    id: u64,
    pos: Vec2,
    energy: f64,
    nectar_interval: u64,
    phase_offset: u64,
    rng: SimRng,
}

impl Flora {
    pub const WIDTH: f64 = 18.0;
    pub const HEIGHT: f64 = 30.0;
    const NECTAR_COST: f64 = 5.0;

    pub fn new(id: u64, pos: Vec2, rng: SimRng) -> Self {
        Self {
            id,
            pos,
            energy: 40.0,
            nectar_interval: 240,
            phase_offset: (id * 37) % 240,
            rng,
        }
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn gain_energy(&mut self, amount: f64) {
        self.energy += amount;
    }

    pub fn spend_energy(&mut self, amount: f64) {
        self.energy -= amount;
    }
}

impl Entity for Flora {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> (f64, f64) {
        (Self::WIDTH, Self::HEIGHT)
    }

    fn is_dead(&self) -> bool {
        self.energy <= 0.0
    }

    fn update(&mut self, frame: u64, time_modifier: f64, _time_of_day: f64) -> UpdateResult {
        self.energy += 0.04 * time_modifier;

        if frame % self.nectar_interval == self.phase_offset && self.energy > 20.0 {
            self.energy -= Self::NECTAR_COST;
            let dx = self.rng.gen_range(-12.0..12.0);
            let nectar = Nectar::new(Vec2::new(self.pos.x + dx, self.pos.y - 6.0));
            return UpdateResult::with_spawned(vec![Box::new(nectar)]);
        }
        UpdateResult::none()
    }

    fn constrain_to_bounds(&mut self, width: f64, height: f64) {
        self.pos.x = self.pos.x.clamp(0.0, width - Self::WIDTH);
        self.pos.y = self.pos.y.clamp(0.0, height - Self::HEIGHT);
    }

    fn snapshot_type(&self) -> Option<&str> {
        Some(PLANT_TAG)
    }

    fn entity_id(&self) -> Option<u64> {
        Some(self.id)
    }

    fn energy(&self) -> Option<f64> {
        Some(self.energy)
    }

    fn snapshot(&self) -> serde_json::Value {
        json!({ "energy": self.energy })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Nectar
// ---------------------------------------------------------------------------

/// Drifting plant product. Expires unconsumed after a while.
pub struct Nectar {
    pos: Vec2,
    age: u64,
    consumed: bool,
}

impl Nectar {
    pub const SIZE: f64 = 5.0;
    pub const ENERGY_VALUE: f64 = 6.0;
    const TTL: u64 = 600;

    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            age: 0,
            consumed: false,
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub fn consume(&mut self) -> f64 {
        self.consumed = true;
        Self::ENERGY_VALUE
    }
}

impl Entity for Nectar {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> (f64, f64) {
        (Self::SIZE, Self::SIZE)
    }

    fn is_dead(&self) -> bool {
        self.consumed || self.age > Self::TTL
    }

    fn update(&mut self, _frame: u64, _tm: f64, _tod: f64) -> UpdateResult {
        self.age += 1;
        self.pos.y += 0.2;
        UpdateResult::none()
    }

    fn constrain_to_bounds(&mut self, width: f64, height: f64) {
        self.pos.x = self.pos.x.clamp(0.0, width - Self::SIZE);
        self.pos.y = self.pos.y.min(height - Self::SIZE);
    }

    fn snapshot_type(&self) -> Option<&str> {
        Some(NECTAR_TAG)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Pellet
// ---------------------------------------------------------------------------

/// Sinking food. The live variant wiggles sideways while it sinks.
pub struct Pellet {
    pos: Vec2,
    live: bool,
    age: u64,
    consumed: bool,
    rng: SimRng,
}

impl Pellet {
    pub const SIZE: f64 = 6.0;
    pub const ENERGY_VALUE: f64 = 10.0;

    pub fn new(pos: Vec2, live: bool, rng: SimRng) -> Self {
        Self {
            pos,
            live,
            age: 0,
            consumed: false,
            rng,
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub fn consume(&mut self) -> f64 {
        self.consumed = true;
        Self::ENERGY_VALUE
    }

    pub fn is_live(&self) -> bool {
        self.live
    }
}

impl Entity for Pellet {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> (f64, f64) {
        (Self::SIZE, Self::SIZE)
    }

    fn is_dead(&self) -> bool {
        self.consumed
    }

    fn update(&mut self, _frame: u64, _tm: f64, _tod: f64) -> UpdateResult {
        self.age += 1;
        self.pos.y += 0.8;
        if self.live {
            self.pos.x += self.rng.gen_range(-0.6..0.6);
        }
        UpdateResult::none()
    }

    fn constrain_to_bounds(&mut self, width: f64, _height: f64) {
        // Deliberately not clamped at the bottom: the off-screen cleanup in
        // the lifecycle hook removes pellets that sink out of the world.
        self.pos.x = self.pos.x.clamp(0.0, width - Self::SIZE);
    }

    fn snapshot_type(&self) -> Option<&str> {
        Some(FOOD_TAG)
    }

    fn snapshot(&self) -> serde_json::Value {
        json!({ "live": self.live })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ---------------------------------------------------------------------------
// TankEnvironment
// ---------------------------------------------------------------------------

/// Rectangular water column. Detection range dips at night.
pub struct TankEnvironment {
    width: f64,
    height: f64,
    detection: f64,
}

impl TankEnvironment {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            detection: 1.0,
        }
    }
}

impl Environment for TankEnvironment {
    fn bounds(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn update_detection_modifier(&mut self, time_of_day: f64) {
        let daylight = 0.5 - 0.5 * (std::f64::consts::TAU * time_of_day).cos();
        self.detection = 0.6 + 0.4 * daylight;
    }

    fn detection_modifier(&self) -> f64 {
        self.detection
    }
}

// ---------------------------------------------------------------------------
// PopulationCap
// ---------------------------------------------------------------------------

/// Admission policy: at most `max` entities of `tag`.
pub struct PopulationCap {
    pub tag: String,
    pub max: usize,
}

impl CapacityOracle for PopulationCap {
    fn admit(&self, manager: &EntityManager, entity: &dyn Entity) -> bool {
        kind_of(entity) != self.tag || manager.count_type(&self.tag) < self.max
    }
}

// ---------------------------------------------------------------------------
// EcosystemPhaseHooks
// ---------------------------------------------------------------------------

/// Tank-like phase hooks: population cap on agent offspring, deferred agent
/// removal (death animation), immediate removal for everything else,
/// off-screen-bottom cleanup for sunk food.
pub struct EcosystemPhaseHooks {
    /// Deaths already announced on the bus, to avoid repeats while an agent
    /// plays its death animation.
    announced: HashSet<EntityHandle>,
}

impl EcosystemPhaseHooks {
    pub fn new() -> Self {
        Self {
            announced: HashSet::new(),
        }
    }
}

impl Default for EcosystemPhaseHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseHooks for EcosystemPhaseHooks {
    fn on_entity_spawned(
        &mut self,
        ctx: &mut KernelCtx<'_>,
        spawned: Box<dyn Entity>,
        _parent: EntityHandle,
    ) -> SpawnDecision {
        if kind_of(spawned.as_ref()) == FISH_TAG
            && ctx.entities.count_type(FISH_TAG) >= ctx.config.max_population
        {
            return SpawnDecision::reject(spawned, "population_cap");
        }
        SpawnDecision::accept(spawned)
    }

    fn on_entity_died(&mut self, ctx: &mut KernelCtx<'_>, entity: EntityHandle) -> bool {
        self.announced.retain(|h| ctx.entities.contains(*h));
        let Some(kind) = ctx.entities.get(entity).map(|e| kind_of(e).to_owned()) else {
            return false;
        };
        if self.announced.insert(entity) {
            ctx.emit(SimEvent::EntityDied {
                entity,
                cause: "energy_depleted".to_owned(),
            });
        }
        // Agents linger for their death animation; the lifecycle system
        // requests their removal when the timer lapses.
        kind != FISH_TAG
    }

    fn on_lifecycle_cleanup(&mut self, ctx: &mut KernelCtx<'_>) {
        let (_, height) = ctx.env.bounds();
        let sunk: Vec<EntityHandle> = ctx
            .entities
            .iter()
            .filter(|(_, e)| {
                let tag = kind_of(*e);
                tag == FOOD_TAG || tag == NECTAR_TAG
            })
            .filter(|(_, e)| e.position().y >= height - e.size().1)
            .map(|(h, _)| h)
            .collect();
        for handle in sunk {
            ctx.request_remove(handle, "off_screen", json!({}));
        }
    }

    fn on_frame_end(&mut self, ctx: &mut KernelCtx<'_>) {
        if ctx.frame % 300 == 0 {
            tracing::debug!(
                frame = ctx.frame,
                fish = ctx.entities.count_type(FISH_TAG),
                food = ctx.entities.count_type(FOOD_TAG),
                plants = ctx.entities.count_type(PLANT_TAG),
                "population census"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// GrazeCollisionPolicy
// ---------------------------------------------------------------------------

/// Agents eat pellets and nectar on contact.
pub struct GrazeCollisionPolicy;

impl CollisionPolicy for GrazeCollisionPolicy {
    fn on_collision(
        &mut self,
        ctx: &mut KernelCtx<'_>,
        mover: EntityHandle,
        other: EntityHandle,
    ) -> Result<(), SystemError> {
        let food_type = match ctx.entities.get(other).map(kind_of) {
            Some(tag) if tag == FOOD_TAG || tag == NECTAR_TAG => tag.to_owned(),
            _ => return Ok(()),
        };

        let Some((eater, meal)) = ctx.entities.get_pair_mut(mover, other) else {
            return Ok(());
        };
        let Some(swimmer) = eater.as_any_mut().downcast_mut::<Swimmer>() else {
            return Ok(());
        };

        let gained = if let Some(pellet) = meal.as_any_mut().downcast_mut::<Pellet>() {
            if pellet.is_consumed() {
                return Ok(());
            }
            pellet.consume()
        } else if let Some(nectar) = meal.as_any_mut().downcast_mut::<Nectar>() {
            if nectar.is_consumed() {
                return Ok(());
            }
            nectar.consume()
        } else {
            return Ok(());
        };

        swimmer.gain_energy(gained);
        ctx.emit(SimEvent::AteFood {
            entity: mover,
            food: other,
            food_type,
            energy_gained: gained,
        });
        ctx.request_remove(other, "eaten", json!({}));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Encounter staging and the contest driver
// ---------------------------------------------------------------------------

/// Proximity policy that stages encounters for the interaction driver.
pub struct StageEncounters {
    queue: EncounterQueue,
}

impl StageEncounters {
    pub fn new(queue: EncounterQueue) -> Self {
        Self { queue }
    }
}

impl ProximityPolicy for StageEncounters {
    fn on_encounter(
        &mut self,
        _ctx: &mut KernelCtx<'_>,
        encounter: &Encounter,
    ) -> Result<(), SystemError> {
        self.queue.borrow_mut().push_back(encounter.clone());
        Ok(())
    }
}

/// Plays a simple energy contest between a seeker and its first available
/// partner. A stand-in for richer interaction games; the kernel only ever
/// sees the `GamePlayed` events and the mutation requests.
pub struct ContestDriver {
    queue: EncounterQueue,
    stake: f64,
    cooldown: u64,
    last_played: HashMap<EntityHandle, u64>,
}

impl ContestDriver {
    pub fn new(queue: EncounterQueue) -> Self {
        Self {
            queue,
            stake: 2.5,
            cooldown: 45,
            last_played: HashMap::new(),
        }
    }

    fn on_cooldown(&self, handle: EntityHandle, frame: u64) -> bool {
        self.last_played
            .get(&handle)
            .map_or(false, |last| frame.saturating_sub(*last) < self.cooldown)
    }
}

impl InteractionDriver for ContestDriver {
    fn run(&mut self, ctx: &mut KernelCtx<'_>) -> Result<SystemResult, SystemError> {
        let mut result = SystemResult::default();
        self.last_played.retain(|h, _| ctx.entities.contains(*h));

        let staged: Vec<Encounter> = self.queue.borrow_mut().drain(..).collect();
        for encounter in staged {
            let seeker = encounter.seeker;
            if self.on_cooldown(seeker, ctx.frame) || ctx.mutations.is_pending_removal(seeker) {
                continue;
            }
            let Some(partner) = encounter.partners.iter().copied().find(|p| {
                !ctx.mutations.is_pending_removal(*p)
                    && !self.on_cooldown(*p, ctx.frame)
                    && ctx.entities.contains(*p)
            }) else {
                continue;
            };

            let opponent_type = match ctx.entities.get(partner).map(kind_of) {
                Some(tag) => tag.to_owned(),
                None => continue,
            };
            // Plants are easier opponents than other agents.
            let win_chance = if opponent_type == PLANT_TAG { 0.6 } else { 0.5 };
            let seeker_wins = ctx.rng.gen_bool(win_chance);

            let Some((seeker_entity, partner_entity)) = ctx.entities.get_pair_mut(seeker, partner)
            else {
                continue;
            };
            let Some(challenger) = seeker_entity.as_any_mut().downcast_mut::<Swimmer>() else {
                continue;
            };
            let stake = self.stake;
            let transferred =
                if let Some(rival) = partner_entity.as_any_mut().downcast_mut::<Swimmer>() {
                    if seeker_wins {
                        rival.spend_energy(stake);
                        challenger.gain_energy(stake);
                    } else {
                        rival.gain_energy(stake);
                        challenger.spend_energy(stake);
                    }
                    true
                } else if let Some(plant) = partner_entity.as_any_mut().downcast_mut::<Flora>() {
                    if seeker_wins {
                        plant.spend_energy(stake);
                        challenger.gain_energy(stake);
                    } else {
                        plant.gain_energy(stake);
                        challenger.spend_energy(stake);
                    }
                    true
                } else {
                    false
                };
            if !transferred {
                continue;
            }

            let energy_change = if seeker_wins { stake } else { -stake };
            ctx.emit(SimEvent::GamePlayed {
                entity: seeker,
                opponent_type,
                energy_change,
                won: seeker_wins,
            });
            self.last_played.insert(seeker, ctx.frame);
            self.last_played.insert(partner, ctx.frame);
            result.entities_affected += 2;
            result.events_emitted += 1;
        }

        result
            .details
            .insert("contests".to_owned(), json!(result.events_emitted));
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// PairReproductionPolicy
// ---------------------------------------------------------------------------

/// Pairs energetic, mature agents; each pair invests energy into one
/// offspring. Offspring enter through the request API, so the capacity
/// oracle still applies (rejected offspring cost the parents anyway).
pub struct PairReproductionPolicy {
    next_id: IdCounter,
    energy_threshold: f64,
    cost: f64,
    min_age: u64,
}

impl PairReproductionPolicy {
    pub fn new(next_id: IdCounter) -> Self {
        Self {
            next_id,
            energy_threshold: 140.0,
            cost: 45.0,
            min_age: 300,
        }
    }
}

impl ReproductionPolicy for PairReproductionPolicy {
    fn reproduce(&mut self, ctx: &mut KernelCtx<'_>) -> Result<SystemResult, SystemError> {
        let mut result = SystemResult::default();

        let fish: Vec<EntityHandle> = ctx.entities.view(FISH_TAG).to_vec();
        let mut ready: Vec<EntityHandle> = Vec::new();
        for handle in fish {
            if ctx.mutations.is_pending_removal(handle) {
                continue;
            }
            let Some(entity) = ctx.entities.get(handle) else {
                continue;
            };
            let Some(swimmer) = entity.as_any().downcast_ref::<Swimmer>() else {
                continue;
            };
            if swimmer.energy() >= self.energy_threshold && swimmer.age() >= self.min_age {
                ready.push(handle);
            }
        }

        for pair in ready.chunks(2) {
            if pair.len() < 2 {
                break;
            }
            let (a, b) = (pair[0], pair[1]);
            let Some((first, second)) = ctx.entities.get_pair_mut(a, b) else {
                continue;
            };
            let (Some(mother), Some(father)) = (
                first.as_any_mut().downcast_mut::<Swimmer>(),
                second.as_any_mut().downcast_mut::<Swimmer>(),
            ) else {
                continue;
            };
            mother.spend_energy(self.cost);
            father.spend_energy(self.cost);
            let midpoint = Vec2::new(
                (mother.position().x + father.position().x) / 2.0,
                (mother.position().y + father.position().y) / 2.0,
            );

            let child_id = next_id(&self.next_id);
            let child_rng = ctx.rng.fork();
            let child = Swimmer::new(child_id, midpoint, self.cost, child_rng);
            ctx.request_spawn(Box::new(child), "reproduction", json!({}));
            result.entities_spawned += 1;
            result.entities_affected += 2;
        }

        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// PelletFactory
// ---------------------------------------------------------------------------

/// Drops pellets in from the surface at a random x.
pub struct PelletFactory;

impl FoodFactory for PelletFactory {
    fn spawn_food(&mut self, rng: &mut SimRng, bounds: (f64, f64), live: bool) -> Box<dyn Entity> {
        let (width, _) = bounds;
        let x = rng.gen_range(0.0..(width - Pellet::SIZE).max(1.0));
        let pellet_rng = rng.fork();
        Box::new(Pellet::new(Vec2::new(x, 0.0), live, pellet_rng))
    }
}

// ---------------------------------------------------------------------------
// SteeringContract
// ---------------------------------------------------------------------------

/// Action translator for externally driven agents: clamps a raw steering
/// vector into the unit box.
pub struct SteeringContract;

impl AgentContract for SteeringContract {
    fn name(&self) -> &str {
        "steering"
    }

    fn translate_action(&self, _agent_id: &str, action: &serde_json::Value) -> serde_json::Value {
        let dx = action.get("dx").and_then(|v| v.as_f64()).unwrap_or(0.0);
        let dy = action.get("dy").and_then(|v| v.as_f64()).unwrap_or(0.0);
        json!({
            "dx": dx.clamp(-1.0, 1.0),
            "dy": dy.clamp(-1.0, 1.0),
        })
    }
}

// ---------------------------------------------------------------------------
// Seeding helpers
// ---------------------------------------------------------------------------

/// Deterministic seed population used by both modes.
pub struct SeedPlan {
    pub swimmers: usize,
    pub flora: usize,
    pub pellets: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            swimmers: 12,
            flora: 3,
            pellets: 6,
        }
    }
}

/// Enqueue the initial population through the engine's request API.
pub fn seed_population(
    engine: &mut crate::engine::SimulationEngine,
    plan: &SeedPlan,
    fish_ids: &IdCounter,
    plant_ids: &IdCounter,
) {
    let (width, height) = (
        f64::from(engine.config().display.width),
        f64::from(engine.config().display.height),
    );

    for _ in 0..plan.swimmers {
        let x = engine.rng_mut().gen_range(0.0..width - Swimmer::WIDTH);
        let y = engine.rng_mut().gen_range(0.0..height - Swimmer::HEIGHT);
        let rng = engine.rng_mut().fork();
        let swimmer = Swimmer::new(next_id(fish_ids), Vec2::new(x, y), 100.0, rng);
        engine.request_spawn(Box::new(swimmer), "seed", json!({}));
    }

    for _ in 0..plan.flora {
        let x = engine.rng_mut().gen_range(0.0..width - Flora::WIDTH);
        let y = height - Flora::HEIGHT;
        let rng = engine.rng_mut().fork();
        let flora = Flora::new(next_id(plant_ids), Vec2::new(x, y), rng);
        engine.request_spawn(Box::new(flora), "seed", json!({}));
    }

    for _ in 0..plan.pellets {
        let x = engine.rng_mut().gen_range(0.0..width - Pellet::SIZE);
        let y = engine.rng_mut().gen_range(0.0..height / 2.0);
        let rng = engine.rng_mut().fork();
        let pellet = Pellet::new(Vec2::new(x, y), false, rng);
        engine.request_spawn(Box::new(pellet), "seed", json!({}));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
