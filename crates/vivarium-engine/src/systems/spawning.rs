//! Automatic food spawning.
//!
//! Runs in the `spawn` phase. The spawn interval scales with the state of
//! the ecosystem: a starving population gets food several times faster, a
//! saturated one several times slower. The live-food chance follows the
//! day/night cycle — twilight is peak live-food activity, night somewhat
//! elevated, daytime slightly suppressed. Entity construction is delegated
//! to a mode-provided [`FoodFactory`]; this system only decides *when* and
//! *which kind*.

use rand::Rng;
use serde_json::json;

use vivarium_core::entity::Entity;
use vivarium_core::phase::Phase;
use vivarium_core::rng::SimRng;
use vivarium_core::system::{KernelCtx, System, SystemError, SystemResult};

// ---------------------------------------------------------------------------
// FoodFactory
// ---------------------------------------------------------------------------

/// Builds food entities for the spawning system.
pub trait FoodFactory {
    /// Construct one food entity inside `bounds`. `live` selects the mobile
    /// variant.
    fn spawn_food(&mut self, rng: &mut SimRng, bounds: (f64, f64), live: bool) -> Box<dyn Entity>;
}

/// Live-food chance after the time-of-day adjustment.
///
/// Dawn `[0.15, 0.35)` and dusk `[0.65, 0.85)` are peak live-food windows
/// (x2.2, capped at 0.95); night is moderately elevated (x1.6, capped at
/// 0.85); daytime `[0.35, 0.65)` is slightly suppressed (x0.9, floored at
/// 0.25).
pub fn live_food_chance(base: f64, time_of_day: f64) -> f64 {
    let is_dawn = (0.15..0.35).contains(&time_of_day);
    let is_day = (0.35..0.65).contains(&time_of_day);
    let is_dusk = (0.65..0.85).contains(&time_of_day);

    if is_dawn || is_dusk {
        (base * 2.2).min(0.95)
    } else if is_day {
        (base * 0.9).max(0.25)
    } else {
        (base * 1.6).min(0.85)
    }
}

// ---------------------------------------------------------------------------
// FoodSpawningSystem
// ---------------------------------------------------------------------------

/// Spawns food on a state-scaled interval.
pub struct FoodSpawningSystem {
    /// Kind tag counted against the food cap.
    food_tag: String,
    /// Kind tag whose population and total energy drive the interval.
    agent_tag: String,
    factory: Box<dyn FoodFactory>,
    spawned: u64,
    live_spawned: u64,
}

impl FoodSpawningSystem {
    pub fn new(food_tag: &str, agent_tag: &str, factory: Box<dyn FoodFactory>) -> Self {
        Self {
            food_tag: food_tag.to_owned(),
            agent_tag: agent_tag.to_owned(),
            factory,
            spawned: 0,
            live_spawned: 0,
        }
    }

    /// Current spawn interval in frames, derived from the threshold table.
    fn interval(&self, ctx: &KernelCtx<'_>) -> u64 {
        let config = &ctx.config.food;
        let base = u64::from(config.base_interval.max(1));
        let total_energy = ctx.entities.total_energy_of(&self.agent_tag);
        let population = ctx.entities.count_type(&self.agent_tag);

        if total_energy < config.ultra_low_energy_threshold {
            return (base / 4).max(1);
        }
        if total_energy < config.low_energy_threshold {
            return (base / 3).max(1);
        }
        if total_energy > config.high_energy_threshold_2 || population > config.high_pop_threshold_2
        {
            return base * 3;
        }
        if total_energy > config.high_energy_threshold_1 || population > config.high_pop_threshold_1
        {
            return (base as f64 * 1.67) as u64;
        }
        base
    }
}

impl System for FoodSpawningSystem {
    fn name(&self) -> &str {
        "food_spawning"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Spawn)
    }

    fn update(&mut self, ctx: &mut KernelCtx<'_>) -> Result<SystemResult, SystemError> {
        let mut result = SystemResult::default();

        let interval = self.interval(ctx);
        if ctx.frame % interval != 0 {
            return Ok(result);
        }
        if ctx.entities.count_type(&self.food_tag) >= ctx.config.food.max_food {
            result.details.insert("capped".to_owned(), json!(1));
            return Ok(result);
        }

        let chance = live_food_chance(ctx.config.food.live_food_chance, ctx.time_of_day);
        let live = ctx.rng.gen_bool(chance);
        let bounds = ctx.env.bounds();
        let entity = self.factory.spawn_food(ctx.rng, bounds, live);
        ctx.request_spawn(entity, "auto_spawn", json!({ "live": live }));

        self.spawned += 1;
        if live {
            self.live_spawned += 1;
        }
        result.entities_spawned = 1;
        Ok(result)
    }

    fn debug_info(&self) -> serde_json::Value {
        json!({
            "spawned": self.spawned,
            "live_spawned": self.live_spawned,
            "food_tag": self.food_tag,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twilight_boosts_live_food() {
        // Dawn and dusk multiply the base chance.
        assert!((live_food_chance(0.15, 0.20) - 0.33).abs() < 1e-12);
        assert!((live_food_chance(0.15, 0.70) - 0.33).abs() < 1e-12);
        // Capped at 0.95 for generous base chances.
        assert_eq!(live_food_chance(0.9, 0.25), 0.95);
    }

    #[test]
    fn night_moderately_elevated() {
        assert!((live_food_chance(0.15, 0.0) - 0.24).abs() < 1e-12);
        assert!((live_food_chance(0.15, 0.95) - 0.24).abs() < 1e-12);
        assert_eq!(live_food_chance(0.9, 0.05), 0.85);
    }

    #[test]
    fn daytime_slightly_suppressed_with_floor() {
        // A generous base chance shrinks during the day...
        assert!((live_food_chance(0.5, 0.5) - 0.45).abs() < 1e-12);
        // ...but never below the daytime floor.
        assert_eq!(live_food_chance(0.15, 0.5), 0.25);
    }

    #[test]
    fn band_edges_follow_half_open_ranges() {
        // 0.15 and 0.65 open the dawn/dusk windows; 0.35 opens day;
        // 0.85 falls back to night.
        assert_eq!(live_food_chance(0.2, 0.15), (0.2f64 * 2.2).min(0.95));
        assert_eq!(live_food_chance(0.2, 0.35), 0.25);
        assert_eq!(live_food_chance(0.2, 0.65), (0.2f64 * 2.2).min(0.95));
        assert_eq!(live_food_chance(0.2, 0.85), (0.2f64 * 1.6).min(0.85));
    }
}
