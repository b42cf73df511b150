//! Kernel configuration.
//!
//! A [`KernelConfig`] is passed by value into the engine constructor; there
//! are no global defaults modules and no environment-variable surface apart
//! from the single phase-debug override ([`PHASE_DEBUG_ENV`]).

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Environment variable that forces the phase-debug invariant assertions on
/// (useful for tests against release builds).
pub const PHASE_DEBUG_ENV: &str = "VIVARIUM_ENFORCE_PHASE_INVARIANTS";

// ---------------------------------------------------------------------------
// DisplayConfig
// ---------------------------------------------------------------------------

/// World extents and nominal frame rate.
///
/// The frame rate is informational only (time modulation); the engine never
/// sleeps or reads a clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            frame_rate: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// FoodSpawnConfig
// ---------------------------------------------------------------------------

/// Spawn-rate tuning for the food spawning system.
///
/// `base_interval` is the frame interval between automatic spawns; the
/// thresholds scale it down when the ecosystem is starving and up when it is
/// saturated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodSpawnConfig {
    /// Frames between spawns at nominal conditions.
    pub base_interval: u32,
    /// Total agent energy below which spawning runs at `interval / 4`.
    pub ultra_low_energy_threshold: f64,
    /// Total agent energy below which spawning runs at `interval / 3`.
    pub low_energy_threshold: f64,
    /// Total agent energy above which spawning slows to `interval * 1.67`.
    pub high_energy_threshold_1: f64,
    /// Total agent energy above which spawning slows to `interval * 3`.
    pub high_energy_threshold_2: f64,
    /// Agent population above which spawning slows to `interval * 1.67`.
    pub high_pop_threshold_1: usize,
    /// Agent population above which spawning slows to `interval * 3`.
    pub high_pop_threshold_2: usize,
    /// Probability that a spawn produces live (mobile) food.
    pub live_food_chance: f64,
    /// Hard cap on concurrently present food entities.
    pub max_food: usize,
}

impl Default for FoodSpawnConfig {
    fn default() -> Self {
        Self {
            base_interval: 90,
            ultra_low_energy_threshold: 500.0,
            low_energy_threshold: 1500.0,
            high_energy_threshold_1: 6000.0,
            high_energy_threshold_2: 12000.0,
            high_pop_threshold_1: 40,
            high_pop_threshold_2: 70,
            live_food_chance: 0.15,
            max_food: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// KernelConfig
// ---------------------------------------------------------------------------

/// Full kernel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Root seed. `None` draws one from OS entropy; the drawn seed is
    /// recorded in the engine's `run_id`.
    pub seed: Option<u64>,
    pub display: DisplayConfig,
    /// Population cap for the mode's primary agent kind.
    pub max_population: usize,
    pub food: FoodSpawnConfig,
    /// Frames per full day/night cycle.
    pub time_cycle_frames: u32,
    /// Spatial grid cell size in world units. Must be positive.
    pub spatial_cell_size: u32,
    /// Frames a dead agent lingers before the lifecycle system requests its
    /// removal (death animation). 45 frames is 1.5 s at 30 fps.
    pub death_effect_frames: u32,
    /// Eagerly enable the frame-end invariant assertions. Always on in debug
    /// builds; also forced on by [`PHASE_DEBUG_ENV`].
    pub enable_phase_debug: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            seed: None,
            display: DisplayConfig::default(),
            max_population: 60,
            food: FoodSpawnConfig::default(),
            time_cycle_frames: 1800,
            spatial_cell_size: 150,
            death_effect_frames: 45,
            enable_phase_debug: false,
        }
    }
}

impl KernelConfig {
    /// A config with a fixed seed and everything else at defaults.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Validate invariants that would otherwise surface as confusing
    /// downstream failures.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.display.width == 0 || self.display.height == 0 {
            return Err(EngineError::Setup {
                missing: "display extents must be positive".to_owned(),
            });
        }
        if self.spatial_cell_size == 0 {
            return Err(EngineError::Setup {
                missing: "spatial_cell_size must be positive".to_owned(),
            });
        }
        if self.time_cycle_frames == 0 {
            return Err(EngineError::Setup {
                missing: "time_cycle_frames must be positive".to_owned(),
            });
        }
        if !(0.0..=1.0).contains(&self.food.live_food_chance) {
            return Err(EngineError::Setup {
                missing: "food.live_food_chance must be within [0, 1]".to_owned(),
            });
        }
        Ok(())
    }

    /// Whether the phase-debug assertions should run, considering the config
    /// flag, the environment override, and the build profile.
    pub fn phase_debug_effective(&self) -> bool {
        if cfg!(debug_assertions) || self.enable_phase_debug {
            return true;
        }
        std::env::var(PHASE_DEBUG_ENV).map(|v| v == "1").unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(KernelConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_cell_size_rejected() {
        let mut config = KernelConfig::default();
        config.spatial_cell_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_extent_rejected() {
        let mut config = KernelConfig::default();
        config.display.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_live_food_chance_rejected() {
        let mut config = KernelConfig::default();
        config.food.live_food_chance = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = KernelConfig::seeded(42);
        let json = serde_json::to_string(&config).unwrap();
        let back: KernelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seed, Some(42));
        assert_eq!(back.display.width, config.display.width);
        assert_eq!(back.food.base_interval, config.food.base_interval);
    }
}
