//! Built-in simulation systems.
//!
//! Each system owns the phase mechanics and delegates domain behavior to a
//! mode-provided policy trait, so the kernel never learns what a "fish" is.

pub mod collision;
pub mod interaction;
pub mod lifecycle;
pub mod reproduction;
pub mod spawning;
pub mod time;

pub use collision::{CollisionPolicy, CollisionSystem};
pub use interaction::{
    Encounter, EncounterQueue, InteractionDriver, InteractionProximitySystem, InteractionSystem,
    ProximityPolicy,
};
pub use lifecycle::LifecycleSystem;
pub use reproduction::{ReproductionPolicy, ReproductionSystem};
pub use spawning::{live_food_chance, FoodFactory, FoodSpawningSystem};
pub use time::TimeSystem;
