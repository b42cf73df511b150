//! Built-in world modes.
//!
//! `shared` holds the tank-like entity set, hooks, and policies used by both
//! modes; `tank` and `petri` are the packs. Petri reuses the tank wiring
//! with its own identity and render hint.

pub mod petri;
pub mod shared;
pub mod tank;
