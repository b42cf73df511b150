//! Reproduction.
//!
//! Runs in the `reproduction` phase. Mating rules, genome mixing, and
//! offspring construction are all mode territory ([`ReproductionPolicy`]);
//! the system is just the phase slot with counters.

use serde_json::json;

use vivarium_core::phase::Phase;
use vivarium_core::system::{KernelCtx, System, SystemError, SystemResult};

// ---------------------------------------------------------------------------
// ReproductionPolicy
// ---------------------------------------------------------------------------

/// Mode-side reproduction logic. Offspring enter through the request API.
pub trait ReproductionPolicy {
    fn reproduce(&mut self, ctx: &mut KernelCtx<'_>) -> Result<SystemResult, SystemError>;
}

// ---------------------------------------------------------------------------
// ReproductionSystem
// ---------------------------------------------------------------------------

pub struct ReproductionSystem {
    policy: Box<dyn ReproductionPolicy>,
    offspring: u64,
}

impl ReproductionSystem {
    pub fn new(policy: Box<dyn ReproductionPolicy>) -> Self {
        Self {
            policy,
            offspring: 0,
        }
    }
}

impl System for ReproductionSystem {
    fn name(&self) -> &str {
        "reproduction"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Reproduction)
    }

    fn update(&mut self, ctx: &mut KernelCtx<'_>) -> Result<SystemResult, SystemError> {
        let result = self.policy.reproduce(ctx)?;
        self.offspring += u64::from(result.entities_spawned);
        Ok(result)
    }

    fn debug_info(&self) -> serde_json::Value {
        json!({ "offspring": self.offspring })
    }
}
