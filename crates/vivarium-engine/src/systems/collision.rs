//! Collision detection.
//!
//! Runs in the `collision` phase. Iterates the mobile fast-lane kind, pulls
//! contact candidates through the fused spatial query, confirms overlap with
//! an AABB test, and hands confirmed contacts to the mode's
//! [`CollisionPolicy`]. The policy may mutate entity state and must surface
//! every membership change through the request API — never directly.

use serde_json::json;

use vivarium_core::entity::{aabb_overlap, EntityHandle};
use vivarium_core::phase::Phase;
use vivarium_core::system::{KernelCtx, System, SystemError, SystemResult};

// ---------------------------------------------------------------------------
// CollisionPolicy
// ---------------------------------------------------------------------------

/// Mode-side contact resolution (eating, damage, pickup...).
pub trait CollisionPolicy {
    fn on_collision(
        &mut self,
        ctx: &mut KernelCtx<'_>,
        mover: EntityHandle,
        other: EntityHandle,
    ) -> Result<(), SystemError>;
}

// ---------------------------------------------------------------------------
// CollisionSystem
// ---------------------------------------------------------------------------

/// Pairs the mobile kind against candidate kinds and resolves contacts.
pub struct CollisionSystem {
    mobile_tag: String,
    candidate_tags: Vec<String>,
    /// Candidate-gathering radius; the AABB test decides actual contact.
    radius: f64,
    policy: Box<dyn CollisionPolicy>,
    contacts: u64,
}

impl CollisionSystem {
    pub fn new(
        mobile_tag: &str,
        candidate_tags: &[&str],
        radius: f64,
        policy: Box<dyn CollisionPolicy>,
    ) -> Self {
        Self {
            mobile_tag: mobile_tag.to_owned(),
            candidate_tags: candidate_tags.iter().map(|t| (*t).to_owned()).collect(),
            radius,
            policy,
            contacts: 0,
        }
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &str {
        "collision"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Collision)
    }

    fn update(&mut self, ctx: &mut KernelCtx<'_>) -> Result<SystemResult, SystemError> {
        let mut result = SystemResult::default();
        let movers: Vec<EntityHandle> = ctx.entities.view(&self.mobile_tag).to_vec();
        let tags: Vec<&str> = self.candidate_tags.iter().map(String::as_str).collect();

        for mover in movers {
            if ctx.mutations.is_pending_removal(mover) {
                continue;
            }
            let candidates =
                ctx.spatial
                    .query_interaction_candidates(ctx.entities, mover, self.radius, &tags);
            for candidate in candidates {
                if ctx.mutations.is_pending_removal(candidate)
                    || ctx.mutations.is_pending_removal(mover)
                {
                    continue;
                }
                let touching = match (ctx.entities.get(mover), ctx.entities.get(candidate)) {
                    (Some(a), Some(b)) => aabb_overlap(a, b),
                    _ => false,
                };
                if !touching {
                    continue;
                }
                self.policy.on_collision(ctx, mover, candidate)?;
                self.contacts += 1;
                result.entities_affected += 2;
                result.events_emitted += 1;
            }
        }

        Ok(result)
    }

    fn debug_info(&self) -> serde_json::Value {
        json!({
            "contacts": self.contacts,
            "mobile_tag": self.mobile_tag,
            "radius": self.radius,
        })
    }
}
