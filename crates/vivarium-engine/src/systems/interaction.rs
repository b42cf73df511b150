//! Proximity-driven social interactions.
//!
//! The `interaction` phase runs two systems:
//!
//! 1. [`InteractionProximitySystem`] finds encounter groups (a seeker plus
//!    the partners inside its sensing radius, scaled by the environment's
//!    detection modifier) and passes them to the mode's
//!    [`ProximityPolicy`] — typically to enqueue them on a shared
//!    [`EncounterQueue`].
//! 2. [`InteractionSystem`] drains whatever the mode staged through its
//!    [`InteractionDriver`] — the actual game/contest logic is an external
//!    collaborator the kernel knows nothing about.

use serde_json::json;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use vivarium_core::entity::EntityHandle;
use vivarium_core::phase::Phase;
use vivarium_core::system::{KernelCtx, System, SystemError, SystemResult};

// ---------------------------------------------------------------------------
// Encounter
// ---------------------------------------------------------------------------

/// A seeker and the partners found within its sensing radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Encounter {
    pub seeker: EntityHandle,
    pub partners: Vec<EntityHandle>,
}

/// Shared staging queue between the proximity pass and the driver. The
/// engine is single-threaded, so `Rc<RefCell>` is the whole story.
pub type EncounterQueue = Rc<RefCell<VecDeque<Encounter>>>;

/// A fresh, empty encounter queue.
pub fn encounter_queue() -> EncounterQueue {
    Rc::new(RefCell::new(VecDeque::new()))
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Decides what to do with an encounter group (usually: stage it).
pub trait ProximityPolicy {
    fn on_encounter(
        &mut self,
        ctx: &mut KernelCtx<'_>,
        encounter: &Encounter,
    ) -> Result<(), SystemError>;
}

/// Runs the mode's interaction logic over whatever was staged this frame.
pub trait InteractionDriver {
    fn run(&mut self, ctx: &mut KernelCtx<'_>) -> Result<SystemResult, SystemError>;
}

// ---------------------------------------------------------------------------
// InteractionProximitySystem
// ---------------------------------------------------------------------------

/// Finds encounter groups via spatial queries.
pub struct InteractionProximitySystem {
    seeker_tag: String,
    partner_tags: Vec<String>,
    radius: f64,
    policy: Box<dyn ProximityPolicy>,
    encounters: u64,
}

impl InteractionProximitySystem {
    pub fn new(
        seeker_tag: &str,
        partner_tags: &[&str],
        radius: f64,
        policy: Box<dyn ProximityPolicy>,
    ) -> Self {
        Self {
            seeker_tag: seeker_tag.to_owned(),
            partner_tags: partner_tags.iter().map(|t| (*t).to_owned()).collect(),
            radius,
            policy,
            encounters: 0,
        }
    }
}

impl System for InteractionProximitySystem {
    fn name(&self) -> &str {
        "interaction_proximity"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Interaction)
    }

    fn update(&mut self, ctx: &mut KernelCtx<'_>) -> Result<SystemResult, SystemError> {
        let mut result = SystemResult::default();
        let radius = self.radius * ctx.env.detection_modifier();
        let seekers: Vec<EntityHandle> = ctx.entities.view(&self.seeker_tag).to_vec();
        let tags: Vec<&str> = self.partner_tags.iter().map(String::as_str).collect();

        for seeker in seekers {
            if ctx.mutations.is_pending_removal(seeker) {
                continue;
            }
            let partners =
                ctx.spatial
                    .query_interaction_candidates(ctx.entities, seeker, radius, &tags);
            if partners.is_empty() {
                continue;
            }
            let encounter = Encounter { seeker, partners };
            self.policy.on_encounter(ctx, &encounter)?;
            self.encounters += 1;
            result.entities_affected += 1;
        }

        result
            .details
            .insert("radius".to_owned(), json!(radius));
        Ok(result)
    }

    fn debug_info(&self) -> serde_json::Value {
        json!({
            "encounters": self.encounters,
            "seeker_tag": self.seeker_tag,
            "base_radius": self.radius,
        })
    }
}

// ---------------------------------------------------------------------------
// InteractionSystem
// ---------------------------------------------------------------------------

/// Drains staged encounters through the mode's interaction logic.
pub struct InteractionSystem {
    driver: Box<dyn InteractionDriver>,
}

impl InteractionSystem {
    pub fn new(driver: Box<dyn InteractionDriver>) -> Self {
        Self { driver }
    }
}

impl System for InteractionSystem {
    fn name(&self) -> &str {
        "interaction"
    }

    fn phase(&self) -> Option<Phase> {
        Some(Phase::Interaction)
    }

    fn update(&mut self, ctx: &mut KernelCtx<'_>) -> Result<SystemResult, SystemError> {
        self.driver.run(ctx)
    }
}
