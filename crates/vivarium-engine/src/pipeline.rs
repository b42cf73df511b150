//! Pluggable update pipeline.
//!
//! The pipeline is an ordered list of named steps executed once per frame.
//! Each step is a plain function pointer taking the engine and the frame
//! context; the default pipeline reproduces the canonical ten-step cycle
//! with its commit points. Modes may substitute their own pipeline through
//! `WorldPack::pipeline`, but should reproduce these semantics unless they
//! have a reason not to.

use vivarium_core::EngineError;

use crate::engine::SimulationEngine;
use crate::frame::FrameContext;

/// A pipeline step body.
pub type StepFn = fn(&mut SimulationEngine, &mut FrameContext) -> Result<(), EngineError>;

// ---------------------------------------------------------------------------
// PipelineStep
// ---------------------------------------------------------------------------

/// A single named step in the engine update pipeline.
#[derive(Clone)]
pub struct PipelineStep {
    pub name: &'static str,
    pub run: StepFn,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Ordered sequence of steps that defines the update loop.
#[derive(Clone)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
}

impl Pipeline {
    pub fn new(steps: Vec<PipelineStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name).collect()
    }
}

/// The canonical ten-step pipeline.
pub fn default_pipeline() -> Pipeline {
    Pipeline::new(vec![
        PipelineStep {
            name: "frame_start",
            run: SimulationEngine::step_frame_start,
        },
        PipelineStep {
            name: "time_update",
            run: SimulationEngine::step_time_update,
        },
        PipelineStep {
            name: "environment",
            run: SimulationEngine::step_environment,
        },
        PipelineStep {
            name: "entity_act",
            run: SimulationEngine::step_entity_act,
        },
        PipelineStep {
            name: "lifecycle",
            run: SimulationEngine::step_lifecycle,
        },
        PipelineStep {
            name: "spawn",
            run: SimulationEngine::step_spawn,
        },
        PipelineStep {
            name: "collision",
            run: SimulationEngine::step_collision,
        },
        PipelineStep {
            name: "interaction",
            run: SimulationEngine::step_interaction,
        },
        PipelineStep {
            name: "reproduction",
            run: SimulationEngine::step_reproduction,
        },
        PipelineStep {
            name: "frame_end",
            run: SimulationEngine::step_frame_end,
        },
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pipeline_has_canonical_order() {
        let pipeline = default_pipeline();
        assert_eq!(
            pipeline.step_names(),
            vec![
                "frame_start",
                "time_update",
                "environment",
                "entity_act",
                "lifecycle",
                "spawn",
                "collision",
                "interaction",
                "reproduction",
                "frame_end",
            ]
        );
    }
}
