//! Run a seeded tank world headless and print per-frame activity.
//!
//! ```sh
//! cargo run --example headless_run
//! ```

use anyhow::Result;
use vivarium_engine::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = KernelConfig::seeded(42);
    let mut pack = WorldRegistry::create_pack(WorldType::Tank, &config);
    let mut engine = SimulationEngine::new(config)?;
    engine.setup(pack.as_mut())?;

    println!("run {} ({} entities seeded)", engine.run_id(), engine.entities().len());

    for _ in 0..600 {
        engine.update()?;
        let outputs = engine.drain_frame_outputs();
        if !outputs.spawns.is_empty() || !outputs.removals.is_empty() {
            println!(
                "frame {:>4}: +{} -{} entities, {} energy deltas",
                engine.frame_count(),
                outputs.spawns.len(),
                outputs.removals.len(),
                outputs.energy_deltas.len(),
            );
        }
    }

    let snapshot = engine.get_snapshot();
    println!(
        "after {} frames: {} entities, state hash {}",
        snapshot.frame,
        snapshot.entities.len(),
        snapshot.state_hash()
    );
    Ok(())
}
