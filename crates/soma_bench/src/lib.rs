//! soma_bench: trajectory tests for the whole body over long simulated spans.
//!
//! Validates emergent behaviour rather than single steps:
//! - ten minutes of mixed input stays finite and inside every bound
//! - a threat produces a flinch, a stress spike and a return to baseline
//! - sustained effort fatigues the body and rest recovers it
//! - mood decays with its configured half-lives over hours and days

use soma_actor::{FrameInput, FrameOutput, PhysiologicalActor, Stimulus, StimulusKind};
use soma_core::{AnatomyConfig, SomaConfig};

/// Step `actor` for `frames` frames of `dt` seconds, building each frame's
/// input from its index. Returns the last output.
pub fn simulate<F>(actor: &mut PhysiologicalActor, frames: usize, dt: f32, mut scenario: F) -> FrameOutput
where
    F: FnMut(usize, f32) -> FrameInput,
{
    for i in 0..frames {
        let input = scenario(i, dt);
        actor.step(&input, None);
    }
    actor.output().clone()
}

/// Small body used by the trajectory tests: three segments, eight fibers.
pub fn bench_config() -> SomaConfig {
    SomaConfig {
        anatomy: AnatomyConfig {
            muscle_count: 6,
            joint_count: 4,
            fibers_per_muscle: 8,
            neurons_per_pool: 16,
        },
        ..SomaConfig::default()
    }
}

/// Sinusoidal reaching torques, one per segment, phase-shifted.
pub fn sinusoidal_torques(segments: usize, t: f32) -> Vec<f32> {
    (0..segments)
        .map(|s| 0.6 * (1.3 * t + s as f32).sin())
        .collect()
}

/// A sudden, unfamiliar, unpredictable threat.
pub fn sudden_threat() -> Stimulus {
    Stimulus::new(StimulusKind::Threat, 1.0, 1.0)
        .with_familiarity(0.0)
        .with_predictability(0.0)
}
