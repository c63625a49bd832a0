//! The physiological actor: one body stepped one frame at a time.
//!
//! Every frame runs the same nine stages in the same order:
//!
//! 1. appraise stimuli into an instantaneous emotion
//! 2. integrate mood and attach it to the emotion
//! 3. step the spinal cord from desired torques and last frame's feedback
//! 4. let designated emotion channels drive designated muscles
//! 5. step every muscle
//! 6. step every tendon
//! 7. step metabolism (every fourth frame)
//! 8. integrate the skeleton under muscle torque
//! 9. emit the pose with fatigue tremor and hand a sample to the sink
//!
//! Feedback between frames flows only through component state. The only
//! parallelism is inside stages (fibers in 5, segments in 3, joints in 8).

use crate::governor::{LoadGovernor, TierChange};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use soma_body::{ArticulatedSkeleton, MetabolicSystem, Muscle, MuscleParams, Tendon};
use soma_core::math::{safe_div, sanitize_f32, unit};
use soma_core::{
    quantize_angle, Accuracy, EmotionProfile, FeatureFlags, FrameSample, SomaConfig, SomaError,
    TelemetrySink, Vec3,
};
use soma_limbic::{CognitiveAppraiser, MoodDynamics, Stimulus};
use soma_spinal::{SegmentFeedback, SpinalCord};
use std::time::Instant;

/// Frames between metabolic updates.
pub const METABOLIC_INTERVAL: u64 = 4;
/// Root-joint z-rotation amplitude per unit fatigue, rad.
const TREMOR_AMPLITUDE: f32 = 0.1;
/// Below this fatigue the pose is emitted without tremor.
const TREMOR_THRESHOLD: f32 = 0.01;

/// What the host hands the actor each frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameInput {
    /// One signed torque per spinal segment, flexion positive.
    pub desired_torques: Vec<f32>,
    pub stimuli: Vec<Stimulus>,
    /// Seconds since the previous frame.
    pub dt: f32,
}

impl FrameInput {
    pub fn new(desired_torques: Vec<f32>, dt: f32) -> Self {
        Self {
            desired_torques,
            stimuli: Vec::new(),
            dt,
        }
    }

    #[must_use]
    pub fn with_stimulus(mut self, stimulus: Stimulus) -> Self {
        self.stimuli.push(stimulus);
        self
    }
}

/// What the actor reports back, overwritten every frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameOutput {
    /// Euler angles per joint, tremor included.
    pub joint_angles: Vec<Vec3>,
    /// Per-muscle activation after emotion overrides, `[0, 1]`.
    pub muscle_activations: Vec<f32>,
    /// `[0, 1]`
    pub fatigue: f32,
    /// Borg 6–20.
    pub perceived_exertion: f32,
}

pub struct PhysiologicalActor {
    features: FeatureFlags,
    config: SomaConfig,

    appraiser: CognitiveAppraiser,
    mood: MoodDynamics,
    emotion: EmotionProfile,

    cord: SpinalCord,
    /// Stage-3 activations before overrides. Kept when a frame's torque
    /// vector is rejected.
    drive: Vec<f32>,

    muscles: Vec<Muscle>,
    tendons: Vec<Tendon>,
    metabolism: MetabolicSystem,
    skeleton: ArticulatedSkeleton,

    governor: LoadGovernor,
    rng: StdRng,

    output: FrameOutput,
    frame: u64,
    time: f64,
    metabolic_dt: f32,
    metabolic_activation: f32,
}

impl PhysiologicalActor {
    /// Build a body from `config`. Fails only on an inconsistent anatomy or
    /// budget.
    pub fn new(config: SomaConfig) -> Result<Self, SomaError> {
        config.validate()?;
        let anatomy = config.anatomy.clone();
        let accuracy = config.accuracy;

        tracing::info!(
            "Building actor: {} muscles, {} joints, {} fibers/muscle, {:?} accuracy \
             (age {}, height {} m, mass {} kg, fitness {}, fast fibers {})",
            anatomy.muscle_count,
            anatomy.joint_count,
            anatomy.fibers_per_muscle,
            accuracy,
            config.human.age_years,
            config.human.height_m,
            config.human.mass_kg,
            config.human.fitness,
            config.human.fiber_composition,
        );

        let params = MuscleParams::default().with_fast_fraction(config.human.fiber_composition);
        let muscles = (0..anatomy.muscle_count)
            .map(|_| Muscle::new(params.clone(), anatomy.fibers_per_muscle, accuracy))
            .collect();
        let tendons = (0..anatomy.muscle_count)
            .map(|_| {
                let mut t = Tendon::new();
                if accuracy.linear_tendon() {
                    t.set_linear_mode();
                }
                t
            })
            .collect();
        let skeleton = ArticulatedSkeleton::new(anatomy.joint_count);

        Ok(Self {
            features: config.features,
            appraiser: CognitiveAppraiser::new(config.appraisal.clone()),
            mood: MoodDynamics::new(config.mood.clone()),
            emotion: EmotionProfile::neutral(),
            cord: SpinalCord::new(anatomy.segment_count(), anatomy.neurons_per_pool),
            drive: vec![0.0; anatomy.muscle_count],
            muscles,
            tendons,
            metabolism: MetabolicSystem::new(),
            governor: LoadGovernor::new(config.budget.clone(), accuracy),
            rng: StdRng::seed_from_u64(config.seed),
            output: FrameOutput {
                joint_angles: skeleton.joint_angles(),
                muscle_activations: vec![0.0; anatomy.muscle_count],
                fatigue: 0.0,
                perceived_exertion: 6.0,
            },
            skeleton,
            frame: 0,
            time: 0.0,
            metabolic_dt: 0.0,
            metabolic_activation: 0.0,
            config,
        })
    }

    pub fn config(&self) -> &SomaConfig {
        &self.config
    }

    /// Tier the muscles currently run at. Differs from the configured tier
    /// only while the load governor has stepped it down.
    pub fn accuracy(&self) -> Accuracy {
        self.governor.accuracy()
    }

    /// Whether the next frame runs with half-amplitude fibers.
    pub fn is_throttled(&self) -> bool {
        self.features.thermal_throttling && self.governor.throttled()
    }

    pub fn emotion(&self) -> &EmotionProfile {
        &self.emotion
    }

    pub fn mood(&self) -> &MoodDynamics {
        &self.mood
    }

    pub fn cord(&self) -> &SpinalCord {
        &self.cord
    }

    pub fn muscles(&self) -> &[Muscle] {
        &self.muscles
    }

    pub fn tendons(&self) -> &[Tendon] {
        &self.tendons
    }

    pub fn metabolism(&self) -> &MetabolicSystem {
        &self.metabolism
    }

    pub fn skeleton(&self) -> &ArticulatedSkeleton {
        &self.skeleton
    }

    pub fn skeleton_mut(&mut self) -> &mut ArticulatedSkeleton {
        &mut self.skeleton
    }

    pub fn output(&self) -> &FrameOutput {
        &self.output
    }

    /// Frames stepped so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Simulated seconds so far.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Wall-clock cost of the last frame, milliseconds.
    pub fn last_frame_ms(&self) -> f64 {
        self.governor.last_frame_ms()
    }

    /// Advance one frame. The sink, when given, receives exactly one sample;
    /// its failures are logged and otherwise ignored.
    pub fn step(
        &mut self,
        input: &FrameInput,
        sink: Option<&mut dyn TelemetrySink>,
    ) -> &FrameOutput {
        let started = Instant::now();
        let dt = sanitize_f32(input.dt, 0.0).max(0.0);
        let throttled = self.is_throttled();

        self.appraise(input, dt);
        self.spinal(input, dt);
        let activations = self.emotion_overrides();
        self.step_muscles(&activations, dt, throttled);
        if self.features.hysteresis {
            self.step_tendons(dt);
        }
        self.frame += 1;
        if self.features.metabolism {
            self.step_metabolism(&activations, dt);
        }
        self.step_skeleton(dt);
        self.emit(activations, dt, sink);

        if self.features.thermal_throttling {
            let elapsed = started.elapsed().as_secs_f64() * 1000.0;
            match self.governor.observe(elapsed) {
                TierChange::Keep => {}
                TierChange::Downgrade(tier) | TierChange::Upgrade(tier) => self.rebuild(tier),
            }
        }
        &self.output
    }

    /// Stages 1 and 2.
    fn appraise(&mut self, input: &FrameInput, dt: f32) {
        if !self.features.emotion {
            self.emotion = EmotionProfile::neutral();
            self.cord.set_emotional_modulation(0.0);
            return;
        }
        let instant = self.appraiser.appraise_all(&input.stimuli, &self.mood.state());
        self.mood.update(dt, &instant);
        self.emotion = instant;
        self.emotion.mood = self.mood.state();
        self.emotion.clamp();
        // Gain takes effect on this frame's spinal step
        self.cord.set_emotional_modulation(self.emotion.primary.fear);
    }

    /// Stage 3. A torque vector of the wrong length leaves the drive as it
    /// was last frame.
    fn spinal(&mut self, input: &FrameInput, dt: f32) {
        let torques = &input.desired_torques;
        if torques.len() != self.cord.len() {
            tracing::debug!(
                "Frame {}: {} desired torques for {} segments, spinal stage skipped",
                self.frame,
                torques.len(),
                self.cord.len()
            );
            return;
        }

        if !self.features.neural_reflex {
            for (i, &t) in torques.iter().enumerate() {
                let t = sanitize_f32(t, 0.0).clamp(-1.0, 1.0);
                self.drive[2 * i] = t.max(0.0);
                self.drive[2 * i + 1] = (-t).max(0.0);
            }
            return;
        }

        // Flexion is +z, which shortens the flexor, so its stretch is -z
        let feedback: Vec<SegmentFeedback> = (0..self.cord.len())
            .map(|i| {
                let joint = &self.skeleton.joints()[i];
                SegmentFeedback {
                    angle: -joint.angle().z,
                    velocity: -joint.velocity().z,
                    flexor_tendon: self.tendons[2 * i].normalized_force(),
                    extensor_tendon: self.tendons[2 * i + 1].normalized_force(),
                }
            })
            .collect();
        if self.cord.step(torques, &feedback, dt) {
            self.drive = self.cord.muscle_activations();
        }
    }

    /// Stage 4.
    fn emotion_overrides(&self) -> Vec<f32> {
        let mut activations = self.drive.clone();
        if !self.features.emotion {
            return activations;
        }
        for o in &self.config.emotion_overrides {
            if let Some(a) = activations.get_mut(o.muscle) {
                *a = a.max(unit(o.gain * self.emotion.channel(o.channel)));
            }
        }
        activations
    }

    /// Stage 5. Muscle 2i flexes joint i and shortens as it flexes; muscle
    /// 2i + 1 extends it.
    fn step_muscles(&mut self, activations: &[f32], dt: f32, throttled: bool) {
        let joints = self.skeleton.joints();
        for (m, muscle) in self.muscles.iter_mut().enumerate() {
            let omega = joints.get(m / 2).map_or(0.0, |j| j.velocity().z);
            let sign = if m % 2 == 0 { -1.0 } else { 1.0 };
            let velocity = sign * omega * muscle.params().moment_arm;
            muscle.step(activations[m], velocity, dt, throttled);
        }
    }

    /// Stage 6.
    fn step_tendons(&mut self, dt: f32) {
        for (tendon, muscle) in self.tendons.iter_mut().zip(&self.muscles) {
            let rest = muscle.params().rest_length;
            let strain_rate = safe_div(muscle.velocity(), rest);
            tendon.step(muscle.force(), strain_rate, dt);
        }
    }

    /// Stage 7. Runs on every fourth frame over the dt accumulated since the
    /// last run and the mean of the per-frame mean activations.
    fn step_metabolism(&mut self, activations: &[f32], dt: f32) {
        let mean = if activations.is_empty() {
            0.0
        } else {
            activations.iter().sum::<f32>() / activations.len() as f32
        };
        self.metabolic_dt += dt;
        self.metabolic_activation += mean;
        if self.frame % METABOLIC_INTERVAL == 0 {
            let activation = self.metabolic_activation / METABOLIC_INTERVAL as f32;
            self.metabolism.update(activation, self.metabolic_dt);
            self.metabolic_dt = 0.0;
            self.metabolic_activation = 0.0;
        }
    }

    /// Stage 8.
    fn step_skeleton(&mut self, dt: f32) {
        let mut torques = vec![Vec3::zeros(); self.skeleton.len()];
        for (i, torque) in torques.iter_mut().enumerate().take(self.cord.len()) {
            let flexor = &self.muscles[2 * i];
            let extensor = &self.muscles[2 * i + 1];
            torque.z = (flexor.force() - extensor.force()) * flexor.params().moment_arm;
        }
        self.skeleton.step(&torques, dt);
    }

    /// Stage 9.
    fn emit(&mut self, activations: Vec<f32>, dt: f32, sink: Option<&mut dyn TelemetrySink>) {
        self.time += f64::from(dt);

        let fatigue = if self.features.fatigue {
            self.metabolism.fatigue()
        } else {
            0.0
        };
        let mut angles = self.skeleton.joint_angles();
        if fatigue > TREMOR_THRESHOLD {
            if let Some(root) = angles.first_mut() {
                let noise: f32 = self.rng.gen_range(-1.0..=1.0);
                root.z += TREMOR_AMPLITUDE * fatigue * noise;
            }
        }

        self.output = FrameOutput {
            joint_angles: angles,
            muscle_activations: activations,
            fatigue,
            perceived_exertion: self.metabolism.perceived_exertion(),
        };

        if let Some(sink) = sink {
            let sample = self.sample();
            if let Err(e) = sink.record(sample) {
                tracing::warn!("Telemetry sample {} dropped: {}", self.frame, e);
            }
        }
    }

    fn sample(&self) -> FrameSample {
        FrameSample {
            timestamp: self.time,
            emotion: self.emotion.to_vector().to_vec(),
            metabolism: self.metabolism.state_vector(),
            muscle_activations: self.output.muscle_activations.clone(),
            pose: self
                .output
                .joint_angles
                .iter()
                .flat_map(|a| [quantize_angle(a.x), quantize_angle(a.y), quantize_angle(a.z)])
                .collect(),
        }
    }

    /// Move every muscle onto the grid of `tier`. Tendons follow the tier's
    /// linear/viscoelastic mode.
    fn rebuild(&mut self, tier: Accuracy) {
        tracing::debug!("Frame {}: rebuilding muscles at {:?}", self.frame, tier);
        for muscle in &mut self.muscles {
            muscle.rebuild_at_resolution(tier);
        }
        for tendon in &mut self.tendons {
            if tier.linear_tendon() {
                tendon.set_linear_mode();
            } else if tendon.is_linear() {
                tendon.set_viscoelastic_mode();
            }
        }
    }
}
