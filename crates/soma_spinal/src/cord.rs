use crate::segment::{SegmentFeedback, SpinalSegment};
use crate::FULL_ACTIVATION_HZ;
use rayon::prelude::*;

/// All spinal segments of one body.
#[derive(Debug, Clone)]
pub struct SpinalCord {
    segments: Vec<SpinalSegment>,
}

impl SpinalCord {
    pub fn new(segment_count: usize, neurons_per_pool: usize) -> Self {
        Self {
            segments: (0..segment_count)
                .map(|_| SpinalSegment::new(neurons_per_pool))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[SpinalSegment] {
        &self.segments
    }

    pub fn set_emotional_modulation(&mut self, fear: f32) {
        for seg in &mut self.segments {
            seg.set_emotional_modulation(fear);
        }
    }

    /// Step every segment. Returns `false` (and changes nothing) when the
    /// torque vector does not have one entry per segment. A feedback slice of
    /// the wrong length is ignored and zero feedback is used instead.
    ///
    /// Segments are independent, so the result does not depend on how rayon
    /// schedules them.
    pub fn step(&mut self, desired_torques: &[f32], feedback: &[SegmentFeedback], dt: f32) -> bool {
        if desired_torques.len() != self.segments.len() {
            tracing::debug!(
                "Spinal step skipped: {} torques for {} segments",
                desired_torques.len(),
                self.segments.len()
            );
            return false;
        }
        let use_feedback = feedback.len() == self.segments.len();
        if !use_feedback && !feedback.is_empty() {
            tracing::debug!(
                "Spinal feedback ignored: {} entries for {} segments",
                feedback.len(),
                self.segments.len()
            );
        }
        let zero = SegmentFeedback::default();

        self.segments
            .par_iter_mut()
            .zip(desired_torques.par_iter())
            .enumerate()
            .for_each(|(i, (seg, &torque))| {
                let fb = if use_feedback { &feedback[i] } else { &zero };
                seg.step(torque, fb, dt);
            });
        true
    }

    /// Net firing rate per segment, Hz.
    pub fn net_activations(&self) -> Vec<f32> {
        self.segments.iter().map(SpinalSegment::net_activation).collect()
    }

    /// Muscle activations, two per segment: `[2i]` flexor, `[2i + 1]` extensor.
    /// The net rate is normalised by [`FULL_ACTIVATION_HZ`], clamped to
    /// `[-1, 1]` and split into its non-negative parts.
    pub fn muscle_activations(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.segments.len() * 2);
        for seg in &self.segments {
            let net = (seg.net_activation() / FULL_ACTIVATION_HZ).clamp(-1.0, 1.0);
            out.push(net.max(0.0));
            out.push((-net).max(0.0));
        }
        out
    }

    /// Mean neuron fatigue over both pools of every segment.
    pub fn mean_fatigue(&self) -> f32 {
        if self.segments.is_empty() {
            return 0.0;
        }
        let sum: f32 = self
            .segments
            .iter()
            .map(|s| 0.5 * (s.flexor.mean_fatigue() + s.extensor.mean_fatigue()))
            .sum();
        sum / self.segments.len() as f32
    }
}
