use crate::pool::MotorNeuronPool;
use serde::{Deserialize, Serialize};
use soma_core::math::unit;

/// Length error gain of the muscle spindle, per radian.
const SPINDLE_LENGTH_GAIN: f32 = 100.0;
/// Velocity gain of the muscle spindle, per rad/s.
const SPINDLE_VELOCITY_GAIN: f32 = 5.0;
const RENSHAW_STRENGTH: f32 = 0.3;
/// Extra stretch-reflex gain at maximum fear.
const FEAR_GAMMA_GAIN: f32 = 0.5;

/// Proprioceptive state of the joint a segment drives, from the previous frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentFeedback {
    /// Joint angle measured as flexor stretch: positive when the flexor is
    /// lengthened, rad.
    pub angle: f32,
    /// Rate of flexor stretch, rad/s.
    pub velocity: f32,
    /// Normalised tendon force of the flexor, `[0, 1]`.
    pub flexor_tendon: f32,
    /// Normalised tendon force of the extensor, `[0, 1]`.
    pub extensor_tendon: f32,
}

/// Antagonist pair: one flexor pool and one extensor pool for one joint.
#[derive(Debug, Clone)]
pub struct SpinalSegment {
    pub flexor: MotorNeuronPool,
    pub extensor: MotorNeuronPool,
    /// Joint angle the stretch reflex defends, rad.
    pub setpoint: f32,
    gamma_gain: f32,
}

impl SpinalSegment {
    pub fn new(neurons_per_pool: usize) -> Self {
        Self {
            flexor: MotorNeuronPool::new(neurons_per_pool),
            extensor: MotorNeuronPool::new(neurons_per_pool),
            setpoint: 0.0,
            gamma_gain: 1.0,
        }
    }

    /// Fear sensitises the spindles. Applies from the next [`step`](Self::step).
    pub fn set_emotional_modulation(&mut self, fear: f32) {
        self.gamma_gain = 1.0 + FEAR_GAMMA_GAIN * unit(fear);
    }

    pub fn gamma_gain(&self) -> f32 {
        self.gamma_gain
    }

    pub fn step(&mut self, desired_torque: f32, feedback: &SegmentFeedback, dt: f32) {
        let spindle = self.gamma_gain
            * (SPINDLE_LENGTH_GAIN * (feedback.angle - self.setpoint)
                + SPINDLE_VELOCITY_GAIN * feedback.velocity);
        self.flexor.set_spindle_feedback(spindle);
        self.extensor.set_spindle_feedback(-spindle);

        self.flexor.set_central_drive(desired_torque.max(0.0));
        self.extensor.set_central_drive((-desired_torque).max(0.0));

        self.flexor.set_tendon_force(feedback.flexor_tendon);
        self.extensor.set_tendon_force(feedback.extensor_tendon);
        self.flexor.update_ib_inhibition();
        self.extensor.update_ib_inhibition();

        // Recurrent inhibition from the antagonist's output before this step
        let flexor_rate = self.flexor.mean_rate();
        let extensor_rate = self.extensor.mean_rate();
        self.flexor.reset_renshaw();
        self.extensor.reset_renshaw();
        self.flexor.add_renshaw_inhibition(RENSHAW_STRENGTH * extensor_rate);
        self.extensor.add_renshaw_inhibition(RENSHAW_STRENGTH * flexor_rate);

        self.flexor.step(dt);
        self.extensor.step(dt);
    }

    /// Flexor minus extensor mean rate, Hz.
    pub fn net_activation(&self) -> f32 {
        self.flexor.mean_rate() - self.extensor.mean_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_torque_drives_flexor() {
        let mut seg = SpinalSegment::new(100);
        seg.step(0.8, &SegmentFeedback::default(), 0.01);
        assert!(seg.flexor.mean_rate() > 0.0);
        assert_eq!(seg.extensor.mean_rate(), 0.0);
        assert!(seg.net_activation() > 0.0);
    }

    #[test]
    fn test_negative_torque_drives_extensor() {
        let mut seg = SpinalSegment::new(100);
        seg.step(-0.8, &SegmentFeedback::default(), 0.01);
        assert!(seg.net_activation() < 0.0);
    }

    #[test]
    fn test_stretch_reflex_recruits_flexor() {
        let mut seg = SpinalSegment::new(100);
        let fb = SegmentFeedback {
            angle: 0.01,
            ..SegmentFeedback::default()
        };
        seg.step(0.0, &fb, 0.01);
        // spindle = 100 × 0.01 = 1.0; drive = 0.3
        assert!((seg.flexor.net_drive() - 0.3).abs() < 1e-5);
        assert!(seg.flexor.mean_rate() > 0.0);
        assert_eq!(seg.extensor.mean_rate(), 0.0);
    }

    #[test]
    fn test_fear_gain_applies_next_step() {
        let fb = SegmentFeedback {
            angle: 0.01,
            ..SegmentFeedback::default()
        };
        let mut seg = SpinalSegment::new(100);
        seg.set_emotional_modulation(1.0);
        assert!((seg.gamma_gain() - 1.5).abs() < 1e-6);
        seg.step(0.0, &fb, 0.01);
        assert!((seg.flexor.spindle_feedback() - 1.5).abs() < 1e-4);
        assert!((seg.extensor.spindle_feedback() + 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_renshaw_does_not_accumulate() {
        let mut seg = SpinalSegment::new(50);
        for _ in 0..20 {
            seg.step(0.5, &SegmentFeedback::default(), 0.01);
        }
        // Bounded by 0.3 × the extensor's mean rate, which is zero here
        assert_eq!(seg.flexor.renshaw_inhibition(), 0.0);
        let cap = 0.3 * 200.0;
        assert!(seg.extensor.renshaw_inhibition() <= cap);
    }

    #[test]
    fn test_tendon_overload_inhibits() {
        let mut seg = SpinalSegment::new(100);
        let fb = SegmentFeedback {
            flexor_tendon: 1.0,
            ..SegmentFeedback::default()
        };
        seg.step(0.5, &fb, 0.01);
        // 0.5 − 0.5 × 2 × (1.0 − 0.8) = 0.3
        assert!((seg.flexor.net_drive() - 0.3).abs() < 1e-5);
    }
}
