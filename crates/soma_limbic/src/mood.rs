//! Mood: the part of emotion that outlives the frame.
//!
//! Two leaky accumulators. Stress charges while fear is high and drains
//! otherwise; depression does the same with sadness, two orders of magnitude
//! slower. After the linear charge/discharge both decay exponentially with
//! their own half-lives and are clamped to `[0, 1]`.

use soma_core::math::unit;
use soma_core::{EmotionProfile, MoodConfig, MoodState};
use std::f32::consts::LN_2;

#[derive(Debug, Clone, Default)]
pub struct MoodDynamics {
    config: MoodConfig,
    stress: f32,
    depression: f32,
}

impl MoodDynamics {
    pub fn new(config: MoodConfig) -> Self {
        Self {
            config,
            stress: 0.0,
            depression: 0.0,
        }
    }

    /// Start from given accumulator levels (clamped).
    pub fn with_levels(mut self, stress: f32, depression: f32) -> Self {
        self.stress = unit(stress);
        self.depression = unit(depression);
        self
    }

    pub fn stress(&self) -> f32 {
        self.stress
    }

    pub fn depression(&self) -> f32 {
        self.depression
    }

    /// Integrate one step of `dt` seconds against the frame's instantaneous emotion.
    pub fn update(&mut self, dt: f32, instant: &EmotionProfile) {
        let dt = dt.max(0.0);
        let c = &self.config;

        if instant.primary.fear > c.fear_threshold {
            self.stress += c.stress_charge * dt;
        } else {
            self.stress -= c.stress_discharge * dt;
        }
        if instant.primary.sadness > c.sadness_threshold {
            self.depression += c.depression_charge * dt;
        } else {
            self.depression -= c.depression_discharge * dt;
        }

        self.stress *= decay(dt, c.stress_half_life);
        self.depression *= decay(dt, c.depression_half_life);

        self.stress = unit(self.stress);
        self.depression = unit(self.depression);
    }

    /// Project the accumulators onto the mood vector.
    pub fn state(&self) -> MoodState {
        MoodState {
            depression: self.depression,
            stress: self.stress,
            valence: 1.0 - 0.5 * self.depression,
            arousal: 0.3 * self.stress,
        }
    }
}

fn decay(dt: f32, half_life: f32) -> f32 {
    (-dt * LN_2 / half_life.max(soma_core::math::EPSILON)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fearful(level: f32) -> EmotionProfile {
        let mut e = EmotionProfile::neutral();
        e.primary.fear = level;
        e
    }

    #[test]
    fn test_stress_charges_under_fear() {
        let mut m = MoodDynamics::new(MoodConfig::default());
        for _ in 0..10 {
            m.update(0.1, &fearful(0.9));
        }
        // 1 s of charging at 0.5/s, minus a negligible hour-scale decay
        assert!((m.stress() - 0.5).abs() < 1e-3, "stress = {}", m.stress());
        assert_eq!(m.depression(), 0.0);
    }

    #[test]
    fn test_stress_discharges_without_fear() {
        let mut m = MoodDynamics::new(MoodConfig::default()).with_levels(0.5, 0.0);
        m.update(1.0, &fearful(0.2));
        assert!((m.stress() - 0.3).abs() < 1e-3);
        m.update(10.0, &fearful(0.0));
        assert_eq!(m.stress(), 0.0);
    }

    #[test]
    fn test_passive_half_life() {
        let mut m = MoodDynamics::new(MoodConfig::passive()).with_levels(0.8, 0.0);
        for _ in 0..3600 {
            m.update(1.0, &EmotionProfile::neutral());
        }
        assert!((m.stress() - 0.4).abs() < 1e-3, "stress = {}", m.stress());
    }

    #[test]
    fn test_depression_is_slow() {
        let mut sad = EmotionProfile::neutral();
        sad.primary.sadness = 0.9;
        let mut m = MoodDynamics::new(MoodConfig::default());
        m.update(1.0, &sad);
        assert!((m.depression() - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_state_projection() {
        let m = MoodDynamics::new(MoodConfig::default()).with_levels(0.5, 0.4);
        let s = m.state();
        assert!((s.valence - 0.8).abs() < 1e-6);
        assert!((s.arousal - 0.15).abs() < 1e-6);
        assert_eq!(s.stress, 0.5);
        assert_eq!(s.depression, 0.4);
    }

    #[test]
    fn test_accumulators_saturate() {
        let mut m = MoodDynamics::new(MoodConfig::default());
        m.update(100.0, &fearful(1.0));
        assert_eq!(m.stress(), 1.0);
    }
}
