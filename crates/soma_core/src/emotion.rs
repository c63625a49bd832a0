//! Discrete emotion profile.
//!
//! Eight primary emotions, eight social emotions and a persistent mood, each
//! an intensity in `[0, 1]`. Primary and social channels are rebuilt every
//! frame by appraisal; `mood` is carried between frames by the mood
//! integrator and attached after appraisal.
//!
//! The PAD projection (pleasure, arousal, dominance) is derived, not stored,
//! and is not clamped: dominance in particular is signed.

use crate::config::EmotionChannel;
use crate::math::unit;
use serde::{Deserialize, Serialize};

/// Length of [`EmotionProfile::to_vector`].
pub const EMOTION_DIM: usize = 23;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimaryEmotions {
    pub joy: f32,
    pub sadness: f32,
    pub anger: f32,
    pub fear: f32,
    pub surprise: f32,
    pub disgust: f32,
    pub trust: f32,
    pub anticipation: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialEmotions {
    pub guilt: f32,
    pub shame: f32,
    pub pride: f32,
    pub envy: f32,
    pub gratitude: f32,
    pub love: f32,
    pub hate: f32,
    pub anxiety: f32,
}

/// Slow background state. Persists across frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoodState {
    pub depression: f32,
    pub stress: f32,
    pub valence: f32,
    pub arousal: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionProfile {
    pub primary: PrimaryEmotions,
    pub social: SocialEmotions,
    pub mood: MoodState,
}

impl EmotionProfile {
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Component-wise maximum of the instantaneous channels. Mood is taken
    /// from `self`, since it is not produced by appraisal.
    pub fn blend_max(&self, other: &EmotionProfile) -> EmotionProfile {
        let p = &self.primary;
        let q = &other.primary;
        let s = &self.social;
        let t = &other.social;
        EmotionProfile {
            primary: PrimaryEmotions {
                joy: p.joy.max(q.joy),
                sadness: p.sadness.max(q.sadness),
                anger: p.anger.max(q.anger),
                fear: p.fear.max(q.fear),
                surprise: p.surprise.max(q.surprise),
                disgust: p.disgust.max(q.disgust),
                trust: p.trust.max(q.trust),
                anticipation: p.anticipation.max(q.anticipation),
            },
            social: SocialEmotions {
                guilt: s.guilt.max(t.guilt),
                shame: s.shame.max(t.shame),
                pride: s.pride.max(t.pride),
                envy: s.envy.max(t.envy),
                gratitude: s.gratitude.max(t.gratitude),
                love: s.love.max(t.love),
                hate: s.hate.max(t.hate),
                anxiety: s.anxiety.max(t.anxiety),
            },
            mood: self.mood,
        }
    }

    /// Clamp every channel into `[0, 1]`, replacing non-finite values with 0.
    pub fn clamp(&mut self) {
        let p = &mut self.primary;
        for v in [
            &mut p.joy,
            &mut p.sadness,
            &mut p.anger,
            &mut p.fear,
            &mut p.surprise,
            &mut p.disgust,
            &mut p.trust,
            &mut p.anticipation,
        ] {
            *v = unit(*v);
        }
        let s = &mut self.social;
        for v in [
            &mut s.guilt,
            &mut s.shame,
            &mut s.pride,
            &mut s.envy,
            &mut s.gratitude,
            &mut s.love,
            &mut s.hate,
            &mut s.anxiety,
        ] {
            *v = unit(*v);
        }
        let m = &mut self.mood;
        for v in [&mut m.depression, &mut m.stress, &mut m.valence, &mut m.arousal] {
            *v = unit(*v);
        }
    }

    /// Intensity of a single channel.
    pub fn channel(&self, channel: EmotionChannel) -> f32 {
        match channel {
            EmotionChannel::Joy => self.primary.joy,
            EmotionChannel::Sadness => self.primary.sadness,
            EmotionChannel::Anger => self.primary.anger,
            EmotionChannel::Fear => self.primary.fear,
            EmotionChannel::Surprise => self.primary.surprise,
            EmotionChannel::Disgust => self.primary.disgust,
            EmotionChannel::Trust => self.primary.trust,
            EmotionChannel::Anticipation => self.primary.anticipation,
            EmotionChannel::Anxiety => self.social.anxiety,
            EmotionChannel::Shame => self.social.shame,
        }
    }

    pub fn pleasure(&self) -> f32 {
        self.mood.valence
    }

    pub fn arousal(&self) -> f32 {
        let p = &self.primary;
        p.joy * 0.3 + p.anger * 0.8 + p.fear * 0.9 + self.mood.arousal
    }

    pub fn dominance(&self) -> f32 {
        let p = &self.primary;
        (p.anger * 0.7 + p.trust * 0.5) - (p.fear * 0.8 + p.sadness * 0.6)
    }

    /// Fixed-order serialisation: primary, social, mood, then PAD.
    pub fn to_vector(&self) -> [f32; EMOTION_DIM] {
        let p = &self.primary;
        let s = &self.social;
        let m = &self.mood;
        [
            p.joy,
            p.sadness,
            p.anger,
            p.fear,
            p.surprise,
            p.disgust,
            p.trust,
            p.anticipation,
            s.guilt,
            s.shame,
            s.pride,
            s.envy,
            s.gratitude,
            s.love,
            s.hate,
            s.anxiety,
            m.depression,
            m.stress,
            m.valence,
            m.arousal,
            self.pleasure(),
            self.arousal(),
            self.dominance(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_max_takes_componentwise_max() {
        let mut a = EmotionProfile::neutral();
        a.primary.fear = 0.8;
        a.social.anxiety = 0.1;
        a.mood.stress = 0.4;
        let mut b = EmotionProfile::neutral();
        b.primary.fear = 0.3;
        b.primary.joy = 0.5;
        b.social.anxiety = 0.9;

        let c = a.blend_max(&b);
        assert_eq!(c.primary.fear, 0.8);
        assert_eq!(c.primary.joy, 0.5);
        assert_eq!(c.social.anxiety, 0.9);
        assert_eq!(c.mood.stress, 0.4);
    }

    #[test]
    fn test_clamp_bounds_every_channel() {
        let mut e = EmotionProfile::neutral();
        e.primary.fear = 2.0;
        e.primary.anger = -1.0;
        e.social.shame = f32::NAN;
        e.mood.stress = 1.5;
        e.clamp();
        assert_eq!(e.primary.fear, 1.0);
        assert_eq!(e.primary.anger, 0.0);
        assert_eq!(e.social.shame, 0.0);
        assert_eq!(e.mood.stress, 1.0);
    }

    #[test]
    fn test_pad_projection() {
        let mut e = EmotionProfile::neutral();
        e.primary.fear = 1.0;
        e.mood.valence = 0.9;
        e.mood.arousal = 0.1;
        assert!((e.pleasure() - 0.9).abs() < 1e-6);
        assert!((e.arousal() - 1.0).abs() < 1e-6);
        assert!((e.dominance() + 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_vector_layout() {
        let mut e = EmotionProfile::neutral();
        e.primary.joy = 0.1;
        e.social.anxiety = 0.2;
        e.mood.arousal = 0.3;
        let v = e.to_vector();
        assert_eq!(v.len(), EMOTION_DIM);
        assert_eq!(v[0], 0.1);
        assert_eq!(v[15], 0.2);
        assert_eq!(v[19], 0.3);
        assert!((v[21] - e.arousal()).abs() < 1e-7);
    }

    #[test]
    fn test_channel_lookup() {
        let mut e = EmotionProfile::neutral();
        e.primary.sadness = 0.4;
        e.social.anxiety = 0.6;
        assert_eq!(e.channel(EmotionChannel::Sadness), 0.4);
        assert_eq!(e.channel(EmotionChannel::Anxiety), 0.6);
        assert_eq!(e.channel(EmotionChannel::Joy), 0.0);
    }
}
