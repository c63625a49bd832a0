//! Cognitive appraisal: stimulus → instantaneous emotion.
//!
//! Two passes, after Lazarus:
//! - **Primary**: what kind of event is this? Category decides which
//!   primary emotions fire, scaled by intensity, familiarity, predictability.
//! - **Secondary**: can I cope? A coping potential below 0.3 on an intense
//!   stimulus adds anxiety and shame.
//!
//! Stress from the persistent mood then amplifies fear, and stimuli whose
//! goal relevance (urgency × intensity) is under 0.2 are discarded entirely.

use serde::{Deserialize, Serialize};
use soma_core::math::unit;
use soma_core::{AppraisalConfig, EmotionProfile, MoodState, PrimaryEmotions, Vec3};
use tracing::debug;

/// Below this coping potential an intense stimulus overwhelms.
const COPING_FLOOR: f32 = 0.3;
/// Intensity above which low coping produces anxiety and shame.
const OVERWHELM_INTENSITY: f32 = 0.6;
/// Goal relevance below this is treated as noise.
const RELEVANCE_GATE: f32 = 0.2;

/// Category tag of a stimulus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StimulusKind {
    Threat,
    Enemy,
    Reward,
    Friend,
    Loss,
    /// Unrecognised tag, kept verbatim. Appraises to nothing.
    Other(String),
}

impl From<&str> for StimulusKind {
    fn from(tag: &str) -> Self {
        match tag {
            "threat" => StimulusKind::Threat,
            "enemy" => StimulusKind::Enemy,
            "reward" => StimulusKind::Reward,
            "friend" => StimulusKind::Friend,
            "loss" => StimulusKind::Loss,
            other => StimulusKind::Other(other.to_string()),
        }
    }
}

impl From<String> for StimulusKind {
    fn from(tag: String) -> Self {
        StimulusKind::from(tag.as_str())
    }
}

impl From<StimulusKind> for String {
    fn from(kind: StimulusKind) -> Self {
        match kind {
            StimulusKind::Threat => "threat".to_string(),
            StimulusKind::Enemy => "enemy".to_string(),
            StimulusKind::Reward => "reward".to_string(),
            StimulusKind::Friend => "friend".to_string(),
            StimulusKind::Loss => "loss".to_string(),
            StimulusKind::Other(s) => s,
        }
    }
}

/// One appraisal event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stimulus {
    pub kind: StimulusKind,
    pub intensity: f32,
    /// World-space source position. Carried for callers; appraisal ignores it.
    pub position: Vec3,
    pub urgency: f32,
    pub familiarity: f32,
    pub predictability: f32,
}

impl Default for Stimulus {
    fn default() -> Self {
        Self {
            kind: StimulusKind::Other(String::new()),
            intensity: 0.0,
            position: Vec3::zeros(),
            urgency: 0.0,
            familiarity: 0.5,
            predictability: 0.5,
        }
    }
}

impl Stimulus {
    pub fn new(kind: impl Into<StimulusKind>, intensity: f32, urgency: f32) -> Self {
        Self {
            kind: kind.into(),
            intensity,
            urgency,
            ..Self::default()
        }
    }

    pub fn with_familiarity(mut self, familiarity: f32) -> Self {
        self.familiarity = familiarity;
        self
    }

    pub fn with_predictability(mut self, predictability: f32) -> Self {
        self.predictability = predictability;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Copy with every scalar clamped into `[0, 1]`.
    fn sanitized(&self) -> (f32, f32, f32, f32) {
        (
            unit(self.intensity),
            unit(self.urgency),
            unit(self.familiarity),
            unit(self.predictability),
        )
    }
}

/// Result of appraising one stimulus.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AppraisalOutput {
    /// Clamped instantaneous emotion (mood not attached).
    pub emotion: EmotionProfile,
    /// Primary appraisal after mood amplification, before gating and clamping.
    pub raw_primary: PrimaryEmotions,
    pub coping_potential: f32,
    pub goal_relevance: f32,
    /// False when the relevance gate zeroed the emotion.
    pub retained: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CognitiveAppraiser {
    config: AppraisalConfig,
}

impl CognitiveAppraiser {
    pub fn new(config: AppraisalConfig) -> Self {
        Self { config }
    }

    /// Category-driven raw emotion. Not clamped: fear reaches 2.0 for an
    /// unfamiliar full-intensity threat.
    pub fn primary_appraisal(&self, stim: &Stimulus) -> PrimaryEmotions {
        let (intensity, urgency, familiarity, predictability) = stim.sanitized();
        let mut prim = PrimaryEmotions::default();
        match stim.kind {
            StimulusKind::Threat | StimulusKind::Enemy => {
                prim.fear = intensity * (2.0 - familiarity);
                prim.anger = 0.5 * intensity * (1.0 - predictability);
                prim.surprise = (1.0 - predictability) * urgency;
            }
            StimulusKind::Reward | StimulusKind::Friend => {
                prim.joy = intensity;
                prim.trust = intensity * familiarity;
            }
            StimulusKind::Loss => {
                prim.sadness = intensity;
            }
            StimulusKind::Other(_) => {}
        }
        prim
    }

    /// Self-efficacy × available resources × controllability.
    pub fn coping_potential(&self, stim: &Stimulus, mood: &MoodState) -> f32 {
        let (_, _, familiarity, predictability) = stim.sanitized();
        let resource = 1.0 - 0.5 * unit(mood.stress);
        let controllability = 0.6 * predictability + 0.4 * familiarity;
        unit(self.config.self_efficacy * resource * controllability)
    }

    pub fn appraise(&self, stim: &Stimulus, mood: &MoodState) -> AppraisalOutput {
        let (intensity, urgency, _, _) = stim.sanitized();

        let mut emotion = EmotionProfile::neutral();
        emotion.primary = self.primary_appraisal(stim);

        let coping_potential = self.coping_potential(stim, mood);
        if coping_potential < COPING_FLOOR && intensity > OVERWHELM_INTENSITY {
            emotion.social.anxiety = (1.0 - coping_potential) * intensity;
            emotion.social.shame = (1.0 - unit(self.config.self_esteem)) * intensity;
        }

        emotion.primary.fear *= 1.0 + 0.5 * unit(mood.stress);
        let raw_primary = emotion.primary;

        let goal_relevance = urgency * intensity;
        let retained = goal_relevance >= RELEVANCE_GATE;
        if retained {
            emotion.clamp();
        } else {
            debug!(
                "Stimulus {:?} below relevance gate ({:.3}), discarded",
                stim.kind, goal_relevance
            );
            emotion = EmotionProfile::neutral();
        }

        AppraisalOutput {
            emotion,
            raw_primary,
            coping_potential,
            goal_relevance,
            retained,
        }
    }

    /// Appraise every stimulus of a frame and max-blend the results.
    /// No stimuli yields the neutral profile.
    pub fn appraise_all(&self, stimuli: &[Stimulus], mood: &MoodState) -> EmotionProfile {
        stimuli
            .iter()
            .map(|s| self.appraise(s, mood).emotion)
            .fold(EmotionProfile::neutral(), |acc, e| acc.blend_max(&e))
    }
}
