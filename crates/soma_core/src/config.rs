use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SomaError;

// ============================================================================
// Top-level config
// ============================================================================

/// Read-only configuration handed to an actor at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SomaConfig {
    pub accuracy: Accuracy,
    pub features: FeatureFlags,
    pub budget: PerformanceBudget,
    pub human: HumanParams,
    pub anatomy: AnatomyConfig,
    pub appraisal: AppraisalConfig,
    pub mood: MoodConfig,
    /// Emotion channels forced onto designated muscles after the spinal stage.
    pub emotion_overrides: Vec<EmotionOverride>,
    /// Seed for the fatigue tremor noise source.
    pub seed: u64,
}

impl Default for SomaConfig {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::default(),
            features: FeatureFlags::default(),
            budget: PerformanceBudget::default(),
            human: HumanParams::default(),
            anatomy: AnatomyConfig::default(),
            appraisal: AppraisalConfig::default(),
            mood: MoodConfig::default(),
            emotion_overrides: default_emotion_overrides(),
            seed: 0x5eed,
        }
    }
}

impl SomaConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SomaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Parse from an in-memory TOML document without touching the environment.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, SomaError> {
        Ok(toml::from_str(s)?)
    }

    /// Apply environment variable overrides on top of file-based config.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SOMA_ACCURACY") {
            match v.parse() {
                Ok(tier) => self.accuracy = tier,
                Err(e) => tracing::warn!("Ignoring SOMA_ACCURACY: {}", e),
            }
        }
        if let Ok(v) = std::env::var("SOMA_FRAME_BUDGET_MS") {
            if let Ok(n) = v.parse() {
                self.budget.frame_budget_ms = n;
            }
        }
        if let Ok(v) = std::env::var("SOMA_THERMAL") {
            if let Ok(b) = v.parse() {
                self.features.thermal_throttling = b;
            }
        }
    }

    /// Reject configurations that cannot produce a correctly sized actor.
    pub fn validate(&self) -> std::result::Result<(), SomaError> {
        let a = &self.anatomy;
        if a.muscle_count == 0 {
            return Err(SomaError::invalid_config("muscle_count must be non-zero"));
        }
        if a.muscle_count % 2 != 0 {
            return Err(SomaError::invalid_config(format!(
                "muscle_count must be even (flexor/extensor pairs), got {}",
                a.muscle_count
            )));
        }
        if a.segment_count() > a.joint_count {
            return Err(SomaError::invalid_config(format!(
                "{} spinal segments but only {} joints",
                a.segment_count(),
                a.joint_count
            )));
        }
        if a.fibers_per_muscle == 0 || a.neurons_per_pool == 0 {
            return Err(SomaError::invalid_config(
                "fibers_per_muscle and neurons_per_pool must be non-zero",
            ));
        }
        let budget = self.budget.frame_budget_ms;
        if budget.is_nan() || budget <= 0.0 {
            return Err(SomaError::invalid_config(format!(
                "frame_budget_ms must be positive, got {}",
                self.budget.frame_budget_ms
            )));
        }
        let composition = self.human.fiber_composition;
        if !(0.0..=1.0).contains(&composition) {
            return Err(SomaError::invalid_config(format!(
                "fiber_composition must be in [0, 1], got {}",
                composition
            )));
        }
        if let Some(o) = self.emotion_overrides.iter().find(|o| o.muscle >= a.muscle_count) {
            return Err(SomaError::invalid_config(format!(
                "emotion override targets muscle {} of {}",
                o.muscle, a.muscle_count
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Accuracy tier
// ============================================================================

/// Fidelity/cost trade-off. Orders from cheapest to most expensive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    /// Coarse grid, linear tendon
    Realtime,
    #[default]
    Standard,
    High,
    Extreme,
}

impl Accuracy {
    /// Cross-bridge grid nodes per fiber.
    pub fn grid_resolution(self) -> usize {
        match self {
            Accuracy::Realtime => 10,
            Accuracy::Standard => 100,
            Accuracy::High => 200,
            Accuracy::Extreme => 1000,
        }
    }

    /// Upper bound on fiber sub-steps per frame. Every tier covers frames up
    /// to 1/30 s inside the cross-bridge stability bound.
    pub fn substep_cap(self) -> usize {
        match self {
            Accuracy::Realtime => 16,
            Accuracy::Standard => 24,
            Accuracy::High => 32,
            Accuracy::Extreme => 64,
        }
    }

    /// Tendons drop viscosity and Prony memory at the cheapest tier.
    pub fn linear_tendon(self) -> bool {
        self == Accuracy::Realtime
    }

    /// One tier cheaper, saturating at `Realtime`.
    pub fn step_down(self) -> Self {
        match self {
            Accuracy::Realtime | Accuracy::Standard => Accuracy::Realtime,
            Accuracy::High => Accuracy::Standard,
            Accuracy::Extreme => Accuracy::High,
        }
    }

    /// One tier richer, saturating at `Extreme`.
    pub fn step_up(self) -> Self {
        match self {
            Accuracy::Realtime => Accuracy::Standard,
            Accuracy::Standard => Accuracy::High,
            Accuracy::High | Accuracy::Extreme => Accuracy::Extreme,
        }
    }
}

impl std::str::FromStr for Accuracy {
    type Err = SomaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "realtime" => Ok(Accuracy::Realtime),
            "standard" => Ok(Accuracy::Standard),
            "high" => Ok(Accuracy::High),
            "extreme" => Ok(Accuracy::Extreme),
            other => Err(SomaError::invalid_config(format!(
                "unknown accuracy tier '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Accuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Accuracy::Realtime => "realtime",
            Accuracy::Standard => "standard",
            Accuracy::High => "high",
            Accuracy::Extreme => "extreme",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub emotion: bool,
    pub neural_reflex: bool,
    pub hysteresis: bool,
    pub metabolism: bool,
    pub fatigue: bool,
    pub thermal_throttling: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            emotion: true,
            neural_reflex: true,
            hysteresis: true,
            metabolism: true,
            fatigue: true,
            thermal_throttling: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceBudget {
    /// Wall-clock budget for one frame, milliseconds.
    pub frame_budget_ms: f64,
    /// Consecutive over-budget frames before the grid steps down a tier.
    pub downgrade_after: u32,
    /// Consecutive frames under half budget before stepping back up.
    pub upgrade_after: u32,
}

impl Default for PerformanceBudget {
    fn default() -> Self {
        Self {
            frame_budget_ms: 16.0,
            downgrade_after: 3,
            upgrade_after: 300,
        }
    }
}

/// Subject parameters. All are logged at construction; only the fiber-type
/// composition feeds the muscles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanParams {
    pub age_years: f32,
    pub height_m: f32,
    pub mass_kg: f32,
    pub fitness: f32,
    /// Fast-twitch fraction of every muscle, `[0, 1]`.
    pub fiber_composition: f32,
}

impl Default for HumanParams {
    fn default() -> Self {
        Self {
            age_years: 30.0,
            height_m: 1.75,
            mass_kg: 70.0,
            fitness: 0.5,
            fiber_composition: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnatomyConfig {
    /// Muscles, arranged as flexor/extensor pairs.
    pub muscle_count: usize,
    pub joint_count: usize,
    pub fibers_per_muscle: usize,
    pub neurons_per_pool: usize,
}

impl Default for AnatomyConfig {
    fn default() -> Self {
        Self {
            muscle_count: 46,
            joint_count: 23,
            fibers_per_muscle: 100,
            neurons_per_pool: 100,
        }
    }
}

impl AnatomyConfig {
    /// One spinal segment per flexor/extensor pair.
    pub fn segment_count(&self) -> usize {
        self.muscle_count / 2
    }
}

/// Personality terms consumed by secondary appraisal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppraisalConfig {
    pub self_efficacy: f32,
    pub self_esteem: f32,
}

impl Default for AppraisalConfig {
    fn default() -> Self {
        Self {
            self_efficacy: 0.7,
            self_esteem: 0.8,
        }
    }
}

/// Charge/discharge rates (per second) and half-lives (seconds) of the two
/// mood accumulators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodConfig {
    pub stress_charge: f32,
    pub stress_discharge: f32,
    pub stress_half_life: f32,
    pub fear_threshold: f32,
    pub depression_charge: f32,
    pub depression_discharge: f32,
    pub depression_half_life: f32,
    pub sadness_threshold: f32,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            stress_charge: 0.5,
            stress_discharge: 0.2,
            stress_half_life: 3600.0,
            fear_threshold: 0.6,
            depression_charge: 0.1,
            depression_discharge: 0.01,
            depression_half_life: 86_400.0,
            sadness_threshold: 0.7,
        }
    }
}

impl MoodConfig {
    /// No charge or discharge; the accumulators only decay with their half-lives.
    pub fn passive() -> Self {
        Self {
            stress_charge: 0.0,
            stress_discharge: 0.0,
            depression_charge: 0.0,
            depression_discharge: 0.0,
            ..Self::default()
        }
    }
}

/// Emotion channels that may drive a muscle directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionChannel {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Trust,
    Anticipation,
    Anxiety,
    Shame,
}

/// `activation[muscle] = max(activation[muscle], gain * emotion[channel])`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionOverride {
    pub muscle: usize,
    pub channel: EmotionChannel,
    pub gain: f32,
}

fn default_emotion_overrides() -> Vec<EmotionOverride> {
    vec![
        // Trunk flexion (slump)
        EmotionOverride {
            muscle: 0,
            channel: EmotionChannel::Sadness,
            gain: 0.6,
        },
        // Shoulder/neck tension
        EmotionOverride {
            muscle: 1,
            channel: EmotionChannel::Fear,
            gain: 0.7,
        },
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SomaConfig::default();
        assert_eq!(cfg.accuracy, Accuracy::Standard);
        assert_eq!(cfg.anatomy.muscle_count, 46);
        assert_eq!(cfg.anatomy.segment_count(), 23);
        assert!(cfg.features.emotion);
        assert!(!cfg.features.thermal_throttling);
        assert_eq!(cfg.emotion_overrides.len(), 2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
accuracy = "realtime"

[features]
hysteresis = false
"#;
        let cfg = SomaConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(cfg.accuracy, Accuracy::Realtime);
        assert!(!cfg.features.hysteresis);
        // Defaults for unspecified fields
        assert!(cfg.features.metabolism);
        assert_eq!(cfg.budget.frame_budget_ms, 16.0);
        assert_eq!(cfg.appraisal.self_efficacy, 0.7);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
accuracy = "high"
seed = 7

[features]
emotion = false
thermal_throttling = true

[budget]
frame_budget_ms = 8.0
downgrade_after = 5

[anatomy]
muscle_count = 4
joint_count = 2
fibers_per_muscle = 8
neurons_per_pool = 20

[appraisal]
self_efficacy = 0.4

[human]
fiber_composition = 0.7

[[emotion_overrides]]
muscle = 3
channel = "anger"
gain = 0.9
"#;
        let cfg = SomaConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(cfg.accuracy, Accuracy::High);
        assert_eq!(cfg.seed, 7);
        assert!(!cfg.features.emotion);
        assert!(cfg.features.thermal_throttling);
        assert_eq!(cfg.budget.frame_budget_ms, 8.0);
        assert_eq!(cfg.budget.downgrade_after, 5);
        assert_eq!(cfg.budget.upgrade_after, 300);
        assert_eq!(cfg.anatomy.segment_count(), 2);
        assert_eq!(cfg.appraisal.self_esteem, 0.8);
        assert_eq!(cfg.human.fiber_composition, 0.7);
        assert_eq!(cfg.human.age_years, 30.0);
        assert_eq!(cfg.emotion_overrides.len(), 1);
        assert_eq!(cfg.emotion_overrides[0].channel, EmotionChannel::Anger);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_rejects_unknown_tier() {
        assert!(SomaConfig::from_toml_str("accuracy = \"ludicrous\"").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_anatomy() {
        let mut cfg = SomaConfig::default();
        cfg.anatomy.muscle_count = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SomaConfig::default();
        cfg.anatomy.muscle_count = 5;
        assert!(cfg.validate().is_err());

        let mut cfg = SomaConfig::default();
        cfg.anatomy.joint_count = 10;
        assert!(cfg.validate().is_err());

        let mut cfg = SomaConfig::default();
        cfg.budget.frame_budget_ms = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SomaConfig::default();
        cfg.emotion_overrides[0].muscle = 46;
        assert!(cfg.validate().is_err());

        let mut cfg = SomaConfig::default();
        cfg.human.fiber_composition = 1.5;
        assert!(cfg.validate().is_err());
        cfg.human.fiber_composition = f32::NAN;
        assert!(cfg.validate().is_err());
        cfg.human.fiber_composition = 1.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_tier_table() {
        assert_eq!(Accuracy::Realtime.grid_resolution(), 10);
        assert_eq!(Accuracy::Standard.grid_resolution(), 100);
        assert_eq!(Accuracy::High.grid_resolution(), 200);
        assert_eq!(Accuracy::Extreme.grid_resolution(), 1000);
        assert_eq!(Accuracy::Realtime.substep_cap(), 16);
        assert_eq!(Accuracy::Extreme.substep_cap(), 64);
        assert!(Accuracy::Realtime.linear_tendon());
        assert!(!Accuracy::Standard.linear_tendon());
        assert_eq!(Accuracy::Extreme.step_down(), Accuracy::High);
        assert_eq!(Accuracy::Realtime.step_down(), Accuracy::Realtime);
        assert_eq!(Accuracy::High.step_up(), Accuracy::Extreme);
        assert!(Accuracy::Realtime < Accuracy::Extreme);
    }

    #[test]
    fn test_accuracy_from_str() {
        assert_eq!("Realtime".parse::<Accuracy>().unwrap(), Accuracy::Realtime);
        assert_eq!(" extreme ".parse::<Accuracy>().unwrap(), Accuracy::Extreme);
        assert!("fast".parse::<Accuracy>().is_err());
        assert_eq!(Accuracy::High.to_string(), "high");
    }

    #[test]
    fn test_passive_mood_config() {
        let m = MoodConfig::passive();
        assert_eq!(m.stress_charge, 0.0);
        assert_eq!(m.depression_discharge, 0.0);
        assert_eq!(m.stress_half_life, 3600.0);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let cfg = SomaConfig::load_or_default("/definitely/not/here/soma.toml");
        assert_eq!(cfg.anatomy.joint_count, 23);
    }
}
