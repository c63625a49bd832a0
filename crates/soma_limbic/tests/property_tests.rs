//! Property-based tests for soma_limbic.
//!
//! Appraisal and mood run every frame for the lifetime of an actor, so their
//! output ranges must hold for any stimulus and any step size.

use proptest::prelude::*;
use soma_core::{AppraisalConfig, EmotionProfile, MoodConfig, MoodState};
use soma_limbic::{CognitiveAppraiser, MoodDynamics, Stimulus};

// ============================================================================
// Strategies
// ============================================================================

fn arb_kind() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("threat"),
        Just("enemy"),
        Just("reward"),
        Just("friend"),
        Just("loss"),
        Just("noise"),
    ]
}

/// Stimulus scalars deliberately range beyond `[0, 1]`.
fn arb_stimulus() -> impl Strategy<Value = Stimulus> {
    (
        arb_kind(),
        -0.5f32..=1.5,
        -0.5f32..=1.5,
        -0.5f32..=1.5,
        -0.5f32..=1.5,
    )
        .prop_map(|(kind, intensity, urgency, familiarity, predictability)| {
            Stimulus::new(kind, intensity, urgency)
                .with_familiarity(familiarity)
                .with_predictability(predictability)
        })
}

fn arb_mood() -> impl Strategy<Value = MoodState> {
    (0.0f32..=1.0, 0.0f32..=1.0).prop_map(|(stress, depression)| MoodState {
        stress,
        depression,
        valence: 1.0 - 0.5 * depression,
        arousal: 0.3 * stress,
    })
}

fn arb_appraisal_config() -> impl Strategy<Value = AppraisalConfig> {
    (0.0f32..=1.0, 0.0f32..=1.0).prop_map(|(self_efficacy, self_esteem)| AppraisalConfig {
        self_efficacy,
        self_esteem,
    })
}

fn arb_instant() -> impl Strategy<Value = EmotionProfile> {
    (0.0f32..=1.0, 0.0f32..=1.0).prop_map(|(fear, sadness)| {
        let mut e = EmotionProfile::neutral();
        e.primary.fear = fear;
        e.primary.sadness = sadness;
        e
    })
}

// ============================================================================
// Appraisal Properties
// ============================================================================

proptest! {
    /// **Appraisal output is always a valid profile.**
    #[test]
    fn appraisal_output_in_unit_range(
        cfg in arb_appraisal_config(),
        stim in arb_stimulus(),
        mood in arb_mood(),
    ) {
        let out = CognitiveAppraiser::new(cfg).appraise(&stim, &mood);
        for (i, v) in out.emotion.to_vector()[..16].iter().enumerate() {
            prop_assert!(v.is_finite() && (0.0..=1.0).contains(v), "channel {} = {}", i, v);
        }
        prop_assert!((0.0..=1.0).contains(&out.coping_potential));
    }

    /// **Gate**: a stimulus below the relevance threshold leaves no trace.
    #[test]
    fn irrelevant_stimulus_is_neutral(
        stim in arb_stimulus(),
        mood in arb_mood(),
    ) {
        let out = CognitiveAppraiser::default().appraise(&stim, &mood);
        if out.goal_relevance < 0.2 {
            prop_assert_eq!(out.emotion, EmotionProfile::neutral());
        }
    }

    /// **Fear never decreases with stress.**
    #[test]
    fn stress_never_lowers_fear(
        stim in arb_stimulus(),
        lo in 0.0f32..=1.0,
        hi in 0.0f32..=1.0,
    ) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let a = CognitiveAppraiser::default();
        let calm = a.appraise(&stim, &MoodState { stress: lo, ..MoodState::default() });
        let tense = a.appraise(&stim, &MoodState { stress: hi, ..MoodState::default() });
        prop_assert!(tense.raw_primary.fear >= calm.raw_primary.fear);
    }

    /// **Multi-stimulus blend dominates each single appraisal.**
    #[test]
    fn appraise_all_dominates(
        stimuli in proptest::collection::vec(arb_stimulus(), 0..6),
        mood in arb_mood(),
    ) {
        let a = CognitiveAppraiser::default();
        let all = a.appraise_all(&stimuli, &mood).to_vector();
        for s in &stimuli {
            let one = a.appraise(s, &mood).emotion.to_vector();
            for i in 0..16 {
                prop_assert!(all[i] >= one[i]);
            }
        }
    }
}

// ============================================================================
// Mood Properties
// ============================================================================

proptest! {
    /// **Accumulators stay in [0, 1] for any emotion sequence and dt.**
    #[test]
    fn mood_bounded(
        seq in proptest::collection::vec((arb_instant(), 0.0f32..=100.0), 1..50),
        stress0 in 0.0f32..=1.0,
        depression0 in 0.0f32..=1.0,
    ) {
        let mut m = MoodDynamics::new(MoodConfig::default()).with_levels(stress0, depression0);
        for (e, dt) in &seq {
            m.update(*dt, e);
            let s = m.state();
            prop_assert!((0.0..=1.0).contains(&s.stress), "stress {}", s.stress);
            prop_assert!((0.0..=1.0).contains(&s.depression), "depression {}", s.depression);
            prop_assert!((0.5..=1.0).contains(&s.valence));
        }
    }

    /// **Passive decay is monotone non-increasing.**
    #[test]
    fn passive_mood_never_grows(
        stress0 in 0.0f32..=1.0,
        instant in arb_instant(),
        dt in 0.0f32..=60.0,
    ) {
        let mut m = MoodDynamics::new(MoodConfig::passive()).with_levels(stress0, stress0);
        m.update(dt, &instant);
        prop_assert!(m.stress() <= stress0);
        prop_assert!(m.depression() <= stress0);
    }
}
