//! Property-based tests for soma_body.
//!
//! These are the invariants the rest of the pipeline leans on: bound
//! fractions stay fractions, force grows with activation, concentrations stay
//! physiological and joints stay inside their range of motion.

use proptest::prelude::*;
use soma_body::{ArticulatedSkeleton, HuxleyFiber, MetabolicSystem, Muscle, MuscleParams, Tendon};
use soma_core::{Accuracy, Vec3};

fn arb_accuracy() -> impl Strategy<Value = Accuracy> {
    prop_oneof![
        Just(Accuracy::Realtime),
        Just(Accuracy::Standard),
        Just(Accuracy::High),
    ]
}

fn arb_vec3(range: f32) -> impl Strategy<Value = Vec3> {
    (-range..=range, -range..=range, -range..=range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

// ============================================================================
// Cross-bridge Properties
// ============================================================================

proptest! {
    /// **n(x) ∈ [0, 1]** on every node for any activation and any dt up to
    /// the stability bound.
    #[test]
    fn bound_fraction_in_unit_interval(
        resolution in 4usize..=200,
        activations in proptest::collection::vec(0.0f32..=1.0, 1..60),
        v_rel in -1.0f32..=1.0,
        dt_frac in 0.01f32..=1.0,
    ) {
        let mut fiber = HuxleyFiber::new(resolution);
        let dt = fiber.stable_dt(v_rel) * dt_frac;
        for a in activations {
            fiber.step(a, v_rel, dt);
            for (i, n) in fiber.bound().iter().enumerate() {
                prop_assert!((0.0..=1.0).contains(n), "node {} = {}", i, n);
            }
            prop_assert!(fiber.force().is_finite());
        }
    }

    /// **Force is non-decreasing in activation** at fixed kinematics.
    #[test]
    fn fiber_force_monotone_in_activation(
        resolution in 4usize..=100,
        a_lo in 0.0f32..=1.0,
        a_hi in 0.0f32..=1.0,
        v_rel in -1.0f32..=1.0,
        steps in 1usize..=200,
    ) {
        let (a_lo, a_hi) = if a_lo <= a_hi { (a_lo, a_hi) } else { (a_hi, a_lo) };
        let mut lo = HuxleyFiber::new(resolution);
        let mut hi = HuxleyFiber::new(resolution);
        let dt = 0.9 * lo.stable_dt(v_rel);
        for _ in 0..steps {
            lo.step(a_lo, v_rel, dt);
            hi.step(a_hi, v_rel, dt);
        }
        prop_assert!(hi.force() >= lo.force() - 1e-5, "{} < {}", hi.force(), lo.force());
    }

    /// **Muscle force is finite and non-negative** at any tier, even when the
    /// frame is longer than the sub-step cap can cover.
    #[test]
    fn muscle_force_finite(
        accuracy in arb_accuracy(),
        seq in proptest::collection::vec((0.0f32..=1.0, -2.0f32..=2.0), 1..20),
        throttled in any::<bool>(),
    ) {
        let mut m = Muscle::new(MuscleParams::default(), 8, accuracy);
        for (a, v) in seq {
            m.step(a, v, 0.5, throttled);
            prop_assert!(m.force().is_finite() && m.force() >= 0.0);
            for f in m.fibers() {
                prop_assert!(f.bound().iter().all(|n| (0.0..=1.0).contains(n)));
            }
        }
    }

    /// **Muscle force is non-decreasing in activation** at the frame rate the
    /// actor runs, on the tiers the governor moves between.
    #[test]
    fn muscle_force_monotone_at_frame_rate(
        accuracy in prop_oneof![Just(Accuracy::Realtime), Just(Accuracy::Standard)],
        a_lo in 0.0f32..=1.0,
        a_hi in 0.0f32..=1.0,
        velocity in -1.2f32..=1.2,
        frames in 1usize..=60,
    ) {
        let (a_lo, a_hi) = if a_lo <= a_hi { (a_lo, a_hi) } else { (a_hi, a_lo) };
        let mut lo = Muscle::new(MuscleParams::default(), 4, accuracy);
        let mut hi = Muscle::new(MuscleParams::default(), 4, accuracy);
        let tol = 1e-4 * lo.params().max_force();
        for frame in 0..frames {
            lo.step(a_lo, velocity, 1.0 / 60.0, false);
            hi.step(a_hi, velocity, 1.0 / 60.0, false);
            prop_assert!(
                hi.force() >= lo.force() - tol,
                "frame {}: {} < {}",
                frame,
                hi.force(),
                lo.force()
            );
        }
    }
}

// ============================================================================
// Tendon Properties
// ============================================================================

proptest! {
    #[test]
    fn tendon_stress_within_ceiling(
        seq in proptest::collection::vec((-0.1f32..=0.3, -50.0f32..=50.0), 1..50),
        dt in 0.001f32..=0.1,
        linear in any::<bool>(),
    ) {
        let mut t = Tendon::new();
        if linear {
            t.set_linear_mode();
        }
        let mut loss = 0.0;
        for (strain, rate) in seq {
            let s = t.compute_stress(strain, rate, dt);
            prop_assert!(s >= 0.0 && s <= t.ceiling());
            prop_assert!(t.hysteresis_loss() >= loss, "hysteresis loss decreased");
            loss = t.hysteresis_loss();
        }
    }
}

// ============================================================================
// Metabolism Properties
// ============================================================================

proptest! {
    /// **Concentrations stay in range** for any activation sequence in [0, 1]
    /// and dt ∈ (0, 0.1].
    #[test]
    fn metabolic_bounds(
        seq in proptest::collection::vec((0.0f32..=1.0, 0.0001f32..=0.1), 1..400),
    ) {
        let mut m = MetabolicSystem::new();
        for (a, dt) in seq {
            m.update(a, dt);
            prop_assert!((0.0..=1.0).contains(&m.atp()), "ATP {}", m.atp());
            prop_assert!((0.3..=1.0).contains(&m.pcr()), "PCr {}", m.pcr());
            prop_assert!((0.0..=1.0).contains(&m.glycogen()), "glycogen {}", m.glycogen());
            prop_assert!((0.0..=1.0).contains(&m.lactate()), "lactate {}", m.lactate());
            prop_assert!((0.0..=0.2).contains(&m.pyruvate()), "pyruvate {}", m.pyruvate());
            prop_assert!((0.0..=1.0).contains(&m.fatigue()));
            let rpe = m.perceived_exertion();
            prop_assert!((6.0..=20.0).contains(&rpe));
        }
    }
}

// ============================================================================
// Skeleton Properties
// ============================================================================

proptest! {
    /// **Joint limits are never exceeded** whatever the torque.
    #[test]
    fn joint_limits_hold(
        torques in proptest::collection::vec(arb_vec3(500.0), 1..60),
        external in arb_vec3(1000.0),
        dt in 0.001f32..=0.05,
    ) {
        let mut s = ArticulatedSkeleton::new(4);
        s.set_external_force(3, external);
        for t in torques {
            let per_joint = vec![t; 4];
            prop_assert!(s.step(&per_joint, dt));
            for j in s.joints() {
                for i in 0..3 {
                    let a = j.angle()[i];
                    prop_assert!(a.is_finite());
                    prop_assert!(a >= j.capsule.limit_min[i] && a <= j.capsule.limit_max[i],
                        "axis {} angle {} outside [{}, {}]", i, a, j.capsule.limit_min[i], j.capsule.limit_max[i]);
                }
            }
        }
    }

    /// **Inverse dynamics output is non-negative with one side of each pair at zero.**
    #[test]
    fn inverse_dynamics_antagonist_split(
        angle in arb_vec3(0.7),
        velocity in arb_vec3(2.0),
        force in arb_vec3(300.0),
    ) {
        let s = ArticulatedSkeleton::new(2);
        let out = s.inverse_dynamics(&[angle; 2], &[velocity; 2], &[force; 2]);
        for pair in out.chunks(2) {
            prop_assert!(pair[0] >= 0.0 && pair[1] >= 0.0);
            prop_assert!(pair[0] == 0.0 || pair[1] == 0.0);
        }
    }
}
