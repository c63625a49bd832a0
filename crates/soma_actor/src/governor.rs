//! Prospective load governor.
//!
//! Looks at what the last frame cost and decides how the next one runs. A
//! frame over budget throttles the next frame's fibers. A run of over-budget
//! frames drops the grid one accuracy tier; a long run of cheap frames climbs
//! back toward the configured tier, never above it.

use soma_core::{Accuracy, PerformanceBudget};

/// Tier change the actor must carry out before the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierChange {
    Keep,
    Downgrade(Accuracy),
    Upgrade(Accuracy),
}

#[derive(Debug, Clone)]
pub struct LoadGovernor {
    budget: PerformanceBudget,
    ceiling: Accuracy,
    current: Accuracy,
    over_streak: u32,
    under_streak: u32,
    throttled: bool,
    last_frame_ms: f64,
}

impl LoadGovernor {
    pub fn new(budget: PerformanceBudget, configured: Accuracy) -> Self {
        Self {
            budget,
            ceiling: configured,
            current: configured,
            over_streak: 0,
            under_streak: 0,
            throttled: false,
            last_frame_ms: 0.0,
        }
    }

    /// Tier the next frame runs at.
    pub fn accuracy(&self) -> Accuracy {
        self.current
    }

    /// Whether the next frame runs with half-amplitude fibers.
    pub fn throttled(&self) -> bool {
        self.throttled
    }

    pub fn last_frame_ms(&self) -> f64 {
        self.last_frame_ms
    }

    /// Feed the measured cost of the frame that just finished.
    pub fn observe(&mut self, frame_ms: f64) -> TierChange {
        self.last_frame_ms = frame_ms;
        let budget = self.budget.frame_budget_ms;

        if frame_ms > budget {
            self.throttled = true;
            self.under_streak = 0;
            self.over_streak += 1;
            if self.over_streak >= self.budget.downgrade_after.max(1) {
                self.over_streak = 0;
                let lower = self.current.step_down();
                if lower != self.current {
                    tracing::debug!(
                        "Load governor: {:.2} ms over {:.2} ms budget, {:?} -> {:?}",
                        frame_ms,
                        budget,
                        self.current,
                        lower
                    );
                    self.current = lower;
                    return TierChange::Downgrade(lower);
                }
            }
            return TierChange::Keep;
        }

        self.throttled = false;
        self.over_streak = 0;
        if frame_ms < 0.5 * budget {
            self.under_streak += 1;
            if self.under_streak >= self.budget.upgrade_after.max(1) && self.current < self.ceiling {
                self.under_streak = 0;
                let higher = self.current.step_up().min(self.ceiling);
                tracing::debug!(
                    "Load governor: headroom at {:.2} ms, {:?} -> {:?}",
                    frame_ms,
                    self.current,
                    higher
                );
                self.current = higher;
                return TierChange::Upgrade(higher);
            }
        } else {
            self.under_streak = 0;
        }
        TierChange::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor(configured: Accuracy) -> LoadGovernor {
        LoadGovernor::new(PerformanceBudget::default(), configured)
    }

    #[test]
    fn test_single_overrun_only_throttles() {
        let mut g = governor(Accuracy::Standard);
        assert!(!g.throttled());
        assert_eq!(g.observe(20.0), TierChange::Keep);
        assert!(g.throttled());
        assert_eq!(g.accuracy(), Accuracy::Standard);
        assert_eq!(g.observe(10.0), TierChange::Keep);
        assert!(!g.throttled());
    }

    #[test]
    fn test_three_overruns_step_down() {
        let mut g = governor(Accuracy::High);
        g.observe(20.0);
        g.observe(20.0);
        assert_eq!(g.observe(20.0), TierChange::Downgrade(Accuracy::Standard));
        assert_eq!(g.accuracy(), Accuracy::Standard);
        // Streak restarts after a downgrade
        g.observe(20.0);
        g.observe(20.0);
        assert_eq!(g.observe(20.0), TierChange::Downgrade(Accuracy::Realtime));
        g.observe(20.0);
        g.observe(20.0);
        assert_eq!(g.observe(20.0), TierChange::Keep);
        assert_eq!(g.accuracy(), Accuracy::Realtime);
    }

    #[test]
    fn test_interrupted_overruns_do_not_step_down() {
        let mut g = governor(Accuracy::Standard);
        g.observe(20.0);
        g.observe(20.0);
        g.observe(1.0);
        assert_eq!(g.observe(20.0), TierChange::Keep);
        assert_eq!(g.accuracy(), Accuracy::Standard);
    }

    #[test]
    fn test_recovers_up_to_configured_tier_only() {
        let mut g = governor(Accuracy::Standard);
        for _ in 0..3 {
            g.observe(50.0);
        }
        assert_eq!(g.accuracy(), Accuracy::Realtime);

        for _ in 0..299 {
            assert_eq!(g.observe(1.0), TierChange::Keep);
        }
        assert_eq!(g.observe(1.0), TierChange::Upgrade(Accuracy::Standard));
        for _ in 0..1000 {
            assert_eq!(g.observe(1.0), TierChange::Keep);
        }
        assert_eq!(g.accuracy(), Accuracy::Standard);
    }

    #[test]
    fn test_moderate_frames_reset_headroom_streak() {
        let mut g = governor(Accuracy::High);
        for _ in 0..3 {
            g.observe(50.0);
        }
        for _ in 0..299 {
            g.observe(1.0);
        }
        // Under budget but not under half of it
        g.observe(12.0);
        assert_eq!(g.observe(1.0), TierChange::Keep);
        assert_eq!(g.accuracy(), Accuracy::Standard);
    }
}
