//! Per-frame compression planning.
//!
//! The planner turns a frame's value into a compression decision in
//! `[0, 1]` using a closed-form rate allocation over a fitted
//! rate/distortion model
//!
//! ```text
//! phi(d) = -A · log2(1 - B·d) + C
//! ```
//!
//! where `phi(d)` is the fraction of the original cost a frame occupies when
//! stored at decision `d`. Setting the marginal distortion gain equal to the
//! marginal rate yields
//!
//! ```text
//! d = -A / (ln 2 · (zeta / eta) · value) + 1 / B
//! ```
//!
//! clamped to `[0, 1]`. A higher value or a higher `eta / zeta` ratio moves
//! the decision toward 1.

use crate::config::PlannerConfig;
use crate::segment::{SealedSegment, Segment};

/// Scale of the fitted rate model.
pub const RATE_A: f64 = 0.108_386_9;
/// Curvature of the fitted rate model.
pub const RATE_B: f64 = 0.998_372_49;
/// Floor of the fitted rate model (cost fraction at decision 0).
pub const RATE_C: f64 = 0.025_35;

/// Maps frame values to compression decisions and applies them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionPlanner {
    eta: f64,
    zeta: f64,
    sigma: usize,
}

impl CompressionPlanner {
    /// Creates a planner with the given trade-off weights and no smoothing.
    #[must_use]
    pub fn new(eta: f64, zeta: f64) -> Self {
        Self {
            eta,
            zeta,
            sigma: 0,
        }
    }

    /// Creates a planner from configuration.
    #[must_use]
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            eta: config.eta,
            zeta: config.zeta,
            sigma: config.filter_sigma,
        }
    }

    /// Compression decision for a frame.
    ///
    /// The cost does not enter the closed form; it is accepted so callers can
    /// plan from a `(cost, value)` pair. Worthless frames get decision 0.
    #[must_use]
    pub fn decide(&self, _cost: f64, value: f64) -> f64 {
        if value <= 0.0 {
            return 0.0;
        }
        let decision =
            -RATE_A / (std::f64::consts::LN_2 * (self.zeta / self.eta) * value) + 1.0 / RATE_B;
        if decision.is_nan() || decision <= 0.0 {
            0.0
        } else if decision >= 1.0 {
            1.0
        } else {
            decision
        }
    }

    /// Fraction of the original cost a frame keeps at `decision`.
    #[must_use]
    pub fn cost_ratio(decision: f64) -> f64 {
        -RATE_A * (1.0 - RATE_B * decision).log2() + RATE_C
    }

    /// Effective `(cost, value)` of a frame stored at `decision`.
    #[must_use]
    pub fn compress(original_cost: f64, value: f64, decision: f64) -> (f64, f64) {
        (original_cost * Self::cost_ratio(decision), value * decision)
    }

    /// Closes a segment for admission.
    ///
    /// Values are smoothed first, then every frame gets a decision from its
    /// working cost and value, and finally the working columns are rewritten:
    /// cost becomes the frame's original cost scaled by [`Self::cost_ratio`]
    /// and value is multiplied by the decision.
    #[must_use]
    pub fn seal(&self, index: u64, mut segment: Segment) -> SealedSegment {
        segment.smooth_values(self.sigma);

        let decisions: Vec<f64> = segment
            .costs()
            .iter()
            .zip(segment.values())
            .map(|(&cost, &value)| self.decide(cost, value))
            .collect();

        let mut next = decisions.iter();
        segment.map_columns(|frame, value, cost| {
            let decision = next.next().copied().unwrap_or(0.0);
            (*cost, *value) = Self::compress(frame.cost, *value, decision);
        });

        SealedSegment::new(index, segment, decisions)
    }
}
