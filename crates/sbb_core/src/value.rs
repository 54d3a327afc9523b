//! Frame value models.
//!
//! The recorder never computes values itself. It consumes a [`ValueOracle`]
//! that maps the classifier signals of a frame to a scalar value. The
//! [`ValueModel`] implementations cover the models configured through
//! [`ValueConfig`]; any other scorer can be plugged in through the trait.

use crate::config::{ValueConfig, ValueKind};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Classifier outputs for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSignals {
    /// Normalised anomaly score in `[0, 1]`.
    pub anomaly_score: f64,
    /// Class probabilities. Entry 0 is the "normal" class; entries `1..` are
    /// scored classes.
    #[serde(default)]
    pub class_scores: Vec<f64>,
}

impl FrameSignals {
    /// Creates signals with an anomaly score only.
    #[must_use]
    pub fn anomaly(score: f64) -> Self {
        Self {
            anomaly_score: score,
            class_scores: Vec::new(),
        }
    }

    /// Sets the class probabilities.
    #[must_use]
    pub fn with_class_scores(mut self, scores: Vec<f64>) -> Self {
        self.class_scores = scores;
        self
    }
}

/// Maps frame signals to a frame value.
///
/// Implementations must be deterministic. Errors are not retried.
pub trait ValueOracle {
    /// Scores one frame.
    ///
    /// # Errors
    ///
    /// Returns `Oracle` if the signals are malformed for this model.
    fn score(&self, signals: &FrameSignals) -> CoreResult<f64>;
}

/// The configurable value models.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueModel {
    /// Value is the anomaly score.
    Anomaly,
    /// Value is the class scores weighted by `class_values`.
    Class {
        /// Weight per scored class.
        class_values: Vec<f64>,
    },
    /// `alpha · class + beta · anomaly`.
    Hybrid {
        /// Weight per scored class.
        class_values: Vec<f64>,
        /// Weight of the class term.
        alpha: f64,
        /// Weight of the anomaly term.
        beta: f64,
    },
}

impl ValueModel {
    /// Builds the model selected by `config.value_type`.
    #[must_use]
    pub fn from_config(config: &ValueConfig) -> Self {
        match config.value_type {
            ValueKind::Anomaly => ValueModel::Anomaly,
            ValueKind::Class => ValueModel::Class {
                class_values: config.class_values.clone(),
            },
            ValueKind::Hybrid => ValueModel::Hybrid {
                class_values: config.class_values.clone(),
                alpha: config.hybrid_value_alpha,
                beta: config.hybrid_value_beta,
            },
        }
    }
}

impl ValueOracle for ValueModel {
    fn score(&self, signals: &FrameSignals) -> CoreResult<f64> {
        match self {
            ValueModel::Anomaly => Ok(signals.anomaly_score),
            ValueModel::Class { class_values } => class_weighted(class_values, signals),
            ValueModel::Hybrid {
                class_values,
                alpha,
                beta,
            } => Ok(alpha * class_weighted(class_values, signals)? + beta * signals.anomaly_score),
        }
    }
}

fn class_weighted(class_values: &[f64], signals: &FrameSignals) -> CoreResult<f64> {
    let scored = signals.class_scores.get(1..).unwrap_or_default();
    if scored.len() != class_values.len() {
        return Err(CoreError::oracle(format!(
            "expected {} class scores after the normal class, got {}",
            class_values.len(),
            scored.len()
        )));
    }
    Ok(class_values.iter().zip(scored).map(|(w, p)| w * p).sum())
}

/// Min-max normalises scores in place.
///
/// The smallest score maps to 0 and the largest to 1. If every score is
/// equal, all of them become 0.
pub fn normalize_scores(scores: &mut [f64]) {
    let (min, max) = scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        });
    let range = max - min;
    for score in scores.iter_mut() {
        *score = if range > 0.0 {
            (*score - min) / range
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn anomaly_model_passes_score_through() {
        let model = ValueModel::Anomaly;
        assert_eq!(model.score(&FrameSignals::anomaly(0.42)).unwrap(), 0.42);
    }

    #[test]
    fn class_model_skips_normal_class() {
        let model = ValueModel::Class {
            class_values: vec![0.5, 2.0],
        };
        let signals = FrameSignals::anomaly(0.9).with_class_scores(vec![0.7, 0.1, 0.2]);

        assert!(close(model.score(&signals).unwrap(), 0.5 * 0.1 + 2.0 * 0.2));
    }

    #[test]
    fn hybrid_model_mixes_terms() {
        let model = ValueModel::Hybrid {
            class_values: vec![1.0],
            alpha: 0.25,
            beta: 0.75,
        };
        let signals = FrameSignals::anomaly(0.4).with_class_scores(vec![0.2, 0.8]);

        assert!(close(model.score(&signals).unwrap(), 0.25 * 0.8 + 0.75 * 0.4));
    }

    #[test]
    fn class_length_mismatch_is_oracle_error() {
        let model = ValueModel::Class {
            class_values: vec![1.0, 1.0],
        };
        let signals = FrameSignals::anomaly(0.0).with_class_scores(vec![0.5, 0.5]);

        assert!(matches!(model.score(&signals), Err(CoreError::Oracle { .. })));
        assert!(matches!(
            model.score(&FrameSignals::anomaly(0.0)),
            Err(CoreError::Oracle { .. })
        ));
    }

    #[test]
    fn model_from_config() {
        let config = ValueConfig {
            value_type: ValueKind::Hybrid,
            class_values: vec![0.3],
            hybrid_value_alpha: 0.6,
            hybrid_value_beta: 0.4,
        };
        assert_eq!(
            ValueModel::from_config(&config),
            ValueModel::Hybrid {
                class_values: vec![0.3],
                alpha: 0.6,
                beta: 0.4
            }
        );
        assert_eq!(
            ValueModel::from_config(&ValueConfig::default()),
            ValueModel::Anomaly
        );
    }

    #[test]
    fn normalize_maps_to_unit_interval() {
        let mut scores = vec![2.0, 4.0, 3.0];
        normalize_scores(&mut scores);
        assert_eq!(scores, vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn normalize_flat_and_empty() {
        let mut flat = vec![3.0, 3.0];
        normalize_scores(&mut flat);
        assert_eq!(flat, vec![0.0, 0.0]);

        let mut empty: Vec<f64> = Vec::new();
        normalize_scores(&mut empty);
        assert!(empty.is_empty());
    }

    proptest! {
        #[test]
        fn normalized_scores_stay_in_unit_interval(
            mut scores in proptest::collection::vec(-1e6f64..1e6, 0..50),
        ) {
            normalize_scores(&mut scores);
            for s in scores {
                prop_assert!((0.0..=1.0).contains(&s));
            }
        }
    }
}
