//! Recorder configuration.
//!
//! All tunables are immutable for a run. The groups are flattened when
//! (de)serialised, so a flat `params.json` maps directly onto [`Config`]:
//!
//! ```json
//! {
//!   "major_buffer_max": 600, "wait_buffer_max": 30, "pre_buffer_min": 20,
//!   "similarity_threshold": 10, "value_threshold": 0,
//!   "max_memory_mb": 512, "inflation_factor": 1.01, "fifo": false,
//!   "eta": 1.0, "zeta": 1.0, "filter_sigma": 5,
//!   "value_type": "hybrid", "class_values": [0.2, 0.8],
//!   "hybrid_value_alpha": 0.5, "hybrid_value_beta": 0.5
//! }
//! ```

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Limits and thresholds of the segmentation machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Size cap of the major segment (input 5 when reached).
    pub major_buffer_max: usize,
    /// Size cap of the wait segment (input 6 when reached).
    pub wait_buffer_max: usize,
    /// Number of frames carried over into the next segment as precursor.
    pub pre_buffer_min: usize,
    /// Similarity above which a frame is considered related to the major segment.
    pub similarity_threshold: f64,
    /// Value above which a frame is considered worth keeping.
    pub value_threshold: f64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            major_buffer_max: 600,
            wait_buffer_max: 30,
            pre_buffer_min: 20,
            similarity_threshold: 10.0,
            value_threshold: 0.0,
        }
    }
}

/// Budget and ordering of the eviction queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Storage budget in MiB.
    pub max_memory_mb: f64,
    /// Base of the exponential recency weighting of segment priority.
    pub inflation_factor: f64,
    /// Evict strictly oldest-first instead of lowest-priority-first.
    pub fifo: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_memory_mb: 1024.0,
            inflation_factor: 1.0,
            fifo: false,
        }
    }
}

impl QueueConfig {
    /// Returns the budget in bytes.
    #[must_use]
    pub fn budget_bytes(&self) -> f64 {
        self.max_memory_mb * BYTES_PER_MB
    }

    /// Sets the budget in bytes.
    #[must_use]
    pub fn with_budget_bytes(mut self, bytes: f64) -> Self {
        self.max_memory_mb = bytes / BYTES_PER_MB;
        self
    }

    /// Sets the inflation factor.
    #[must_use]
    pub fn with_inflation_factor(mut self, factor: f64) -> Self {
        self.inflation_factor = factor;
        self
    }

    /// Sets FIFO mode.
    #[must_use]
    pub fn with_fifo(mut self, fifo: bool) -> Self {
        self.fifo = fifo;
        self
    }
}

/// Compression planning and value smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Allowed distortion weight.
    pub eta: f64,
    /// Rate weight.
    pub zeta: f64,
    /// Width of the edge-spreading bumps applied to values before planning (0 disables).
    pub filter_sigma: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            eta: 1.0,
            zeta: 1.0,
            filter_sigma: 0,
        }
    }
}

/// How a frame value is derived from classifier signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// The normalised anomaly score.
    #[default]
    #[serde(alias = "vad")]
    Anomaly,
    /// Class scores weighted by `class_values`.
    #[serde(alias = "oad")]
    Class,
    /// Weighted sum of the two above.
    Hybrid,
}

/// Value model parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueConfig {
    /// Which value model to use.
    pub value_type: ValueKind,
    /// Per-class weights for the class model.
    pub class_values: Vec<f64>,
    /// Weight of the class term in the hybrid model.
    pub hybrid_value_alpha: f64,
    /// Weight of the anomaly term in the hybrid model.
    pub hybrid_value_beta: f64,
}

/// Complete configuration for a recording run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Segmentation machine settings.
    #[serde(flatten)]
    pub machine: MachineConfig,
    /// Eviction queue settings.
    #[serde(flatten)]
    pub queue: QueueConfig,
    /// Compression planner settings.
    #[serde(flatten)]
    pub planner: PlannerConfig,
    /// Value model settings.
    #[serde(flatten)]
    pub value: ValueConfig,
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from a JSON document.
    ///
    /// Missing keys take their default value. The result is validated.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serialises the configuration as pretty-printed flat JSON.
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Sets the major segment size cap.
    #[must_use]
    pub fn major_buffer_max(mut self, size: usize) -> Self {
        self.machine.major_buffer_max = size;
        self
    }

    /// Sets the wait segment size cap.
    #[must_use]
    pub fn wait_buffer_max(mut self, size: usize) -> Self {
        self.machine.wait_buffer_max = size;
        self
    }

    /// Sets the precursor length.
    #[must_use]
    pub fn pre_buffer_min(mut self, size: usize) -> Self {
        self.machine.pre_buffer_min = size;
        self
    }

    /// Sets the similarity threshold.
    #[must_use]
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.machine.similarity_threshold = threshold;
        self
    }

    /// Sets the value threshold.
    #[must_use]
    pub fn value_threshold(mut self, threshold: f64) -> Self {
        self.machine.value_threshold = threshold;
        self
    }

    /// Sets the queue settings.
    #[must_use]
    pub fn queue(mut self, queue: QueueConfig) -> Self {
        self.queue = queue;
        self
    }

    /// Sets the planner trade-off weights.
    #[must_use]
    pub fn rate_weights(mut self, eta: f64, zeta: f64) -> Self {
        self.planner.eta = eta;
        self.planner.zeta = zeta;
        self
    }

    /// Sets the smoothing width.
    #[must_use]
    pub fn filter_sigma(mut self, sigma: usize) -> Self {
        self.planner.filter_sigma = sigma;
        self
    }

    /// Checks that the configuration can drive a run.
    pub fn validate(&self) -> CoreResult<()> {
        let m = &self.machine;
        if m.major_buffer_max == 0 || m.wait_buffer_max == 0 {
            return Err(CoreError::invalid_config("buffer caps must be positive"));
        }
        if m.major_buffer_max <= m.pre_buffer_min {
            return Err(CoreError::invalid_config(format!(
                "major_buffer_max ({}) must exceed pre_buffer_min ({})",
                m.major_buffer_max, m.pre_buffer_min
            )));
        }
        if m.similarity_threshold.is_nan() || m.value_threshold.is_nan() {
            return Err(CoreError::invalid_config("thresholds must not be NaN"));
        }

        let q = &self.queue;
        let budget = q.budget_bytes();
        if budget.is_nan() || budget <= 0.0 {
            return Err(CoreError::invalid_config("budget must be positive"));
        }
        if !q.inflation_factor.is_finite() || q.inflation_factor <= 0.0 {
            return Err(CoreError::invalid_config(
                "inflation_factor must be positive and finite",
            ));
        }

        let p = &self.planner;
        for (name, weight) in [("eta", p.eta), ("zeta", p.zeta)] {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(CoreError::invalid_config(format!(
                    "{name} must be positive and finite, got {weight}"
                )));
            }
        }

        Ok(())
    }
}
