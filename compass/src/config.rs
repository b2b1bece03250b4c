//! Engine-level tuning knobs.

use util::config;

/// Thresholds used by the cluster builder and the default feedback selector.
#[derive(Debug, Clone, PartialEq)]
pub struct CompassConfig {
    /// Minimum overall similarity to a cluster representative for an element to join it.
    pub similarity_threshold: f64,
    /// Minimum share of candidate feedback that has to agree before it is suggested.
    pub confidence_threshold: f64,
    /// Compare against cluster representatives on the rayon pool.
    pub parallel_comparisons: bool,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            confidence_threshold: 0.0,
            parallel_comparisons: true,
        }
    }
}

impl CompassConfig {
    /// Reads the `COMPASS_*` values from the global application config.
    pub fn from_app_config() -> Self {
        Self {
            similarity_threshold: config::similarity_threshold(),
            confidence_threshold: config::confidence_threshold(),
            parallel_comparisons: config::parallel_comparisons(),
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_parallel_comparisons(mut self, parallel: bool) -> Self {
        self.parallel_comparisons = parallel;
        self
    }
}
