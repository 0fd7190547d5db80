//! Comparison results and their classification.

use serde::Serialize;

use crate::{BenchError, MetricAggregate, RevisionPair};

/// Outcome of comparing the new revision against the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Change is smaller than the margin of error.
    WithinMargin,
    /// New revision is measurably faster.
    Improvement,
    /// New revision is measurably slower.
    Regression,
}

impl Classification {
    /// Classify a percentage change against `epsilon` (strict `<`).
    pub fn classify(percentage_change: f64, epsilon: f64) -> Self {
        if percentage_change.abs() < epsilon {
            Classification::WithinMargin
        } else if percentage_change > 0.0 {
            Classification::Improvement
        } else {
            Classification::Regression
        }
    }

    pub fn is_regression(self) -> bool {
        matches!(self, Classification::Regression)
    }

    /// Line printed in the console report.
    pub fn headline(self) -> &'static str {
        match self {
            Classification::WithinMargin => "Within margin of error.",
            Classification::Improvement => "IMPROVEMENT",
            Classification::Regression => "REGRESSION",
        }
    }

    /// Get a machine-readable string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::WithinMargin => "within_margin",
            Classification::Improvement => "improvement",
            Classification::Regression => "regression",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one scenario's A/B comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub revisions: RevisionPair,
    pub old_fps: f64,
    pub new_fps: f64,
    pub delta: f64,
    pub percentage_change: f64,
    pub classification: Classification,
    pub old_peak_rss_bytes: Option<u64>,
    pub new_peak_rss_bytes: Option<u64>,
}

impl ComparisonResult {
    /// Derive delta, percentage change and classification.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::DegenerateBaseline`] when the old revision
    /// measured 0 fps, since no percentage can be formed against it.
    pub fn from_aggregates(
        revisions: &RevisionPair,
        old: &MetricAggregate,
        new: &MetricAggregate,
        epsilon: f64,
    ) -> Result<Self, BenchError> {
        if old.fps == 0.0 {
            return Err(BenchError::DegenerateBaseline {
                revision: revisions.old.to_string(),
            });
        }
        let delta = new.fps - old.fps;
        let percentage_change = delta / old.fps * 100.0;
        Ok(ComparisonResult {
            revisions: revisions.clone(),
            old_fps: old.fps,
            new_fps: new.fps,
            delta,
            percentage_change,
            classification: Classification::classify(percentage_change, epsilon),
            old_peak_rss_bytes: old.peak_rss_bytes,
            new_peak_rss_bytes: new.peak_rss_bytes,
        })
    }
}
