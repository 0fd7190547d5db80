//! Core data model shared by the runner, the VCS guard and the CLI.

use serde::{Deserialize, Serialize};

/// Short identifier of a point in version history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    /// Wrap an already-resolved short hash.
    pub fn new(id: impl Into<String>) -> Self {
        Revision(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two revisions under comparison, resolved once before any workspace
/// mutation and passed by reference from then on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionPair {
    pub old: Revision,
    pub new: Revision,
}

impl RevisionPair {
    pub fn new(old: Revision, new: Revision) -> Self {
        RevisionPair { old, new }
    }
}

/// A named set of extra flags for the executable under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkScenario {
    pub name: String,
    pub args: Vec<String>,
}

impl BenchmarkScenario {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BenchmarkScenario {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// File name the executable writes this scenario's metrics to.
    pub fn metrics_file_name(&self) -> String {
        format!("benchmark_{}.json", self.name)
    }
}

/// Built-in scenarios, in execution order.
pub fn default_scenarios() -> Vec<BenchmarkScenario> {
    vec![
        BenchmarkScenario::new("normal", Vec::<String>::new()),
        BenchmarkScenario::new("with-dummy-lua", ["-lua", "dummy.lua"]),
    ]
}

/// One parsed metrics file.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct MetricSample {
    pub fps: f64,
}

/// Mean of the measured samples for one (scenario, revision) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricAggregate {
    pub fps: f64,
    /// Number of measured samples that went into `fps`.
    pub samples: usize,
    /// Largest resident set observed across the measured runs.
    pub peak_rss_bytes: Option<u64>,
}

impl MetricAggregate {
    /// Average `samples`. Returns `None` for an empty slice.
    pub fn from_samples(samples: &[MetricSample], peak_rss_bytes: Option<u64>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let sum: f64 = samples.iter().map(|sample| sample.fps).sum();
        Some(MetricAggregate {
            fps: sum / samples.len() as f64,
            samples: samples.len(),
            peak_rss_bytes,
        })
    }
}
