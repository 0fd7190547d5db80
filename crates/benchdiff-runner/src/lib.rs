//! Measurement and comparison pipeline for benchdiff.
//!
//! - [`ProcessLauncher`]: spawn the executable under test with a timeout
//! - [`MetricRunner`]: warm up, then average the fps of repeated runs
//! - [`BenchmarkComparator`]: measure one scenario at both revisions
//! - [`Orchestrator`]: resolve revisions, write the config, run every scenario

mod comparator;
mod emulator_config;
mod launcher;
mod metrics;
mod orchestrator;
mod report;
mod runner;

pub use comparator::BenchmarkComparator;
pub use emulator_config::ConfigPreparer;
pub use launcher::{Invocation, LaunchOutcome, Launcher, ProcessLauncher};
pub use metrics::{clear_metrics, read_metrics};
pub use orchestrator::Orchestrator;
pub use report::{ScenarioOutcome, ScenarioReport, failed_count, has_regressions, render_text};
pub use runner::{METRICS_FLAG, MetricRunner};
