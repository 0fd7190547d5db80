//! Shared data model for the benchdiff A/B performance harness.
//!
//! This crate holds the types every other benchdiff crate passes around and
//! has no knowledge of processes or version control.
//!
//! # Overview
//!
//! - [`HarnessConfig`]: executable, arguments, run counts and limits
//! - [`RevisionPair`]: the old/new revisions, resolved once per process
//! - [`BenchmarkScenario`]: a named set of extra executable flags
//! - [`MetricAggregate`]: mean fps over the measured runs
//! - [`ComparisonResult`] and [`Classification`]: the verdict for a scenario
//! - [`BenchError`]: error type for all harness operations

mod classification;
mod config;
mod error;
mod types;

pub use classification::{Classification, ComparisonResult};
pub use config::{
    FPS_PERCENTAGE_EPSILON, HarnessConfig, PROCESS_TIMEOUT, PluginSet, RUN_COUNT, WARMUP_RUNS,
};
pub use error::BenchError;
pub use types::{
    BenchmarkScenario, MetricAggregate, MetricSample, Revision, RevisionPair, default_scenarios,
};
