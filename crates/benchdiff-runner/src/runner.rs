//! Averaged fps measurement for one scenario at one revision.

use std::path::{Path, PathBuf};

use benchdiff_core::{
    BenchError, BenchmarkScenario, HarnessConfig, MetricAggregate, MetricSample, Revision,
};
use benchdiff_tools::max_peak;

use crate::launcher::{Invocation, Launcher};
use crate::metrics::{clear_metrics, read_metrics};

/// Flag telling the executable where to write its metrics.
pub const METRICS_FLAG: &str = "-b";

/// Runs the executable under test and averages its reported fps.
pub struct MetricRunner<'a, L> {
    config: &'a HarnessConfig,
    launcher: L,
}

impl<'a, L: Launcher> MetricRunner<'a, L> {
    pub fn new(config: &'a HarnessConfig, launcher: L) -> Self {
        MetricRunner { config, launcher }
    }

    /// Where this scenario's metrics file is read from.
    pub fn metrics_path(&self, scenario: &BenchmarkScenario) -> PathBuf {
        self.config.working_dir.join(scenario.metrics_file_name())
    }

    /// Build the command line for `scenario`.
    ///
    /// The metrics path is passed relative to the working directory, which is
    /// also the child's current directory.
    pub fn invocation(&self, scenario: &BenchmarkScenario) -> Invocation {
        let mut args = Vec::with_capacity(self.config.baseline_args.len() + scenario.args.len() + 2);
        args.extend(self.config.baseline_args.iter().cloned());
        args.extend(scenario.args.iter().cloned());
        args.push(METRICS_FLAG.to_string());
        args.push(scenario.metrics_file_name());

        Invocation {
            program: self.config.executable.clone(),
            args,
            working_dir: self.config.working_dir.clone(),
            timeout: self.config.timeout,
        }
    }

    /// Warm up, then average `run_count` measured invocations.
    ///
    /// Any process or metrics failure aborts the measurement. The metrics
    /// file is removed afterwards so nothing is left in the working tree.
    pub fn run(
        &mut self,
        scenario: &BenchmarkScenario,
        revision: &Revision,
    ) -> Result<MetricAggregate, BenchError> {
        let metrics_path = self.metrics_path(scenario);
        let result = self.measure(scenario, revision, &metrics_path);
        if let Err(err) = clear_metrics(&metrics_path) {
            tracing::warn!(
                component = "runner",
                scenario = %scenario.name,
                error = %err,
                "cannot remove metrics file"
            );
        }
        result
    }

    fn measure(
        &mut self,
        scenario: &BenchmarkScenario,
        revision: &Revision,
        metrics_path: &Path,
    ) -> Result<MetricAggregate, BenchError> {
        let invocation = self.invocation(scenario);

        for warmup in 0..self.config.warmup_runs {
            clear_metrics(metrics_path)?;
            let outcome = self.launcher.launch(&invocation)?;
            tracing::debug!(
                component = "runner",
                scenario = %scenario.name,
                revision = %revision,
                warmup = warmup + 1,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "warmup run finished"
            );
        }

        let mut samples: Vec<MetricSample> = Vec::with_capacity(self.config.run_count);
        let mut peak_rss_bytes = None;
        for run in 0..self.config.run_count {
            clear_metrics(metrics_path)?;
            let outcome = self.launcher.launch(&invocation)?;
            let sample = read_metrics(metrics_path)?;
            tracing::info!(
                component = "runner",
                scenario = %scenario.name,
                revision = %revision,
                run = run + 1,
                fps = sample.fps,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "measured run finished"
            );
            peak_rss_bytes = max_peak(peak_rss_bytes, outcome.peak_rss_bytes);
            samples.push(sample);
        }

        MetricAggregate::from_samples(&samples, peak_rss_bytes).ok_or_else(|| {
            BenchError::InvalidInput("run count must be greater than zero".to_string())
        })
    }
}
