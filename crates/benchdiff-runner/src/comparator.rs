//! A/B comparison of one scenario across the old and new revisions.

use benchdiff_core::{BenchError, BenchmarkScenario, ComparisonResult, HarnessConfig, RevisionPair};
use benchdiff_vcs::{VersionControl, run_isolated};

use crate::launcher::Launcher;
use crate::report::{ScenarioOutcome, ScenarioReport};
use crate::runner::MetricRunner;

/// Measures a scenario at the new revision, then at the old one, leaving the
/// workspace at the new revision with its uncommitted changes in place.
pub struct BenchmarkComparator<'a, V, L> {
    config: &'a HarnessConfig,
    revisions: &'a RevisionPair,
    vcs: V,
    runner: MetricRunner<'a, L>,
}

impl<'a, V: VersionControl, L: Launcher> BenchmarkComparator<'a, V, L> {
    pub fn new(config: &'a HarnessConfig, revisions: &'a RevisionPair, vcs: V, launcher: L) -> Self {
        BenchmarkComparator {
            config,
            revisions,
            vcs,
            runner: MetricRunner::new(config, launcher),
        }
    }

    /// Compare `scenario`, propagating the first failure.
    ///
    /// The workspace is restored to the new revision before any error is
    /// returned.
    pub fn compare(&mut self, scenario: &BenchmarkScenario) -> Result<ComparisonResult, BenchError> {
        let revisions = self.revisions;
        let label = format!("{}-{}", self.config.stash_label, scenario.name);
        let runner = &mut self.runner;

        let new = run_isolated(&mut self.vcs, &label, &revisions.new, &revisions.new, || {
            runner.run(scenario, &revisions.new)
        })?;
        let old = run_isolated(&mut self.vcs, &label, &revisions.old, &revisions.new, || {
            runner.run(scenario, &revisions.old)
        })?;

        ComparisonResult::from_aggregates(revisions, &old, &new, self.config.fps_epsilon)
    }

    /// Compare `scenario`, converting a failure into a skipped report.
    pub fn evaluate(&mut self, scenario: &BenchmarkScenario) -> ScenarioReport {
        let outcome = match self.compare(scenario) {
            Ok(result) => {
                tracing::info!(
                    component = "comparator",
                    scenario = %scenario.name,
                    old_fps = result.old_fps,
                    new_fps = result.new_fps,
                    percentage_change = result.percentage_change,
                    classification = %result.classification,
                    status = "ok",
                    "scenario compared"
                );
                ScenarioOutcome::Completed(result)
            }
            Err(err) => {
                tracing::error!(
                    component = "comparator",
                    scenario = %scenario.name,
                    code = err.code(),
                    status = "error",
                    "scenario skipped: {err}"
                );
                ScenarioOutcome::Failed(err)
            }
        };

        ScenarioReport {
            scenario: scenario.name.clone(),
            revisions: self.revisions.clone(),
            outcome,
        }
    }
}
