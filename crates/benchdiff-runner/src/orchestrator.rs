//! Full benchmark pass over every scenario.

use benchdiff_core::{BenchError, BenchmarkScenario, HarnessConfig, default_scenarios};
use benchdiff_vcs::{RevisionRequest, VersionControl, resolve_revisions};

use crate::comparator::BenchmarkComparator;
use crate::emulator_config::ConfigPreparer;
use crate::launcher::Launcher;
use crate::report::{ScenarioReport, failed_count, has_regressions};

/// Drives one process run: resolve revisions, write the emulator
/// configuration, then compare each scenario in order.
pub struct Orchestrator<V, L> {
    config: HarnessConfig,
    vcs: V,
    launcher: L,
    scenarios: Vec<BenchmarkScenario>,
    preparer: ConfigPreparer,
}

impl<V: VersionControl, L: Launcher> Orchestrator<V, L> {
    pub fn new(config: HarnessConfig, vcs: V, launcher: L) -> Self {
        let preparer = ConfigPreparer::from_config(&config);
        Orchestrator {
            config,
            vcs,
            launcher,
            scenarios: default_scenarios(),
            preparer,
        }
    }

    /// Replace the scenario list.
    pub fn with_scenarios(mut self, scenarios: Vec<BenchmarkScenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn scenarios(&self) -> &[BenchmarkScenario] {
        &self.scenarios
    }

    /// Run every scenario, handing each report to `on_report` as soon as it
    /// is ready.
    ///
    /// Scenario failures are recorded in the returned reports. Invalid
    /// settings, revision resolution and the configuration write abort the
    /// run before the workspace is touched. A scenario that fails with a
    /// setup error (see [`BenchError::is_scenario_fatal`]) is reported, then
    /// stops the run.
    pub fn run<F>(
        &mut self,
        request: &RevisionRequest,
        mut on_report: F,
    ) -> Result<Vec<ScenarioReport>, BenchError>
    where
        F: FnMut(&ScenarioReport),
    {
        self.config.validate()?;
        let revisions = resolve_revisions(&mut self.vcs, request)?;
        self.preparer.prepare()?;

        tracing::info!(
            component = "orchestrator",
            old = %revisions.old,
            new = %revisions.new,
            scenarios = self.scenarios.len(),
            "starting benchmark run"
        );

        let mut reports = Vec::with_capacity(self.scenarios.len());
        for scenario in &self.scenarios {
            let mut comparator = BenchmarkComparator::new(
                &self.config,
                &revisions,
                &mut self.vcs,
                &mut self.launcher,
            );
            let report = comparator.evaluate(scenario);
            on_report(&report);
            if let Some(err) = report.error() {
                if !err.is_scenario_fatal() {
                    tracing::error!(
                        component = "orchestrator",
                        scenario = %scenario.name,
                        error = %err,
                        "setup error, stopping run"
                    );
                    return Err(err.clone());
                }
            }
            reports.push(report);
        }

        tracing::info!(
            component = "orchestrator",
            scenarios = reports.len(),
            failed = failed_count(&reports),
            regressions = has_regressions(&reports),
            "benchmark run finished"
        );
        Ok(reports)
    }
}
