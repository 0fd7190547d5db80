//! Per-scenario outcomes and their console rendering.

use std::fmt::Write as _;

use benchdiff_core::{BenchError, ComparisonResult, RevisionPair};

/// How a scenario ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioOutcome {
    Completed(ComparisonResult),
    Failed(BenchError),
}

/// One scenario's entry in the run report.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub scenario: String,
    pub revisions: RevisionPair,
    pub outcome: ScenarioOutcome,
}

impl ScenarioReport {
    pub fn result(&self) -> Option<&ComparisonResult> {
        match &self.outcome {
            ScenarioOutcome::Completed(result) => Some(result),
            ScenarioOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&BenchError> {
        match &self.outcome {
            ScenarioOutcome::Completed(_) => None,
            ScenarioOutcome::Failed(err) => Some(err),
        }
    }

    pub fn is_regression(&self) -> bool {
        self.result()
            .is_some_and(|result| result.classification.is_regression())
    }
}

/// Render the human-readable block for one scenario.
pub fn render_text(report: &ScenarioReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Benchmark - {} ({}) vs {}",
        report.scenario, report.revisions.old, report.revisions.new
    );
    match &report.outcome {
        ScenarioOutcome::Completed(result) => {
            let _ = writeln!(
                out,
                "FPS: {:.2} (old) | {:.2} (new)",
                result.old_fps, result.new_fps
            );
            let _ = writeln!(out, "Change: {:+.2}%", result.percentage_change);
            let _ = writeln!(out, "{}", result.classification.headline());
        }
        ScenarioOutcome::Failed(err) => {
            let _ = writeln!(out, "Skipped: {err}");
        }
    }
    out.push_str("------\n");
    out
}

/// Whether any scenario regressed.
pub fn has_regressions(reports: &[ScenarioReport]) -> bool {
    reports.iter().any(ScenarioReport::is_regression)
}

/// Number of scenarios that did not complete.
pub fn failed_count(reports: &[ScenarioReport]) -> usize {
    reports
        .iter()
        .filter(|report| report.error().is_some())
        .count()
}
