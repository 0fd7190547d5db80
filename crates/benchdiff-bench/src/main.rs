use benchdiff_core::{BenchError, BenchmarkScenario, HarnessConfig, default_scenarios};
use benchdiff_runner::{
    Orchestrator, ProcessLauncher, ScenarioOutcome, ScenarioReport, failed_count,
    has_regressions, render_text,
};
use benchdiff_tools::init_logging;
use benchdiff_vcs::{GitCli, RevisionRequest};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const SCHEMA_VERSION: u32 = 1;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Compare emulator frame rates between two revisions"
)]
struct Cli {
    /// Old revision (defaults to the parent of the current revision)
    #[arg(long)]
    old: Option<String>,

    /// New revision (defaults to the current revision)
    #[arg(long)]
    new: Option<String>,

    /// Executable under test
    #[arg(long)]
    executable: Option<PathBuf>,

    /// Working directory for the executable and its metrics files
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Repository root
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Built-in scenarios to run (default: all)
    #[arg(long = "scenario", value_delimiter = ',')]
    scenarios: Vec<String>,

    /// Output format for stdout
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// JSONL output artifact path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Exit with status 1 if any scenario regressed or failed
    #[arg(long)]
    fail_on_regression: bool,

    /// Log filter, overriding BENCHDIFF_TRACE
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Ndjson,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct BenchRecord {
    schema_version: u32,
    run_id: String,
    scenario: String,
    old_revision: String,
    new_revision: String,
    old_fps: Option<f64>,
    new_fps: Option<f64>,
    delta: Option<f64>,
    percentage_change: Option<f64>,
    classification: Option<String>,
    old_peak_rss_bytes: Option<u64>,
    new_peak_rss_bytes: Option<u64>,
    status: String,
    error_code: Option<String>,
    error: Option<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    let scenarios = select_scenarios(&cli.scenarios)?;
    let config = build_config(&cli, &std::env::current_dir()?);
    let request = RevisionRequest {
        old: cli.old.clone(),
        new: cli.new.clone(),
    };
    let run_id = build_run_id()?;

    let mut orchestrator =
        Orchestrator::new(config, GitCli::new(&cli.repo), ProcessLauncher::new())
            .with_scenarios(scenarios);
    let stream_table = cli.format == OutputFormat::Table;
    let reports = orchestrator.run(&request, |report| {
        if stream_table {
            print!("{}", render_text(report));
        }
    })?;

    let records: Vec<BenchRecord> = reports
        .iter()
        .map(|report| build_record(&run_id, report))
        .collect();

    render_output(cli.format, &records)?;
    if let Some(path) = &cli.output {
        write_records_jsonl(path, &records)?;
        announce_artifact(
            cli.format,
            path,
            &mut std::io::stdout(),
            &mut std::io::stderr(),
        )?;
    }

    if cli.fail_on_regression && (has_regressions(&reports) || failed_count(&reports) > 0) {
        return Err(boxed_input_error(
            "regression or failed scenario (see report)",
        ));
    }

    Ok(())
}

/// Settings from the command line, with the executable anchored at `cwd`.
fn build_config(cli: &Cli, cwd: &Path) -> HarnessConfig {
    let mut config = HarnessConfig::new();
    if let Some(executable) = &cli.executable {
        config = config.with_executable(executable);
    }
    if let Some(dir) = &cli.working_dir {
        config = config.with_working_dir(dir);
    }
    config.anchored_to(cwd)
}

/// Pick built-in scenarios by name, keeping the requested order.
fn select_scenarios(names: &[String]) -> Result<Vec<BenchmarkScenario>, BenchError> {
    let available = default_scenarios();
    if names.is_empty() {
        return Ok(available);
    }

    let mut selected: Vec<BenchmarkScenario> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if selected.iter().any(|scenario| scenario.name == name) {
            continue;
        }
        match available.iter().find(|scenario| scenario.name == name) {
            Some(scenario) => selected.push(scenario.clone()),
            None => {
                let known: Vec<&str> = available
                    .iter()
                    .map(|scenario| scenario.name.as_str())
                    .collect();
                return Err(BenchError::InvalidInput(format!(
                    "unknown scenario '{name}' (expected one of: {})",
                    known.join(", ")
                )));
            }
        }
    }
    Ok(selected)
}

fn build_record(run_id: &str, report: &ScenarioReport) -> BenchRecord {
    let mut record = BenchRecord {
        schema_version: SCHEMA_VERSION,
        run_id: run_id.to_string(),
        scenario: report.scenario.clone(),
        old_revision: report.revisions.old.to_string(),
        new_revision: report.revisions.new.to_string(),
        old_fps: None,
        new_fps: None,
        delta: None,
        percentage_change: None,
        classification: None,
        old_peak_rss_bytes: None,
        new_peak_rss_bytes: None,
        status: String::new(),
        error_code: None,
        error: None,
    };

    match &report.outcome {
        ScenarioOutcome::Completed(result) => {
            record.old_fps = Some(result.old_fps);
            record.new_fps = Some(result.new_fps);
            record.delta = Some(result.delta);
            record.percentage_change = Some(result.percentage_change);
            record.classification = Some(result.classification.as_str().to_string());
            record.old_peak_rss_bytes = result.old_peak_rss_bytes;
            record.new_peak_rss_bytes = result.new_peak_rss_bytes;
            record.status = "ok".to_string();
        }
        ScenarioOutcome::Failed(err) => {
            record.status = "error".to_string();
            record.error_code = Some(err.code().to_string());
            record.error = Some(err.to_string());
        }
    }
    record
}

fn render_output(
    format: OutputFormat,
    records: &[BenchRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Table => {
            print_summary_line(records);
            Ok(())
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
            Ok(())
        }
        OutputFormat::Ndjson => {
            for record in records {
                println!("{}", serde_json::to_string(record)?);
            }
            Ok(())
        }
    }
}

fn print_summary_line(records: &[BenchRecord]) {
    let count = |classification: &str| {
        records
            .iter()
            .filter(|record| record.classification.as_deref() == Some(classification))
            .count()
    };
    let failed = records
        .iter()
        .filter(|record| record.status == "error")
        .count();
    println!(
        "{} scenarios: {} improved, {} regressed, {} within margin, {} skipped",
        records.len(),
        count("improvement"),
        count("regression"),
        count("within_margin"),
        failed
    );
}

fn write_records_jsonl(
    path: &Path,
    records: &[BenchRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Name the JSONL artifact. Only the table format shares stdout with it.
fn announce_artifact(
    format: OutputFormat,
    path: &Path,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Table => writeln!(stdout, "artifact: {}", path.display()),
        OutputFormat::Json | OutputFormat::Ndjson => {
            writeln!(stderr, "artifact: {}", path.display())
        }
    }
}

fn build_run_id() -> Result<String, Box<dyn std::error::Error>> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| std::io::Error::other(err.to_string()))?
        .as_millis();
    Ok(format!("benchdiff_{}", millis))
}

fn boxed_input_error(message: &str) -> Box<dyn std::error::Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        message.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, OutputFormat, announce_artifact, build_config, build_record, select_scenarios,
        write_records_jsonl,
    };
    use benchdiff_core::{BenchError, Classification, ComparisonResult, Revision, RevisionPair};
    use benchdiff_runner::{ScenarioOutcome, ScenarioReport};
    use clap::Parser;
    use std::path::{Path, PathBuf};

    fn revisions() -> RevisionPair {
        RevisionPair::new(Revision::new("1a2b3c4"), Revision::new("5d6e7f8"))
    }

    fn completed() -> ScenarioReport {
        ScenarioReport {
            scenario: "normal".to_string(),
            revisions: revisions(),
            outcome: ScenarioOutcome::Completed(ComparisonResult {
                revisions: revisions(),
                old_fps: 60.0,
                new_fps: 54.0,
                delta: -6.0,
                percentage_change: -10.0,
                classification: Classification::Regression,
                old_peak_rss_bytes: Some(1_024),
                new_peak_rss_bytes: None,
            }),
        }
    }

    #[test]
    fn build_record_for_completed_scenario() {
        let record = build_record("run", &completed());
        assert_eq!(record.schema_version, 1);
        assert_eq!(record.old_revision, "1a2b3c4");
        assert_eq!(record.new_revision, "5d6e7f8");
        assert_eq!(record.old_fps, Some(60.0));
        assert_eq!(record.percentage_change, Some(-10.0));
        assert_eq!(record.classification.as_deref(), Some("regression"));
        assert_eq!(record.old_peak_rss_bytes, Some(1_024));
        assert_eq!(record.status, "ok");
        assert!(record.error.is_none());
    }

    #[test]
    fn build_record_for_failed_scenario() {
        let report = ScenarioReport {
            scenario: "with-dummy-lua".to_string(),
            revisions: revisions(),
            outcome: ScenarioOutcome::Failed(BenchError::DegenerateBaseline {
                revision: "1a2b3c4".to_string(),
            }),
        };
        let record = build_record("run", &report);
        assert_eq!(record.status, "error");
        assert_eq!(record.error_code.as_deref(), Some("BASELINE_DEGENERATE"));
        assert!(record.old_fps.is_none());
        assert!(record.classification.is_none());
    }

    #[test]
    fn select_scenarios_defaults_and_order() {
        let all = select_scenarios(&[]).unwrap();
        assert_eq!(all.len(), 2);

        let names = vec!["with-dummy-lua".to_string(), "normal".to_string()];
        let picked = select_scenarios(&names).unwrap();
        assert_eq!(picked[0].name, "with-dummy-lua");
        assert_eq!(picked[1].name, "normal");

        let names = vec!["normal".to_string(), "normal".to_string()];
        assert_eq!(select_scenarios(&names).unwrap().len(), 1);
    }

    #[test]
    fn select_scenarios_rejects_unknown_names() {
        let err = select_scenarios(&["turbo".to_string()]).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
        assert!(err.to_string().contains("turbo"));
        assert!(err.to_string().contains("normal, with-dummy-lua"));
    }

    #[test]
    fn cli_accepts_comma_delimited_scenarios() {
        let cli = Cli::try_parse_from([
            "benchdiff",
            "--old",
            "HEAD@{1}",
            "--scenario",
            "normal,with-dummy-lua",
            "--format",
            "ndjson",
            "--fail-on-regression",
        ])
        .unwrap();
        assert_eq!(cli.old.as_deref(), Some("HEAD@{1}"));
        assert!(cli.new.is_none());
        assert_eq!(cli.scenarios, vec!["normal", "with-dummy-lua"]);
        assert_eq!(cli.format, OutputFormat::Ndjson);
        assert!(cli.fail_on_regression);
        assert_eq!(cli.repo, PathBuf::from("."));
    }

    #[test]
    fn build_config_anchors_relative_executable() {
        let cli = Cli::try_parse_from([
            "benchdiff",
            "--executable",
            "build/emu.sh",
            "--working-dir",
            "run",
        ])
        .unwrap();

        let config = build_config(&cli, Path::new("/work"));
        assert_eq!(config.executable, PathBuf::from("/work/build/emu.sh"));
        assert_eq!(
            config.resolved_config_path(),
            PathBuf::from("/work/build/config.ini")
        );
        assert_eq!(config.working_dir, PathBuf::from("run"));
    }

    #[test]
    fn artifact_notice_keeps_json_stdout_clean() {
        let path = Path::new("out/run.jsonl");

        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
        announce_artifact(OutputFormat::Json, path, &mut stdout, &mut stderr).unwrap();
        assert!(stdout.is_empty());
        assert_eq!(String::from_utf8(stderr).unwrap(), "artifact: out/run.jsonl\n");

        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
        announce_artifact(OutputFormat::Ndjson, path, &mut stdout, &mut stderr).unwrap();
        assert!(stdout.is_empty());
        assert!(!stderr.is_empty());

        let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
        announce_artifact(OutputFormat::Table, path, &mut stdout, &mut stderr).unwrap();
        assert_eq!(String::from_utf8(stdout).unwrap(), "artifact: out/run.jsonl\n");
        assert!(stderr.is_empty());
    }

    #[test]
    fn write_records_jsonl_one_line_per_record() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("run.jsonl");
        let records = vec![build_record("run", &completed())];

        write_records_jsonl(&path, &records).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["scenario"], "normal");
        assert_eq!(value["classification"], "regression");
    }
}
