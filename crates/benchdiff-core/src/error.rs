//! Harness error types.

use std::path::PathBuf;
use std::time::Duration;

/// Error type for every stage of a benchmark comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum BenchError {
    /// The executable under test did not exit before the wall-clock limit.
    ProcessTimeout {
        /// Program that was killed.
        program: PathBuf,
        /// Limit that was exceeded.
        timeout: Duration,
    },
    /// The executable under test exited abnormally.
    ProcessFailed {
        /// Program that failed.
        program: PathBuf,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
    },
    /// The executable under test could not be started or waited on.
    ProcessSpawn {
        /// Program that could not be started.
        program: PathBuf,
        /// Underlying I/O error message.
        message: String,
    },
    /// No metrics file was present after a run.
    MetricsMissing {
        /// Expected metrics path.
        path: PathBuf,
    },
    /// The metrics file was not a JSON object with a numeric `fps`.
    MetricsMalformed {
        /// Metrics path that failed to parse.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// The metrics file carried an fps value that is not a usable rate.
    InvalidMetric {
        /// Metrics path holding the value.
        path: PathBuf,
        /// Offending value.
        fps: f64,
    },
    /// The old revision measured zero fps, so no percentage can be derived.
    DegenerateBaseline {
        /// Short hash of the old revision.
        revision: String,
    },
    /// A version-control subprocess failed.
    Vcs {
        /// Operation that failed (for example `stash push`).
        operation: String,
        /// Diagnostic output of the failed command.
        message: String,
    },
    /// The emulator configuration file could not be written.
    ConfigWrite {
        /// Configuration path.
        path: PathBuf,
        /// Underlying I/O error message.
        message: String,
    },
    /// Invalid configuration or command-line input.
    InvalidInput(String),
}

impl BenchError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            BenchError::ProcessTimeout { .. } => "PROCESS_TIMEOUT",
            BenchError::ProcessFailed { .. } => "PROCESS_FAILED",
            BenchError::ProcessSpawn { .. } => "PROCESS_SPAWN",
            BenchError::MetricsMissing { .. } => "METRICS_MISSING",
            BenchError::MetricsMalformed { .. } => "METRICS_MALFORMED",
            BenchError::InvalidMetric { .. } => "METRICS_INVALID",
            BenchError::DegenerateBaseline { .. } => "BASELINE_DEGENERATE",
            BenchError::Vcs { .. } => "VCS_FAILURE",
            BenchError::ConfigWrite { .. } => "CONFIG_WRITE",
            BenchError::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    /// Whether this error only aborts the scenario it occurred in.
    ///
    /// Setup errors (configuration, invalid input) abort the whole run.
    pub fn is_scenario_fatal(&self) -> bool {
        !matches!(
            self,
            BenchError::ConfigWrite { .. } | BenchError::InvalidInput(_)
        )
    }

    /// Build a [`BenchError::Vcs`] for a failed version-control operation.
    pub fn vcs(operation: impl Into<String>, message: impl Into<String>) -> Self {
        BenchError::Vcs {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BenchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchError::ProcessTimeout { program, timeout } => write!(
                f,
                "[{}] {} did not exit within {}s",
                self.code(),
                program.display(),
                timeout.as_secs_f64()
            ),
            BenchError::ProcessFailed { program, code } => match code {
                Some(code) => write!(
                    f,
                    "[{}] {} exited with status {}",
                    self.code(),
                    program.display(),
                    code
                ),
                None => write!(
                    f,
                    "[{}] {} was terminated by a signal",
                    self.code(),
                    program.display()
                ),
            },
            BenchError::ProcessSpawn { program, message } => write!(
                f,
                "[{}] failed to run {}: {}",
                self.code(),
                program.display(),
                message
            ),
            BenchError::MetricsMissing { path } => write!(
                f,
                "[{}] metrics file {} was not written",
                self.code(),
                path.display()
            ),
            BenchError::MetricsMalformed { path, message } => write!(
                f,
                "[{}] metrics file {} is malformed: {}",
                self.code(),
                path.display(),
                message
            ),
            BenchError::InvalidMetric { path, fps } => write!(
                f,
                "[{}] metrics file {} reports unusable fps {}",
                self.code(),
                path.display(),
                fps
            ),
            BenchError::DegenerateBaseline { revision } => write!(
                f,
                "[{}] baseline revision {} measured 0 fps",
                self.code(),
                revision
            ),
            BenchError::Vcs { operation, message } => {
                write!(f, "[{}] {} failed: {}", self.code(), operation, message)
            }
            BenchError::ConfigWrite { path, message } => write!(
                f,
                "[{}] cannot write {}: {}",
                self.code(),
                path.display(),
                message
            ),
            BenchError::InvalidInput(msg) => write!(f, "[{}] {}", self.code(), msg),
        }
    }
}

impl std::error::Error for BenchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_timeout() {
        let err = BenchError::ProcessTimeout {
            program: PathBuf::from("emu.exe"),
            timeout: Duration::from_secs(120),
        };
        let msg = err.to_string();
        assert!(msg.contains("PROCESS_TIMEOUT"));
        assert!(msg.contains("emu.exe"));
        assert!(msg.contains("120"));
    }

    #[test]
    fn test_error_display_process_failed() {
        let err = BenchError::ProcessFailed {
            program: PathBuf::from("emu.exe"),
            code: Some(3),
        };
        assert!(err.to_string().contains("status 3"));

        let err = BenchError::ProcessFailed {
            program: PathBuf::from("emu.exe"),
            code: None,
        };
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn test_error_display_metrics() {
        let err = BenchError::MetricsMalformed {
            path: PathBuf::from("benchmark_normal.json"),
            message: "missing field `fps`".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("METRICS_MALFORMED"));
        assert!(msg.contains("benchmark_normal.json"));
        assert!(msg.contains("fps"));
    }

    #[test]
    fn test_error_display_vcs() {
        let err = BenchError::vcs("stash pop", "conflict in foo.c");
        let msg = format!("{}", err);
        assert!(msg.contains("VCS_FAILURE"));
        assert!(msg.contains("stash pop failed"));
        assert!(msg.contains("conflict in foo.c"));
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            BenchError::DegenerateBaseline {
                revision: "abc1234".to_string()
            }
            .code(),
            "BASELINE_DEGENERATE"
        );
        assert_eq!(
            BenchError::MetricsMissing {
                path: PathBuf::new()
            }
            .code(),
            "METRICS_MISSING"
        );
        assert_eq!(
            BenchError::InvalidInput(String::new()).code(),
            "INVALID_INPUT"
        );
    }

    #[test]
    fn test_scenario_fatal_split() {
        assert!(
            BenchError::ProcessTimeout {
                program: PathBuf::new(),
                timeout: Duration::from_secs(1),
            }
            .is_scenario_fatal()
        );
        assert!(BenchError::vcs("reset", "boom").is_scenario_fatal());
        assert!(!BenchError::InvalidInput("bad".to_string()).is_scenario_fatal());
        assert!(
            !BenchError::ConfigWrite {
                path: PathBuf::new(),
                message: String::new(),
            }
            .is_scenario_fatal()
        );
    }
}
