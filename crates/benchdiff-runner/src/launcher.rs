//! Process boundary for the executable under test.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use benchdiff_core::BenchError;
use benchdiff_tools::ProcessMemoryProbe;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One fully-specified invocation of the executable under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

/// What a successful invocation reports besides its metrics file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub elapsed: Duration,
    pub peak_rss_bytes: Option<u64>,
}

/// Runs an [`Invocation`] to completion.
///
/// Implementations block until the process exits or the invocation's timeout
/// elapses. A timeout or abnormal exit is an error.
pub trait Launcher {
    fn launch(&mut self, invocation: &Invocation) -> Result<LaunchOutcome, BenchError>;
}

impl<L: Launcher + ?Sized> Launcher for &mut L {
    fn launch(&mut self, invocation: &Invocation) -> Result<LaunchOutcome, BenchError> {
        (**self).launch(invocation)
    }
}

/// Spawns the executable as a child process and polls it until exit.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    poll_interval: Duration,
}

impl ProcessLauncher {
    pub fn new() -> Self {
        ProcessLauncher {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set how often the child is polled for exit and memory usage.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&mut self, invocation: &Invocation) -> Result<LaunchOutcome, BenchError> {
        let program = &invocation.program;
        tracing::debug!(
            component = "launcher",
            program = %program.display(),
            args = ?invocation.args,
            "spawning"
        );

        let started = Instant::now();
        let mut child = Command::new(program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| BenchError::ProcessSpawn {
                program: program.clone(),
                message: err.to_string(),
            })?;

        let mut probe = ProcessMemoryProbe::new(child.id());
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    let _ = probe.sample();
                    let elapsed = started.elapsed();
                    if elapsed >= invocation.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        tracing::error!(
                            component = "launcher",
                            program = %program.display(),
                            timeout_ms = invocation.timeout.as_millis() as u64,
                            status = "timeout",
                            "killed process after timeout"
                        );
                        return Err(BenchError::ProcessTimeout {
                            program: program.clone(),
                            timeout: invocation.timeout,
                        });
                    }
                    thread::sleep(self.poll_interval.min(invocation.timeout - elapsed));
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BenchError::ProcessSpawn {
                        program: program.clone(),
                        message: err.to_string(),
                    });
                }
            }
        };

        let elapsed = started.elapsed();
        if !status.success() {
            tracing::error!(
                component = "launcher",
                program = %program.display(),
                code = ?status.code(),
                status = "failed",
                "process exited abnormally"
            );
            return Err(BenchError::ProcessFailed {
                program: program.clone(),
                code: status.code(),
            });
        }

        Ok(LaunchOutcome {
            elapsed,
            peak_rss_bytes: probe.peak_rss_bytes(),
        })
    }
}
