//! Harness configuration types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::BenchError;

/// Measured invocations per (scenario, revision) pair.
pub const RUN_COUNT: usize = 3;
/// Discarded invocations before the measured ones.
pub const WARMUP_RUNS: usize = 1;
/// Percentage change below which a result is treated as noise.
pub const FPS_PERCENTAGE_EPSILON: f64 = 1.0;
/// Wall-clock limit for a single invocation of the executable under test.
pub const PROCESS_TIMEOUT: Duration = Duration::from_secs(120);

const DEFAULT_EXECUTABLE: &str = "../../build/Views.Win32/mupen64-x86-sse2-release.exe";
const DEFAULT_STASH_LABEL: &str = "benchdiff";
const CONFIG_FILE_NAME: &str = "config.ini";

/// Headless plugin paths written into the emulator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSet {
    pub video: String,
    pub audio: String,
    pub input: String,
    pub rsp: String,
}

impl Default for PluginSet {
    fn default() -> Self {
        PluginSet {
            video: "plugins/video-headless.dll".to_string(),
            audio: "plugins/audio-null.dll".to_string(),
            input: "plugins/input-null.dll".to_string(),
            rsp: "plugins/rsp-hle-null.dll".to_string(),
        }
    }
}

/// Configuration for one harness process.
///
/// Timeout, run counts and epsilon are fixed for command-line use; the
/// `with_*` setters exist so tests can shrink them.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Executable under test.
    pub executable: PathBuf,
    /// Working directory for invocations and metrics files.
    pub working_dir: PathBuf,
    /// Arguments passed before the scenario flags on every invocation.
    pub baseline_args: Vec<String>,
    /// Discarded warmup invocations per (scenario, revision).
    pub warmup_runs: usize,
    /// Measured invocations per (scenario, revision).
    pub run_count: usize,
    /// Wall-clock limit per invocation.
    pub timeout: Duration,
    /// Margin of error in percent.
    pub fps_epsilon: f64,
    /// Label attached to stash entries created by the workspace guard.
    pub stash_label: String,
    /// Emulator configuration file. `None` places it next to the executable.
    pub config_path: Option<PathBuf>,
    /// Plugins selected in the emulator configuration.
    pub plugins: PluginSet,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            working_dir: PathBuf::from("."),
            baseline_args: default_baseline_args(),
            warmup_runs: WARMUP_RUNS,
            run_count: RUN_COUNT,
            timeout: PROCESS_TIMEOUT,
            fps_epsilon: FPS_PERCENTAGE_EPSILON,
            stash_label: DEFAULT_STASH_LABEL.to_string(),
            config_path: None,
            plugins: PluginSet::default(),
        }
    }
}

fn default_baseline_args() -> Vec<String> {
    ["-g", "m64p_test_rom.v64", "-m64", "test_rom_benchmark.m64"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl HarnessConfig {
    /// Create a new configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the executable under test.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = path.into();
        self
    }

    /// Set the working directory for invocations.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Replace the baseline arguments.
    pub fn with_baseline_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.baseline_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of warmup invocations.
    pub fn with_warmup_runs(mut self, count: usize) -> Self {
        self.warmup_runs = count;
        self
    }

    /// Set the number of measured invocations.
    pub fn with_run_count(mut self, count: usize) -> Self {
        self.run_count = count;
        self
    }

    /// Set the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the margin of error in percent.
    pub fn with_fps_epsilon(mut self, epsilon: f64) -> Self {
        self.fps_epsilon = epsilon;
        self
    }

    /// Set the stash label.
    pub fn with_stash_label(mut self, label: impl Into<String>) -> Self {
        self.stash_label = label.into();
        self
    }

    /// Set an explicit emulator configuration path.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Set the plugin paths.
    pub fn with_plugins(mut self, plugins: PluginSet) -> Self {
        self.plugins = plugins;
        self
    }

    /// Anchor a relative executable path at `base`.
    ///
    /// The child runs inside `working_dir`, so a path such as `build/emu`
    /// would otherwise be looked up from there while `config.ini` is
    /// written next to it from the harness directory. A bare program name
    /// is left for the `PATH` search.
    pub fn anchored_to(mut self, base: &Path) -> Self {
        let has_dir = self
            .executable
            .parent()
            .is_some_and(|parent| !parent.as_os_str().is_empty());
        if self.executable.is_relative() && has_dir {
            self.executable = base.join(&self.executable);
        }
        self
    }

    /// Emulator configuration path, defaulting to `config.ini` beside the
    /// executable.
    pub fn resolved_config_path(&self) -> PathBuf {
        match &self.config_path {
            Some(path) => path.clone(),
            None => self
                .executable
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(CONFIG_FILE_NAME),
        }
    }

    /// Check the numeric settings.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidInput`] for a zero run count, a zero
    /// timeout, or an epsilon that is negative or not finite.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.run_count == 0 {
            return Err(BenchError::InvalidInput(
                "run count must be greater than zero".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(BenchError::InvalidInput(
                "process timeout must be greater than zero".to_string(),
            ));
        }
        if !self.fps_epsilon.is_finite() || self.fps_epsilon < 0.0 {
            return Err(BenchError::InvalidInput(format!(
                "fps epsilon must be a non-negative number, got {}",
                self.fps_epsilon
            )));
        }
        Ok(())
    }
}
