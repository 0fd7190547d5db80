//! Deterministic emulator configuration.

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use benchdiff_core::{BenchError, HarnessConfig, PluginSet};

const SECTION: &str = "config";

/// Writes a fresh, non-interactive emulator configuration before benchmarking.
#[derive(Debug, Clone)]
pub struct ConfigPreparer {
    path: PathBuf,
    plugins: PluginSet,
}

impl ConfigPreparer {
    pub fn new(path: impl Into<PathBuf>, plugins: PluginSet) -> Self {
        ConfigPreparer {
            path: path.into(),
            plugins,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.resolved_config_path(), config.plugins.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the INI document.
    pub fn render(&self) -> String {
        let entries = [
            ("silent_mode", "1"),
            ("keep_default_working_directory", "1"),
            ("selected_video_plugin", self.plugins.video.as_str()),
            ("selected_audio_plugin", self.plugins.audio.as_str()),
            ("selected_input_plugin", self.plugins.input.as_str()),
            ("selected_rsp_plugin", self.plugins.rsp.as_str()),
        ];

        let mut out = String::new();
        let _ = writeln!(out, "[{SECTION}]");
        for (key, value) in entries {
            let _ = writeln!(out, "{key}={value}");
        }
        out
    }

    /// Replace any existing configuration file with a freshly rendered one.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ConfigWrite`] if the old file cannot be removed
    /// or the new one cannot be written.
    pub fn prepare(&self) -> Result<(), BenchError> {
        let write_error = |err: std::io::Error| BenchError::ConfigWrite {
            path: self.path.clone(),
            message: err.to_string(),
        };

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(write_error(err)),
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_error)?;
            }
        }
        fs::write(&self.path, self.render()).map_err(write_error)?;

        tracing::info!(
            component = "config",
            path = %self.path.display(),
            "wrote emulator configuration"
        );
        Ok(())
    }
}
