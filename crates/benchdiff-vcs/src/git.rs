//! `git` subprocess backend.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use benchdiff_core::{BenchError, Revision};

use crate::VersionControl;

/// Runs `git -C <repo> ...` for every operation.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo: PathBuf,
}

impl GitCli {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        GitCli { repo: repo.into() }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn output(&self, operation: &str, args: &[&str]) -> Result<Output, BenchError> {
        tracing::debug!(component = "vcs", operation, ?args, "git");
        Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| BenchError::vcs(operation, format!("cannot run git: {err}")))
    }

    /// Run a git command, returning trimmed stdout on success.
    fn run(&self, operation: &str, args: &[&str]) -> Result<String, BenchError> {
        let output = self.output(operation, args)?;
        if !output.status.success() {
            let message = diagnostic(&output);
            tracing::error!(
                component = "vcs",
                operation,
                status = "error",
                "{message}"
            );
            return Err(BenchError::vcs(operation, message));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Object id of the newest stash entry, if there is one.
    fn stash_head(&self) -> Result<Option<String>, BenchError> {
        let output = self.output(
            "stash inspect",
            &["rev-parse", "-q", "--verify", "refs/stash"],
        )?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
        } else {
            Ok(None)
        }
    }
}

fn diagnostic(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        match output.status.code() {
            Some(code) => format!("git exited with status {code}"),
            None => "git was terminated by a signal".to_string(),
        }
    } else {
        stderr.to_string()
    }
}

impl VersionControl for GitCli {
    fn resolve(&mut self, spec: &str) -> Result<Revision, BenchError> {
        let object = format!("{spec}^{{commit}}");
        let short = self.run("rev-parse", &["rev-parse", "--short", "--verify", &object])?;
        Ok(Revision::new(short))
    }

    fn stash_push(&mut self, label: &str) -> Result<bool, BenchError> {
        let before = self.stash_head()?;
        // Untracked files go too: a reset to a revision that tracks the same
        // path would overwrite them.
        self.run(
            "stash push",
            &["stash", "push", "--include-untracked", "--quiet", "-m", label],
        )?;
        let after = self.stash_head()?;
        let created = after.is_some() && after != before;
        tracing::info!(
            component = "vcs",
            operation = "stash push",
            label,
            created,
            "saved uncommitted changes"
        );
        Ok(created)
    }

    fn stash_pop(&mut self) -> Result<(), BenchError> {
        self.run("stash pop", &["stash", "pop", "--quiet", "--index"])?;
        tracing::info!(
            component = "vcs",
            operation = "stash pop",
            "reapplied uncommitted changes"
        );
        Ok(())
    }

    fn force_checkout(&mut self, revision: &Revision) -> Result<(), BenchError> {
        self.run("reset", &["reset", "--hard", "--quiet", revision.as_str()])?;
        tracing::info!(
            component = "vcs",
            operation = "reset",
            revision = %revision,
            "checked out revision"
        );
        Ok(())
    }
}
