//! Scoped workspace isolation.
//!
//! A [`WorkspaceGuard`] owns the saved uncommitted changes from the moment
//! they are stashed until they are reapplied. Release resets the workspace to
//! the return revision and pops the stash; it runs from [`WorkspaceGuard::release`]
//! or, if the guard is dropped without it (early return, panic), from `Drop`.

use benchdiff_core::{BenchError, Revision};

use crate::VersionControl;

/// Holds the workspace between stash and restore.
pub struct WorkspaceGuard<'a, V: VersionControl + ?Sized> {
    vcs: &'a mut V,
    return_to: Revision,
    stashed: bool,
    released: bool,
}

impl<'a, V: VersionControl + ?Sized> WorkspaceGuard<'a, V> {
    /// Stash uncommitted changes and take ownership of the workspace.
    ///
    /// # Errors
    ///
    /// Returns the VCS error if the stash could not be created. Nothing has
    /// been mutated in that case, so there is nothing to restore.
    pub fn acquire(
        vcs: &'a mut V,
        label: &str,
        return_to: &Revision,
    ) -> Result<Self, BenchError> {
        let stashed = vcs.stash_push(label)?;
        Ok(WorkspaceGuard {
            vcs,
            return_to: return_to.clone(),
            stashed,
            released: false,
        })
    }

    /// Whether uncommitted changes were saved on acquisition.
    pub fn stashed(&self) -> bool {
        self.stashed
    }

    /// Forcibly move the workspace to `target`.
    pub fn checkout(&mut self, target: &Revision) -> Result<(), BenchError> {
        self.vcs.force_checkout(target)
    }

    /// Restore the return revision and reapply saved changes.
    ///
    /// Both steps are attempted even when the first fails; the first error is
    /// returned.
    pub fn release(mut self) -> Result<(), BenchError> {
        self.restore()
    }

    fn restore(&mut self) -> Result<(), BenchError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let reset = self.vcs.force_checkout(&self.return_to);
        if let Err(err) = &reset {
            tracing::error!(
                component = "workspace",
                operation = "restore",
                revision = %self.return_to,
                status = "error",
                "{err}"
            );
        }

        let pop = if self.stashed {
            self.vcs.stash_pop()
        } else {
            Ok(())
        };
        if let Err(err) = &pop {
            tracing::error!(
                component = "workspace",
                operation = "unstash",
                status = "error",
                "{err}"
            );
        }

        reset.and(pop)
    }
}

impl<V: VersionControl + ?Sized> Drop for WorkspaceGuard<'_, V> {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(
                component = "workspace",
                operation = "restore",
                "guard dropped without release; restoring workspace"
            );
            let _ = self.restore();
        }
    }
}

/// Run `body` with the workspace checked out at `target`, then restore it to
/// `return_to` and reapply any uncommitted changes.
///
/// Restoration runs on every exit path. A body error takes precedence over a
/// restoration error; the latter is still logged.
pub fn run_isolated<V, T, F>(
    vcs: &mut V,
    label: &str,
    target: &Revision,
    return_to: &Revision,
    body: F,
) -> Result<T, BenchError>
where
    V: VersionControl + ?Sized,
    F: FnOnce() -> Result<T, BenchError>,
{
    let mut guard = WorkspaceGuard::acquire(vcs, label, return_to)?;
    let outcome = guard.checkout(target).and_then(|()| body());
    let restored = guard.release();

    match (outcome, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) | (Err(err), Ok(())) => Err(err),
        (Err(err), Err(restore_err)) => {
            tracing::error!(
                component = "workspace",
                operation = "run_isolated",
                status = "error",
                body_error = %err,
                "restoration also failed: {restore_err}"
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    /// In-memory repository: a current revision plus an optional dirty diff.
    #[derive(Debug, Default)]
    struct FakeRepo {
        head: String,
        dirty: Option<String>,
        stash: Vec<String>,
        log: Vec<String>,
        fail_checkout_to: Option<String>,
        fail_pop: bool,
    }

    impl FakeRepo {
        fn at(head: &str) -> Self {
            FakeRepo {
                head: head.to_string(),
                ..Default::default()
            }
        }
    }

    impl VersionControl for FakeRepo {
        fn resolve(&mut self, spec: &str) -> Result<Revision, BenchError> {
            Ok(Revision::new(spec))
        }

        fn stash_push(&mut self, label: &str) -> Result<bool, BenchError> {
            self.log.push(format!("stash push {label}"));
            match self.dirty.take() {
                Some(diff) => {
                    self.stash.push(diff);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn stash_pop(&mut self) -> Result<(), BenchError> {
            self.log.push("stash pop".to_string());
            if self.fail_pop {
                return Err(BenchError::vcs("stash pop", "conflict"));
            }
            self.dirty = self.stash.pop();
            Ok(())
        }

        fn force_checkout(&mut self, revision: &Revision) -> Result<(), BenchError> {
            self.log.push(format!("reset {revision}"));
            if self.fail_checkout_to.as_deref() == Some(revision.as_str()) {
                return Err(BenchError::vcs("reset", "unknown revision"));
            }
            self.head = revision.to_string();
            self.dirty = None;
            Ok(())
        }
    }

    fn rev(id: &str) -> Revision {
        Revision::new(id)
    }

    #[test]
    fn test_success_restores_revision_and_changes() {
        let mut repo = FakeRepo::at("new");
        repo.dirty = Some("diff --git a/x b/x".to_string());

        let mut seen = String::new();
        let value = run_isolated(&mut repo, "bench", &rev("old"), &rev("new"), || {
            seen = "ran".to_string();
            Ok(42)
        })
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(seen, "ran");
        assert_eq!(repo.head, "new");
        assert_eq!(repo.dirty.as_deref(), Some("diff --git a/x b/x"));
        assert!(repo.stash.is_empty());
        assert_eq!(
            repo.log,
            vec!["stash push bench", "reset old", "reset new", "stash pop"]
        );
    }

    #[test]
    fn test_clean_workspace_skips_pop() {
        let mut repo = FakeRepo::at("new");
        run_isolated(&mut repo, "bench", &rev("old"), &rev("new"), || Ok(())).unwrap();
        assert_eq!(repo.log, vec!["stash push bench", "reset old", "reset new"]);
        assert_eq!(repo.head, "new");
        assert!(repo.dirty.is_none());
    }

    #[test]
    fn test_body_failure_still_restores() {
        let mut repo = FakeRepo::at("new");
        repo.dirty = Some("wip".to_string());

        let err = run_isolated(&mut repo, "bench", &rev("old"), &rev("new"), || {
            Err::<(), _>(BenchError::MetricsMissing {
                path: "benchmark_normal.json".into(),
            })
        })
        .unwrap_err();

        assert_eq!(err.code(), "METRICS_MISSING");
        assert_eq!(repo.head, "new");
        assert_eq!(repo.dirty.as_deref(), Some("wip"));
    }

    #[test]
    fn test_failed_checkout_skips_body_and_restores() {
        let mut repo = FakeRepo::at("new");
        repo.dirty = Some("wip".to_string());
        repo.fail_checkout_to = Some("old".to_string());

        let mut ran = false;
        let err = run_isolated(&mut repo, "bench", &rev("old"), &rev("new"), || {
            ran = true;
            Ok(())
        })
        .unwrap_err();

        assert!(!ran);
        assert_eq!(err.code(), "VCS_FAILURE");
        assert_eq!(repo.head, "new");
        assert_eq!(repo.dirty.as_deref(), Some("wip"));
    }

    #[test]
    fn test_pop_attempted_even_if_reset_fails() {
        let mut repo = FakeRepo::at("new");
        repo.dirty = Some("wip".to_string());
        repo.fail_checkout_to = Some("new".to_string());

        let err = run_isolated(&mut repo, "bench", &rev("old"), &rev("new"), || Ok(()))
            .unwrap_err();

        assert_eq!(err.code(), "VCS_FAILURE");
        assert_eq!(repo.log.last().map(String::as_str), Some("stash pop"));
        assert_eq!(repo.dirty.as_deref(), Some("wip"));
    }

    #[test]
    fn test_body_error_wins_over_restore_error() {
        let mut repo = FakeRepo::at("new");
        repo.dirty = Some("wip".to_string());
        repo.fail_pop = true;

        let err = run_isolated(&mut repo, "bench", &rev("old"), &rev("new"), || {
            Err::<(), _>(BenchError::DegenerateBaseline {
                revision: "old".to_string(),
            })
        })
        .unwrap_err();

        assert_eq!(err.code(), "BASELINE_DEGENERATE");
    }

    #[test]
    fn test_panic_in_body_restores_through_drop() {
        let mut repo = FakeRepo::at("new");
        repo.dirty = Some("wip".to_string());

        let result = catch_unwind(AssertUnwindSafe(|| {
            let body = || -> Result<(), BenchError> { panic!("emulator wrapper exploded") };
            let _ = run_isolated(&mut repo, "bench", &rev("old"), &rev("new"), body);
        }));

        assert!(result.is_err());
        assert_eq!(repo.head, "new");
        assert_eq!(repo.dirty.as_deref(), Some("wip"));
        assert!(repo.stash.is_empty());
    }

    #[test]
    fn test_guard_drop_without_release() {
        let mut repo = FakeRepo::at("new");
        repo.dirty = Some("wip".to_string());
        {
            let mut guard = WorkspaceGuard::acquire(&mut repo, "bench", &rev("new")).unwrap();
            assert!(guard.stashed());
            guard
                .checkout(&rev("old"))
                .unwrap();
        }
        assert_eq!(repo.head, "new");
        assert_eq!(repo.dirty.as_deref(), Some("wip"));
    }
}
