//! Version-control trait used by the workspace guard.

use benchdiff_core::{BenchError, Revision};

/// Operations the harness performs on the repository holding the code under
/// test.
///
/// Every method blocks until the underlying operation completes. At most one
/// call is in flight at a time.
pub trait VersionControl {
    /// Resolve a revision expression (`HEAD`, `HEAD~1`, `HEAD@{1}`, a hash)
    /// to a short identifier.
    fn resolve(&mut self, spec: &str) -> Result<Revision, BenchError>;

    /// Save uncommitted changes under `label`.
    ///
    /// Returns `true` if an entry was created, `false` when there was nothing
    /// to save.
    fn stash_push(&mut self, label: &str) -> Result<bool, BenchError>;

    /// Reapply and drop the most recent stash entry.
    fn stash_pop(&mut self) -> Result<(), BenchError>;

    /// Move the working tree to `revision`, discarding local modifications.
    fn force_checkout(&mut self, revision: &Revision) -> Result<(), BenchError>;
}

impl<V: VersionControl + ?Sized> VersionControl for &mut V {
    fn resolve(&mut self, spec: &str) -> Result<Revision, BenchError> {
        (**self).resolve(spec)
    }

    fn stash_push(&mut self, label: &str) -> Result<bool, BenchError> {
        (**self).stash_push(label)
    }

    fn stash_pop(&mut self) -> Result<(), BenchError> {
        (**self).stash_pop()
    }

    fn force_checkout(&mut self, revision: &Revision) -> Result<(), BenchError> {
        (**self).force_checkout(revision)
    }
}
