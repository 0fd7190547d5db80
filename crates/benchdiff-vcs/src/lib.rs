//! Version-control seam and workspace isolation for benchdiff.
//!
//! - [`VersionControl`]: the operations the harness needs from a VCS
//! - [`GitCli`]: implementation that shells out to `git`
//! - [`WorkspaceGuard`] / [`run_isolated`]: stash, check out, run, restore
//! - [`resolve_revisions`]: pick the old/new revisions before any mutation

mod git;
mod guard;
mod revisions;
mod traits;

pub use git::GitCli;
pub use guard::{WorkspaceGuard, run_isolated};
pub use revisions::{DEFAULT_NEW_REVISION, DEFAULT_OLD_REVISION, RevisionRequest, resolve_revisions};
pub use traits::VersionControl;
