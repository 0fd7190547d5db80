//! Revision resolution.

use benchdiff_core::{BenchError, RevisionPair};

use crate::VersionControl;

/// Revision expression used for the new side when none is given.
pub const DEFAULT_NEW_REVISION: &str = "HEAD";
/// Revision expression used for the old side when none is given.
pub const DEFAULT_OLD_REVISION: &str = "HEAD~1";

/// Revision expressions requested by the user, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionRequest {
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Resolve both revisions to short identifiers.
///
/// Must run before the workspace is touched: the defaults are relative to the
/// revision checked out at process start.
pub fn resolve_revisions<V: VersionControl + ?Sized>(
    vcs: &mut V,
    request: &RevisionRequest,
) -> Result<RevisionPair, BenchError> {
    let new = vcs.resolve(request.new.as_deref().unwrap_or(DEFAULT_NEW_REVISION))?;
    let old = vcs.resolve(request.old.as_deref().unwrap_or(DEFAULT_OLD_REVISION))?;
    tracing::info!(
        component = "vcs",
        operation = "resolve",
        old = %old,
        new = %new,
        "resolved revisions"
    );
    Ok(RevisionPair::new(old, new))
}
