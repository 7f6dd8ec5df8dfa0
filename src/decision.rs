//! Decides whether a pull request event warrants a new release tag.

use crate::event::MergeContext;
use crate::version::{Bump, TagVersion};
use std::fmt;
use thiserror::Error;

/// What is known about the repository before the decision runs: the branch
/// whose merges produce releases, the highest existing tag, and the commit
/// that tag points at (when any tag exists).
#[derive(Debug, Clone)]
pub struct RepositoryState {
    pub release_branch: String,
    pub version: TagVersion,
    pub tagged_commit: Option<String>,
}

impl RepositoryState {
    pub fn new(release_branch: impl Into<String>) -> Self {
        Self {
            release_branch: release_branch.into(),
            version: TagVersion::ZERO,
            tagged_commit: None,
        }
    }
}

/// Tunable parts of the evaluation.
#[derive(Debug, Clone, Copy)]
pub struct DecisionPolicy {
    /// Treat an event that is not a closed, merged pull request (or lacks
    /// a base branch) as a skip instead of an error. Off by default.
    pub lenient_preconditions: bool,
    /// Cross-check the event's merge commit against the commit the
    /// workflow run was given, and skip when that commit already carries
    /// the current highest tag.
    pub verify_commit: bool,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            lenient_preconditions: false,
            verify_commit: true,
        }
    }
}

/// A successful evaluation: either create a tag or do nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Create a tag at the workflow commit for this version.
    Tag(TagVersion),
    /// Valid event, nothing to do.
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Lenient policy only; strict policy rejects instead.
    NotClosed,
    /// Lenient policy only.
    NotMerged,
    /// Lenient policy only.
    UnknownBaseBranch,
    /// Merged into some branch other than the release branch.
    DifferentBaseBranch(String),
    /// The workflow commit already carries the current highest tag.
    AlreadyTagged(TagVersion),
    /// No recognized sizing label on the pull request.
    NoVersionLabel,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotClosed => write!(f, "pull request is not closed"),
            Self::NotMerged => write!(f, "pull request is not merged"),
            Self::UnknownBaseBranch => {
                write!(f, "could not determine pull request base branch")
            }
            Self::DifferentBaseBranch(branch) => {
                write!(f, "pull request merged into {branch}, not the release branch")
            }
            Self::AlreadyTagged(version) => {
                write!(f, "commit is already tagged as {version}")
            }
            Self::NoVersionLabel => {
                write!(f, "no version label on the pull request; keeping current version")
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("pull request is not closed")]
    NotClosed,
    #[error("pull request is not merged")]
    NotMerged,
    #[error("could not determine pull request base branch")]
    UnknownBaseBranch,
    #[error("workflow run arguments and pull request data mismatch")]
    CommitMismatch,
    #[error("new version is {0}")]
    DegenerateVersion(TagVersion),
}

/// Evaluate a merge event against the repository state.
///
/// Pure: no I/O, no process exit. The first failing condition determines
/// the result. `Err` means the run should fail; `Ok(Skip)` is a successful
/// no-op; `Ok(Tag)` instructs the caller to create the tag at
/// `workflow_sha`.
pub fn evaluate(
    state: &RepositoryState,
    ctx: &MergeContext,
    workflow_sha: &str,
    policy: DecisionPolicy,
) -> Result<Outcome, DecisionError> {
    if ctx.action.as_deref() != Some("closed") {
        return precondition(policy, DecisionError::NotClosed, SkipReason::NotClosed);
    }

    if !ctx.merged {
        return precondition(policy, DecisionError::NotMerged, SkipReason::NotMerged);
    }

    let Some(base_branch) = ctx.base_branch.as_deref() else {
        return precondition(
            policy,
            DecisionError::UnknownBaseBranch,
            SkipReason::UnknownBaseBranch,
        );
    };

    if base_branch != state.release_branch {
        return Ok(Outcome::Skip(SkipReason::DifferentBaseBranch(
            base_branch.to_string(),
        )));
    }

    if policy.verify_commit {
        // A stale or foreign event payload must not tag the wrong commit.
        if ctx.merge_commit.as_deref() != Some(workflow_sha) {
            return Err(DecisionError::CommitMismatch);
        }

        // Re-running the workflow for an already-tagged merge is a no-op.
        if state.tagged_commit.as_deref() == Some(workflow_sha) {
            return Ok(Outcome::Skip(SkipReason::AlreadyTagged(state.version)));
        }
    }

    let Some(bump) = Bump::most_significant(ctx.labels.iter().map(String::as_str)) else {
        return Ok(Outcome::Skip(SkipReason::NoVersionLabel));
    };

    let candidate = state
        .version
        .bump(bump)
        .filter(|candidate| *candidate > TagVersion::ZERO)
        .ok_or(DecisionError::DegenerateVersion(TagVersion::ZERO))?;

    Ok(Outcome::Tag(candidate))
}

fn precondition(
    policy: DecisionPolicy,
    error: DecisionError,
    skip: SkipReason,
) -> Result<Outcome, DecisionError> {
    if policy.lenient_preconditions {
        Ok(Outcome::Skip(skip))
    } else {
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "6dcb09b5b57875f334f61aebed695e2e4193db5e";

    fn state(version: TagVersion) -> RepositoryState {
        RepositoryState {
            release_branch: "main".to_string(),
            version,
            tagged_commit: None,
        }
    }

    fn merged_ctx(labels: &[&str]) -> MergeContext {
        MergeContext {
            action: Some("closed".to_string()),
            merged: true,
            base_branch: Some("main".to_string()),
            merge_commit: Some(SHA.to_string()),
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_minor_label_bumps_minor() {
        let outcome = evaluate(
            &state(TagVersion::new(1, 2, 3)),
            &merged_ctx(&["minor"]),
            SHA,
            DecisionPolicy::default(),
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Tag(TagVersion::new(1, 3, 0)));
    }

    #[test]
    fn test_foreign_base_branch_is_a_skip() {
        let mut ctx = merged_ctx(&["minor"]);
        ctx.base_branch = Some("develop".to_string());

        let outcome = evaluate(
            &state(TagVersion::new(1, 2, 3)),
            &ctx,
            SHA,
            DecisionPolicy::default(),
        )
        .unwrap();

        assert_eq!(
            outcome,
            Outcome::Skip(SkipReason::DifferentBaseBranch("develop".to_string()))
        );
    }

    #[test]
    fn test_major_wins_over_patch() {
        let outcome = evaluate(
            &state(TagVersion::new(1, 2, 3)),
            &merged_ctx(&["major", "patch"]),
            SHA,
            DecisionPolicy::default(),
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Tag(TagVersion::new(2, 0, 0)));
    }

    #[test]
    fn test_open_pull_request_is_rejected() {
        let mut ctx = merged_ctx(&["minor"]);
        ctx.action = Some("opened".to_string());

        let err = evaluate(
            &state(TagVersion::new(1, 2, 3)),
            &ctx,
            SHA,
            DecisionPolicy::default(),
        )
        .unwrap_err();

        assert_eq!(err, DecisionError::NotClosed);
        assert_eq!(err.to_string(), "pull request is not closed");
    }

    #[test]
    fn test_missing_action_is_rejected() {
        let mut ctx = merged_ctx(&["minor"]);
        ctx.action = None;

        assert_eq!(
            evaluate(&state(TagVersion::ZERO), &ctx, SHA, DecisionPolicy::default()),
            Err(DecisionError::NotClosed)
        );
    }

    #[test]
    fn test_unmerged_pull_request_is_rejected() {
        let mut ctx = merged_ctx(&["minor"]);
        ctx.merged = false;

        assert_eq!(
            evaluate(&state(TagVersion::ZERO), &ctx, SHA, DecisionPolicy::default()),
            Err(DecisionError::NotMerged)
        );
    }

    #[test]
    fn test_missing_base_branch_is_rejected() {
        let mut ctx = merged_ctx(&["minor"]);
        ctx.base_branch = None;

        assert_eq!(
            evaluate(&state(TagVersion::ZERO), &ctx, SHA, DecisionPolicy::default()),
            Err(DecisionError::UnknownBaseBranch)
        );
    }

    #[test]
    fn test_lenient_policy_downgrades_preconditions_to_skips() {
        let policy = DecisionPolicy {
            lenient_preconditions: true,
            ..DecisionPolicy::default()
        };

        let mut ctx = merged_ctx(&["minor"]);
        ctx.action = Some("opened".to_string());
        assert_eq!(
            evaluate(&state(TagVersion::ZERO), &ctx, SHA, policy),
            Ok(Outcome::Skip(SkipReason::NotClosed))
        );

        let mut ctx = merged_ctx(&["minor"]);
        ctx.merged = false;
        assert_eq!(
            evaluate(&state(TagVersion::ZERO), &ctx, SHA, policy),
            Ok(Outcome::Skip(SkipReason::NotMerged))
        );

        let mut ctx = merged_ctx(&["minor"]);
        ctx.base_branch = None;
        assert_eq!(
            evaluate(&state(TagVersion::ZERO), &ctx, SHA, policy),
            Ok(Outcome::Skip(SkipReason::UnknownBaseBranch))
        );
    }

    #[test]
    fn test_commit_mismatch_is_rejected() {
        let mut ctx = merged_ctx(&["minor"]);
        ctx.merge_commit = Some("0000000000000000000000000000000000000000".to_string());

        assert_eq!(
            evaluate(
                &state(TagVersion::new(1, 2, 3)),
                &ctx,
                SHA,
                DecisionPolicy::default()
            ),
            Err(DecisionError::CommitMismatch)
        );
    }

    #[test]
    fn test_missing_merge_commit_counts_as_mismatch() {
        let mut ctx = merged_ctx(&["minor"]);
        ctx.merge_commit = None;

        assert_eq!(
            evaluate(
                &state(TagVersion::new(1, 2, 3)),
                &ctx,
                SHA,
                DecisionPolicy::default()
            ),
            Err(DecisionError::CommitMismatch)
        );
    }

    #[test]
    fn test_already_tagged_commit_is_a_skip() {
        let mut repo = state(TagVersion::new(1, 2, 3));
        repo.tagged_commit = Some(SHA.to_string());

        assert_eq!(
            evaluate(&repo, &merged_ctx(&["minor"]), SHA, DecisionPolicy::default()),
            Ok(Outcome::Skip(SkipReason::AlreadyTagged(TagVersion::new(
                1, 2, 3
            ))))
        );
    }

    #[test]
    fn test_commit_checks_can_be_disabled() {
        let policy = DecisionPolicy {
            verify_commit: false,
            ..DecisionPolicy::default()
        };

        let mut ctx = merged_ctx(&["minor"]);
        ctx.merge_commit = None;

        assert_eq!(
            evaluate(&state(TagVersion::new(1, 2, 3)), &ctx, SHA, policy),
            Ok(Outcome::Tag(TagVersion::new(1, 3, 0)))
        );
    }

    #[test]
    fn test_no_version_label_is_a_skip() {
        assert_eq!(
            evaluate(
                &state(TagVersion::new(1, 2, 3)),
                &merged_ctx(&["bug", "help wanted"]),
                SHA,
                DecisionPolicy::default()
            ),
            Ok(Outcome::Skip(SkipReason::NoVersionLabel))
        );
    }

    #[test]
    fn test_empty_repository_starts_from_zero() {
        assert_eq!(
            evaluate(
                &state(TagVersion::ZERO),
                &merged_ctx(&["patch"]),
                SHA,
                DecisionPolicy::default()
            ),
            Ok(Outcome::Tag(TagVersion::new(0, 0, 1)))
        );
    }

    #[test]
    fn test_overflowing_bump_is_degenerate() {
        assert_eq!(
            evaluate(
                &state(TagVersion::new(u64::MAX, 0, 0)),
                &merged_ctx(&["major"]),
                SHA,
                DecisionPolicy::default()
            ),
            Err(DecisionError::DegenerateVersion(TagVersion::ZERO))
        );
    }

    #[test]
    fn test_skip_reasons_render_for_the_console() {
        assert_eq!(
            SkipReason::DifferentBaseBranch("develop".to_string()).to_string(),
            "pull request merged into develop, not the release branch"
        );
        assert_eq!(
            SkipReason::AlreadyTagged(TagVersion::new(1, 2, 3)).to_string(),
            "commit is already tagged as v1.2.3"
        );
    }
}
