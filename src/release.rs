//! Ties the collaborators together: scan existing tags, evaluate the
//! merge event, create the tag when the decision says so.

use crate::decision::{self, DecisionPolicy, Outcome, RepositoryState};
use crate::event::PullRequestEvent;
use crate::github::TagStore;
use crate::version::TagVersion;
use anyhow::{Context, Result};

/// Result of scanning the repository's existing tags.
#[derive(Debug, Default)]
pub struct TagScan {
    /// Highest semantic version among the tags, or zero when none parse.
    pub version: TagVersion,
    /// Commit the highest tag points at.
    pub commit: Option<String>,
    /// Tag names that are not semantic versions; reported, never fatal.
    pub ignored: Vec<String>,
}

/// Find the current highest version tag.
pub async fn scan_tags(store: &dyn TagStore) -> Result<TagScan> {
    let tags = store
        .list_tags()
        .await
        .with_context(|| format!("failed to list tags from {}", store.name()))?;

    let mut scan = TagScan::default();
    for tag in tags {
        match TagVersion::parse(&tag.name) {
            Ok(version) if version > scan.version => {
                scan.version = version;
                scan.commit = Some(tag.commit);
            }
            Ok(_) => {}
            Err(_) => scan.ignored.push(tag.name),
        }
    }

    Ok(scan)
}

/// Everything the CLI needs to report one invocation.
#[derive(Debug)]
pub struct ReleaseReport {
    pub outcome: Outcome,
    pub previous: TagVersion,
    pub ignored_tags: Vec<String>,
    /// Whether a tag reference was actually created (false on skip and
    /// on dry runs).
    pub created: bool,
}

/// Evaluate one merge event end-to-end.
///
/// Decision errors and collaborator failures surface as `Err`; the caller
/// exits non-zero on those and zero on any [`ReleaseReport`].
pub async fn run(
    store: &dyn TagStore,
    release_branch: &str,
    commit_sha: &str,
    event: &PullRequestEvent,
    policy: DecisionPolicy,
    dry_run: bool,
) -> Result<ReleaseReport> {
    let scan = scan_tags(store).await?;

    let state = RepositoryState {
        release_branch: release_branch.to_string(),
        version: scan.version,
        tagged_commit: scan.commit,
    };

    let outcome = decision::evaluate(&state, &event.context(), commit_sha, policy)?;

    let mut created = false;
    if let Outcome::Tag(version) = &outcome {
        if !dry_run {
            store.create_tag(&version.to_string(), commit_sha).await?;
            created = true;
        }
    }

    Ok(ReleaseReport {
        outcome,
        previous: scan.version,
        ignored_tags: scan.ignored,
        created,
    })
}
