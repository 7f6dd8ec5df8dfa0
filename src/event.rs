//! Typed view of the GitHub `pull_request` webhook payload.
//!
//! GitHub Actions hands the workflow a JSON file describing the event that
//! triggered the run. Only the fields the release decision needs are
//! modeled; everything else in the payload (including the repository's
//! `organization` object, which has a history of tripping up stricter
//! parsers) is ignored by serde.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct PullRequestEvent {
    pub action: Option<String>,
    pub pull_request: Option<PullRequest>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub merged: Option<bool>,
    pub merge_commit_sha: Option<String>,
    pub base: Option<GitRef>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Label {
    pub name: Option<String>,
}

impl PullRequestEvent {
    /// Read and deserialize an event payload file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read event payload: {}", path.display()))?;

        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse event payload: {}", path.display()))
    }

    /// Flatten the payload into the read-only view the decision engine
    /// consumes. Missing fields stay absent; the engine decides what each
    /// absence means.
    pub fn context(&self) -> MergeContext {
        let pull_request = self.pull_request.as_ref();

        MergeContext {
            action: self.action.clone(),
            merged: pull_request.and_then(|pr| pr.merged) == Some(true),
            base_branch: pull_request
                .and_then(|pr| pr.base.as_ref())
                .and_then(|base| base.name.clone()),
            merge_commit: pull_request.and_then(|pr| pr.merge_commit_sha.clone()),
            labels: pull_request
                .map(|pr| pr.labels.iter().filter_map(|label| label.name.clone()).collect())
                .unwrap_or_default(),
        }
    }
}

/// Everything the decision engine needs to know about the merge event.
#[derive(Debug, Clone, Default)]
pub struct MergeContext {
    pub action: Option<String>,
    pub merged: bool,
    pub base_branch: Option<String>,
    pub merge_commit: Option<String>,
    pub labels: Vec<String>,
}
