pub mod cli;
pub mod decision;
pub mod event;
pub mod github;
pub mod release;
pub mod version;

pub use cli::{Cli, Command};
pub use decision::{DecisionPolicy, Outcome, RepositoryState, SkipReason};
pub use event::{MergeContext, PullRequestEvent};
pub use github::{GitHubTagStore, RepoId, TagRef, TagStore};
pub use release::{ReleaseReport, TagScan};
pub use version::{Bump, TagVersion};
