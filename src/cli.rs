use crate::github::RepoId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "autotag")]
#[command(
    author,
    version,
    about = "Creates the next semantic-version tag when a pull request is merged into the release branch"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate a pull request event and create the next version tag
    Exec {
        /// Repository in owner/name form
        repository: RepoId,

        /// Branch whose merges produce release tags
        release_branch: String,

        /// Commit the workflow run is tagging
        commit_sha: String,

        /// Path to the pull request event payload JSON
        event_file: PathBuf,

        /// Show the decision without creating the tag
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Treat an event that is not a merged pull request as a skip
        /// instead of an error
        #[arg(long)]
        lenient: bool,

        /// Skip cross-checking the event merge commit against COMMIT_SHA
        #[arg(long)]
        no_commit_check: bool,
    },
}
