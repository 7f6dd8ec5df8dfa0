use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use autotag::cli::{Cli, Command};
use autotag::decision::{DecisionPolicy, Outcome};
use autotag::event::PullRequestEvent;
use autotag::github::{self, GitHubTagStore};
use autotag::release;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Handle no-color flag
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let Command::Exec {
        repository,
        release_branch,
        commit_sha,
        event_file,
        dry_run,
        lenient,
        no_commit_check,
    } = &cli.command;

    let token = github::token_from_env()?;
    let store = GitHubTagStore::new(&token, repository.clone())?;
    let event = PullRequestEvent::from_file(event_file)?;

    let policy = DecisionPolicy {
        lenient_preconditions: *lenient,
        verify_commit: !*no_commit_check,
    };

    if cli.verbose {
        println!(
            "{}",
            format!(
                "Evaluating pull request event for {} (release branch: {})",
                repository, release_branch
            )
            .cyan()
        );
    }

    let report =
        release::run(&store, release_branch, commit_sha, &event, policy, *dry_run).await?;

    if cli.verbose && !report.ignored_tags.is_empty() {
        println!(
            "{}",
            format!(
                "Ignored {} non-semver tag(s): {}",
                report.ignored_tags.len(),
                report.ignored_tags.join(", ")
            )
            .dimmed()
        );
    }

    match &report.outcome {
        Outcome::Tag(version) => {
            let action = if report.created { "Tagged" } else { "Would tag" };
            println!(
                "{} {} {} {} {}",
                "✓".green(),
                action.green(),
                version.to_string().green().bold(),
                format!("at {}", commit_sha).dimmed(),
                format!("(was {})", report.previous).dimmed()
            );
        }
        Outcome::Skip(reason) => {
            println!("{} {}", "✓".green(), format!("Nothing to do: {}", reason).yellow());
        }
    }

    Ok(())
}
