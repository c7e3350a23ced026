//! repoview - a read-only Git repository viewer
//!
//! This is the command-line front end: it loads the configuration, builds the
//! repository registry and prints listings or graph JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::Level;

use repoview::config::Config;
use repoview::registry::RepoList;
use repoview::storage::{AnnotatedCommit, Repo};

#[derive(Parser, Debug)]
#[command(name = "repoview", version, about = "Browse git repositories and their commit graphs")]
struct Cli {
    /// Path to the configuration file (default: ./repoview.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serve this repository in addition to the configured ones
    #[arg(short, long, global = true)]
    repository: Vec<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the served repositories
    List,

    /// Show the history of a branch
    Log {
        /// Repository name
        repo: String,
        /// Branch, tag or commit to start from (default: the HEAD branch)
        #[arg(value_name = "REF")]
        start: Option<String>,
        /// Maximum number of commits
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        max_count: Option<i64>,
        /// Number of commits to skip
        #[arg(long, default_value_t = 0)]
        skip: usize,
        /// Show this 1-based page instead of using --skip
        #[arg(long, conflicts_with = "skip")]
        page: Option<usize>,
    },

    /// Show a single commit
    Show {
        repo: String,
        /// Commit id or ref name
        commit: String,
    },

    /// Print the commit graph of every branch as JSON
    Graph {
        repo: String,
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        max_count: Option<i64>,
        #[arg(long, default_value_t = 0)]
        skip: usize,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    for path in cli.repository {
        config = config.with_repository(path);
    }
    let repos = RepoList::from_config(&config)?;

    match cli.command {
        Command::List => {
            if repos.is_empty() {
                println!("(no repositories configured)");
            }
            for repo in repos.iter() {
                if repo.description().is_empty() {
                    println!("{}", repo.param());
                } else {
                    println!("{}\t{}", repo.param(), repo.description());
                }
            }
        }
        Command::Log {
            repo,
            start,
            max_count,
            skip,
            page,
        } => {
            let repo = repos.find(&repo)?;
            let start = match start {
                Some(start) => start,
                None => repo.default_branch()?,
            };
            let max_count = max_count.unwrap_or(config.log.default_max_count);

            match page {
                Some(page) => {
                    let per_page = usize::try_from(max_count)
                        .map_err(|_| format!("invalid page size {}", max_count))?;
                    let listing = repo.page(&start, page, per_page)?;
                    print_log(&listing.commits);
                    let nav: Vec<&str> = [
                        listing.has_previous.then_some("previous page available"),
                        listing.has_next.then_some("next page available"),
                    ]
                    .into_iter()
                    .flatten()
                    .collect();
                    if !nav.is_empty() {
                        println!("({})", nav.join(", "));
                    }
                }
                None => print_log(&repo.commits(&start, max_count, skip)?),
            }
        }
        Command::Show { repo, commit } => {
            let repo: &Repo = repos.find(&repo)?;
            let commit = repo.resolve_commit(&commit)?;
            print_commit(&commit);
        }
        Command::Graph {
            repo,
            max_count,
            skip,
            pretty,
        } => {
            let repo = repos.find(&repo)?;
            let max_count = max_count.unwrap_or_else(|| {
                config
                    .graph
                    .max_commits
                    .and_then(|n| i64::try_from(n).ok())
                    .unwrap_or(i64::MAX)
            });
            let view = repo.graph(max_count, skip)?;
            let json = if pretty {
                serde_json::to_string_pretty(&view)?
            } else {
                serde_json::to_string(&view)?
            };
            println!("{}", json);
        }
    }

    Ok(())
}

fn print_log(commits: &[AnnotatedCommit]) {
    if commits.is_empty() {
        println!("(no commits)");
        return;
    }
    for commit in commits {
        let refs = commit.ref_names_joined();
        let info = &commit.commit;
        if refs.is_empty() {
            println!(
                "{} {} {} {}",
                commit.id().short(),
                info.authored_time.format("%Y-%m-%d"),
                info.author_name,
                info.summary()
            );
        } else {
            println!(
                "{} {} {} ({}) {}",
                commit.id().short(),
                info.authored_time.format("%Y-%m-%d"),
                info.author_name,
                refs,
                info.summary()
            );
        }
    }
}

fn print_commit(commit: &AnnotatedCommit) {
    let info = &commit.commit;
    println!("commit {}", info.id);
    if !commit.refs.is_empty() {
        println!("Refs:   {}", commit.ref_names_joined());
    }
    if info.is_merge() {
        let parents: Vec<String> = info.parent_ids.iter().map(|p| p.short()).collect();
        println!("Merge:  {}", parents.join(" "));
    }
    println!("Author: {} <{}>", info.author_name, info.author_email);
    println!("Date:   {}", info.authored_time.to_rfc2822());
    println!();
    for line in info.message.lines() {
        println!("    {}", line);
    }
}
