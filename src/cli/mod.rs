use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "branchflow")]
#[command(version)]
#[command(about = "git-flow branch workflows: feature, release, hotfix and support branches")]
#[command(long_about = "Branchflow starts, publishes and finishes git-flow branches. \
                       Run 'branchflow init' once per repository, then e.g. \
                       'branchflow feature start <name>'.")]
pub struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long = "directory", global = true)]
    pub directory: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up git-flow branches and configuration in this repository
    Init(InitArgs),
    /// Print the stored git-flow configuration as TOML
    Config,
    /// Feature branches: branch from and merge back into develop
    Feature {
        #[command(subcommand)]
        action: WorkflowAction,
    },
    /// Release branches: branch from master, merge into master and develop, tag
    Release {
        #[command(subcommand)]
        action: WorkflowAction,
    },
    /// Hotfix branches: branch from master, merge into master and develop, tag
    Hotfix {
        #[command(subcommand)]
        action: WorkflowAction,
    },
    /// Support branches: long-lived branches started from master
    Support {
        #[command(subcommand)]
        action: SupportAction,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct InitArgs {
    /// Overwrite an existing git-flow configuration
    #[arg(long, short = 'f')]
    pub force: bool,
    #[arg(long, help = "Name of the production branch")]
    pub master: Option<String>,
    #[arg(long, help = "Name of the integration branch")]
    pub develop: Option<String>,
    #[arg(long)]
    pub feature_prefix: Option<String>,
    #[arg(long)]
    pub release_prefix: Option<String>,
    #[arg(long)]
    pub hotfix_prefix: Option<String>,
    #[arg(long)]
    pub support_prefix: Option<String>,
    #[arg(long)]
    pub version_tag_prefix: Option<String>,
    /// Add this URL as the remote when it is not configured yet
    #[arg(long)]
    pub origin_url: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum WorkflowAction {
    /// Create the branch and check it out
    Start {
        name: String,
        #[command(flatten)]
        args: StartArgs,
    },
    /// Push the branch and track it
    Publish {
        name: String,
        #[arg(long, help = "Do not treat untracked files as uncommitted changes")]
        allow_untracked: bool,
    },
    /// Merge the branch back, tag where applicable, and delete it
    Finish {
        name: String,
        #[command(flatten)]
        args: FinishArgs,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SupportAction {
    /// Create the support branch from master and check it out
    Start {
        name: String,
        #[command(flatten)]
        args: StartArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    #[arg(long, help = "Fetch first and refuse to start from a stale base branch")]
    pub fetch: bool,
    #[arg(long, value_name = "REV", help = "Start from this commit instead of the base branch")]
    pub start_commit: Option<String>,
    #[arg(long, help = "Do not treat untracked files as uncommitted changes")]
    pub allow_untracked: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FinishArgs {
    #[arg(long, help = "Fetch first and refuse to finish onto stale integration branches")]
    pub fetch: bool,
    #[arg(long, short = 'k', help = "Keep the branch after finishing")]
    pub keep_branch: bool,
    #[arg(long, short = 'n', help = "Do not tag the release or hotfix")]
    pub no_tag: bool,
    #[arg(long, short = 'm', help = "Tag message")]
    pub message: Option<String>,
    #[arg(long, short = 'p', help = "Push develop, master and the tag afterwards")]
    pub push: bool,
    #[arg(long, help = "Do not treat untracked files as uncommitted changes")]
    pub allow_untracked: bool,
}
