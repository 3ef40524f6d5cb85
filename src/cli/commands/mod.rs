use anyhow::{Context, Result};
use std::path::Path;

use branchflow::{BranchflowConfig, FlowSession, Phase, WorkflowKind};

use super::{Commands, SupportAction};

pub mod config;
pub mod init;
pub mod workflow;

pub fn open_session(directory: &Path, settings: &BranchflowConfig) -> Result<FlowSession> {
    FlowSession::open(directory, settings)
        .with_context(|| format!("Failed to open git repository at {}", directory.display()))
}

/// Route a parsed command to its implementation
pub fn dispatch(command: Commands, directory: &Path, settings: &BranchflowConfig) -> Result<()> {
    match command {
        Commands::Init(args) => init::InitCommand::new(args).execute(directory, settings),
        Commands::Config => config::ConfigCommand.execute(directory, settings),
        Commands::Feature { action } => {
            workflow::WorkflowCommand::from_action(WorkflowKind::Feature, action)
                .execute(directory, settings)
        }
        Commands::Release { action } => {
            workflow::WorkflowCommand::from_action(WorkflowKind::Release, action)
                .execute(directory, settings)
        }
        Commands::Hotfix { action } => {
            workflow::WorkflowCommand::from_action(WorkflowKind::Hotfix, action)
                .execute(directory, settings)
        }
        Commands::Support {
            action: SupportAction::Start { name, args },
        } => workflow::WorkflowCommand::new(WorkflowKind::Support, Phase::Start, name)
            .with_start_args(args)
            .execute(directory, settings),
    }
}
