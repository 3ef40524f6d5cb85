use anyhow::Result;
use std::path::Path;

use branchflow::{BranchflowConfig, CommandOptions, Phase, WorkflowKind};

use super::open_session;
use crate::cli::{FinishArgs, StartArgs, WorkflowAction};

/// `branchflow <kind> <phase> <name>`
pub struct WorkflowCommand {
    pub kind: WorkflowKind,
    pub phase: Phase,
    pub name: String,
    pub options: CommandOptions,
}

impl WorkflowCommand {
    pub fn new(kind: WorkflowKind, phase: Phase, name: String) -> Self {
        Self {
            kind,
            phase,
            name,
            options: CommandOptions::default(),
        }
    }

    pub fn from_action(kind: WorkflowKind, action: WorkflowAction) -> Self {
        match action {
            WorkflowAction::Start { name, args } => {
                Self::new(kind, Phase::Start, name).with_start_args(args)
            }
            WorkflowAction::Publish {
                name,
                allow_untracked,
            } => {
                let mut command = Self::new(kind, Phase::Publish, name);
                command.options.allow_untracked = allow_untracked;
                command
            }
            WorkflowAction::Finish { name, args } => {
                Self::new(kind, Phase::Finish, name).with_finish_args(args)
            }
        }
    }

    pub fn with_start_args(mut self, args: StartArgs) -> Self {
        self.options.fetch = args.fetch;
        self.options.start_commit = args.start_commit;
        self.options.allow_untracked = args.allow_untracked;
        self
    }

    pub fn with_finish_args(mut self, args: FinishArgs) -> Self {
        self.options.fetch = args.fetch;
        self.options.keep_branch = args.keep_branch;
        self.options.no_tag = args.no_tag;
        self.options.tag_message = args.message;
        self.options.push = args.push;
        self.options.allow_untracked = args.allow_untracked;
        self
    }

    pub fn execute(&self, directory: &Path, settings: &BranchflowConfig) -> Result<()> {
        let session = open_session(directory, settings)?;
        let branch = session
            .command(self.kind, self.phase, &self.name)
            .with_options(self.options.clone())
            .call()?;

        match self.phase {
            Phase::Start => {
                println!("✅ Switched to a new branch '{branch}'");
            }
            Phase::Publish => {
                println!(
                    "✅ Published '{branch}' to '{}' and set up tracking",
                    session.remote_name()
                );
            }
            Phase::Finish => {
                let config = session.configuration()?;
                println!("✅ Finished '{branch}'");
                if self.kind.policy().tag_on_finish && !self.options.no_tag {
                    println!("🏷️  Tagged '{}'", config.version_tag(branch.short_name()));
                }
                if self.options.keep_branch {
                    println!("   Branch '{branch}' was kept");
                } else {
                    println!("   Branch '{branch}' was deleted");
                }
                println!("   You are now on '{}'", config.develop);
            }
        }
        Ok(())
    }
}
