use anyhow::{Context, Result};
use std::path::Path;

use branchflow::{BranchflowConfig, InitContext, WorkflowKind};

use super::open_session;
use crate::cli::InitArgs;

/// `branchflow init`: flags override the `[init]` settings
pub struct InitCommand {
    pub args: InitArgs,
}

impl InitCommand {
    pub fn new(args: InitArgs) -> Self {
        Self { args }
    }

    pub fn context(&self, settings: &BranchflowConfig) -> InitContext {
        let args = &self.args;
        let mut context = settings.init.to_init_context().force(args.force);
        if let Some(master) = &args.master {
            context = context.master(master);
        }
        if let Some(develop) = &args.develop {
            context = context.develop(develop);
        }
        let prefixes = [
            (WorkflowKind::Feature, &args.feature_prefix),
            (WorkflowKind::Release, &args.release_prefix),
            (WorkflowKind::Hotfix, &args.hotfix_prefix),
            (WorkflowKind::Support, &args.support_prefix),
        ];
        for (kind, prefix) in prefixes {
            if let Some(prefix) = prefix {
                context = context.prefix(kind, prefix);
            }
        }
        if let Some(prefix) = &args.version_tag_prefix {
            context = context.version_tag_prefix(prefix);
        }
        if let Some(url) = &args.origin_url {
            context = context.origin_url(url);
        }
        context
    }

    pub fn execute(&self, directory: &Path, settings: &BranchflowConfig) -> Result<()> {
        let session = open_session(directory, settings)?;
        let config = session
            .init(self.context(settings))
            .context("git-flow initialization failed")?;

        println!("✅ Initialized git-flow");
        println!("   master:  {}", config.master);
        println!("   develop: {}", config.develop);
        for kind in WorkflowKind::ALL {
            println!("   {kind} prefix: {}", config.prefix(kind));
        }
        if !config.version_tag_prefix.is_empty() {
            println!("   version tag prefix: {}", config.version_tag_prefix);
        }
        Ok(())
    }
}
