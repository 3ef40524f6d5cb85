use std::path::Path;
use std::sync::Arc;

use crate::config::BranchflowConfig;
use crate::flow::command::WorkflowCommand;
use crate::flow::configuration::FlowConfiguration;
use crate::flow::error::{FlowError, Journal};
use crate::flow::init::{InitCommand, InitContext};
use crate::flow::kind::{Phase, WorkflowKind};
use crate::flow::reporter::{FileReporter, Reporter, TracingReporter};
use crate::git::{Git2Operations, GitOperations};

/// A git-flow session bound to one working copy.
///
/// Hands out one [`WorkflowCommand`] per call; each reads the stored
/// configuration afresh when it runs.
pub struct FlowSession<G: GitOperations = Git2Operations> {
    git: G,
    reporter: Arc<dyn Reporter>,
    remote: String,
}

impl FlowSession<Git2Operations> {
    /// Open the repository containing `path` without initializing anything
    pub fn get<P: AsRef<Path>>(path: P) -> Result<Self, FlowError> {
        let git = Git2Operations::new(path)
            .map_err(|e| FlowError::from_git("open repository", e, &Journal::new()))?;
        Ok(Self::with_operations(git))
    }

    /// Open with remote name and audit reporter taken from tool settings.
    /// A relative audit log path is taken relative to `path`.
    pub fn open<P: AsRef<Path>>(path: P, settings: &BranchflowConfig) -> Result<Self, FlowError> {
        let directory = path.as_ref();
        let session = Self::get(directory)?.remote(&settings.remote.name);
        Ok(match &settings.audit.log_path {
            Some(log_path) => {
                session.reporter(Arc::new(FileReporter::new(directory.join(log_path))))
            }
            None => session,
        })
    }
}

impl<G: GitOperations> FlowSession<G> {
    pub fn with_operations(git: G) -> Self {
        Self {
            git,
            reporter: Arc::new(TracingReporter),
            remote: "origin".to_string(),
        }
    }

    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn remote(mut self, remote: &str) -> Self {
        self.remote = remote.to_string();
        self
    }

    pub fn remote_name(&self) -> &str {
        &self.remote
    }

    pub fn operations(&self) -> &G {
        &self.git
    }

    /// Initialize; fails `AlreadyInitialized` on an initialized repository
    pub fn init(&self, context: InitContext) -> Result<FlowConfiguration, FlowError> {
        InitCommand::new(&self.git, self.reporter.as_ref(), &self.remote, context).call()
    }

    /// Initialize, overwriting any stored configuration
    pub fn force_init(&self, context: InitContext) -> Result<FlowConfiguration, FlowError> {
        self.init(context.force(true))
    }

    /// Stored configuration when initialized, otherwise initialize with `context`
    pub fn get_or_init(&self, context: InitContext) -> Result<FlowConfiguration, FlowError> {
        let config = self.configuration()?;
        if config.is_initialized() {
            Ok(config)
        } else {
            self.init(context)
        }
    }

    pub fn is_initialized(&self) -> Result<bool, FlowError> {
        Ok(self.configuration()?.is_initialized())
    }

    pub fn configuration(&self) -> Result<FlowConfiguration, FlowError> {
        FlowConfiguration::load(&self.git)
    }

    pub fn master_branch_name(&self) -> Result<String, FlowError> {
        Ok(self.configuration()?.master)
    }

    pub fn develop_branch_name(&self) -> Result<String, FlowError> {
        Ok(self.configuration()?.develop)
    }

    pub fn prefix(&self, kind: WorkflowKind) -> Result<String, FlowError> {
        Ok(self.configuration()?.prefix(kind).to_string())
    }

    pub fn version_tag_prefix(&self) -> Result<String, FlowError> {
        Ok(self.configuration()?.version_tag_prefix)
    }

    pub fn command(&self, kind: WorkflowKind, phase: Phase, name: &str) -> WorkflowCommand<'_, G> {
        WorkflowCommand::new(
            &self.git,
            self.reporter.as_ref(),
            &self.remote,
            kind,
            phase,
            name,
        )
    }

    pub fn feature_start(&self, name: &str) -> WorkflowCommand<'_, G> {
        self.command(WorkflowKind::Feature, Phase::Start, name)
    }

    pub fn feature_publish(&self, name: &str) -> WorkflowCommand<'_, G> {
        self.command(WorkflowKind::Feature, Phase::Publish, name)
    }

    pub fn feature_finish(&self, name: &str) -> WorkflowCommand<'_, G> {
        self.command(WorkflowKind::Feature, Phase::Finish, name)
    }

    pub fn release_start(&self, name: &str) -> WorkflowCommand<'_, G> {
        self.command(WorkflowKind::Release, Phase::Start, name)
    }

    pub fn release_publish(&self, name: &str) -> WorkflowCommand<'_, G> {
        self.command(WorkflowKind::Release, Phase::Publish, name)
    }

    pub fn release_finish(&self, name: &str) -> WorkflowCommand<'_, G> {
        self.command(WorkflowKind::Release, Phase::Finish, name)
    }

    pub fn hotfix_start(&self, name: &str) -> WorkflowCommand<'_, G> {
        self.command(WorkflowKind::Hotfix, Phase::Start, name)
    }

    pub fn hotfix_publish(&self, name: &str) -> WorkflowCommand<'_, G> {
        self.command(WorkflowKind::Hotfix, Phase::Publish, name)
    }

    pub fn hotfix_finish(&self, name: &str) -> WorkflowCommand<'_, G> {
        self.command(WorkflowKind::Hotfix, Phase::Finish, name)
    }

    pub fn support_start(&self, name: &str) -> WorkflowCommand<'_, G> {
        self.command(WorkflowKind::Support, Phase::Start, name)
    }
}
