use crate::flow::configuration::FlowConfiguration;
use crate::flow::error::{AppliedStep, FlowError, Journal};
use crate::flow::kind::WorkflowKind;
use crate::flow::preconditions::Preconditions;
use crate::flow::reporter::{CommandOutcome, CommandRecord, Reporter};
use crate::git::GitOperations;
use crate::telemetry::{create_command_span, generate_correlation_id};

const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

/// What `init` should establish: branch names, prefixes and an optional origin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitContext {
    pub configuration: FlowConfiguration,
    pub origin_url: Option<String>,
    pub force: bool,
}

impl InitContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn master(mut self, name: &str) -> Self {
        self.configuration.master = name.to_string();
        self
    }

    pub fn develop(mut self, name: &str) -> Self {
        self.configuration.develop = name.to_string();
        self
    }

    pub fn prefix(mut self, kind: WorkflowKind, prefix: &str) -> Self {
        self.configuration.prefixes.insert(kind, prefix.to_string());
        self
    }

    pub fn version_tag_prefix(mut self, prefix: &str) -> Self {
        self.configuration.version_tag_prefix = prefix.to_string();
        self
    }

    pub fn origin_url(mut self, url: &str) -> Self {
        self.origin_url = Some(url.to_string());
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Bootstraps git-flow on a fresh or existing repository.
pub struct InitCommand<'a, G: GitOperations + ?Sized> {
    git: &'a G,
    reporter: &'a dyn Reporter,
    remote: &'a str,
    context: InitContext,
}

impl<'a, G: GitOperations + ?Sized> InitCommand<'a, G> {
    pub fn new(git: &'a G, reporter: &'a dyn Reporter, remote: &'a str, context: InitContext) -> Self {
        Self {
            git,
            reporter,
            remote,
            context,
        }
    }

    pub fn call(self) -> Result<FlowConfiguration, FlowError> {
        let correlation_id = generate_correlation_id();
        let develop = self.context.configuration.develop.clone();
        let span = create_command_span("init", &develop, &correlation_id);
        let _guard = span.enter();

        self.report(&develop, CommandOutcome::Attempted, &correlation_id);
        let result = self.run();
        match &result {
            Ok(config) => {
                tracing::info!(master = %config.master, develop = %config.develop, "git-flow initialized");
                self.report(&develop, CommandOutcome::Succeeded, &correlation_id);
            }
            Err(e) => {
                tracing::warn!(error = %e, "init failed");
                self.report(
                    &develop,
                    CommandOutcome::Failed {
                        error: e.to_string(),
                    },
                    &correlation_id,
                );
            }
        }
        result
    }

    fn report(&self, branch: &str, outcome: CommandOutcome, correlation_id: &str) {
        self.reporter
            .record(&CommandRecord::new("init", branch, outcome, correlation_id));
    }

    fn run(&self) -> Result<FlowConfiguration, FlowError> {
        let gates = Preconditions::new(self.git, self.remote);
        let existing = FlowConfiguration::load(self.git)?;
        if existing.is_initialized() && !self.context.force {
            return Err(FlowError::AlreadyInitialized);
        }

        let mut config = self.context.configuration.clone();
        config.validate()?;
        gates.require_valid_branch_name(&config.master)?;
        gates.require_valid_branch_name(&config.develop)?;

        let mut journal = Journal::new();
        self.ensure_remote(&mut journal)?;

        let has_commits = self
            .git
            .has_commits()
            .map_err(|e| FlowError::from_git("inspect history", e, &journal))?;
        if has_commits {
            let head = "HEAD".to_string();
            let master_start = self.remote_or(&gates, &config.master, head)?;
            self.ensure_branch(&config.master, master_start, &mut journal)?;
        } else {
            self.git
                .create_initial_commit(&config.master, INITIAL_COMMIT_MESSAGE)
                .map_err(|e| FlowError::from_git("initial commit", e, &journal))?;
            tracing::info!(branch = %config.master, "Created initial commit");
            journal.record(AppliedStep::InitialCommit {
                branch: config.master.clone(),
            });
        }

        let develop_start = self.remote_or(&gates, &config.develop, config.master.clone())?;
        self.ensure_branch(&config.develop, develop_start, &mut journal)?;

        config.initialized = true;
        config.save(self.git, &mut journal)?;

        let current = self
            .git
            .current_branch()
            .map_err(|e| FlowError::from_git("checkout", e, &journal))?;
        if current.as_deref() != Some(config.develop.as_str()) {
            self.git
                .checkout(&config.develop)
                .map_err(|e| FlowError::from_git("checkout", e, &journal))?;
            journal.record(AppliedStep::CheckedOut {
                branch: config.develop.clone(),
            });
        }

        Ok(config)
    }

    /// Add the remote when an origin URL was given and it is not configured yet
    fn ensure_remote(&self, journal: &mut Journal) -> Result<(), FlowError> {
        let Some(url) = &self.context.origin_url else {
            return Ok(());
        };
        let exists = self
            .git
            .remote_exists(self.remote)
            .map_err(|e| FlowError::from_git("remote", e, journal))?;
        if !exists {
            self.git
                .add_remote(self.remote, url)
                .map_err(|e| FlowError::from_git("add remote", e, journal))?;
            tracing::info!(remote = %self.remote, url = %url, "Added remote");
            journal.record(AppliedStep::RemoteAdded {
                remote: self.remote.to_string(),
            });
        }
        self.git
            .fetch(self.remote)
            .map_err(|e| FlowError::from_git("fetch", e, journal))
    }

    /// `<remote>/<branch>` when the remote has it, otherwise `fallback`
    fn remote_or(
        &self,
        gates: &Preconditions<'a, G>,
        branch: &str,
        fallback: String,
    ) -> Result<String, FlowError> {
        let on_remote = self
            .git
            .remote_branch_exists(self.remote, branch)
            .map_err(|e| FlowError::from_git("branch --remotes", e, &Journal::new()))?;
        Ok(if on_remote {
            gates.upstream_of(branch)
        } else {
            fallback
        })
    }

    fn ensure_branch(&self, branch: &str, start_point: String, journal: &mut Journal) -> Result<(), FlowError> {
        let exists = self
            .git
            .local_branch_exists(branch)
            .map_err(|e| FlowError::from_git("branch --list", e, journal))?;
        if exists {
            return Ok(());
        }
        self.git
            .create_branch(branch, &start_point)
            .map_err(|e| FlowError::from_git("create branch", e, journal))?;
        tracing::info!(branch = %branch, start_point = %start_point, "Created integration branch");
        journal.record(AppliedStep::BranchCreated {
            branch: branch.to_string(),
            start_point,
        });
        Ok(())
    }
}
