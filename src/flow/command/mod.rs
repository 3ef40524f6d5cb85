//! The single generic workflow command.
//!
//! Every {kind, phase} pair (feature start, release finish, ...) is the same
//! state machine driven by the kind's [`KindPolicy`](crate::flow::kind::KindPolicy):
//! read configuration, run the gates, then apply a fixed mutation sequence.
//! Mutations already applied are never undone; failures report them instead.

mod finish;
mod publish;
mod start;

use crate::flow::branch::BranchName;
use crate::flow::configuration::FlowConfiguration;
use crate::flow::error::{AppliedStep, FlowError, Journal};
use crate::flow::kind::{Phase, WorkflowKind};
use crate::flow::preconditions::Preconditions;
use crate::flow::reporter::{CommandOutcome, CommandRecord, Reporter};
use crate::git::GitOperations;
use crate::telemetry::{create_command_span, generate_correlation_id};

/// Per-invocation switches; all off by default
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    /// Fetch first and refuse to work from integration branches behind their remote
    pub fetch: bool,
    /// Start from this revision instead of the kind's integration branch
    pub start_commit: Option<String>,
    /// Untracked files do not make the working tree dirty
    pub allow_untracked: bool,
    /// Finish without deleting the local and remote branch
    pub keep_branch: bool,
    /// Finish a release or hotfix without tagging it
    pub no_tag: bool,
    pub tag_message: Option<String>,
    /// Push the integration branches (and tag) after finishing
    pub push: bool,
}

pub struct WorkflowCommand<'a, G: GitOperations + ?Sized> {
    git: &'a G,
    reporter: &'a dyn Reporter,
    remote: &'a str,
    kind: WorkflowKind,
    phase: Phase,
    short_name: String,
    options: CommandOptions,
}

/// What the phase bodies share once configuration has been read
struct Context<'c, 'a, G: GitOperations + ?Sized> {
    config: &'c FlowConfiguration,
    branch: BranchName,
    gates: Preconditions<'a, G>,
    journal: Journal,
}

impl<'a, G: GitOperations + ?Sized> WorkflowCommand<'a, G> {
    pub fn new(
        git: &'a G,
        reporter: &'a dyn Reporter,
        remote: &'a str,
        kind: WorkflowKind,
        phase: Phase,
        short_name: &str,
    ) -> Self {
        Self {
            git,
            reporter,
            remote,
            kind,
            phase,
            short_name: short_name.to_string(),
            options: CommandOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fetch(mut self, fetch: bool) -> Self {
        self.options.fetch = fetch;
        self
    }

    pub fn start_commit(mut self, revision: &str) -> Self {
        self.options.start_commit = Some(revision.to_string());
        self
    }

    pub fn allow_untracked(mut self, allow: bool) -> Self {
        self.options.allow_untracked = allow;
        self
    }

    pub fn keep_branch(mut self, keep: bool) -> Self {
        self.options.keep_branch = keep;
        self
    }

    pub fn no_tag(mut self, no_tag: bool) -> Self {
        self.options.no_tag = no_tag;
        self
    }

    pub fn tag_message(mut self, message: &str) -> Self {
        self.options.tag_message = Some(message.to_string());
        self
    }

    pub fn push(mut self, push: bool) -> Self {
        self.options.push = push;
        self
    }

    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn options(&self) -> &CommandOptions {
        &self.options
    }

    /// Run the command once. Returns the full name of the branch it worked on.
    pub fn call(self) -> Result<BranchName, FlowError> {
        let command = self.kind.command_name(self.phase);
        let correlation_id = generate_correlation_id();

        let config = FlowConfiguration::load(self.git);
        let label = match &config {
            Ok(config) => format!("{}{}", config.prefix(self.kind), self.short_name),
            Err(_) => self.short_name.clone(),
        };

        let span = create_command_span(&command, &label, &correlation_id);
        let _guard = span.enter();

        self.report(&command, &label, CommandOutcome::Attempted, &correlation_id);
        let result = config.and_then(|config| self.run(&config));
        match &result {
            Ok(branch) => {
                tracing::info!(branch = %branch, "{} completed", command);
                self.report(&command, &label, CommandOutcome::Succeeded, &correlation_id);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    applied = e.applied().len(),
                    "{} failed",
                    command
                );
                self.report(
                    &command,
                    &label,
                    CommandOutcome::Failed {
                        error: e.to_string(),
                    },
                    &correlation_id,
                );
            }
        }
        result
    }

    fn report(&self, command: &str, branch: &str, outcome: CommandOutcome, correlation_id: &str) {
        self.reporter
            .record(&CommandRecord::new(command, branch, outcome, correlation_id));
    }

    fn run(&self, config: &FlowConfiguration) -> Result<BranchName, FlowError> {
        if !self.kind.supports(self.phase) {
            return Err(FlowError::UnsupportedPhase {
                kind: self.kind,
                phase: self.phase,
            });
        }

        let gates = Preconditions::new(self.git, self.remote);
        gates.require_flow_initialized(config)?;
        let branch = BranchName::for_kind(config, self.kind, &self.short_name)?;
        gates.require_valid_branch_name(branch.as_str())?;

        let mut ctx = Context {
            config,
            branch,
            gates,
            journal: Journal::new(),
        };
        match self.phase {
            Phase::Start => self.start(&mut ctx)?,
            Phase::Publish => self.publish(&mut ctx)?,
            Phase::Finish => self.finish(&mut ctx)?,
        }
        Ok(ctx.branch)
    }

    fn fetch_remote(&self, journal: &Journal) -> Result<(), FlowError> {
        tracing::debug!(remote = %self.remote, "Fetching");
        self.git
            .fetch(self.remote)
            .map_err(|e| FlowError::from_git("fetch", e, journal))
    }

    /// Check out `branch` unless it already is; journals the switch
    fn checkout(&self, branch: &str, journal: &mut Journal) -> Result<(), FlowError> {
        let current = self
            .git
            .current_branch()
            .map_err(|e| FlowError::from_git("checkout", e, journal))?;
        if current.as_deref() == Some(branch) {
            return Ok(());
        }
        self.git
            .checkout(branch)
            .map_err(|e| FlowError::from_git("checkout", e, journal))?;
        journal.record(AppliedStep::CheckedOut {
            branch: branch.to_string(),
        });
        Ok(())
    }

    fn push_refspec(&self, refspec: String, journal: &mut Journal) -> Result<(), FlowError> {
        self.git
            .push(self.remote, &refspec)
            .map_err(|e| FlowError::from_git("push", e, journal))?;
        tracing::info!(remote = %self.remote, refspec = %refspec, "Pushed");
        journal.record(AppliedStep::Pushed {
            remote: self.remote.to_string(),
            refspec,
        });
        Ok(())
    }
}
