use std::fmt;
use thiserror::Error;

use crate::flow::kind::{Phase, WorkflowKind};
use crate::git::GitError;

/// A repository mutation a command has already performed.
///
/// Nothing is ever rolled back, so failures carry the journal of these
/// steps to tell the caller what state the repository was left in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedStep {
    BranchCreated { branch: String, start_point: String },
    CheckedOut { branch: String },
    Pushed { remote: String, refspec: String },
    TrackingConfigured { branch: String, remote: String },
    Merged { source: String, target: String },
    Tagged { tag: String, target: String },
    LocalBranchDeleted { branch: String },
    RemoteBranchDeleted { remote: String, branch: String },
    ConfigWritten { key: String },
    InitialCommit { branch: String },
    RemoteAdded { remote: String },
}

impl fmt::Display for AppliedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppliedStep::BranchCreated {
                branch,
                start_point,
            } => write!(f, "created branch '{branch}' at '{start_point}'"),
            AppliedStep::CheckedOut { branch } => write!(f, "checked out '{branch}'"),
            AppliedStep::Pushed { remote, refspec } => write!(f, "pushed '{refspec}' to '{remote}'"),
            AppliedStep::TrackingConfigured { branch, remote } => {
                write!(f, "set '{branch}' to track '{remote}'")
            }
            AppliedStep::Merged { source, target } => write!(f, "merged '{source}' into '{target}'"),
            AppliedStep::Tagged { tag, target } => write!(f, "tagged '{target}' as '{tag}'"),
            AppliedStep::LocalBranchDeleted { branch } => {
                write!(f, "deleted local branch '{branch}'")
            }
            AppliedStep::RemoteBranchDeleted { remote, branch } => {
                write!(f, "deleted remote branch '{remote}/{branch}'")
            }
            AppliedStep::ConfigWritten { key } => write!(f, "wrote config '{key}'"),
            AppliedStep::InitialCommit { branch } => {
                write!(f, "created initial commit on '{branch}'")
            }
            AppliedStep::RemoteAdded { remote } => write!(f, "added remote '{remote}'"),
        }
    }
}

/// Ordered record of the mutations applied so far by one command
#[derive(Debug, Default, Clone)]
pub struct Journal {
    steps: Vec<AppliedStep>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: AppliedStep) {
        tracing::debug!(step = %step, "Applied repository mutation");
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[AppliedStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn snapshot(&self) -> Vec<AppliedStep> {
        self.steps.clone()
    }
}

fn kind_title(kind: &WorkflowKind) -> &'static str {
    match kind {
        WorkflowKind::Feature => "Feature",
        WorkflowKind::Release => "Release",
        WorkflowKind::Hotfix => "Hotfix",
        WorkflowKind::Support => "Support",
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("git-flow is not initialized in this repository")]
    NotInitialized,
    #[error("git-flow is already initialized; use force to overwrite the configuration")]
    AlreadyInitialized,
    #[error("master and develop must be different branches, both are '{branch}'")]
    SameBranch { branch: String },
    #[error("'{name}' is not a valid branch name: {reason}")]
    InvalidBranchName { name: String, reason: String },
    #[error("{kind} branches do not support {phase}")]
    UnsupportedPhase { kind: WorkflowKind, phase: Phase },
    #[error("working tree is not clean: {}", paths.join(", "))]
    DirtyWorkingTree { paths: Vec<String> },
    #[error("local branch '{branch}' does not exist")]
    LocalBranchMissing { branch: String },
    #[error("local branch '{branch}' already exists")]
    LocalBranchExists { branch: String },
    #[error("remote branch '{remote}/{branch}' already exists")]
    RemoteBranchExists { remote: String, branch: String },
    #[error("remote branch '{remote}/{branch}' does not exist")]
    RemoteBranchMissing { remote: String, branch: String },
    #[error("{} already started: '{existing}' is still in progress", kind_title(kind))]
    AlreadyStarted { kind: WorkflowKind, existing: String },
    #[error("tag '{tag}' already exists")]
    TagExists { tag: String },
    #[error("branch '{branch}' is {behind} commit(s) behind '{upstream}'")]
    BranchBehind {
        branch: String,
        upstream: String,
        behind: usize,
    },
    #[error("branches '{left}' and '{right}' point at different commits")]
    BranchesNotEqual { left: String, right: String },
    #[error("branches '{left}' and '{right}' have not diverged")]
    BranchesNotDiverged { left: String, right: String },
    #[error("merging into '{target}' stopped with conflicts in: {}", paths.join(", "))]
    MergeConflict {
        target: String,
        paths: Vec<String>,
        applied: Vec<AppliedStep>,
    },
    #[error("{operation} failed: {source}")]
    TransportFailure {
        operation: String,
        applied: Vec<AppliedStep>,
        #[source]
        source: GitError,
    },
    #[error("could not persist '{key}': {source}")]
    LocalStorageFailure {
        key: String,
        applied: Vec<AppliedStep>,
        #[source]
        source: GitError,
    },
    #[error("{operation} failed: {source}")]
    Repository {
        operation: String,
        applied: Vec<AppliedStep>,
        #[source]
        source: GitError,
    },
}

impl FlowError {
    /// Map an adapter failure onto the engine taxonomy, attaching what was already applied.
    pub fn from_git(operation: &str, source: GitError, journal: &Journal) -> Self {
        let applied = journal.snapshot();
        if source.is_transport() {
            FlowError::TransportFailure {
                operation: operation.to_string(),
                applied,
                source,
            }
        } else if let GitError::Config { key, .. } = &source {
            FlowError::LocalStorageFailure {
                key: key.clone(),
                applied,
                source,
            }
        } else {
            FlowError::Repository {
                operation: operation.to_string(),
                applied,
                source,
            }
        }
    }

    /// Failures raised by a gate before anything was changed; safe to retry once fixed
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            FlowError::NotInitialized
                | FlowError::AlreadyInitialized
                | FlowError::SameBranch { .. }
                | FlowError::InvalidBranchName { .. }
                | FlowError::UnsupportedPhase { .. }
                | FlowError::DirtyWorkingTree { .. }
                | FlowError::LocalBranchMissing { .. }
                | FlowError::LocalBranchExists { .. }
                | FlowError::RemoteBranchExists { .. }
                | FlowError::RemoteBranchMissing { .. }
                | FlowError::AlreadyStarted { .. }
                | FlowError::TagExists { .. }
                | FlowError::BranchBehind { .. }
                | FlowError::BranchesNotEqual { .. }
                | FlowError::BranchesNotDiverged { .. }
        )
    }

    /// Mutations already applied when the command stopped
    pub fn applied(&self) -> &[AppliedStep] {
        match self {
            FlowError::MergeConflict { applied, .. }
            | FlowError::TransportFailure { applied, .. }
            | FlowError::LocalStorageFailure { applied, .. }
            | FlowError::Repository { applied, .. } => applied,
            _ => &[],
        }
    }
}
