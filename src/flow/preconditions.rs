use crate::flow::configuration::FlowConfiguration;
use crate::flow::error::{FlowError, Journal};
use crate::flow::kind::WorkflowKind;
use crate::git::{GitError, GitOperations};

/// Gates evaluated against live repository state before a command mutates anything.
///
/// Every check reads the repository at call time; nothing is cached between
/// gates, so the order in which a command calls them is the order the user
/// sees failures in.
pub struct Preconditions<'a, G: GitOperations + ?Sized> {
    git: &'a G,
    remote: &'a str,
}

fn read_failure(operation: &str, err: GitError) -> FlowError {
    FlowError::from_git(operation, err, &Journal::new())
}

impl<'a, G: GitOperations + ?Sized> Preconditions<'a, G> {
    pub fn new(git: &'a G, remote: &'a str) -> Self {
        Self { git, remote }
    }

    pub fn require_flow_initialized(&self, config: &FlowConfiguration) -> Result<(), FlowError> {
        if config.is_initialized() {
            Ok(())
        } else {
            Err(FlowError::NotInitialized)
        }
    }

    pub fn require_valid_branch_name(&self, name: &str) -> Result<(), FlowError> {
        if self.git.is_valid_branch_name(name) {
            Ok(())
        } else {
            Err(FlowError::InvalidBranchName {
                name: name.to_string(),
                reason: "not a valid git reference name".to_string(),
            })
        }
    }

    pub fn require_clean_working_tree(&self, allow_untracked: bool) -> Result<(), FlowError> {
        let status = self
            .git
            .status()
            .map_err(|e| read_failure("status", e))?;
        if status.is_clean(allow_untracked) {
            Ok(())
        } else {
            Err(FlowError::DirtyWorkingTree {
                paths: status.dirty_paths(allow_untracked),
            })
        }
    }

    pub fn require_local_branch_exists(&self, branch: &str) -> Result<(), FlowError> {
        if self.local_branch_exists(branch)? {
            Ok(())
        } else {
            Err(FlowError::LocalBranchMissing {
                branch: branch.to_string(),
            })
        }
    }

    pub fn require_local_branch_absent(&self, branch: &str) -> Result<(), FlowError> {
        if self.local_branch_exists(branch)? {
            Err(FlowError::LocalBranchExists {
                branch: branch.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Reads remote-tracking refs; only as current as the last fetch
    pub fn require_remote_branch_exists(&self, branch: &str) -> Result<(), FlowError> {
        if self.remote_branch_exists(branch)? {
            Ok(())
        } else {
            Err(FlowError::RemoteBranchMissing {
                remote: self.remote.to_string(),
                branch: branch.to_string(),
            })
        }
    }

    /// Reads remote-tracking refs; only as current as the last fetch
    pub fn require_remote_branch_absent(&self, branch: &str) -> Result<(), FlowError> {
        if self.remote_branch_exists(branch)? {
            Err(FlowError::RemoteBranchExists {
                remote: self.remote.to_string(),
                branch: branch.to_string(),
            })
        } else {
            Ok(())
        }
    }

    pub fn require_branches_equal(&self, left: &str, right: &str) -> Result<(), FlowError> {
        let left_id = self.resolve(left)?;
        let right_id = self.resolve(right)?;
        if left_id == right_id {
            Ok(())
        } else {
            Err(FlowError::BranchesNotEqual {
                left: left.to_string(),
                right: right.to_string(),
            })
        }
    }

    /// Passes when each side has commits the other lacks, i.e. neither is a fast-forward of the other
    pub fn require_branches_diverged(&self, left: &str, right: &str) -> Result<(), FlowError> {
        let (ahead, behind) = self
            .git
            .commits_ahead_behind(left, right)
            .map_err(|e| read_failure("rev-list", e))?;
        if ahead > 0 && behind > 0 {
            Ok(())
        } else {
            Err(FlowError::BranchesNotDiverged {
                left: left.to_string(),
                right: right.to_string(),
            })
        }
    }

    /// Fails when `upstream` has commits `local` lacks.
    /// An upstream that does not resolve has nothing to be behind.
    pub fn require_not_behind(&self, local: &str, upstream: &str) -> Result<(), FlowError> {
        if self
            .git
            .resolve_commit(upstream)
            .map_err(|e| read_failure("rev-parse", e))?
            .is_none()
        {
            return Ok(());
        }
        let (_, behind) = self
            .git
            .commits_ahead_behind(local, upstream)
            .map_err(|e| read_failure("rev-list", e))?;
        if behind == 0 {
            Ok(())
        } else {
            Err(FlowError::BranchBehind {
                branch: local.to_string(),
                upstream: upstream.to_string(),
                behind,
            })
        }
    }

    /// Only one release and one hotfix may be in progress at a time
    pub fn require_no_branch_with_prefix(
        &self,
        kind: WorkflowKind,
        prefix: &str,
    ) -> Result<(), FlowError> {
        let branches = self
            .git
            .list_local_branches()
            .map_err(|e| read_failure("branch --list", e))?;
        match branches.into_iter().find(|b| b.starts_with(prefix)) {
            Some(existing) => Err(FlowError::AlreadyStarted { kind, existing }),
            None => Ok(()),
        }
    }

    pub fn require_tag_absent(&self, tag: &str) -> Result<(), FlowError> {
        if self
            .git
            .tag_exists(tag)
            .map_err(|e| read_failure("tag --list", e))?
        {
            Err(FlowError::TagExists {
                tag: tag.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// `<remote>/<branch>`, the remote-tracking name of a branch on the configured remote
    pub fn upstream_of(&self, branch: &str) -> String {
        format!("{}/{}", self.remote, branch)
    }

    pub fn require_start_point(&self, start_point: &str) -> Result<(), FlowError> {
        self.resolve(start_point).map(|_| ())
    }

    fn local_branch_exists(&self, branch: &str) -> Result<bool, FlowError> {
        self.git
            .local_branch_exists(branch)
            .map_err(|e| read_failure("branch --list", e))
    }

    fn remote_branch_exists(&self, branch: &str) -> Result<bool, FlowError> {
        self.git
            .remote_branch_exists(self.remote, branch)
            .map_err(|e| read_failure("branch --remotes", e))
    }

    fn resolve(&self, rev: &str) -> Result<String, FlowError> {
        self.git
            .resolve_commit(rev)
            .map_err(|e| read_failure("rev-parse", e))?
            .ok_or_else(|| FlowError::LocalBranchMissing {
                branch: rev.to_string(),
            })
    }
}
