// Mock implementations for testing - no side effects

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::error::GitError;
use super::operations::{
    GitOperations, MergeMode, MergeOutcome, RemoteTrackingLink, Result, WorkingTreeStatus,
};

/// State-changing operations the mock has executed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCommand {
    CreateBranch { name: String, start_point: String },
    DeleteLocalBranch { name: String },
    DeleteRemoteBranch { remote: String, name: String },
    Checkout { branch: String },
    Merge { branch: String, into: String },
    Tag { name: String, target: String },
    Fetch { remote: String },
    Push { remote: String, refspec: String },
    SetConfig { key: String, value: String },
    InitialCommit { branch: String },
    AddRemote { name: String, url: String },
}

/// Operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Fetch,
    Push,
    DeleteRemoteBranch,
    SetConfig,
    Tag,
    CurrentBranch,
}

/// In-memory repository with a tiny commit graph.
///
/// Commits are indices into `parents`; their ids render as `c<index>`.
#[derive(Debug)]
pub struct MockGitOperations {
    parents: RefCell<Vec<Vec<usize>>>,
    local: RefCell<BTreeMap<String, usize>>,
    /// Branches as the remote server holds them
    server: RefCell<BTreeMap<String, BTreeMap<String, usize>>>,
    server_tags: RefCell<BTreeMap<String, BTreeSet<String>>>,
    /// `refs/remotes/<remote>/<branch>` as last fetched
    remote_tracking: RefCell<BTreeMap<String, BTreeMap<String, usize>>>,
    tags: RefCell<BTreeMap<String, usize>>,
    head: RefCell<Option<String>>,
    config: RefCell<BTreeMap<String, String>>,
    status: RefCell<WorkingTreeStatus>,
    merge_conflicts: RefCell<HashMap<String, Vec<String>>>,
    failures: RefCell<HashSet<FailurePoint>>,
    fail_after: RefCell<HashMap<FailurePoint, usize>>,
    pub executed_commands: RefCell<Vec<GitCommand>>,
}

impl Default for MockGitOperations {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitOperations {
    /// Repository with one commit on `master` and an empty `origin` remote
    pub fn new() -> Self {
        let mock = Self::empty();
        mock.parents.borrow_mut().push(Vec::new());
        mock.local.borrow_mut().insert("master".to_string(), 0);
        mock
    }

    /// Repository with no commits; HEAD is an unborn `master`
    pub fn empty() -> Self {
        let mut server = BTreeMap::new();
        server.insert("origin".to_string(), BTreeMap::new());
        let mut tracking = BTreeMap::new();
        tracking.insert("origin".to_string(), BTreeMap::new());
        Self {
            parents: RefCell::new(Vec::new()),
            local: RefCell::new(BTreeMap::new()),
            server: RefCell::new(server),
            server_tags: RefCell::new(BTreeMap::new()),
            remote_tracking: RefCell::new(tracking),
            tags: RefCell::new(BTreeMap::new()),
            head: RefCell::new(Some("master".to_string())),
            config: RefCell::new(BTreeMap::new()),
            status: RefCell::new(WorkingTreeStatus::default()),
            merge_conflicts: RefCell::new(HashMap::new()),
            failures: RefCell::new(HashSet::new()),
            fail_after: RefCell::new(HashMap::new()),
            executed_commands: RefCell::new(Vec::new()),
        }
    }

    /// Add a commit on top of a local branch and return its id
    pub fn commit_on(&self, branch: &str) -> String {
        let parent = self.local.borrow().get(branch).copied();
        let id = self.new_commit(parent.into_iter().collect());
        self.local.borrow_mut().insert(branch.to_string(), id);
        Self::commit_id(id)
    }

    /// Simulate a collaborator pushing a new commit to `remote/branch`
    pub fn commit_on_remote(&self, remote: &str, branch: &str) -> String {
        let parent = self
            .server
            .borrow()
            .get(remote)
            .and_then(|branches| branches.get(branch).copied())
            .or_else(|| self.local.borrow().get(branch).copied());
        let id = self.new_commit(parent.into_iter().collect());
        self.server
            .borrow_mut()
            .entry(remote.to_string())
            .or_default()
            .insert(branch.to_string(), id);
        Self::commit_id(id)
    }

    pub fn set_dirty(&self, paths: &[&str]) {
        self.status.borrow_mut().changed = paths.iter().map(|p| p.to_string()).collect();
    }

    pub fn set_untracked(&self, paths: &[&str]) {
        self.status.borrow_mut().untracked = paths.iter().map(|p| p.to_string()).collect();
    }

    /// Merges into `target` will report these conflicting paths
    pub fn set_merge_conflicts(&self, target: &str, paths: &[&str]) {
        self.merge_conflicts.borrow_mut().insert(
            target.to_string(),
            paths.iter().map(|p| p.to_string()).collect(),
        );
    }

    pub fn fail_on(&self, point: FailurePoint) {
        self.failures.borrow_mut().insert(point);
    }

    /// Let `successes` calls through, then fail every later one
    pub fn fail_after(&self, point: FailurePoint, successes: usize) {
        self.fail_after.borrow_mut().insert(point, successes);
    }

    pub fn set_config_value(&self, key: &str, value: &str) {
        self.config
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    pub fn config_value(&self, key: &str) -> Option<String> {
        self.config.borrow().get(key).cloned()
    }

    pub fn branch_tip(&self, branch: &str) -> Option<String> {
        self.local.borrow().get(branch).map(|id| Self::commit_id(*id))
    }

    pub fn server_branch_tip(&self, remote: &str, branch: &str) -> Option<String> {
        self.server
            .borrow()
            .get(remote)
            .and_then(|branches| branches.get(branch))
            .map(|id| Self::commit_id(*id))
    }

    pub fn server_has_tag(&self, remote: &str, tag: &str) -> bool {
        self.server_tags
            .borrow()
            .get(remote)
            .is_some_and(|tags| tags.contains(tag))
    }

    pub fn tag_target(&self, tag: &str) -> Option<String> {
        self.tags.borrow().get(tag).map(|id| Self::commit_id(*id))
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.borrow().keys().cloned().collect()
    }

    pub fn parents_of(&self, commit: &str) -> Vec<String> {
        Self::parse_id(commit)
            .and_then(|id| self.parents.borrow().get(id).cloned())
            .unwrap_or_default()
            .into_iter()
            .map(Self::commit_id)
            .collect()
    }

    pub fn get_executed_commands(&self) -> Vec<GitCommand> {
        self.executed_commands.borrow().clone()
    }

    pub fn clear_executed_commands(&self) {
        self.executed_commands.borrow_mut().clear();
    }

    fn record(&self, command: GitCommand) {
        self.executed_commands.borrow_mut().push(command);
    }

    fn failing(&self, point: FailurePoint) -> bool {
        if self.failures.borrow().contains(&point) {
            return true;
        }
        match self.fail_after.borrow_mut().get_mut(&point) {
            Some(0) => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        }
    }

    fn new_commit(&self, parents: Vec<usize>) -> usize {
        let mut graph = self.parents.borrow_mut();
        graph.push(parents);
        graph.len() - 1
    }

    fn commit_id(id: usize) -> String {
        format!("c{id}")
    }

    fn parse_id(rev: &str) -> Option<usize> {
        rev.strip_prefix('c').and_then(|n| n.parse().ok())
    }

    fn resolve(&self, rev: &str) -> Option<usize> {
        if rev == "HEAD" {
            let head = self.head.borrow().clone()?;
            return self.local.borrow().get(&head).copied();
        }
        let rev = rev.strip_prefix("refs/heads/").unwrap_or(rev);
        if let Some(id) = self.local.borrow().get(rev) {
            return Some(*id);
        }
        for (remote, branches) in self.remote_tracking.borrow().iter() {
            let prefix = format!("{remote}/");
            if let Some(id) = rev.strip_prefix(&prefix).and_then(|b| branches.get(b)) {
                return Some(*id);
            }
        }
        let rev = rev.strip_prefix("refs/tags/").unwrap_or(rev);
        if let Some(id) = self.tags.borrow().get(rev) {
            return Some(*id);
        }
        Self::parse_id(rev).filter(|id| *id < self.parents.borrow().len())
    }

    fn resolve_or_err(&self, rev: &str) -> Result<usize> {
        self.resolve(rev).ok_or_else(|| GitError::RevisionNotFound {
            rev: rev.to_string(),
        })
    }

    fn reachable(&self, from: usize) -> HashSet<usize> {
        let graph = self.parents.borrow();
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(graph[id].iter().copied());
            }
        }
        seen
    }

    fn transport_error(operation: &str, remote: &str) -> GitError {
        GitError::Transport {
            operation: operation.to_string(),
            remote: remote.to_string(),
            message: "connection reset by peer".to_string(),
        }
    }
}

impl GitOperations for MockGitOperations {
    fn status(&self) -> Result<WorkingTreeStatus> {
        Ok(self.status.borrow().clone())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        if self.failing(FailurePoint::CurrentBranch) {
            return Err(GitError::CommandFailed {
                operation: "head".to_string(),
                message: "unable to read HEAD".to_string(),
            });
        }
        Ok(self.head.borrow().clone())
    }

    fn has_commits(&self) -> Result<bool> {
        Ok(!self.parents.borrow().is_empty())
    }

    fn list_local_branches(&self) -> Result<Vec<String>> {
        Ok(self.local.borrow().keys().cloned().collect())
    }

    fn list_remote_branches(&self, remote: &str) -> Result<Vec<String>> {
        Ok(self
            .remote_tracking
            .borrow()
            .get(remote)
            .map(|branches| branches.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn resolve_commit(&self, rev: &str) -> Result<Option<String>> {
        Ok(self.resolve(rev).map(Self::commit_id))
    }

    fn is_valid_branch_name(&self, name: &str) -> bool {
        !name.is_empty()
            && !name.contains("..")
            && !name.contains("//")
            && !name.starts_with('/')
            && !name.ends_with('/')
            && !name.ends_with(".lock")
            && !name
                .chars()
                .any(|c| c.is_whitespace() || "~^:?*[\\".contains(c))
    }

    fn create_branch(&self, name: &str, start_point: &str) -> Result<()> {
        if self.local.borrow().contains_key(name) {
            return Err(GitError::CommandFailed {
                operation: "branch".to_string(),
                message: format!("a branch named '{name}' already exists"),
            });
        }
        let id = self.resolve_or_err(start_point)?;
        self.record(GitCommand::CreateBranch {
            name: name.to_string(),
            start_point: start_point.to_string(),
        });
        self.local.borrow_mut().insert(name.to_string(), id);
        Ok(())
    }

    fn delete_local_branch(&self, name: &str) -> Result<()> {
        if !self.local.borrow().contains_key(name) {
            return Err(GitError::BranchNotFound {
                branch: name.to_string(),
            });
        }
        if self.head.borrow().as_deref() == Some(name) {
            return Err(GitError::CommandFailed {
                operation: "branch -D".to_string(),
                message: format!("cannot delete branch '{name}' checked out"),
            });
        }
        self.record(GitCommand::DeleteLocalBranch {
            name: name.to_string(),
        });
        self.local.borrow_mut().remove(name);
        self.config
            .borrow_mut()
            .retain(|key, _| !key.starts_with(&format!("branch.{name}.")));
        Ok(())
    }

    fn delete_remote_branch(&self, remote: &str, name: &str) -> Result<()> {
        self.record(GitCommand::DeleteRemoteBranch {
            remote: remote.to_string(),
            name: name.to_string(),
        });
        if self.failing(FailurePoint::DeleteRemoteBranch) {
            return Err(Self::transport_error("push", remote));
        }
        let removed = self
            .server
            .borrow_mut()
            .get_mut(remote)
            .and_then(|branches| branches.remove(name));
        if removed.is_none() {
            return Err(GitError::Transport {
                operation: "push".to_string(),
                remote: remote.to_string(),
                message: format!("remote ref does not exist: refs/heads/{name}"),
            });
        }
        if let Some(branches) = self.remote_tracking.borrow_mut().get_mut(remote) {
            branches.remove(name);
        }
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        if !self.local.borrow().contains_key(branch) {
            return Err(GitError::BranchNotFound {
                branch: branch.to_string(),
            });
        }
        if !self.status.borrow().conflicted.is_empty() {
            return Err(GitError::CommandFailed {
                operation: "checkout".to_string(),
                message: "you need to resolve your current index first".to_string(),
            });
        }
        self.record(GitCommand::Checkout {
            branch: branch.to_string(),
        });
        *self.head.borrow_mut() = Some(branch.to_string());
        Ok(())
    }

    fn merge(&self, branch: &str, mode: MergeMode, _message: &str) -> Result<MergeOutcome> {
        let target = self.head.borrow().clone().ok_or_else(|| GitError::CommandFailed {
            operation: "merge".to_string(),
            message: "HEAD is detached".to_string(),
        })?;
        let theirs = *self
            .local
            .borrow()
            .get(branch)
            .ok_or_else(|| GitError::BranchNotFound {
                branch: branch.to_string(),
            })?;
        let ours = self.resolve_or_err(&target)?;
        self.record(GitCommand::Merge {
            branch: branch.to_string(),
            into: target.clone(),
        });

        if let Some(paths) = self.merge_conflicts.borrow().get(&target).cloned() {
            self.status.borrow_mut().conflicted = paths.clone();
            return Ok(MergeOutcome::Conflicts(paths));
        }

        if self.reachable(ours).contains(&theirs) {
            return Ok(MergeOutcome::UpToDate);
        }
        if mode == MergeMode::FastForwardAllowed && self.reachable(theirs).contains(&ours) {
            self.local.borrow_mut().insert(target, theirs);
            return Ok(MergeOutcome::FastForward);
        }
        let merged = self.new_commit(vec![ours, theirs]);
        self.local.borrow_mut().insert(target, merged);
        Ok(MergeOutcome::Merged)
    }

    fn tag(&self, name: &str, target: &str, _message: &str) -> Result<()> {
        if self.failing(FailurePoint::Tag) {
            return Err(GitError::CommandFailed {
                operation: "tag".to_string(),
                message: "unable to write tag object".to_string(),
            });
        }
        if self.tags.borrow().contains_key(name) {
            return Err(GitError::CommandFailed {
                operation: "tag".to_string(),
                message: format!("tag '{name}' already exists"),
            });
        }
        let id = self.resolve_or_err(target)?;
        self.record(GitCommand::Tag {
            name: name.to_string(),
            target: target.to_string(),
        });
        self.tags.borrow_mut().insert(name.to_string(), id);
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tags.borrow().contains_key(name))
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.record(GitCommand::Fetch {
            remote: remote.to_string(),
        });
        if self.failing(FailurePoint::Fetch) {
            return Err(Self::transport_error("fetch", remote));
        }
        let branches = self
            .server
            .borrow()
            .get(remote)
            .cloned()
            .ok_or_else(|| GitError::RemoteNotFound {
                remote: remote.to_string(),
            })?;
        self.remote_tracking
            .borrow_mut()
            .insert(remote.to_string(), branches);
        Ok(())
    }

    fn push(&self, remote: &str, refspec: &str) -> Result<()> {
        self.record(GitCommand::Push {
            remote: remote.to_string(),
            refspec: refspec.to_string(),
        });
        if self.failing(FailurePoint::Push) {
            return Err(Self::transport_error("push", remote));
        }
        if !self.server.borrow().contains_key(remote) {
            return Err(GitError::RemoteNotFound {
                remote: remote.to_string(),
            });
        }
        let (src, dst) = refspec.split_once(':').unwrap_or((refspec, refspec));

        if let Some(tag) = dst.strip_prefix("refs/tags/") {
            self.server_tags
                .borrow_mut()
                .entry(remote.to_string())
                .or_default()
                .insert(tag.to_string());
            return Ok(());
        }

        let branch = dst.strip_prefix("refs/heads/").unwrap_or(dst).to_string();
        let id = self.resolve_or_err(src)?;
        let existing = self
            .server
            .borrow()
            .get(remote)
            .and_then(|branches| branches.get(&branch).copied());
        if let Some(existing) = existing {
            if !self.reachable(id).contains(&existing) {
                return Err(GitError::Transport {
                    operation: "push".to_string(),
                    remote: remote.to_string(),
                    message: format!("refs/heads/{branch} rejected: non-fast-forward"),
                });
            }
        }
        self.server
            .borrow_mut()
            .entry(remote.to_string())
            .or_default()
            .insert(branch.clone(), id);
        self.remote_tracking
            .borrow_mut()
            .entry(remote.to_string())
            .or_default()
            .insert(branch, id);
        Ok(())
    }

    fn set_tracking(&self, branch: &str, remote: &str, merge_ref: &str) -> Result<()> {
        self.set_config(&format!("branch.{branch}.remote"), remote)?;
        self.set_config(&format!("branch.{branch}.merge"), merge_ref)
    }

    fn tracking(&self, branch: &str) -> Result<Option<RemoteTrackingLink>> {
        let config = self.config.borrow();
        let remote = config.get(&format!("branch.{branch}.remote")).cloned();
        let merge_ref = config.get(&format!("branch.{branch}.merge")).cloned();
        Ok(remote.zip(merge_ref).map(|(remote, merge_ref)| RemoteTrackingLink {
            local_branch: branch.to_string(),
            remote,
            merge_ref,
        }))
    }

    fn get_config(&self, key: &str) -> Result<Option<String>> {
        Ok(self.config.borrow().get(key).cloned())
    }

    fn set_config(&self, key: &str, value: &str) -> Result<()> {
        if self.failing(FailurePoint::SetConfig) {
            return Err(GitError::Config {
                key: key.to_string(),
                message: "could not lock config file".to_string(),
            });
        }
        self.record(GitCommand::SetConfig {
            key: key.to_string(),
            value: value.to_string(),
        });
        self.config
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn commits_ahead_behind(&self, local: &str, upstream: &str) -> Result<(usize, usize)> {
        let local = self.reachable(self.resolve_or_err(local)?);
        let upstream = self.reachable(self.resolve_or_err(upstream)?);
        Ok((
            local.difference(&upstream).count(),
            upstream.difference(&local).count(),
        ))
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let ancestor = self.resolve_or_err(ancestor)?;
        let descendant = self.resolve_or_err(descendant)?;
        Ok(self.reachable(descendant).contains(&ancestor))
    }

    fn create_initial_commit(&self, branch: &str, _message: &str) -> Result<()> {
        self.record(GitCommand::InitialCommit {
            branch: branch.to_string(),
        });
        let id = self.new_commit(Vec::new());
        self.local.borrow_mut().insert(branch.to_string(), id);
        *self.head.borrow_mut() = Some(branch.to_string());
        Ok(())
    }

    fn remote_exists(&self, remote: &str) -> Result<bool> {
        Ok(self.server.borrow().contains_key(remote))
    }

    fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.record(GitCommand::AddRemote {
            name: name.to_string(),
            url: url.to_string(),
        });
        self.server
            .borrow_mut()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }
}
