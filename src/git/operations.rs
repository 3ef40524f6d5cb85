use git2::{
    build::CheckoutBuilder, BranchType, Cred, CredentialType, ErrorCode, FetchOptions, FetchPrune,
    ObjectType, Oid, PushOptions, RemoteCallbacks, Repository, Signature, StatusOptions,
};
use std::path::Path;

use super::error::GitError;

pub type Result<T> = std::result::Result<T, GitError>;

/// Snapshot of the working copy, split the way the clean-tree gate needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    /// Staged, modified, deleted, renamed or type-changed paths
    pub changed: Vec<String>,
    /// Paths with unresolved merge conflicts
    pub conflicted: Vec<String>,
    /// Paths git does not track yet
    pub untracked: Vec<String>,
}

impl WorkingTreeStatus {
    pub fn is_clean(&self, allow_untracked: bool) -> bool {
        self.dirty_paths(allow_untracked).is_empty()
    }

    pub fn dirty_paths(&self, allow_untracked: bool) -> Vec<String> {
        let mut paths: Vec<String> = self
            .conflicted
            .iter()
            .chain(self.changed.iter())
            .cloned()
            .collect();
        if !allow_untracked {
            paths.extend(self.untracked.iter().cloned());
        }
        paths
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Move the target ref when possible instead of recording a merge commit
    FastForwardAllowed,
    /// Always record a merge commit unless the target already contains the branch
    NoFastForward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    UpToDate,
    FastForward,
    Merged,
    /// The merge stopped with these paths conflicted; the repository is left mid-merge
    Conflicts(Vec<String>),
}

impl MergeOutcome {
    pub fn is_conflicted(&self) -> bool {
        matches!(self, MergeOutcome::Conflicts(_))
    }
}

/// `branch.<name>.remote` / `branch.<name>.merge` as stored in git config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrackingLink {
    pub local_branch: String,
    pub remote: String,
    pub merge_ref: String,
}

impl RemoteTrackingLink {
    pub fn remote_branch(&self) -> &str {
        self.merge_ref
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.merge_ref)
    }
}

/// Capability surface over one working copy.
///
/// Revisions accepted by the `rev` style parameters are anything
/// `git rev-parse` understands: local branch names, `remote/branch`
/// remote-tracking names, tags and commit ids.
pub trait GitOperations {
    /// Working tree and index state (replaces `git status`)
    fn status(&self) -> Result<WorkingTreeStatus>;

    /// Name of the checked-out branch, `None` when HEAD is detached
    fn current_branch(&self) -> Result<Option<String>>;

    /// Whether HEAD points at any commit at all
    fn has_commits(&self) -> Result<bool>;

    fn list_local_branches(&self) -> Result<Vec<String>>;

    /// Branch names known under `refs/remotes/<remote>/`, without the remote prefix
    fn list_remote_branches(&self, remote: &str) -> Result<Vec<String>>;

    fn local_branch_exists(&self, branch: &str) -> Result<bool> {
        Ok(self.list_local_branches()?.iter().any(|b| b == branch))
    }

    fn remote_branch_exists(&self, remote: &str, branch: &str) -> Result<bool> {
        Ok(self
            .list_remote_branches(remote)?
            .iter()
            .any(|b| b == branch))
    }

    /// Commit id a revision points at, `None` if it does not resolve
    fn resolve_commit(&self, rev: &str) -> Result<Option<String>>;

    fn is_valid_branch_name(&self, name: &str) -> bool;

    /// Create a local branch at `start_point` without checking it out
    fn create_branch(&self, name: &str, start_point: &str) -> Result<()>;

    fn delete_local_branch(&self, name: &str) -> Result<()>;

    /// Delete `name` on the remote and drop the matching remote-tracking ref
    fn delete_remote_branch(&self, remote: &str, name: &str) -> Result<()>;

    fn checkout(&self, branch: &str) -> Result<()>;

    /// Merge local `branch` into the checked-out branch
    fn merge(&self, branch: &str, mode: MergeMode, message: &str) -> Result<MergeOutcome>;

    /// Create an annotated tag
    fn tag(&self, name: &str, target: &str, message: &str) -> Result<()>;

    fn tag_exists(&self, name: &str) -> Result<bool>;

    fn fetch(&self, remote: &str) -> Result<()>;

    fn push(&self, remote: &str, refspec: &str) -> Result<()>;

    fn set_tracking(&self, branch: &str, remote: &str, merge_ref: &str) -> Result<()>;

    fn tracking(&self, branch: &str) -> Result<Option<RemoteTrackingLink>>;

    fn get_config(&self, key: &str) -> Result<Option<String>>;

    fn set_config(&self, key: &str, value: &str) -> Result<()>;

    /// Commits `local` has that `upstream` lacks, and the reverse
    fn commits_ahead_behind(&self, local: &str, upstream: &str) -> Result<(usize, usize)>;

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool>;

    /// Record an empty root commit on `branch` and point HEAD at it
    fn create_initial_commit(&self, branch: &str, message: &str) -> Result<()>;

    fn remote_exists(&self, remote: &str) -> Result<bool>;

    fn add_remote(&self, name: &str, url: &str) -> Result<()>;
}

/// Implementation of GitOperations using git2
pub struct Git2Operations {
    repo: Repository,
}

impl Git2Operations {
    /// Open the repository containing `path`, searching parent directories.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|e| GitError::RepositoryNotFound {
            path: path.display().to_string(),
            message: e.message().to_string(),
        })?;
        Ok(Self { repo })
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    fn signature(&self) -> Result<Signature<'static>> {
        // Try to get signature from config, fall back to defaults
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Signature::now("branchflow", "branchflow@localhost")
                .map_err(|e| GitError::command("signature", e)),
        }
    }

    fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
        let mut callbacks = RemoteCallbacks::new();
        let mut attempts = 0;
        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            attempts += 1;
            if attempts > 3 {
                return Err(git2::Error::from_str("authentication failed"));
            }
            let user = username_from_url.unwrap_or("git");
            if allowed_types.contains(CredentialType::SSH_KEY) {
                if attempts == 1 {
                    return Cred::ssh_key_from_agent(user);
                }
                return Cred::ssh_key(
                    user,
                    None,
                    Path::new(&format!(
                        "{}/.ssh/id_rsa",
                        std::env::var("HOME").unwrap_or_default()
                    )),
                    None,
                );
            }
            Cred::default()
        });
        callbacks
    }

    fn oid_of(&self, rev: &str) -> Result<Oid> {
        self.repo
            .revparse_single(rev)
            .and_then(|obj| obj.peel_to_commit())
            .map(|commit| commit.id())
            .map_err(|_| GitError::RevisionNotFound {
                rev: rev.to_string(),
            })
    }

    fn conflicted_paths(index: &git2::Index) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        let conflicts = index
            .conflicts()
            .map_err(|e| GitError::command("merge", e))?;
        for conflict in conflicts {
            let conflict = conflict.map_err(|e| GitError::command("merge", e))?;
            if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
                paths.push(String::from_utf8_lossy(&entry.path).into_owned());
            }
        }
        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}

impl GitOperations for Git2Operations {
    fn status(&self) -> Result<WorkingTreeStatus> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = self
            .repo
            .statuses(Some(&mut options))
            .map_err(|e| GitError::command("status", e))?;

        let mut status = WorkingTreeStatus::default();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else { continue };
            let flags = entry.status();
            if flags.is_conflicted() {
                status.conflicted.push(path.to_string());
            } else if flags == git2::Status::WT_NEW {
                status.untracked.push(path.to_string());
            } else if !flags.is_ignored() && flags != git2::Status::CURRENT {
                status.changed.push(path.to_string());
            }
        }
        Ok(status)
    }

    fn current_branch(&self) -> Result<Option<String>> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(str::to_string)),
            Ok(_) => Ok(None),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                // Unborn HEAD still names the branch the first commit will land on
                let head = self
                    .repo
                    .find_reference("HEAD")
                    .map_err(|e| GitError::command("head", e))?;
                Ok(head
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string))
            }
            Err(e) => Err(GitError::command("head", e)),
        }
    }

    fn has_commits(&self) -> Result<bool> {
        let empty = self
            .repo
            .is_empty()
            .map_err(|e| GitError::command("head", e))?;
        Ok(!empty)
    }

    fn list_local_branches(&self) -> Result<Vec<String>> {
        let branches = self
            .repo
            .branches(Some(BranchType::Local))
            .map_err(|e| GitError::command("branch --list", e))?;
        let mut names = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(|e| GitError::command("branch --list", e))?;
            if let Some(name) = branch
                .name()
                .map_err(|e| GitError::command("branch --list", e))?
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn list_remote_branches(&self, remote: &str) -> Result<Vec<String>> {
        let prefix = format!("{remote}/");
        let branches = self
            .repo
            .branches(Some(BranchType::Remote))
            .map_err(|e| GitError::command("branch --remotes", e))?;
        let mut names = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(|e| GitError::command("branch --remotes", e))?;
            let name = branch
                .name()
                .map_err(|e| GitError::command("branch --remotes", e))?;
            if let Some(short) = name.and_then(|n| n.strip_prefix(&prefix)) {
                if short != "HEAD" {
                    names.push(short.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn local_branch_exists(&self, branch: &str) -> Result<bool> {
        match self.repo.find_branch(branch, BranchType::Local) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound || e.code() == ErrorCode::InvalidSpec => {
                Ok(false)
            }
            Err(e) => Err(GitError::command("branch --list", e)),
        }
    }

    fn remote_branch_exists(&self, remote: &str, branch: &str) -> Result<bool> {
        let remote_branch = format!("{remote}/{branch}");
        match self.repo.find_branch(&remote_branch, BranchType::Remote) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound || e.code() == ErrorCode::InvalidSpec => {
                Ok(false)
            }
            Err(e) => Err(GitError::command("branch --remotes", e)),
        }
    }

    fn resolve_commit(&self, rev: &str) -> Result<Option<String>> {
        match self.oid_of(rev) {
            Ok(oid) => Ok(Some(oid.to_string())),
            Err(GitError::RevisionNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn is_valid_branch_name(&self, name: &str) -> bool {
        git2::Reference::is_valid_name(&format!("refs/heads/{name}"))
    }

    fn create_branch(&self, name: &str, start_point: &str) -> Result<()> {
        let oid = self.oid_of(start_point)?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|e| GitError::command("branch", e))?;
        self.repo
            .branch(name, &commit, false)
            .map_err(|e| GitError::command("branch", e))?;
        Ok(())
    }

    fn delete_local_branch(&self, name: &str) -> Result<()> {
        let mut branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .map_err(|_| GitError::BranchNotFound {
                branch: name.to_string(),
            })?;
        branch
            .delete()
            .map_err(|e| GitError::command("branch -D", e))
    }

    fn delete_remote_branch(&self, remote: &str, name: &str) -> Result<()> {
        self.push(remote, &format!(":refs/heads/{name}"))?;
        let tracking_ref = format!("refs/remotes/{remote}/{name}");
        if let Ok(mut reference) = self.repo.find_reference(&tracking_ref) {
            reference
                .delete()
                .map_err(|e| GitError::command("update-ref -d", e))?;
        }
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        let branch_ref = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| GitError::BranchNotFound {
                branch: branch.to_string(),
            })?;
        let reference = branch_ref.get();
        let refname = reference
            .name()
            .ok_or_else(|| GitError::BranchNotFound {
                branch: branch.to_string(),
            })?
            .to_string();
        let commit = reference
            .peel_to_commit()
            .map_err(|e| GitError::command("checkout", e))?;

        let mut options = CheckoutBuilder::new();
        options.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut options))
            .map_err(|e| GitError::command("checkout", e))?;
        self.repo
            .set_head(&refname)
            .map_err(|e| GitError::command("checkout", e))?;
        Ok(())
    }

    fn merge(&self, branch: &str, mode: MergeMode, message: &str) -> Result<MergeOutcome> {
        let their_branch = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| GitError::BranchNotFound {
                branch: branch.to_string(),
            })?;
        let their = self
            .repo
            .reference_to_annotated_commit(their_branch.get())
            .map_err(|e| GitError::command("merge", e))?;
        let (analysis, _) = self
            .repo
            .merge_analysis(&[&their])
            .map_err(|e| GitError::command("merge", e))?;

        if analysis.is_up_to_date() {
            return Ok(MergeOutcome::UpToDate);
        }

        if analysis.is_fast_forward() && mode == MergeMode::FastForwardAllowed {
            let target = self
                .repo
                .find_commit(their.id())
                .map_err(|e| GitError::command("merge", e))?;
            let mut options = CheckoutBuilder::new();
            options.safe();
            self.repo
                .checkout_tree(target.as_object(), Some(&mut options))
                .map_err(|e| GitError::command("merge", e))?;
            let mut head = self
                .repo
                .head()
                .map_err(|e| GitError::command("merge", e))?;
            head.set_target(their.id(), message)
                .map_err(|e| GitError::command("merge", e))?;
            return Ok(MergeOutcome::FastForward);
        }

        let mut checkout = CheckoutBuilder::new();
        checkout.safe().allow_conflicts(true).conflict_style_merge(true);
        self.repo
            .merge(&[&their], None, Some(&mut checkout))
            .map_err(|e| GitError::command("merge", e))?;

        let mut index = self
            .repo
            .index()
            .map_err(|e| GitError::command("merge", e))?;
        if index.has_conflicts() {
            // Left as-is: MERGE_HEAD and conflict markers stay for manual resolution
            return Ok(MergeOutcome::Conflicts(Self::conflicted_paths(&index)?));
        }

        let tree_id = index
            .write_tree()
            .map_err(|e| GitError::command("merge", e))?;
        let tree = self
            .repo
            .find_tree(tree_id)
            .map_err(|e| GitError::command("merge", e))?;
        let signature = self.signature()?;
        let head_commit = self
            .repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| GitError::command("merge", e))?;
        let their_commit = self
            .repo
            .find_commit(their.id())
            .map_err(|e| GitError::command("merge", e))?;

        self.repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &[&head_commit, &their_commit],
            )
            .map_err(|e| GitError::command("merge", e))?;
        self.repo
            .cleanup_state()
            .map_err(|e| GitError::command("merge", e))?;

        Ok(MergeOutcome::Merged)
    }

    fn tag(&self, name: &str, target: &str, message: &str) -> Result<()> {
        let object = self
            .repo
            .revparse_single(target)
            .and_then(|obj| obj.peel(ObjectType::Commit))
            .map_err(|_| GitError::RevisionNotFound {
                rev: target.to_string(),
            })?;
        let signature = self.signature()?;
        self.repo
            .tag(name, &object, &signature, message, false)
            .map_err(|e| GitError::command("tag", e))?;
        Ok(())
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_reference(&format!("refs/tags/{name}")) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound || e.code() == ErrorCode::InvalidSpec => {
                Ok(false)
            }
            Err(e) => Err(GitError::command("tag --list", e)),
        }
    }

    fn fetch(&self, remote_name: &str) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|e| GitError::transport("fetch", remote_name, e))?;

        let mut options = FetchOptions::new();
        options
            .remote_callbacks(Self::remote_callbacks())
            .prune(FetchPrune::On);

        remote
            .fetch(&[] as &[&str], Some(&mut options), None)
            .map_err(|e| GitError::transport("fetch", remote_name, e))?;
        Ok(())
    }

    fn push(&self, remote_name: &str, refspec: &str) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|e| GitError::transport("push", remote_name, e))?;

        let mut callbacks = Self::remote_callbacks();
        // libgit2 reports per-ref rejections here rather than failing the push
        callbacks.push_update_reference(|refname, status| match status {
            Some(reason) => Err(git2::Error::from_str(&format!(
                "{refname} rejected: {reason}"
            ))),
            None => Ok(()),
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(&[refspec], Some(&mut push_options))
            .map_err(|e| GitError::transport("push", remote_name, e))?;
        Ok(())
    }

    fn set_tracking(&self, branch: &str, remote: &str, merge_ref: &str) -> Result<()> {
        let remote_key = format!("branch.{branch}.remote");
        let merge_key = format!("branch.{branch}.merge");
        self.set_config(&remote_key, remote)?;
        self.set_config(&merge_key, merge_ref)
    }

    fn tracking(&self, branch: &str) -> Result<Option<RemoteTrackingLink>> {
        let remote = self.get_config(&format!("branch.{branch}.remote"))?;
        let merge_ref = self.get_config(&format!("branch.{branch}.merge"))?;
        Ok(match (remote, merge_ref) {
            (Some(remote), Some(merge_ref)) => Some(RemoteTrackingLink {
                local_branch: branch.to_string(),
                remote,
                merge_ref,
            }),
            _ => None,
        })
    }

    fn get_config(&self, key: &str) -> Result<Option<String>> {
        let config = self.repo.config().map_err(|e| GitError::config(key, e))?;
        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::config(key, e)),
        }
    }

    fn set_config(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.repo.config().map_err(|e| GitError::config(key, e))?;
        config
            .set_str(key, value)
            .map_err(|e| GitError::config(key, e))
    }

    fn commits_ahead_behind(&self, local: &str, upstream: &str) -> Result<(usize, usize)> {
        let local_oid = self.oid_of(local)?;
        let upstream_oid = self.oid_of(upstream)?;
        self.repo
            .graph_ahead_behind(local_oid, upstream_oid)
            .map_err(|e| GitError::command("rev-list --count", e))
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let ancestor_oid = self.oid_of(ancestor)?;
        let descendant_oid = self.oid_of(descendant)?;
        if ancestor_oid == descendant_oid {
            return Ok(true);
        }
        self.repo
            .graph_descendant_of(descendant_oid, ancestor_oid)
            .map_err(|e| GitError::command("merge-base --is-ancestor", e))
    }

    fn create_initial_commit(&self, branch: &str, message: &str) -> Result<()> {
        let refname = format!("refs/heads/{branch}");
        let tree_id = self
            .repo
            .index()
            .and_then(|mut index| index.write_tree())
            .map_err(|e| GitError::command("commit", e))?;
        let tree = self
            .repo
            .find_tree(tree_id)
            .map_err(|e| GitError::command("commit", e))?;
        let signature = self.signature()?;
        self.repo
            .commit(Some(&refname), &signature, &signature, message, &tree, &[])
            .map_err(|e| GitError::command("commit", e))?;
        self.repo
            .set_head(&refname)
            .map_err(|e| GitError::command("commit", e))?;
        Ok(())
    }

    fn remote_exists(&self, remote: &str) -> Result<bool> {
        match self.repo.find_remote(remote) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound || e.code() == ErrorCode::InvalidSpec => {
                Ok(false)
            }
            Err(e) => Err(GitError::command("remote", e)),
        }
    }

    fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.repo
            .remote(name, url)
            .map_err(|e| GitError::config(&format!("remote.{name}.url"), e))?;
        Ok(())
    }
}
