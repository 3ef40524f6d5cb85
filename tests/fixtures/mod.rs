//! Real repositories for end-to-end flow tests: a working copy plus a bare "origin".
#![allow(dead_code)]

use branchflow::flow::MemoryReporter;
use branchflow::{FlowSession, Git2Operations, InitContext};
use git2::{BranchType, IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub struct FlowRepository {
    _temp_dir: TempDir,
    pub work_path: PathBuf,
    pub origin_path: PathBuf,
    pub reporter: Arc<MemoryReporter>,
}

fn signature() -> Signature<'static> {
    Signature::now("Test User", "test@example.com").unwrap()
}

impl FlowRepository {
    /// Working copy with one commit on master, pushed to a bare origin
    pub fn new() -> Self {
        let fixture = Self::without_commits();
        fixture.commit_file("README.md", "# Test Repository\n", "Initial commit");
        let repo = fixture.repo();
        let mut remote = repo.find_remote("origin").unwrap();
        remote
            .push(&["refs/heads/master:refs/heads/master"], None)
            .unwrap();
        remote.fetch(&[] as &[&str], None, None).unwrap();
        fixture
    }

    /// Working copy with an unborn master and an empty bare origin
    pub fn without_commits() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let work_path = temp_dir.path().join("work");
        let origin_path = temp_dir.path().join("origin.git");

        let mut bare = RepositoryInitOptions::new();
        bare.bare(true).initial_head("master");
        Repository::init_opts(&origin_path, &bare).unwrap();

        let mut init = RepositoryInitOptions::new();
        init.initial_head("master");
        let repo = Repository::init_opts(&work_path, &init).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        repo.remote("origin", origin_path.to_str().unwrap()).unwrap();

        Self {
            _temp_dir: temp_dir,
            work_path,
            origin_path,
            reporter: Arc::new(MemoryReporter::new()),
        }
    }

    /// `new()` followed by a default init
    pub fn initialized() -> Self {
        let fixture = Self::new();
        fixture.session().init(InitContext::new()).unwrap();
        fixture
    }

    pub fn repo(&self) -> Repository {
        Repository::open(&self.work_path).unwrap()
    }

    pub fn origin(&self) -> Repository {
        Repository::open_bare(&self.origin_path).unwrap()
    }

    pub fn session(&self) -> FlowSession {
        FlowSession::get(&self.work_path)
            .unwrap()
            .reporter(self.reporter.clone())
    }

    pub fn operations(&self) -> Git2Operations {
        Git2Operations::new(&self.work_path).unwrap()
    }

    pub fn write_file(&self, path: &str, content: &str) {
        let full = self.work_path.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    /// Write, stage and commit on the checked-out branch
    pub fn commit_file(&self, path: &str, content: &str, message: &str) -> Oid {
        self.write_file(path, content);
        let repo = self.repo();
        let mut index = repo.index().unwrap();
        index
            .add_all([path].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let sig = signature();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    /// A collaborator's commit landing directly on `origin/<branch>`
    pub fn commit_on_origin(&self, branch: &str, message: &str) -> Oid {
        let origin = self.origin();
        let refname = format!("refs/heads/{branch}");
        let parent = origin
            .find_reference(&refname)
            .unwrap()
            .peel_to_commit()
            .unwrap();
        let tree = parent.tree().unwrap();
        let sig = signature();
        origin
            .commit(Some(&refname), &sig, &sig, message, &tree, &[&parent])
            .unwrap()
    }

    pub fn fetch_origin(&self) {
        let repo = self.repo();
        let mut remote = repo.find_remote("origin").unwrap();
        remote.fetch(&[] as &[&str], None, None).unwrap();
    }

    pub fn current_branch(&self) -> Option<String> {
        let repo = self.repo();
        let head = repo.head().ok()?;
        head.shorthand().map(str::to_string)
    }

    pub fn branch_tip(&self, branch: &str) -> Option<Oid> {
        self.repo()
            .find_branch(branch, BranchType::Local)
            .ok()
            .and_then(|b| b.get().target())
    }

    pub fn origin_branch_tip(&self, branch: &str) -> Option<Oid> {
        self.origin()
            .find_reference(&format!("refs/heads/{branch}"))
            .ok()
            .and_then(|r| r.target())
    }

    pub fn local_branches(&self) -> Vec<String> {
        let repo = self.repo();
        let mut names: Vec<String> = repo
            .branches(Some(BranchType::Local))
            .unwrap()
            .filter_map(|b| b.ok())
            .filter_map(|(b, _)| b.name().ok().flatten().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    pub fn tags(&self) -> Vec<String> {
        self.repo()
            .tag_names(None)
            .unwrap()
            .iter()
            .flatten()
            .map(str::to_string)
            .collect()
    }

    pub fn origin_has_tag(&self, tag: &str) -> bool {
        self.origin()
            .find_reference(&format!("refs/tags/{tag}"))
            .is_ok()
    }

    /// Commit the tag points at, peeling annotated tags
    pub fn tag_target(&self, tag: &str) -> Option<Oid> {
        self.repo()
            .revparse_single(&format!("refs/tags/{tag}"))
            .ok()
            .and_then(|obj| obj.peel_to_commit().ok())
            .map(|c| c.id())
    }

    pub fn parent_count(&self, commit: Oid) -> usize {
        self.repo().find_commit(commit).unwrap().parent_count()
    }

    pub fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> bool {
        ancestor == descendant
            || self
                .repo()
                .graph_descendant_of(descendant, ancestor)
                .unwrap()
    }

    pub fn config_value(&self, key: &str) -> Option<String> {
        self.repo().config().unwrap().get_string(key).ok()
    }

    pub fn path(&self) -> &Path {
        &self.work_path
    }
}
