use super::{Context, WorkflowCommand};
use crate::flow::error::{AppliedStep, FlowError};
use crate::git::{GitError, GitOperations, MergeOutcome};

impl<'a, G: GitOperations + ?Sized> WorkflowCommand<'a, G> {
    /// Merge the branch into its integration targets, tag, clean up, return to develop.
    ///
    /// A conflicting merge stops the command where it is: the target is left
    /// mid-merge for manual resolution and the working branch survives. A
    /// conflict on develop therefore leaves master merged and tagged.
    pub(super) fn finish(&self, ctx: &mut Context<'_, 'a, G>) -> Result<(), FlowError> {
        let policy = self.kind.policy();
        let branch = ctx.branch.as_str().to_string();
        let targets: Vec<String> = policy
            .merge_targets
            .iter()
            .map(|target| target.resolve(ctx.config).to_string())
            .collect();

        ctx.gates
            .require_clean_working_tree(self.options.allow_untracked)?;
        ctx.gates.require_local_branch_exists(&branch)?;
        if self.options.fetch {
            self.fetch_remote(&ctx.journal)?;
            for target in &targets {
                ctx.gates
                    .require_not_behind(target, &ctx.gates.upstream_of(target))?;
            }
        }

        let tag = (policy.tag_on_finish && !self.options.no_tag)
            .then(|| ctx.config.version_tag(ctx.branch.short_name()));
        if let Some(tag) = &tag {
            ctx.gates.require_tag_absent(tag)?;
        }

        let tracking = self
            .git
            .tracking(&branch)
            .map_err(|e| FlowError::from_git("read upstream", e, &ctx.journal))?;
        if let Some(link) = &tracking {
            ctx.gates.require_not_behind(
                &branch,
                &format!("{}/{}", link.remote, link.remote_branch()),
            )?;
        }

        for target in &targets {
            self.checkout(target, &mut ctx.journal)?;

            let message = format!("Merge branch '{branch}' into {target}");
            let outcome = self
                .git
                .merge(&branch, policy.merge_mode, &message)
                .map_err(|e| FlowError::from_git("merge", e, &ctx.journal))?;
            match outcome {
                MergeOutcome::Conflicts(paths) => {
                    tracing::warn!(
                        branch = %branch,
                        target = %target,
                        conflicts = paths.len(),
                        "Merge stopped with conflicts; resolve and commit manually"
                    );
                    return Err(FlowError::MergeConflict {
                        target: target.clone(),
                        paths,
                        applied: ctx.journal.snapshot(),
                    });
                }
                MergeOutcome::UpToDate => {
                    tracing::info!(branch = %branch, target = %target, "Already up to date");
                }
                MergeOutcome::FastForward | MergeOutcome::Merged => {
                    tracing::info!(branch = %branch, target = %target, outcome = ?outcome, "Merged");
                    ctx.journal.record(AppliedStep::Merged {
                        source: branch.clone(),
                        target: target.clone(),
                    });
                }
            }

            if let Some(tag) = tag.as_ref().filter(|_| *target == ctx.config.master) {
                let message = self
                    .options
                    .tag_message
                    .clone()
                    .unwrap_or_else(|| format!("Tagging version {tag}"));
                self.git
                    .tag(tag, target, &message)
                    .map_err(|e| FlowError::from_git("tag", e, &ctx.journal))?;
                tracing::info!(tag = %tag, target = %target, "Tagged");
                ctx.journal.record(AppliedStep::Tagged {
                    tag: tag.clone(),
                    target: target.clone(),
                });
            }
        }

        let mut remote_failure: Option<GitError> = None;
        if !self.options.keep_branch {
            // the branch cannot be deleted while checked out
            let current = self
                .git
                .current_branch()
                .map_err(|e| FlowError::from_git("checkout", e, &ctx.journal))?;
            if current.as_deref() == Some(branch.as_str()) {
                self.checkout(&ctx.config.develop, &mut ctx.journal)?;
            }
            self.git
                .delete_local_branch(&branch)
                .map_err(|e| FlowError::from_git("delete branch", e, &ctx.journal))?;
            tracing::info!(branch = %branch, "Deleted local branch");
            ctx.journal.record(AppliedStep::LocalBranchDeleted {
                branch: branch.clone(),
            });

            if let Some(link) = &tracking {
                remote_failure = self.delete_remote(link.remote.as_str(), link.remote_branch(), ctx);
            }
        }

        self.checkout(&ctx.config.develop, &mut ctx.journal)?;

        if let Some(source) = remote_failure {
            return Err(FlowError::TransportFailure {
                operation: "delete remote branch".to_string(),
                applied: ctx.journal.snapshot(),
                source,
            });
        }

        if self.options.push {
            let develop = &ctx.config.develop;
            self.push_refspec(
                format!("refs/heads/{develop}:refs/heads/{develop}"),
                &mut ctx.journal,
            )?;
            if policy.tag_on_finish {
                let master = &ctx.config.master;
                self.push_refspec(
                    format!("refs/heads/{master}:refs/heads/{master}"),
                    &mut ctx.journal,
                )?;
            }
            if let Some(tag) = &tag {
                self.push_refspec(format!("refs/tags/{tag}:refs/tags/{tag}"), &mut ctx.journal)?;
            }
        }

        Ok(())
    }

    /// Delete the published copy. Failure is handed back, not raised, so the
    /// command can still return to develop first.
    fn delete_remote(
        &self,
        remote: &str,
        remote_branch: &str,
        ctx: &mut Context<'_, 'a, G>,
    ) -> Option<GitError> {
        match self.git.remote_branch_exists(remote, remote_branch) {
            Ok(false) => {
                tracing::debug!(remote = %remote, branch = %remote_branch, "Remote branch already gone");
                return None;
            }
            Ok(true) => {}
            Err(e) => return Some(e),
        }
        match self.git.delete_remote_branch(remote, remote_branch) {
            Ok(()) => {
                tracing::info!(remote = %remote, branch = %remote_branch, "Deleted remote branch");
                ctx.journal.record(AppliedStep::RemoteBranchDeleted {
                    remote: remote.to_string(),
                    branch: remote_branch.to_string(),
                });
                None
            }
            Err(e) => {
                tracing::warn!(
                    remote = %remote,
                    branch = %remote_branch,
                    error = %e,
                    "Failed to delete remote branch; local finish is complete"
                );
                Some(e)
            }
        }
    }
}
