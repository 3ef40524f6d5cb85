use super::{Context, WorkflowCommand};
use crate::flow::error::{AppliedStep, FlowError};
use crate::git::GitOperations;

impl<'a, G: GitOperations + ?Sized> WorkflowCommand<'a, G> {
    /// Push the branch under the same name and make it track the remote copy.
    ///
    /// Never overwrites a branch that already exists remotely. A push that
    /// went through is not undone when a later step fails; the branch is
    /// then left pushed but untracked.
    pub(super) fn publish(&self, ctx: &mut Context<'_, 'a, G>) -> Result<(), FlowError> {
        let branch = ctx.branch.as_str().to_string();

        ctx.gates
            .require_clean_working_tree(self.options.allow_untracked)?;
        ctx.gates.require_local_branch_exists(&branch)?;
        self.fetch_remote(&ctx.journal)?;
        ctx.gates.require_remote_branch_absent(&branch)?;

        let local_ref = ctx.branch.local_ref();
        self.push_refspec(format!("{local_ref}:{local_ref}"), &mut ctx.journal)?;
        self.fetch_remote(&ctx.journal)?;

        self.git
            .set_tracking(&branch, self.remote, &local_ref)
            .map_err(|e| FlowError::from_git("set upstream", e, &ctx.journal))?;
        ctx.journal.record(AppliedStep::TrackingConfigured {
            branch: branch.clone(),
            remote: self.remote.to_string(),
        });

        self.checkout(&branch, &mut ctx.journal)
    }
}
