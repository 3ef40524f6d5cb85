use super::{Context, WorkflowCommand};
use crate::flow::error::{AppliedStep, FlowError};
use crate::git::GitOperations;

impl<'a, G: GitOperations + ?Sized> WorkflowCommand<'a, G> {
    /// Create `prefix ++ name` at the kind's start point and check it out.
    pub(super) fn start(&self, ctx: &mut Context<'_, 'a, G>) -> Result<(), FlowError> {
        let policy = self.kind.policy();
        let branch = ctx.branch.as_str().to_string();

        ctx.gates
            .require_clean_working_tree(self.options.allow_untracked)?;
        ctx.gates.require_local_branch_absent(&branch)?;
        if policy.exclusive {
            ctx.gates
                .require_no_branch_with_prefix(self.kind, ctx.config.prefix(self.kind))?;
        }
        if policy.tag_on_finish {
            ctx.gates
                .require_tag_absent(&ctx.config.version_tag(ctx.branch.short_name()))?;
        }

        let base = policy.start_point.resolve(ctx.config);
        if self.options.fetch {
            self.fetch_remote(&ctx.journal)?;
            ctx.gates
                .require_not_behind(base, &ctx.gates.upstream_of(base))?;
        }

        let start_point = self
            .options
            .start_commit
            .clone()
            .unwrap_or_else(|| base.to_string());
        ctx.gates.require_start_point(&start_point)?;

        self.git
            .create_branch(&branch, &start_point)
            .map_err(|e| FlowError::from_git("create branch", e, &ctx.journal))?;
        tracing::info!(branch = %branch, start_point = %start_point, "Created branch");
        ctx.journal.record(AppliedStep::BranchCreated {
            branch: branch.clone(),
            start_point,
        });

        self.checkout(&branch, &mut ctx.journal)
    }
}
