// Branchflow Library - git-flow branch workflows over git2
// This exposes the engine, the git adapter and the ambient setup for the binary and tests

pub mod config;
pub mod flow;
pub mod git;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{config, init_config, BranchflowConfig};
pub use flow::{
    AppliedStep, BranchName, CommandOptions, FlowConfiguration, FlowError, FlowSession,
    InitContext, Phase, Reporter, WorkflowCommand, WorkflowKind,
};
pub use git::{Git2Operations, GitError, GitOperations};
pub use telemetry::{create_command_span, generate_correlation_id, init_telemetry};
