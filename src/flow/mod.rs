//! The git-flow branch-workflow engine.

pub mod branch;
pub mod command;
pub mod configuration;
pub mod error;
pub mod init;
pub mod kind;
pub mod preconditions;
pub mod reporter;
pub mod session;

pub use branch::BranchName;
pub use command::{CommandOptions, WorkflowCommand};
pub use configuration::FlowConfiguration;
pub use error::{AppliedStep, FlowError, Journal};
pub use init::{InitCommand, InitContext};
pub use kind::{IntegrationBranch, KindPolicy, Phase, WorkflowKind};
pub use preconditions::Preconditions;
pub use reporter::{
    CommandOutcome, CommandRecord, FileReporter, MemoryReporter, NoopReporter, Reporter,
    TracingReporter,
};
pub use session::FlowSession;

#[cfg(any(test, feature = "testing"))]
pub use reporter::MockReporter;
