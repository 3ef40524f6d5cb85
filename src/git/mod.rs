//! Git operations module
//!
//! This module provides the narrow capability interface the flow engine
//! consumes, backed by libgit2 bindings. The engine never touches `git2`
//! directly; everything goes through [`GitOperations`].

pub mod error;
pub mod operations;

#[cfg(test)]
pub mod mocks;

pub use error::GitError;
pub use operations::{
    Git2Operations, GitOperations, MergeMode, MergeOutcome, RemoteTrackingLink, WorkingTreeStatus,
};
