use thiserror::Error;

/// Failures raised at the repository adapter boundary.
///
/// The variants separate network problems from local config writes so the
/// flow engine can map them onto its transport and local-storage kinds.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Repository not found or not a git repository: {path}")]
    RepositoryNotFound { path: String, message: String },
    #[error("Branch not found: {branch}")]
    BranchNotFound { branch: String },
    #[error("Revision not found: {rev}")]
    RevisionNotFound { rev: String },
    #[error("Remote not found: {remote}")]
    RemoteNotFound { remote: String },
    #[error("{operation} against remote '{remote}' failed: {message}")]
    Transport {
        operation: String,
        remote: String,
        message: String,
    },
    #[error("Failed to access config key '{key}': {message}")]
    Config { key: String, message: String },
    #[error("Git {operation} failed: {message}")]
    CommandFailed { operation: String, message: String },
}

impl GitError {
    pub fn command(operation: &str, err: git2::Error) -> Self {
        GitError::CommandFailed {
            operation: operation.to_string(),
            message: err.message().to_string(),
        }
    }

    /// Classify a libgit2 failure raised while talking to a remote.
    pub fn transport(operation: &str, remote: &str, err: git2::Error) -> Self {
        // a remote missing from config, as opposed to a ref missing on the server
        if err.code() == git2::ErrorCode::NotFound && err.class() == git2::ErrorClass::Config {
            return GitError::RemoteNotFound {
                remote: remote.to_string(),
            };
        }
        GitError::Transport {
            operation: operation.to_string(),
            remote: remote.to_string(),
            message: err.message().to_string(),
        }
    }

    pub fn config(key: &str, err: git2::Error) -> Self {
        GitError::Config {
            key: key.to_string(),
            message: err.message().to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GitError::Transport { .. } | GitError::RemoteNotFound { .. }
        )
    }

    pub fn is_config(&self) -> bool {
        matches!(self, GitError::Config { .. })
    }
}
