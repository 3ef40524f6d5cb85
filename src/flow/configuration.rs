use std::collections::BTreeMap;

use crate::flow::error::{AppliedStep, FlowError, Journal};
use crate::flow::kind::WorkflowKind;
use crate::git::GitOperations;

pub const MASTER_KEY: &str = "gitflow.master";
pub const DEVELOP_KEY: &str = "gitflow.develop";
pub const VERSION_TAG_KEY: &str = "gitflow.prefix.versiontag";
pub const INITIALIZED_KEY: &str = "gitflow.initialized";

pub fn prefix_key(kind: WorkflowKind) -> String {
    format!("gitflow.prefix.{}", kind.config_key())
}

/// Repository-scoped git-flow settings, persisted in git config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfiguration {
    pub master: String,
    pub develop: String,
    pub prefixes: BTreeMap<WorkflowKind, String>,
    pub version_tag_prefix: String,
    pub initialized: bool,
}

impl Default for FlowConfiguration {
    fn default() -> Self {
        Self {
            master: "master".to_string(),
            develop: "develop".to_string(),
            prefixes: WorkflowKind::ALL
                .iter()
                .map(|kind| (*kind, kind.default_prefix().to_string()))
                .collect(),
            version_tag_prefix: String::new(),
            initialized: false,
        }
    }
}

impl FlowConfiguration {
    /// Read the stored configuration. Missing keys fall back to defaults.
    pub fn load<G: GitOperations + ?Sized>(git: &G) -> Result<Self, FlowError> {
        let read = |key: &str| {
            git.get_config(key)
                .map_err(|e| FlowError::from_git("read config", e, &Journal::new()))
        };

        let defaults = Self::default();
        let mut prefixes = BTreeMap::new();
        for kind in WorkflowKind::ALL {
            let value = read(&prefix_key(kind))?.unwrap_or_else(|| kind.default_prefix().to_string());
            prefixes.insert(kind, value);
        }

        Ok(Self {
            master: read(MASTER_KEY)?.unwrap_or(defaults.master),
            develop: read(DEVELOP_KEY)?.unwrap_or(defaults.develop),
            prefixes,
            version_tag_prefix: read(VERSION_TAG_KEY)?.unwrap_or_default(),
            initialized: read(INITIALIZED_KEY)?
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    /// Write every key. The initialized flag goes last so an interrupted
    /// save never leaves a half-written configuration marked as usable.
    pub fn save<G: GitOperations + ?Sized>(
        &self,
        git: &G,
        journal: &mut Journal,
    ) -> Result<(), FlowError> {
        for (key, value) in self.entries() {
            git.set_config(&key, &value)
                .map_err(|e| FlowError::from_git("write config", e, journal))?;
            journal.record(AppliedStep::ConfigWritten { key });
        }
        Ok(())
    }

    /// Key/value pairs in the order they are persisted
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![
            (MASTER_KEY.to_string(), self.master.clone()),
            (DEVELOP_KEY.to_string(), self.develop.clone()),
        ];
        for kind in WorkflowKind::ALL {
            entries.push((prefix_key(kind), self.prefix(kind).to_string()));
        }
        entries.push((VERSION_TAG_KEY.to_string(), self.version_tag_prefix.clone()));
        entries.push((INITIALIZED_KEY.to_string(), self.initialized.to_string()));
        entries
    }

    pub fn prefix(&self, kind: WorkflowKind) -> &str {
        self.prefixes
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_prefix())
    }

    pub fn version_tag(&self, short_name: &str) -> String {
        format!("{}{}", self.version_tag_prefix, short_name)
    }

    /// Initialized flag set and the master/develop invariant intact
    pub fn is_initialized(&self) -> bool {
        self.initialized && self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        if self.master.trim().is_empty() {
            return Err(FlowError::InvalidBranchName {
                name: self.master.clone(),
                reason: "master branch name must not be empty".to_string(),
            });
        }
        if self.develop.trim().is_empty() {
            return Err(FlowError::InvalidBranchName {
                name: self.develop.clone(),
                reason: "develop branch name must not be empty".to_string(),
            });
        }
        if self.master == self.develop {
            return Err(FlowError::SameBranch {
                branch: self.master.clone(),
            });
        }
        // exclusive kinds are detected by prefix alone
        for kind in WorkflowKind::ALL.into_iter().filter(|k| k.policy().exclusive) {
            if self.prefix(kind).is_empty() {
                return Err(FlowError::InvalidBranchName {
                    name: String::new(),
                    reason: format!("{kind} prefix must not be empty"),
                });
            }
        }
        Ok(())
    }
}
