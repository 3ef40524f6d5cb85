use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::flow::configuration::FlowConfiguration;
use crate::flow::error::FlowError;
use crate::flow::kind::WorkflowKind;

/// Rules a short name must satisfy before it is glued onto a prefix
static SHORT_NAME_RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();

fn short_name_rules() -> &'static Vec<(Regex, &'static str)> {
    SHORT_NAME_RULES.get_or_init(|| {
        let rules = [
            (r"\s", "contains whitespace"),
            (r"[\x00-\x1f\x7f]", "contains control characters"),
            (r"\.\.", "contains '..'"),
            (r"//", "contains an empty path component"),
            (r"@\{", "contains '@{'"),
            (r"[~^:?*\[\\]", "contains a character git does not allow in refs"),
            (r"^[-/.]", "starts with '-', '/' or '.'"),
            (r"(/|\.|\.lock)$", "ends with '/', '.' or '.lock'"),
        ];
        rules
            .iter()
            .filter_map(|(pattern, reason)| Regex::new(pattern).ok().map(|re| (re, *reason)))
            .collect()
    })
}

pub fn validate_short_name(short_name: &str) -> Result<(), FlowError> {
    if short_name.is_empty() {
        return Err(FlowError::InvalidBranchName {
            name: short_name.to_string(),
            reason: "name must not be empty".to_string(),
        });
    }
    for (rule, reason) in short_name_rules() {
        if rule.is_match(short_name) {
            return Err(FlowError::InvalidBranchName {
                name: short_name.to_string(),
                reason: reason.to_string(),
            });
        }
    }
    Ok(())
}

/// A workflow branch name, `prefix ++ short_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchName {
    prefix: String,
    short_name: String,
    full: String,
}

impl BranchName {
    pub fn new(prefix: &str, short_name: &str) -> Result<Self, FlowError> {
        validate_short_name(short_name)?;
        Ok(Self {
            prefix: prefix.to_string(),
            short_name: short_name.to_string(),
            full: format!("{prefix}{short_name}"),
        })
    }

    pub fn for_kind(
        config: &FlowConfiguration,
        kind: WorkflowKind,
        short_name: &str,
    ) -> Result<Self, FlowError> {
        Self::new(config.prefix(kind), short_name)
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `refs/heads/<name>`
    pub fn local_ref(&self) -> String {
        format!("refs/heads/{}", self.full)
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

impl PartialEq<&str> for BranchName {
    fn eq(&self, other: &&str) -> bool {
        self.full == *other
    }
}
