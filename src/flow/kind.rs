use serde::{Deserialize, Serialize};
use std::fmt;

use crate::flow::configuration::FlowConfiguration;
use crate::git::MergeMode;

/// The four branch families git-flow knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    Feature,
    Release,
    Hotfix,
    Support,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Start,
    Publish,
    Finish,
}

/// One of the two long-lived branches, resolved to a name through the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationBranch {
    Master,
    Develop,
}

/// Per-kind rules the generic workflow command switches on.
#[derive(Debug)]
pub struct KindPolicy {
    pub start_point: IntegrationBranch,
    /// Finish merges into these, in order
    pub merge_targets: &'static [IntegrationBranch],
    /// Tag the master merge with `version_tag_prefix ++ name`
    pub tag_on_finish: bool,
    /// Only one branch of this kind may be in progress at a time
    pub exclusive: bool,
    pub merge_mode: MergeMode,
    pub phases: &'static [Phase],
}

const FEATURE: KindPolicy = KindPolicy {
    start_point: IntegrationBranch::Develop,
    merge_targets: &[IntegrationBranch::Develop],
    tag_on_finish: false,
    exclusive: false,
    merge_mode: MergeMode::FastForwardAllowed,
    phases: &[Phase::Start, Phase::Publish, Phase::Finish],
};

const RELEASE: KindPolicy = KindPolicy {
    start_point: IntegrationBranch::Master,
    merge_targets: &[IntegrationBranch::Master, IntegrationBranch::Develop],
    tag_on_finish: true,
    exclusive: true,
    merge_mode: MergeMode::NoFastForward,
    phases: &[Phase::Start, Phase::Publish, Phase::Finish],
};

const HOTFIX: KindPolicy = KindPolicy {
    start_point: IntegrationBranch::Master,
    merge_targets: &[IntegrationBranch::Master, IntegrationBranch::Develop],
    tag_on_finish: true,
    exclusive: true,
    merge_mode: MergeMode::NoFastForward,
    phases: &[Phase::Start, Phase::Publish, Phase::Finish],
};

const SUPPORT: KindPolicy = KindPolicy {
    start_point: IntegrationBranch::Master,
    merge_targets: &[],
    tag_on_finish: false,
    exclusive: false,
    merge_mode: MergeMode::NoFastForward,
    phases: &[Phase::Start],
};

impl WorkflowKind {
    pub const ALL: [WorkflowKind; 4] = [
        WorkflowKind::Feature,
        WorkflowKind::Release,
        WorkflowKind::Hotfix,
        WorkflowKind::Support,
    ];

    pub fn policy(self) -> &'static KindPolicy {
        match self {
            WorkflowKind::Feature => &FEATURE,
            WorkflowKind::Release => &RELEASE,
            WorkflowKind::Hotfix => &HOTFIX,
            WorkflowKind::Support => &SUPPORT,
        }
    }

    /// Key suffix under `gitflow.prefix.`
    pub fn config_key(self) -> &'static str {
        match self {
            WorkflowKind::Feature => "feature",
            WorkflowKind::Release => "release",
            WorkflowKind::Hotfix => "hotfix",
            WorkflowKind::Support => "support",
        }
    }

    pub fn default_prefix(self) -> &'static str {
        match self {
            WorkflowKind::Feature => "feature/",
            WorkflowKind::Release => "release/",
            WorkflowKind::Hotfix => "hotfix/",
            WorkflowKind::Support => "support/",
        }
    }

    pub fn supports(self, phase: Phase) -> bool {
        self.policy().phases.contains(&phase)
    }

    /// Audit name for a kind/phase pair, e.g. `release-finish`
    pub fn command_name(self, phase: Phase) -> String {
        format!("{self}-{phase}")
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Start => "start",
            Phase::Publish => "publish",
            Phase::Finish => "finish",
        })
    }
}

impl IntegrationBranch {
    pub fn resolve(self, config: &FlowConfiguration) -> &str {
        match self {
            IntegrationBranch::Master => &config.master,
            IntegrationBranch::Develop => &config.develop,
        }
    }
}
