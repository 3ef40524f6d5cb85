//! Audit trail of workflow commands.
//!
//! Reporters observe; they never influence control flow. A reporter that
//! cannot do its job logs the problem and carries on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandOutcome {
    Attempted,
    Succeeded,
    Failed { error: String },
}

/// One entry of the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub command: String,
    pub branch: String,
    pub outcome: CommandOutcome,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: String,
}

impl CommandRecord {
    pub fn new(command: &str, branch: &str, outcome: CommandOutcome, correlation_id: &str) -> Self {
        Self {
            command: command.to_string(),
            branch: branch.to_string(),
            outcome,
            timestamp: Utc::now(),
            correlation_id: correlation_id.to_string(),
        }
    }
}

#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait Reporter: Send + Sync {
    fn record(&self, record: &CommandRecord);
}

/// Emits each record as a structured tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn record(&self, record: &CommandRecord) {
        match &record.outcome {
            CommandOutcome::Attempted => tracing::debug!(
                command = %record.command,
                branch = %record.branch,
                correlation_id = %record.correlation_id,
                "Command attempted"
            ),
            CommandOutcome::Succeeded => tracing::info!(
                command = %record.command,
                branch = %record.branch,
                correlation_id = %record.correlation_id,
                "Command succeeded"
            ),
            CommandOutcome::Failed { error } => tracing::warn!(
                command = %record.command,
                branch = %record.branch,
                correlation_id = %record.correlation_id,
                error = %error,
                "Command failed"
            ),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn record(&self, _record: &CommandRecord) {}
}

/// Keeps records in memory for later inspection
#[derive(Debug, Default)]
pub struct MemoryReporter {
    records: Mutex<Vec<CommandRecord>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CommandRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn outcomes_for(&self, command: &str) -> Vec<CommandOutcome> {
        self.records()
            .into_iter()
            .filter(|r| r.command == command)
            .map(|r| r.outcome)
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn record(&self, record: &CommandRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(e) => tracing::warn!("Audit record dropped, reporter lock poisoned: {}", e),
        }
    }
}

/// Appends records to a JSONL file (one JSON object per line)
#[derive(Debug, Clone)]
pub struct FileReporter {
    path: PathBuf,
}

impl FileReporter {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_jsonl_entry(&self, record: &CommandRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let entry_json = serde_json::to_string(record)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // one write per line keeps concurrent appenders from interleaving
        file.write_all(format!("{entry_json}\n").as_bytes())
    }

    /// Read back every parseable record; a missing file is an empty trail
    pub fn load_records(&self) -> Vec<CommandRecord> {
        match fs::read_to_string(&self.path) {
            Ok(content) => content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .filter_map(|line| match serde_json::from_str::<CommandRecord>(line) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!("Failed to parse audit line: {}", e);
                        None
                    }
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Reporter for FileReporter {
    fn record(&self, record: &CommandRecord) {
        if let Err(e) = self.store_jsonl_entry(record) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to append audit record"
            );
        }
    }
}
