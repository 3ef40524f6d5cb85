use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::flow::{InitContext, WorkflowKind};

/// Tool settings for branchflow. Repository-scoped git-flow settings live in git config instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BranchflowConfig {
    pub remote: RemoteConfig,
    /// Values `branchflow init` uses when no flag overrides them
    pub init: InitDefaults,
    pub observability: ObservabilityConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Remote that publish, fetch and finish talk to
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct InitDefaults {
    pub master: String,
    pub develop: String,
    pub feature_prefix: String,
    pub release_prefix: String,
    pub hotfix_prefix: String,
    pub support_prefix: String,
    pub version_tag_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines instead of the compact format
    pub json: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Append a JSON line per command to this file; unset logs through tracing only
    pub log_path: Option<PathBuf>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            name: "origin".to_string(),
        }
    }
}

impl Default for InitDefaults {
    fn default() -> Self {
        Self {
            master: "master".to_string(),
            develop: "develop".to_string(),
            feature_prefix: WorkflowKind::Feature.default_prefix().to_string(),
            release_prefix: WorkflowKind::Release.default_prefix().to_string(),
            hotfix_prefix: WorkflowKind::Hotfix.default_prefix().to_string(),
            support_prefix: WorkflowKind::Support.default_prefix().to_string(),
            version_tag_prefix: String::new(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl InitDefaults {
    pub fn to_init_context(&self) -> InitContext {
        InitContext::new()
            .master(&self.master)
            .develop(&self.develop)
            .prefix(WorkflowKind::Feature, &self.feature_prefix)
            .prefix(WorkflowKind::Release, &self.release_prefix)
            .prefix(WorkflowKind::Hotfix, &self.hotfix_prefix)
            .prefix(WorkflowKind::Support, &self.support_prefix)
            .version_tag_prefix(&self.version_tag_prefix)
    }
}

impl BranchflowConfig {
    /// Load configuration from the current directory
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files in `dir` (branchflow.toml, .branchflow-rc)
    /// 3. Environment variables (BRANCHFLOW__REMOTE__NAME style)
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        let toml_file = dir.join("branchflow.toml");
        if toml_file.exists() {
            builder = builder.add_source(File::from(toml_file).format(FileFormat::Toml));
        }

        let rc_file = dir.join(".branchflow-rc");
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("BRANCHFLOW")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::debug!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<BranchflowConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = BranchflowConfig::load_env_file();
        BranchflowConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static BranchflowConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::debug!("Configuration loaded successfully");
    Ok(())
}
