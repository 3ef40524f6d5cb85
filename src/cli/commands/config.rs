use anyhow::Result;
use std::path::Path;

use branchflow::BranchflowConfig;

use super::open_session;

/// Prints the stored git-flow configuration as dotted TOML keys
pub struct ConfigCommand;

impl ConfigCommand {
    pub fn execute(&self, directory: &Path, settings: &BranchflowConfig) -> Result<()> {
        let session = open_session(directory, settings)?;
        let config = session.configuration()?;
        for (key, value) in config.entries() {
            println!("{key} = {}", toml::Value::String(value));
        }
        if !config.is_initialized() {
            eprintln!("⚠️  git-flow is not initialized here; run 'branchflow init'");
        }
        Ok(())
    }
}
