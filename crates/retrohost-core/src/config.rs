//! Host directory configuration.

use crate::{HostError, Result};
use std::path::PathBuf;

/// Directories exposed to the core.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// BIOS and system files (GET_SYSTEM_DIRECTORY).
    pub system_directory: PathBuf,
    /// SRAM and save states (GET_SAVE_DIRECTORY).
    pub save_directory: PathBuf,
    /// Core assets (GET_CORE_ASSETS_DIRECTORY). Unhandled when unset.
    pub content_directory: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            system_directory: PathBuf::from("system"),
            save_directory: PathBuf::from("saves"),
            content_directory: None,
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.system_directory.as_os_str().is_empty() {
            return Err(HostError::InvalidConfig(
                "system_directory must not be empty".to_string(),
            ));
        }
        if self.save_directory.as_os_str().is_empty() {
            return Err(HostError::InvalidConfig(
                "save_directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
