use crate::config::ConfigError;
use std::path::PathBuf;

pub const GLOBAL_STATE_DIR: &str = ".workflow-files";
pub const GLOBAL_SETTINGS_FILE_NAME: &str = "config.yaml";

pub const CONFIG_PATH_ENV: &str = "WORKFLOW_FILES_CONFIG";
pub const PRIMARY_ROOT_ENV: &str = "N8N_WORKFLOWS_ROOT";
pub const FALLBACK_ROOT_ENV: &str = "WORKFLOWS_ROOT";
pub const DIRECTORY_PREFIX_ENV: &str = "WORKFLOW_DIR_PREFIX";
pub const LOG_PATH_ENV: &str = "WORKFLOW_FILES_LOG";

pub const DEFAULT_WORKFLOWS_ROOT: &str = "/workflows";
pub const DEFAULT_DIRECTORY_PREFIX: &str = "workflow_";

pub fn default_global_config_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME").ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(PathBuf::from(home)
        .join(GLOBAL_STATE_DIR)
        .join(GLOBAL_SETTINGS_FILE_NAME))
}

/// Explicit `WORKFLOW_FILES_CONFIG` wins over the home-directory default.
pub fn resolve_config_path<F>(lookup: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(CONFIG_PATH_ENV).filter(|value| !value.trim().is_empty()) {
        Some(explicit) => Ok(PathBuf::from(explicit)),
        None => default_global_config_path(),
    }
}
