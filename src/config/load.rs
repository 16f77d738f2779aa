use super::{resolve_config_path, ConfigError, Settings};
use std::path::Path;

/// Loads settings from the config file (when present) and the process
/// environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_with(|key| std::env::var(key).ok())
}

pub fn load_settings_with<F>(lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = resolve_config_path(&lookup)?;
    load_settings_from(&path, lookup)
}

/// A missing file yields the defaults; an unreadable or malformed one is an
/// error.
pub fn load_settings_from<F>(path: &Path, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = if path.exists() {
        Settings::from_path(path)?
    } else {
        Settings::default()
    };
    settings.apply_env_overrides(lookup);
    settings.validate()?;
    Ok(settings)
}
