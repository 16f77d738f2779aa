use super::paths::{
    DEFAULT_DIRECTORY_PREFIX, DEFAULT_WORKFLOWS_ROOT, DIRECTORY_PREFIX_ENV, FALLBACK_ROOT_ENV,
    LOG_PATH_ENV, PRIMARY_ROOT_ENV,
};
use super::ConfigError;
use crate::shared::logging::EventLog;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_RESOLVER_MAX_VISITED: usize = 10_000;
pub const DEFAULT_CATALOG_MAX_VISITED: usize = 20_000;
pub const DEFAULT_RESOURCE_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_workflows_root")]
    pub workflows_root: PathBuf,
    #[serde(default = "default_directory_prefix")]
    pub directory_prefix: String,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    #[serde(default)]
    pub scan: ScanLimits,
    #[serde(default)]
    pub resources: ResourceSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScanLimits {
    #[serde(default = "default_resolver_max_visited")]
    pub resolver_max_visited: usize,
    #[serde(default = "default_catalog_max_visited")]
    pub catalog_max_visited: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceSettings {
    #[serde(default = "default_resource_page_size")]
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workflows_root: default_workflows_root(),
            directory_prefix: default_directory_prefix(),
            log_path: None,
            scan: ScanLimits::default(),
            resources: ResourceSettings::default(),
        }
    }
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            resolver_max_visited: default_resolver_max_visited(),
            catalog_max_visited: default_catalog_max_visited(),
        }
    }
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            page_size: default_resource_page_size(),
        }
    }
}

fn default_workflows_root() -> PathBuf {
    PathBuf::from(DEFAULT_WORKFLOWS_ROOT)
}

fn default_directory_prefix() -> String {
    DEFAULT_DIRECTORY_PREFIX.to_string()
}

fn default_resolver_max_visited() -> usize {
    DEFAULT_RESOLVER_MAX_VISITED
}

fn default_catalog_max_visited() -> usize {
    DEFAULT_CATALOG_MAX_VISITED
}

fn default_resource_page_size() -> usize {
    DEFAULT_RESOURCE_PAGE_SIZE
}

impl Settings {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            workflows_root: root.into(),
            ..Self::default()
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::Encode)
    }

    /// `N8N_WORKFLOWS_ROOT` is consulted before `WORKFLOWS_ROOT`; blank values
    /// are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(root) = non_blank(PRIMARY_ROOT_ENV).or_else(|| non_blank(FALLBACK_ROOT_ENV)) {
            self.workflows_root = PathBuf::from(root);
        }
        if let Some(prefix) = lookup(DIRECTORY_PREFIX_ENV) {
            self.directory_prefix = prefix.trim().to_string();
        }
        if let Some(log_path) = non_blank(LOG_PATH_ENV) {
            self.log_path = Some(PathBuf::from(log_path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workflows_root.as_os_str().is_empty() {
            return Err(ConfigError::Settings(
                "`workflows_root` must be non-empty".to_string(),
            ));
        }
        if !self
            .directory_prefix
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Err(ConfigError::Settings(format!(
                "`directory_prefix` `{}` must use only ASCII letters, digits, '-' or '_'",
                self.directory_prefix
            )));
        }
        if self.scan.resolver_max_visited == 0 {
            return Err(ConfigError::Settings(
                "`scan.resolver_max_visited` must be greater than 0".to_string(),
            ));
        }
        if self.scan.catalog_max_visited == 0 {
            return Err(ConfigError::Settings(
                "`scan.catalog_max_visited` must be greater than 0".to_string(),
            ));
        }
        if self.resources.page_size == 0 {
            return Err(ConfigError::Settings(
                "`resources.page_size` must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The store is usable only once the workflow engine's tree is mounted.
    pub fn root_is_available(&self) -> bool {
        self.workflows_root.is_dir()
    }

    pub fn event_log(&self) -> EventLog {
        EventLog::new(self.log_path.clone())
    }
}
