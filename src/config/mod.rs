pub mod error;
pub mod load;
pub mod paths;
pub mod settings;

pub use error::ConfigError;
pub use load::{load_settings, load_settings_from, load_settings_with};
pub use paths::{
    default_global_config_path, resolve_config_path, CONFIG_PATH_ENV, DEFAULT_DIRECTORY_PREFIX,
    DEFAULT_WORKFLOWS_ROOT, DIRECTORY_PREFIX_ENV, FALLBACK_ROOT_ENV, GLOBAL_SETTINGS_FILE_NAME,
    GLOBAL_STATE_DIR, LOG_PATH_ENV, PRIMARY_ROOT_ENV,
};
pub use settings::{
    ResourceSettings, ScanLimits, Settings, DEFAULT_CATALOG_MAX_VISITED,
    DEFAULT_RESOLVER_MAX_VISITED, DEFAULT_RESOURCE_PAGE_SIZE,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let settings = Settings::from_yaml_str(
            r#"
workflows_root: /srv/workflows
scan:
  resolver_max_visited: 50
"#,
        )
        .expect("parse settings");

        assert_eq!(settings.workflows_root, PathBuf::from("/srv/workflows"));
        assert_eq!(settings.directory_prefix, DEFAULT_DIRECTORY_PREFIX);
        assert_eq!(settings.scan.resolver_max_visited, 50);
        assert_eq!(settings.scan.catalog_max_visited, DEFAULT_CATALOG_MAX_VISITED);
        assert_eq!(settings.resources.page_size, DEFAULT_RESOURCE_PAGE_SIZE);
        assert!(settings.log_path.is_none());
    }

    #[test]
    fn primary_root_env_wins_over_fallback() {
        let mut settings = Settings::default();
        settings.apply_env_overrides(env_from(&[
            (FALLBACK_ROOT_ENV, "/fallback"),
            (PRIMARY_ROOT_ENV, "/primary"),
            (DIRECTORY_PREFIX_ENV, "wf-"),
        ]));
        assert_eq!(settings.workflows_root, PathBuf::from("/primary"));
        assert_eq!(settings.directory_prefix, "wf-");

        let mut settings = Settings::default();
        settings.apply_env_overrides(env_from(&[
            (PRIMARY_ROOT_ENV, "  "),
            (FALLBACK_ROOT_ENV, "/fallback"),
        ]));
        assert_eq!(settings.workflows_root, PathBuf::from("/fallback"));
    }

    #[test]
    fn validation_rejects_prefix_with_path_separators() {
        let settings = Settings {
            directory_prefix: "../".to_string(),
            ..Settings::default()
        };
        let err = settings.validate().expect_err("validation should fail");
        match err {
            ConfigError::Settings(message) => assert!(message.contains("directory_prefix")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn validation_rejects_zero_page_size() {
        let mut settings = Settings::default();
        settings.resources.page_size = 0;
        let err = settings.validate().expect_err("validation should fail");
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn load_uses_defaults_when_file_is_missing() {
        let temp = tempdir().expect("temp dir");
        let root = temp.path().join("workflows");
        let root_text = root.display().to_string();
        let settings = load_settings_from(
            &temp.path().join("missing.yaml"),
            env_from(&[(PRIMARY_ROOT_ENV, root_text.as_str())]),
        )
        .expect("load settings");
        assert_eq!(settings.workflows_root, root);
        assert!(!settings.root_is_available());
    }

    #[test]
    fn load_reports_malformed_yaml_with_path() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("config.yaml");
        fs::write(&path, "workflows_root: [unterminated").expect("write config");
        let err = load_settings_from(&path, env_from(&[])).expect_err("parse should fail");
        match err {
            ConfigError::Parse { path: reported, .. } => {
                assert!(reported.ends_with("config.yaml"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn explicit_config_path_env_is_respected() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("custom.yaml");
        fs::write(&path, "directory_prefix: legacy-\n").expect("write config");
        let path_text = path.display().to_string();
        let settings = load_settings_with(env_from(&[(CONFIG_PATH_ENV, path_text.as_str())]))
            .expect("load settings");
        assert_eq!(settings.directory_prefix, "legacy-");
    }

    #[test]
    fn settings_round_trip_through_yaml() {
        let settings = Settings {
            log_path: Some(PathBuf::from("/tmp/events.log")),
            ..Settings::with_root("/data/workflows")
        };
        let yaml = settings.to_yaml().expect("encode");
        let parsed = Settings::from_yaml_str(&yaml).expect("decode");
        assert_eq!(parsed, settings);
    }
}
