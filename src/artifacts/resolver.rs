use super::error::ArtifactError;
use super::walk::DirectoryWalk;
use crate::config::Settings;
use crate::shared::ids::WorkflowId;
use crate::shared::logging::EventLog;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Finds the directory holding a workflow's artifacts anywhere under the root.
///
/// A `{prefix}{id}` directory wins as soon as the walk sees it. A bare `{id}`
/// directory is remembered as a legacy fallback and returned only when no
/// prefixed directory turns up before the walk ends.
#[derive(Debug, Clone)]
pub struct WorkflowDirResolver {
    root: PathBuf,
    prefix: String,
    max_visited: usize,
    log: EventLog,
}

impl WorkflowDirResolver {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>, max_visited: usize) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            max_visited,
            log: EventLog::disabled(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.workflows_root.clone(),
            settings.directory_prefix.clone(),
            settings.scan.resolver_max_visited,
        )
        .with_log(settings.event_log())
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn prefixed_name(&self, workflow_id: &WorkflowId) -> String {
        format!("{}{}", self.prefix, workflow_id)
    }

    pub fn resolve(&self, workflow_id: &WorkflowId) -> Result<PathBuf, ArtifactError> {
        let prefixed = self.prefixed_name(workflow_id);
        let legacy = workflow_id.as_str();
        let mut legacy_match: Option<PathBuf> = None;

        let mut walk = DirectoryWalk::new(&self.root, self.max_visited);
        for dir in walk.by_ref() {
            for entry in dir.subdirs {
                if entry.name == prefixed {
                    if let Some(legacy_path) = &legacy_match {
                        self.log.warn(
                            "workflow_dir_ambiguous",
                            &[
                                ("workflowId", Value::from(legacy)),
                                ("selected", Value::from(entry.path.display().to_string())),
                                ("ignored", Value::from(legacy_path.display().to_string())),
                            ],
                        );
                    }
                    return Ok(entry.path);
                }
                if legacy_match.is_none() && !self.prefix.is_empty() && entry.name == legacy {
                    legacy_match = Some(entry.path);
                }
            }
        }

        if walk.limit_reached() {
            self.log.warn(
                "workflow_dir_scan_limit",
                &[
                    ("workflowId", Value::from(legacy)),
                    ("maxVisited", Value::from(self.max_visited)),
                ],
            );
        }

        legacy_match.ok_or_else(|| ArtifactError::WorkflowDirNotFound {
            workflow_id: legacy.to_string(),
        })
    }
}
