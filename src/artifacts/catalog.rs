use super::descriptor::read_stamped;
use super::locator::{classify_file_name, ArtifactKind, CodeLanguage, Locator, LOCATOR_SCHEME};
use super::walk::DirectoryWalk;
use crate::config::Settings;
use crate::shared::ids::{NodeId, WorkflowId};
use crate::shared::logging::EventLog;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta {
    pub workflow_id: WorkflowId,
    pub node_id: NodeId,
    pub kind: ArtifactKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<CodeLanguage>,
    pub etag: String,
    pub size: u64,
    pub last_modified: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub name: String,
    pub title: String,
    pub uri: String,
    pub description: String,
    pub mime_type: String,
    #[serde(rename = "_meta")]
    pub meta: ResourceMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePage {
    pub resources: Vec<ResourceDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    pub name: String,
    pub title: String,
    pub uri_template: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

pub fn resource_templates() -> Vec<ResourceTemplate> {
    vec![
        ResourceTemplate {
            name: "workflow-code-python".to_string(),
            title: "Workflow code file (Python)".to_string(),
            uri_template: format!("{LOCATOR_SCHEME}:///code/{{workflowId}}/{{nodeId}}.py"),
            description: "Python source of a code node".to_string(),
            mime_type: Some(CodeLanguage::Python.mime_type().to_string()),
        },
        ResourceTemplate {
            name: "workflow-code-javascript".to_string(),
            title: "Workflow code file (JavaScript)".to_string(),
            uri_template: format!("{LOCATOR_SCHEME}:///code/{{workflowId}}/{{nodeId}}.json"),
            description: "JavaScript source of a code node".to_string(),
            mime_type: Some(CodeLanguage::Javascript.mime_type().to_string()),
        },
        ResourceTemplate {
            name: "workflow-set-json".to_string(),
            title: "Workflow set node payload".to_string(),
            uri_template: format!("{LOCATOR_SCHEME}:///set/{{workflowId}}/{{nodeId}}.set.json"),
            description: "Raw JSON payload of a set node".to_string(),
            mime_type: Some("application/json".to_string()),
        },
    ]
}

/// Slices a sorted listing; the cursor is the decimal start offset and an
/// unparsable cursor starts over.
pub fn page_resources(
    resources: Vec<ResourceDescriptor>,
    cursor: Option<&str>,
    page_size: usize,
) -> ResourcePage {
    let start = cursor
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(0)
        .min(resources.len());
    let end = start.saturating_add(page_size.max(1)).min(resources.len());
    let next_cursor = (end < resources.len()).then(|| end.to_string());
    let resources = resources
        .into_iter()
        .skip(start)
        .take(end - start)
        .collect();
    ResourcePage {
        resources,
        next_cursor,
    }
}

/// Read-only enumeration of every artifact under the workflows root.
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    root: PathBuf,
    prefix: String,
    max_visited: usize,
    page_size: usize,
    log: EventLog,
}

impl ResourceCatalog {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>, max_visited: usize) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            max_visited,
            page_size: crate::config::DEFAULT_RESOURCE_PAGE_SIZE,
            log: EventLog::disabled(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut catalog = Self::new(
            settings.workflows_root.clone(),
            settings.directory_prefix.clone(),
            settings.scan.catalog_max_visited,
        );
        catalog.page_size = settings.resources.page_size;
        catalog.log = settings.event_log();
        catalog
    }

    fn workflow_id_for_dir(&self, dir_name: &str) -> Option<WorkflowId> {
        let stripped = if self.prefix.is_empty() {
            dir_name
        } else {
            dir_name.strip_prefix(&self.prefix).unwrap_or(dir_name)
        };
        WorkflowId::parse(stripped)
            .or_else(|_| WorkflowId::parse(dir_name))
            .ok()
    }

    /// Every artifact file, sorted by resource name. Files that disappear
    /// between listing and stat are left out.
    pub fn list_resources(&self) -> Vec<ResourceDescriptor> {
        let mut resources = Vec::new();
        let mut walk = DirectoryWalk::new(&self.root, self.max_visited);
        for dir in walk.by_ref() {
            let Some(workflow_id) = dir.name().and_then(|name| self.workflow_id_for_dir(name))
            else {
                continue;
            };
            for file in &dir.files {
                let Some((node_id, format)) = classify_file_name(&file.name) else {
                    continue;
                };
                let Ok((_, stamp)) = read_stamped(&file.path) else {
                    continue;
                };
                let locator = Locator::new(workflow_id.clone(), node_id, format);
                let label = match format.language() {
                    Some(language) => format!("{} code ({language})", locator.node_id),
                    None => format!("{} set payload", locator.node_id),
                };
                resources.push(ResourceDescriptor {
                    name: format!("{}/{}", workflow_id, file.name),
                    title: label.clone(),
                    uri: locator.uri(),
                    description: format!("{label} in workflow {workflow_id}"),
                    mime_type: format.mime_type().to_string(),
                    meta: ResourceMeta {
                        workflow_id: workflow_id.clone(),
                        node_id: locator.node_id.clone(),
                        kind: format.kind(),
                        language: format.language(),
                        etag: stamp.etag,
                        size: stamp.size,
                        last_modified: stamp.last_modified,
                    },
                });
            }
        }

        if walk.limit_reached() {
            self.log.warn(
                "resource_scan_limit",
                &[
                    ("maxVisited", Value::from(self.max_visited)),
                    ("collected", Value::from(resources.len())),
                ],
            );
        }

        resources.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.uri.cmp(&b.uri)));
        resources
    }

    pub fn list_page(&self, cursor: Option<&str>) -> ResourcePage {
        page_resources(self.list_resources(), cursor, self.page_size)
    }
}
