use super::catalog::{ResourceCatalog, ResourceDescriptor, ResourceMeta, ResourcePage};
use super::descriptor::{
    compute_etag, decode_utf8, describe, describe_file, read_stamped, stamp_bytes,
    ArtifactContent, ArtifactDescriptor, FileStamp,
};
use super::error::{io_error, ArtifactError};
use super::locator::{classify_file_name, ArtifactFormat, ArtifactKind, CodeLanguage, Locator};
use super::resolver::WorkflowDirResolver;
use crate::config::Settings;
use crate::patch::{apply_hunks, parse_hunks, PatchOptions};
use crate::shared::fs_atomic::{relax_permissions, replace_file_atomically};
use crate::shared::ids::{NodeId, WorkflowId};
use crate::shared::logging::EventLog;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

/// Code files are looked up in this order; the first existing one wins.
const CODE_LOOKUP_ORDER: [CodeLanguage; 2] = [CodeLanguage::Python, CodeLanguage::Javascript];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceText {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
    #[serde(rename = "_meta")]
    pub meta: ResourceMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceWriteResult {
    pub uri: String,
    pub etag: String,
    pub size: u64,
    pub last_modified: String,
}

/// File-backed store for code and set artifacts.
///
/// Holds configuration only. Every write re-reads the current bytes and
/// compares etags right before replacing the file, so two editors racing on
/// the same artifact cannot silently overwrite each other.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    settings: Settings,
    resolver: WorkflowDirResolver,
    catalog: ResourceCatalog,
    log: EventLog,
}

impl ArtifactStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            resolver: WorkflowDirResolver::from_settings(&settings),
            catalog: ResourceCatalog::from_settings(&settings),
            log: settings.event_log(),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ensure_configured(&self) -> Result<(), ArtifactError> {
        if self.settings.root_is_available() {
            return Ok(());
        }
        Err(ArtifactError::RootNotConfigured {
            root: self.settings.workflows_root.display().to_string(),
        })
    }

    pub fn resolve_workflow_dir(&self, workflow_id: &WorkflowId) -> Result<PathBuf, ArtifactError> {
        self.ensure_configured()?;
        self.resolver.resolve(workflow_id)
    }

    pub fn list_code_files(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Vec<ArtifactDescriptor>, ArtifactError> {
        self.list_kind(workflow_id, |format| matches!(format, ArtifactFormat::Code(_)))
    }

    pub fn list_set_files(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Vec<ArtifactDescriptor>, ArtifactError> {
        self.list_kind(workflow_id, |format| format == ArtifactFormat::Set)
    }

    fn list_kind<F>(
        &self,
        workflow_id: &WorkflowId,
        wanted: F,
    ) -> Result<Vec<ArtifactDescriptor>, ArtifactError>
    where
        F: Fn(ArtifactFormat) -> bool,
    {
        let dir = self.resolve_workflow_dir(workflow_id)?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|source| io_error(&dir, source))? {
            let entry = entry.map_err(|source| io_error(&dir, source))?;
            let is_file = fs::metadata(entry.path())
                .map(|metadata| metadata.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        let mut descriptors = Vec::new();
        for name in names {
            let Some((node_id, format)) = classify_file_name(&name) else {
                continue;
            };
            if !wanted(format) {
                continue;
            }
            let locator = Locator::new(workflow_id.clone(), node_id, format);
            match describe_file(&locator, &dir.join(&name)) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(ArtifactError::Io { source, .. }) if source.kind() == IoErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
        Ok(descriptors)
    }

    pub fn read_code_file(
        &self,
        workflow_id: &WorkflowId,
        node_id: &NodeId,
    ) -> Result<ArtifactContent, ArtifactError> {
        let dir = self.resolve_workflow_dir(workflow_id)?;
        let locator = existing_code_locator(&dir, workflow_id, node_id).ok_or_else(|| {
            ArtifactError::ArtifactNotFound {
                kind: ArtifactKind::Code,
                node_id: node_id.to_string(),
            }
        })?;
        read_content(&dir, &locator)
    }

    pub fn read_set_file(
        &self,
        workflow_id: &WorkflowId,
        node_id: &NodeId,
    ) -> Result<ArtifactContent, ArtifactError> {
        let dir = self.resolve_workflow_dir(workflow_id)?;
        let locator = Locator::new(workflow_id.clone(), node_id.clone(), ArtifactFormat::Set);
        if !dir.join(locator.file_name()).is_file() {
            return Err(ArtifactError::ArtifactNotFound {
                kind: ArtifactKind::Set,
                node_id: node_id.to_string(),
            });
        }
        read_content(&dir, &locator)
    }

    /// Writes into the existing `.py` or `.json` file for the node. `language`
    /// only matters when no file exists yet and picks the extension.
    pub fn write_code_file(
        &self,
        workflow_id: &WorkflowId,
        node_id: &NodeId,
        content: &str,
        expected_etag: Option<&str>,
        language: Option<&str>,
    ) -> Result<ArtifactDescriptor, ArtifactError> {
        let dir = self.resolve_workflow_dir(workflow_id)?;
        let locator = match existing_code_locator(&dir, workflow_id, node_id) {
            Some(locator) => locator,
            None => {
                let language = language
                    .filter(|value| !value.trim().is_empty())
                    .ok_or(ArtifactError::MissingLanguage)?;
                let language = CodeLanguage::parse_alias(language)?;
                Locator::new(
                    workflow_id.clone(),
                    node_id.clone(),
                    ArtifactFormat::Code(language),
                )
            }
        };
        let stamp = self.commit(&dir.join(locator.file_name()), content, expected_etag)?;
        self.log_write("artifact_written", &locator, &stamp);
        Ok(describe(&locator, stamp))
    }

    pub fn write_set_file(
        &self,
        workflow_id: &WorkflowId,
        node_id: &NodeId,
        content: &str,
        expected_etag: Option<&str>,
    ) -> Result<ArtifactDescriptor, ArtifactError> {
        let dir = self.resolve_workflow_dir(workflow_id)?;
        let locator = Locator::new(workflow_id.clone(), node_id.clone(), ArtifactFormat::Set);
        let stamp = self.commit(&dir.join(locator.file_name()), content, expected_etag)?;
        self.log_write("artifact_written", &locator, &stamp);
        Ok(describe(&locator, stamp))
    }

    pub fn read_resource(&self, uri: &str) -> Result<ResourceText, ArtifactError> {
        let locator = Locator::parse(uri)?;
        let dir = self.resolve_workflow_dir(&locator.workflow_id)?;
        let path = dir.join(locator.file_name());
        if !path.is_file() {
            return Err(ArtifactError::ResourceNotFound {
                uri: uri.to_string(),
            });
        }
        let content = read_content(&dir, &locator)?;
        Ok(ResourceText {
            uri: uri.to_string(),
            mime_type: locator.format.mime_type().to_string(),
            text: content.content,
            meta: resource_meta(content.descriptor),
        })
    }

    pub fn write_resource(
        &self,
        uri: &str,
        content: &str,
        expected_etag: Option<&str>,
    ) -> Result<ResourceWriteResult, ArtifactError> {
        let locator = Locator::parse(uri)?;
        let dir = self.resolve_workflow_dir(&locator.workflow_id)?;
        if let ArtifactFormat::Code(_) = locator.format {
            ensure_single_code_file(&dir, &locator)?;
        }
        let stamp = self.commit(&dir.join(locator.file_name()), content, expected_etag)?;
        self.log_write("artifact_written", &locator, &stamp);
        Ok(ResourceWriteResult {
            uri: uri.to_string(),
            etag: stamp.etag,
            size: stamp.size,
            last_modified: stamp.last_modified,
        })
    }

    /// Applies a unified diff to the addressed file. The etag is checked
    /// against the base before patching and again right before the write.
    pub fn patch_resource(
        &self,
        uri: &str,
        patch_text: &str,
        expected_etag: Option<&str>,
        options: &PatchOptions,
    ) -> Result<ArtifactDescriptor, ArtifactError> {
        options.validate()?;
        let hunks = parse_hunks(patch_text)?;
        let locator = Locator::parse(uri)?;
        let dir = self.resolve_workflow_dir(&locator.workflow_id)?;
        let path = dir.join(locator.file_name());
        if !path.is_file() {
            return Err(ArtifactError::ResourceNotFound {
                uri: uri.to_string(),
            });
        }

        let (bytes, base) = read_stamped(&path)?;
        check_precondition(Some(base.etag.as_str()), expected_etag)?;
        let original = decode_utf8(&path, bytes)?;
        let patched = apply_hunks(&original, &hunks, options)?;

        let stamp = self.commit(&path, &patched, Some(base.etag.as_str()))?;
        self.log_write("artifact_patched", &locator, &stamp);
        Ok(describe(&locator, stamp))
    }

    pub fn list_resources(&self) -> Result<Vec<ResourceDescriptor>, ArtifactError> {
        self.ensure_configured()?;
        Ok(self.catalog.list_resources())
    }

    pub fn list_resource_page(&self, cursor: Option<&str>) -> Result<ResourcePage, ArtifactError> {
        self.ensure_configured()?;
        Ok(self.catalog.list_page(cursor))
    }

    /// Checks `expected_etag` against the bytes currently on disk, then
    /// replaces the file and stamps what was written.
    fn commit(
        &self,
        path: &Path,
        content: &str,
        expected_etag: Option<&str>,
    ) -> Result<FileStamp, ArtifactError> {
        let current = current_etag(path)?;
        check_precondition(current.as_deref(), expected_etag)?;

        let bytes = content.as_bytes();
        replace_file_atomically(path, bytes).map_err(|source| io_error(path, source))?;
        if let Err(err) = relax_permissions(path) {
            self.log.warn(
                "permission_relax_failed",
                &[
                    ("path", Value::from(path.display().to_string())),
                    ("error", Value::from(err.to_string())),
                ],
            );
        }
        stamp_bytes(path, bytes)
    }

    fn log_write(&self, event: &str, locator: &Locator, stamp: &FileStamp) {
        self.log.info(
            event,
            &[
                ("uri", Value::from(locator.uri())),
                ("etag", Value::from(stamp.etag.clone())),
                ("size", Value::from(stamp.size)),
            ],
        );
    }
}

/// `current` is `None` when the file does not exist. A missing expectation
/// always passes.
pub fn check_precondition(
    current: Option<&str>,
    expected: Option<&str>,
) -> Result<(), ArtifactError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    match current {
        None => Err(ArtifactError::EtagForMissingFile {
            expected: expected.to_string(),
        }),
        Some(current) if current != expected => Err(ArtifactError::EtagMismatch {
            expected: expected.to_string(),
            current: current.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

fn current_etag(path: &Path) -> Result<Option<String>, ArtifactError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(compute_etag(&bytes))),
        Err(err) if err.kind() == IoErrorKind::NotFound => Ok(None),
        Err(source) => Err(io_error(path, source)),
    }
}

fn existing_code_locator(
    dir: &Path,
    workflow_id: &WorkflowId,
    node_id: &NodeId,
) -> Option<Locator> {
    CODE_LOOKUP_ORDER.into_iter().find_map(|language| {
        let locator = Locator::new(
            workflow_id.clone(),
            node_id.clone(),
            ArtifactFormat::Code(language),
        );
        dir.join(locator.file_name()).is_file().then_some(locator)
    })
}

/// A node keeps one code file; writing the other extension would shadow it.
fn ensure_single_code_file(dir: &Path, locator: &Locator) -> Result<(), ArtifactError> {
    match existing_code_locator(dir, &locator.workflow_id, &locator.node_id) {
        Some(existing) if existing.format != locator.format => {
            Err(ArtifactError::CodeFileExists {
                node_id: locator.node_id.to_string(),
                existing: existing.uri(),
            })
        }
        _ => Ok(()),
    }
}

fn read_content(dir: &Path, locator: &Locator) -> Result<ArtifactContent, ArtifactError> {
    let path = dir.join(locator.file_name());
    let (bytes, stamp) = read_stamped(&path)?;
    let content = decode_utf8(&path, bytes)?;
    Ok(ArtifactContent {
        descriptor: describe(locator, stamp),
        content,
    })
}

fn resource_meta(descriptor: ArtifactDescriptor) -> ResourceMeta {
    ResourceMeta {
        workflow_id: descriptor.workflow_id,
        node_id: descriptor.node_id,
        kind: descriptor.kind,
        language: descriptor.language,
        etag: descriptor.etag,
        size: descriptor.size,
        last_modified: descriptor.last_modified,
    }
}
