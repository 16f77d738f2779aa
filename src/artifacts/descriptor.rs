use super::error::{io_error, ArtifactError};
use super::locator::{ArtifactKind, CodeLanguage, Locator};
use crate::shared::ids::{NodeId, WorkflowId};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Metadata describing an artifact without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDescriptor {
    pub workflow_id: WorkflowId,
    pub node_id: NodeId,
    pub kind: ArtifactKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<CodeLanguage>,
    pub uri: String,
    pub etag: String,
    pub size: u64,
    pub last_modified: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactContent {
    #[serde(flatten)]
    pub descriptor: ArtifactDescriptor,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStamp {
    pub etag: String,
    pub size: u64,
    pub last_modified: String,
}

pub fn compute_etag(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Stamps `bytes` as the content of `path`; only the modification time comes
/// from the filesystem.
pub fn stamp_bytes(path: &Path, bytes: &[u8]) -> Result<FileStamp, ArtifactError> {
    let metadata = fs::metadata(path).map_err(|source| io_error(path, source))?;
    let modified = metadata.modified().map_err(|source| io_error(path, source))?;
    Ok(FileStamp {
        etag: compute_etag(bytes),
        size: bytes.len() as u64,
        last_modified: format_timestamp(modified),
    })
}

pub fn read_stamped(path: &Path) -> Result<(Vec<u8>, FileStamp), ArtifactError> {
    let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
    let stamp = stamp_bytes(path, &bytes)?;
    Ok((bytes, stamp))
}

pub fn decode_utf8(path: &Path, bytes: Vec<u8>) -> Result<String, ArtifactError> {
    String::from_utf8(bytes).map_err(|_| ArtifactError::InvalidUtf8 {
        path: path.display().to_string(),
    })
}

pub fn format_timestamp(time: std::time::SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn describe(locator: &Locator, stamp: FileStamp) -> ArtifactDescriptor {
    ArtifactDescriptor {
        workflow_id: locator.workflow_id.clone(),
        node_id: locator.node_id.clone(),
        kind: locator.kind(),
        language: locator.format.language(),
        uri: locator.uri(),
        etag: stamp.etag,
        size: stamp.size,
        last_modified: stamp.last_modified,
    }
}

pub fn describe_file(locator: &Locator, path: &Path) -> Result<ArtifactDescriptor, ArtifactError> {
    let (_, stamp) = read_stamped(path)?;
    Ok(describe(locator, stamp))
}
