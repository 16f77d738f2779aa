use super::locator::ArtifactKind;
use crate::patch::PatchError;

/// Caller-facing classification of an [`ArtifactError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    PatchFailure,
    Io,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::PatchFailure => "PATCH_FAILURE",
            Self::Io => "IO",
        }
    }

    /// Only a conflict can succeed after the caller re-reads and retries.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Conflict)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("{0}")]
    InvalidIdentifier(String),
    #[error("invalid resource URI `{uri}`: {reason}")]
    InvalidLocator { uri: String, reason: String },
    #[error("language is required when creating a new code file")]
    MissingLanguage,
    #[error("unsupported language `{0}`; expected python/py or javascript/js/json")]
    UnsupportedLanguage(String),
    #[error("file {path} is not valid UTF-8")]
    InvalidUtf8 { path: String },
    #[error("code file for nodeId {node_id} already exists as {existing}")]
    CodeFileExists { node_id: String, existing: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("workflow files root `{root}` is not configured; mount the workflows directory and set N8N_WORKFLOWS_ROOT")]
    RootNotConfigured { root: String },
    #[error("workflow directory not found for workflowId {workflow_id}")]
    WorkflowDirNotFound { workflow_id: String },
    #[error("{kind} file not found for nodeId {node_id}")]
    ArtifactNotFound { kind: ArtifactKind, node_id: String },
    #[error("file not found for URI: {uri}")]
    ResourceNotFound { uri: String },
    #[error("ETag mismatch: file has changed (expected {expected}, current {current})")]
    EtagMismatch { expected: String, current: String },
    #[error("ETag mismatch: file does not exist (expected {expected})")]
    EtagForMissingFile { expected: String },
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier(_)
            | Self::InvalidLocator { .. }
            | Self::MissingLanguage
            | Self::UnsupportedLanguage(_)
            | Self::InvalidUtf8 { .. }
            | Self::CodeFileExists { .. }
            | Self::InvalidArgument(_) => ErrorKind::Validation,
            Self::RootNotConfigured { .. }
            | Self::WorkflowDirNotFound { .. }
            | Self::ArtifactNotFound { .. }
            | Self::ResourceNotFound { .. } => ErrorKind::NotFound,
            Self::EtagMismatch { .. } | Self::EtagForMissingFile { .. } => ErrorKind::Conflict,
            Self::Patch(err) if err.is_validation() => ErrorKind::Validation,
            Self::Patch(_) => ErrorKind::PatchFailure,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

pub(crate) fn io_error(path: &std::path::Path, source: std::io::Error) -> ArtifactError {
    ArtifactError::Io {
        path: path.display().to_string(),
        source,
    }
}
