use super::error::ArtifactError;
use crate::shared::ids::{NodeId, WorkflowId};
use serde::{Deserialize, Serialize};

pub const LOCATOR_SCHEME: &str = "n8n-workflows";

const SET_SUFFIX: &str = ".set.json";
const PYTHON_SUFFIX: &str = ".py";
const JAVASCRIPT_SUFFIX: &str = ".json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Code,
    Set,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Set => "set",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "code" => Some(Self::Code),
            "set" => Some(Self::Set),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeLanguage {
    Python,
    Javascript,
}

impl CodeLanguage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Javascript => "javascript",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Python => "py",
            Self::Javascript => "json",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Python => "text/x-python",
            Self::Javascript => "text/javascript",
        }
    }

    /// Accepts the language names and extension aliases editors send.
    pub fn parse_alias(raw: &str) -> Result<Self, ArtifactError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "python" | "pythonnative" | "py" => Ok(Self::Python),
            "javascript" | "js" | "json" => Ok(Self::Javascript),
            _ => Err(ArtifactError::UnsupportedLanguage(raw.to_string())),
        }
    }
}

impl std::fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// On-disk representation of an artifact; decides file suffix and language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactFormat {
    Code(CodeLanguage),
    Set,
}

impl ArtifactFormat {
    pub fn kind(self) -> ArtifactKind {
        match self {
            Self::Code(_) => ArtifactKind::Code,
            Self::Set => ArtifactKind::Set,
        }
    }

    pub fn language(self) -> Option<CodeLanguage> {
        match self {
            Self::Code(language) => Some(language),
            Self::Set => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Code(language) => language.extension(),
            Self::Set => "set.json",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Code(language) => language.mime_type(),
            Self::Set => "application/json",
        }
    }

    pub fn file_name(self, node_id: &NodeId) -> String {
        format!("{node_id}.{}", self.suffix())
    }
}

/// Maps a directory entry name to the artifact it stores, if any. The set
/// suffix is checked first because it also ends in `.json`.
pub fn classify_file_name(file_name: &str) -> Option<(NodeId, ArtifactFormat)> {
    let (stem, format) = if let Some(stem) = file_name.strip_suffix(SET_SUFFIX) {
        (stem, ArtifactFormat::Set)
    } else if let Some(stem) = file_name.strip_suffix(PYTHON_SUFFIX) {
        (stem, ArtifactFormat::Code(CodeLanguage::Python))
    } else if let Some(stem) = file_name.strip_suffix(JAVASCRIPT_SUFFIX) {
        (stem, ArtifactFormat::Code(CodeLanguage::Javascript))
    } else {
        return None;
    };
    let node_id = NodeId::parse(stem).ok()?;
    Some((node_id, format))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub workflow_id: WorkflowId,
    pub node_id: NodeId,
    pub format: ArtifactFormat,
}

impl Locator {
    pub fn new(workflow_id: WorkflowId, node_id: NodeId, format: ArtifactFormat) -> Self {
        Self {
            workflow_id,
            node_id,
            format,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.format.kind()
    }

    pub fn file_name(&self) -> String {
        self.format.file_name(&self.node_id)
    }

    pub fn uri(&self) -> String {
        format!(
            "{LOCATOR_SCHEME}:///{}/{}/{}",
            self.kind(),
            self.workflow_id,
            self.file_name()
        )
    }

    /// Parses `n8n-workflows:///{kind}/{workflowId}/{fileName}`. Segments are
    /// percent-decoded before validation so encoded separators cannot slip
    /// through.
    pub fn parse(uri: &str) -> Result<Self, ArtifactError> {
        let invalid = |reason: &str| ArtifactError::InvalidLocator {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        let rest = uri
            .strip_prefix(LOCATOR_SCHEME)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| invalid("unsupported scheme"))?;
        let path = rest.split(['?', '#']).next().unwrap_or_default();

        let mut segments = Vec::new();
        for raw in path.split('/').filter(|segment| !segment.is_empty()) {
            let decoded = urlencoding::decode(raw).map_err(|_| invalid("bad percent-encoding"))?;
            segments.push(decoded.into_owned());
        }
        if segments.len() != 3 {
            return Err(invalid("expected {kind}/{workflowId}/{fileName}"));
        }

        let kind = ArtifactKind::parse(&segments[0]).ok_or_else(|| invalid("unknown kind"))?;
        let workflow_id =
            WorkflowId::parse(&segments[1]).map_err(ArtifactError::InvalidIdentifier)?;
        let (node_id, format) =
            classify_file_name(&segments[2]).ok_or_else(|| invalid("invalid file name"))?;
        if format.kind() != kind {
            return Err(invalid("file name does not match kind"));
        }

        Ok(Self::new(workflow_id, node_id, format))
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri())
    }
}
