#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("patch does not contain any hunks")]
    NoHunks,
    #[error("maxFuzz must be at most {max}, got {requested}")]
    FuzzOutOfRange { requested: usize, max: usize },
    #[error("invalid hunk header: {header}")]
    InvalidHunkHeader { header: String },
    #[error("invalid patch line in hunk `{header}`: {line}")]
    InvalidHunkLine { header: String, line: String },
    #[error("hunk out of range at line {line}: {header}")]
    HunkOutOfRange { header: String, line: isize },
    #[error("patch context mismatch at line {line}")]
    ContextMismatch { line: usize },
    #[error("patch removal mismatch at line {line}")]
    RemovalMismatch { line: usize },
    #[error("patch context not found for hunk `{header}`")]
    ContextNotFound { header: String },
    #[error("patch context is ambiguous for hunk `{header}`: {matches} matching positions")]
    AmbiguousContext { header: String, matches: usize },
    #[error(
        "hunk `{header}` keeps {available} context lines after trimming, fewer than the required {required}"
    )]
    InsufficientContext {
        header: String,
        required: usize,
        available: usize,
    },
}

impl PatchError {
    /// Malformed requests, as opposed to patches that do not fit the file.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::NoHunks | Self::FuzzOutOfRange { .. })
    }
}
