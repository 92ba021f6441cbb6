use std::path::PathBuf;
use std::time::Duration;

/// Capture input rejected before it reaches storage.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "invalid category '{0}' (must be constraints, decisions, patterns, anti-patterns or note)"
    )]
    InvalidCategory(String),

    #[error("invalid tag: tag cannot be empty")]
    EmptyTag,

    #[error("invalid tag: tag must be {max} characters or less (got {len})")]
    TagTooLong { len: usize, max: usize },

    #[error("invalid tag: contains {0:?}")]
    InvalidTag(String),

    #[error("invalid content: content cannot be empty")]
    EmptyContent,

    #[error("invalid content: content must be {max} characters or less (got {len})")]
    ContentTooLong { len: usize, max: usize },

    #[error("forbidden content: contains {0:?}")]
    ForbiddenContent(String),

    #[error("list item not allowed: content cannot be a list item")]
    ListItem,

    #[error("invalid content: content cannot contain the rationale marker {0:?}")]
    RationaleMarker(String),

    #[error("invalid rationale: rationale must be {max} characters or less (got {len})")]
    RationaleTooLong { len: usize, max: usize },

    #[error("invalid rationale: rationale cannot contain line breaks")]
    RationaleLineBreak,
}

/// Storage-level failures. Every variant is a distinct condition callers can
/// match on; none of them is retried internally.
#[derive(thiserror::Error, Debug)]
pub enum MemoryError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("lock acquisition cancelled: {}", path.display())]
    LockCancelled { path: PathBuf },

    #[error("timed out after {waited:?} waiting for lock {}{}", path.display(), holder_suffix(holder))]
    LockTimedOut {
        path: PathBuf,
        waited: Duration,
        holder: Option<String>,
    },

    #[error("failed to acquire lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("section not found: {0}")]
    SectionNotFound(String),

    #[error("memory file already initialized: {} (use force to overwrite)", path.display())]
    AlreadyInitialized { path: PathBuf },

    #[error("failed to create memory dir {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read memory file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write temp file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename temp file over {}: {source}", path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn holder_suffix(holder: &Option<String>) -> String {
    match holder {
        Some(holder) => format!(" (held by {holder})"),
        None => String::new(),
    }
}
