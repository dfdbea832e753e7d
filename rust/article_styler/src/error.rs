use thiserror::Error;

/// Why a position or a highlight could not be mapped onto the live tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    #[error("offset {offset} is past the end of the text ({len} chars)")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("node is not a text node under the indexed root")]
    NodeNotIndexed,

    #[error("local offset {offset} is past the end of its text node ({len} chars)")]
    LocalOffsetOutOfRange { offset: usize, len: usize },

    #[error("empty or inverted range {start}..{end}")]
    EmptyRange { start: usize, end: usize },

    #[error("text at {start}..{end} no longer matches the stored snapshot")]
    SnapshotMismatch { start: usize, end: usize },

    #[error("range boundary is not inside the indexed root")]
    BoundaryOutsideRoot,

    #[error("offset {offset} falls inside a surrogate pair")]
    SplitsCharacter { offset: usize },
}

/// Failures reported by a persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("highlight already exists for {start_offset}..{end_offset}")]
    DuplicateHighlight { start_offset: usize, end_offset: usize },

    #[error("slug {slug:?} is already taken")]
    SlugTaken { slug: String },

    #[error("{what} {key} not found")]
    NotFound { what: &'static str, key: String },

    #[error("invalid {what}: {reason}")]
    Invalid { what: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown highlight colour {0:?}")]
pub struct UnknownColor(pub String);
