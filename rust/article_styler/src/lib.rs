//! Turns raw article HTML into a navigable reader page and keeps readers'
//! highlights anchored to it.
//!
//! The styling side ([`transform`]) parses the input, gives every heading an
//! id, wraps each `h2`–`h4` with its content in a collapsible section and lays
//! the result out next to a table of contents. The highlighting side measures
//! positions as UTF-16 offsets into the text of the article body
//! ([`OffsetIndex`]) and turns stored offsets back into `<mark>` elements
//! ([`apply_highlights`]).

pub mod dom;
pub mod error;
#[cfg(target_arch = "wasm32")]
pub mod ffi;
pub mod headings;
pub mod highlight;
pub mod json;
pub mod model;
pub mod offsets;
pub mod options;
pub mod sections;
pub mod selection;
pub mod store;
pub mod styler;

pub use dom::Document;
pub use error::{AnchorError, StoreError, UnknownColor};
pub use headings::{index_headings, slugify_heading, HeadingEntry};
pub use highlight::{
    apply_highlight, apply_highlights, remove_highlight, strip_markers, HighlightAnchor,
    HighlightColor, HighlightId,
};
pub use model::{Article, ArticleId, HighlightRecord, LastReadPosition, NewHighlight, SessionId};
pub use offsets::{OffsetIndex, TextPosition};
pub use options::StyleOptions;
pub use selection::{capture_selection, compute_offsets, CapturedSelection, DomRange, RangeBoundary};
pub use store::{ArticleStore, HighlightStore, LastReadStore, MemoryStore};
pub use styler::{extract_title, extract_title_or, transform, transform_with, StyledArticle};
