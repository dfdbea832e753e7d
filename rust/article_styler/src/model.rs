//! Records exchanged with the persistence layer.

use crate::error::StoreError;
use crate::highlight::{HighlightAnchor, HighlightColor, HighlightId};
use crate::selection::CapturedSelection;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ArticleId = u64;

/// Opaque per-reader token. Passed explicitly to every call that reads or
/// writes reader-owned data.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub slug: String,
    pub title: String,
    pub raw_html: String,
    /// Always the styling of `raw_html` as of the last write.
    pub styled_html: String,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRecord {
    pub id: HighlightId,
    pub article_id: ArticleId,
    pub session: SessionId,
    pub highlighted_text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub container_path: String,
    pub color: HighlightColor,
    pub note: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl HighlightRecord {
    pub fn anchor(&self) -> HighlightAnchor {
        HighlightAnchor {
            id: self.id,
            start_offset: self.start_offset,
            end_offset: self.end_offset,
            color: self.color,
            highlighted_text: Some(self.highlighted_text.clone()),
        }
    }
}

/// A highlight about to be stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHighlight {
    pub article_id: ArticleId,
    pub session: SessionId,
    pub highlighted_text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub container_path: String,
    #[serde(default)]
    pub color: HighlightColor,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewHighlight {
    pub fn from_selection(
        article_id: ArticleId,
        session: SessionId,
        selection: CapturedSelection,
        color: HighlightColor,
    ) -> Self {
        Self {
            article_id,
            session,
            highlighted_text: selection.highlighted_text,
            start_offset: selection.start_offset,
            end_offset: selection.end_offset,
            container_path: selection.container_path,
            color,
            note: None,
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        let invalid = |reason: &str| StoreError::Invalid {
            what: "highlight",
            reason: reason.to_string(),
        };
        if self.session.as_str().is_empty() {
            return Err(invalid("session is required"));
        }
        if self.highlighted_text.trim().is_empty() {
            return Err(invalid("highlighted text is required"));
        }
        if self.start_offset >= self.end_offset {
            return Err(invalid("start offset must be before end offset"));
        }
        if self.container_path.is_empty() {
            return Err(invalid("container path is required"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastReadPosition {
    pub article_id: ArticleId,
    pub session: SessionId,
    pub scroll_position: f64,
    pub updated_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(text: &str, start: usize, end: usize) -> CapturedSelection {
        CapturedSelection {
            start_offset: start,
            end_offset: end,
            highlighted_text: text.to_string(),
            container_path: "//*[@id=\"content-section-2-a\"]".to_string(),
        }
    }

    #[test]
    fn selection_becomes_a_valid_record() {
        let new = NewHighlight::from_selection(
            7,
            SessionId::new("s"),
            captured("quick brown", 4, 15),
            HighlightColor::Orange,
        );
        assert_eq!(new.article_id, 7);
        assert_eq!((new.start_offset, new.end_offset), (4, 15));
        assert_eq!(new.highlighted_text, "quick brown");
        assert_eq!(new.container_path, "//*[@id=\"content-section-2-a\"]");
        assert_eq!(new.color, HighlightColor::Orange);
        assert_eq!(new.note, None);
        assert_eq!(new.validate(), Ok(()));
    }

    #[test]
    fn whitespace_selection_is_rejected() {
        let new = NewHighlight::from_selection(
            1,
            SessionId::new("s"),
            captured("", 2, 3),
            HighlightColor::default(),
        );
        assert!(matches!(new.validate(), Err(StoreError::Invalid { .. })));

        let anonymous = NewHighlight::from_selection(
            1,
            SessionId::new(""),
            captured("x", 2, 3),
            HighlightColor::Pink,
        );
        assert!(matches!(anonymous.validate(), Err(StoreError::Invalid { .. })));
    }
}
