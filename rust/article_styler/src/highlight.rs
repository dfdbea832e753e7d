//! Materializing stored highlights as `<mark>` elements in a live tree.
//!
//! Highlights are stored as flattened-text offsets (see [`crate::offsets`]).
//! Applying one splits the boundary text nodes and wraps the covered run;
//! removing one unwraps its markers and merges the text back, so the text of
//! the tree is never changed by highlighting.

use crate::dom::{
    append_child, attr, find_all, find_first, has_class, index_in_parent, insert_child,
    merge_text_nodes, new_element, parent_of, split_text, tag_name, text_of, unwrap_element,
};
use crate::error::{AnchorError, UnknownColor};
use crate::offsets::OffsetIndex;
use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::str::FromStr;

pub type HighlightId = u64;

pub const MARKER_TAG: &str = "mark";
pub const MARKER_ID_ATTR: &str = "data-highlight-id";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
    Orange,
}

impl HighlightColor {
    pub const ALL: [HighlightColor; 5] = [
        HighlightColor::Yellow,
        HighlightColor::Green,
        HighlightColor::Blue,
        HighlightColor::Pink,
        HighlightColor::Orange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
            HighlightColor::Orange => "orange",
        }
    }

    /// CSS background of the marker.
    pub fn background(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "rgba(255, 255, 0, 0.3)",
            HighlightColor::Green => "rgba(0, 255, 0, 0.3)",
            HighlightColor::Blue => "rgba(0, 191, 255, 0.3)",
            HighlightColor::Pink => "rgba(255, 192, 203, 0.3)",
            HighlightColor::Orange => "rgba(255, 165, 0, 0.3)",
        }
    }

    /// Label shown in the colour picker.
    pub fn label(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "🟡 Kuning",
            HighlightColor::Green => "🟢 Hijau",
            HighlightColor::Blue => "🔵 Biru",
            HighlightColor::Pink => "🩷 Pink",
            HighlightColor::Orange => "🟠 Orange",
        }
    }
}

impl FromStr for HighlightColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        HighlightColor::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}

/// What the engine needs from a stored highlight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightAnchor {
    pub id: HighlightId,
    pub start_offset: usize,
    pub end_offset: usize,
    #[serde(default)]
    pub color: HighlightColor,
    /// Text captured when the highlight was made. When present, the anchor is
    /// refused if the text now at those offsets differs.
    #[serde(default)]
    pub highlighted_text: Option<String>,
}

pub fn is_marker(h: &Handle) -> bool {
    tag_name(h).as_deref() == Some(MARKER_TAG) && attr(h, MARKER_ID_ATTR).is_some()
}

fn marker_for(h: &HighlightAnchor) -> Handle {
    let class = format!("highlight highlight-{}", h.color.as_str());
    let style = format!("background-color: {}; cursor: pointer;", h.color.background());
    new_element(
        MARKER_TAG,
        &[
            ("class", &class),
            (MARKER_ID_ATTR, &h.id.to_string()),
            ("style", &style),
        ],
    )
}

fn unwrap_marker(marker: &Handle) {
    let parent = parent_of(marker);
    unwrap_element(marker);
    if let Some(parent) = parent {
        merge_text_nodes(&parent);
    }
}

/// Remove every marker under `root`, restoring the unmarked text nodes.
pub fn strip_markers(root: &Handle) -> usize {
    let markers = find_all(root, &is_marker);
    for m in &markers {
        unwrap_marker(m);
    }
    markers.len()
}

/// Unwrap every marker fragment of highlight `id`. Unknown ids are a no-op;
/// returns how many fragments were removed.
pub fn remove_highlight(id: HighlightId, root: &Handle) -> usize {
    let id = id.to_string();
    let markers = find_all(root, &|h| {
        is_marker(h) && attr(h, MARKER_ID_ATTR).as_deref() == Some(id.as_str())
    });
    for m in &markers {
        unwrap_marker(m);
    }
    log::debug!("removed {} marker(s) for highlight {}", markers.len(), id);
    markers.len()
}

fn without_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Anchor one highlight without touching existing markers.
///
/// A range whose ends share a parent is wrapped in a single marker. A range
/// crossing element boundaries, or enclosing an earlier marker, gets one
/// marker per covered text node, all carrying the same id, so existing
/// markers are never wrapped. Returns the number of markers inserted.
pub fn apply_highlight(h: &HighlightAnchor, root: &Handle) -> Result<usize, AnchorError> {
    if h.start_offset >= h.end_offset {
        return Err(AnchorError::EmptyRange {
            start: h.start_offset,
            end: h.end_offset,
        });
    }

    let index = OffsetIndex::build(root);
    let end = index.resolve(h.end_offset)?;
    let start = index.resolve_forward(h.start_offset)?;

    if let Some(snapshot) = h.highlighted_text.as_deref() {
        let current = index.text_between(h.start_offset, h.end_offset);
        let changed = without_whitespace(snapshot) != without_whitespace(&current);
        if !snapshot.trim().is_empty() && changed {
            return Err(AnchorError::SnapshotMismatch {
                start: h.start_offset,
                end: h.end_offset,
            });
        }
    }

    // End first: splitting it leaves `start.node` as the left piece.
    split_text(&end.node, end.offset);
    let first = if start.offset > 0 {
        split_text(&start.node, start.offset).unwrap_or_else(|| start.node.clone())
    } else {
        start.node.clone()
    };
    let last = if Rc::ptr_eq(&start.node, &end.node) {
        first.clone()
    } else {
        end.node.clone()
    };

    let nodes = OffsetIndex::build(root).nodes_between(&first, &last);
    if nodes.is_empty() {
        return Err(AnchorError::EmptyRange {
            start: h.start_offset,
            end: h.end_offset,
        });
    }

    if let Some((parent, from, to)) = sibling_run(&first, &last) {
        let marker = marker_for(h);
        let covered: Vec<Handle> = parent.children.borrow()[from..=to].to_vec();
        insert_child(&parent, from, marker.clone());
        for node in covered {
            append_child(&marker, node);
        }
        return Ok(1);
    }

    let mut inserted = 0;
    for node in nodes {
        if text_of(&node).map_or(true, |t| t.trim().is_empty()) {
            continue;
        }
        let Some((parent, idx)) = index_in_parent(&node) else {
            continue;
        };
        let marker = marker_for(h);
        insert_child(&parent, idx, marker.clone());
        append_child(&marker, node);
        inserted += 1;
    }
    if inserted == 0 {
        return Err(AnchorError::EmptyRange {
            start: h.start_offset,
            end: h.end_offset,
        });
    }
    Ok(inserted)
}

// Parent and child index span when both ends sit under the same parent and
// the run holds no earlier marker, which would otherwise end up inside.
fn sibling_run(first: &Handle, last: &Handle) -> Option<(Handle, usize, usize)> {
    let (parent, from) = index_in_parent(first)?;
    let (other, to) = index_in_parent(last)?;
    if !Rc::ptr_eq(&parent, &other) || from > to {
        return None;
    }
    let holds_marker = parent.children.borrow()[from..=to]
        .iter()
        .any(|c| find_first(c, &is_marker).is_some());
    (!holds_marker).then_some((parent, from, to))
}

/// Strip every marker under `root`, then anchor `highlights` in ascending id
/// order. A highlight that cannot be anchored is skipped; the ids of those are
/// returned. Overlapping highlights nest, the later (higher id) one always
/// inside.
pub fn apply_highlights(highlights: &[HighlightAnchor], root: &Handle) -> Vec<HighlightId> {
    strip_markers(root);

    let mut ordered: Vec<&HighlightAnchor> = highlights.iter().collect();
    ordered.sort_by_key(|h| h.id);

    let mut unanchored = Vec::new();
    for h in ordered {
        match apply_highlight(h, root) {
            Ok(n) => log::debug!("highlight {} anchored with {} marker(s)", h.id, n),
            Err(e) => {
                log::warn!("highlight {} skipped: {}", h.id, e);
                unanchored.push(h.id);
            }
        }
    }
    unanchored
}

/// Marker elements currently in the tree for `id`.
pub fn markers_for(id: HighlightId, root: &Handle) -> Vec<Handle> {
    let id = id.to_string();
    find_all(root, &|h| {
        is_marker(h)
            && has_class(h, "highlight")
            && attr(h, MARKER_ID_ATTR).as_deref() == Some(id.as_str())
    })
}
