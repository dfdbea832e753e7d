//! Turning a reader's selection into the offsets a highlight is stored with.

use crate::dom::{attr, is_text, parent_of, tag_name, utf16_len};
use crate::error::AnchorError;
use crate::offsets::{walk_text, OffsetIndex};
use crate::sections::is_control;
use markup5ever_rcdom::{Handle, NodeData};
use serde::Serialize;
use std::rc::Rc;

/// One end of a selection, DOM style: inside a text node `offset` counts
/// UTF-16 units, inside an element it is a child index.
#[derive(Clone, Debug)]
pub struct RangeBoundary {
    pub container: Handle,
    pub offset: usize,
}

#[derive(Clone, Debug)]
pub struct DomRange {
    pub start: RangeBoundary,
    pub end: RangeBoundary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionOffsets {
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Everything a new highlight record needs from the selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedSelection {
    pub start_offset: usize,
    pub end_offset: usize,
    pub highlighted_text: String,
    pub container_path: String,
}

// UTF-16 units of indexed text before the point (`target`, `child_index`).
fn units_before(node: &Handle, target: &Handle, child_index: usize, acc: &mut usize) -> bool {
    if Rc::ptr_eq(node, target) {
        for c in node.children.borrow().iter().take(child_index) {
            walk_text(c, &mut |_: &Handle, len: usize| *acc += len);
        }
        return true;
    }
    if let NodeData::Text { contents } = &node.data {
        *acc += utf16_len(&contents.borrow());
        return false;
    }
    if is_control(node) {
        return false;
    }
    for c in node.children.borrow().iter() {
        if units_before(c, target, child_index, acc) {
            return true;
        }
    }
    false
}

fn boundary_offset(
    index: &OffsetIndex,
    root: &Handle,
    b: &RangeBoundary,
) -> Result<usize, AnchorError> {
    if is_text(&b.container) {
        return index.locate(&b.container, b.offset);
    }

    let kids = b.container.children.borrow().len();
    if b.offset > kids {
        return Err(AnchorError::LocalOffsetOutOfRange {
            offset: b.offset,
            len: kids,
        });
    }
    let mut acc = 0;
    if units_before(root, &b.container, b.offset, &mut acc) {
        Ok(acc)
    } else {
        Err(AnchorError::BoundaryOutsideRoot)
    }
}

/// Global offsets of a selection under `root`. A backwards selection is
/// normalized; a collapsed one is refused.
pub fn compute_offsets(root: &Handle, range: &DomRange) -> Result<SelectionOffsets, AnchorError> {
    let index = OffsetIndex::build(root);
    offsets_with(&index, root, range)
}

fn offsets_with(
    index: &OffsetIndex,
    root: &Handle,
    range: &DomRange,
) -> Result<SelectionOffsets, AnchorError> {
    let a = boundary_offset(index, root, &range.start)?;
    let b = boundary_offset(index, root, &range.end)?;
    let (start_offset, end_offset) = if a <= b { (a, b) } else { (b, a) };
    if start_offset == end_offset {
        return Err(AnchorError::EmptyRange {
            start: start_offset,
            end: end_offset,
        });
    }
    Ok(SelectionOffsets {
        start_offset,
        end_offset,
    })
}

/// Offsets plus the selected text and the container path of the range's
/// nearest common element.
pub fn capture_selection(
    root: &Handle,
    range: &DomRange,
) -> Result<CapturedSelection, AnchorError> {
    let index = OffsetIndex::build(root);
    let offsets = offsets_with(&index, root, range)?;
    let text = index.text_between(offsets.start_offset, offsets.end_offset);

    let common = common_ancestor(&range.start.container, &range.end.container)
        .ok_or(AnchorError::BoundaryOutsideRoot)?;
    let element = if is_text(&common) {
        parent_of(&common).ok_or(AnchorError::BoundaryOutsideRoot)?
    } else {
        common
    };

    Ok(CapturedSelection {
        start_offset: offsets.start_offset,
        end_offset: offsets.end_offset,
        highlighted_text: text.trim().to_string(),
        container_path: container_path(&element),
    })
}

fn ancestors(node: &Handle) -> Vec<Handle> {
    let mut out = vec![node.clone()];
    let mut cur = node.clone();
    while let Some(p) = parent_of(&cur) {
        out.push(p.clone());
        cur = p;
    }
    out
}

fn common_ancestor(a: &Handle, b: &Handle) -> Option<Handle> {
    let chain = ancestors(a);
    ancestors(b)
        .into_iter()
        .find(|n| chain.iter().any(|m| Rc::ptr_eq(m, n)))
}

/// Structural locator of an element: `//*[@id="…"]` when it has an id,
/// otherwise an absolute path like `/html/body/div[2]/p`. Stored with the
/// highlight as a hint; anchoring only uses the offsets.
pub fn container_path(node: &Handle) -> String {
    if let Some(id) = attr(node, "id").filter(|id| !id.is_empty()) {
        return format!("//*[@id=\"{id}\"]");
    }

    let mut parts: Vec<String> = Vec::new();
    let mut cur = Some(node.clone());
    while let Some(n) = cur {
        let Some(tag) = tag_name(&n) else {
            break;
        };
        let parent = parent_of(&n);
        let position = parent
            .as_ref()
            .map(|p| {
                p.children
                    .borrow()
                    .iter()
                    .take_while(|c| !Rc::ptr_eq(c, &n))
                    .filter(|c| tag_name(c).as_deref() == Some(tag.as_str()))
                    .count()
            })
            .unwrap_or(0);
        parts.push(if position > 0 {
            format!("{tag}[{}]", position + 1)
        } else {
            tag
        });
        cur = parent;
    }

    if parts.is_empty() {
        return String::new();
    }
    parts.reverse();
    format!("/{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{find_all, find_elem, has_class, text_content, Document};
    use crate::highlight::{apply_highlight, markers_for, HighlightAnchor, HighlightColor};

    fn at(container: &Handle, offset: usize) -> RangeBoundary {
        RangeBoundary {
            container: container.clone(),
            offset,
        }
    }

    #[test]
    fn text_boundaries_map_to_global_offsets() {
        let doc = Document::parse("<p>Hello <b>world</b></p>");
        let root = doc.article_root();
        let texts = find_all(&root, &|h| is_text(h));
        let range = DomRange {
            start: at(&texts[0], 4),
            end: at(&texts[1], 2),
        };
        assert_eq!(
            compute_offsets(&root, &range),
            Ok(SelectionOffsets {
                start_offset: 4,
                end_offset: 8
            })
        );
    }

    #[test]
    fn backwards_selection_is_normalized() {
        let doc = Document::parse("<p>Hello world</p>");
        let root = doc.article_root();
        let text = find_all(&root, &|h| is_text(h)).remove(0);
        let range = DomRange {
            start: at(&text, 9),
            end: at(&text, 2),
        };
        let o = compute_offsets(&root, &range).unwrap();
        assert_eq!((o.start_offset, o.end_offset), (2, 9));
    }

    #[test]
    fn element_boundaries_count_preceding_children() {
        let doc = Document::parse("<p>ab</p><p>cd</p><p>ef</p>");
        let root = doc.article_root();
        let range = DomRange {
            start: at(&root, 1),
            end: at(&root, 3),
        };
        let o = compute_offsets(&root, &range).unwrap();
        assert_eq!((o.start_offset, o.end_offset), (2, 6));
    }

    #[test]
    fn text_offsets_are_utf16_units() {
        let doc = Document::parse("<p>😀 Hello world</p>");
        let root = doc.article_root();
        let text = find_all(&root, &|h| is_text(h)).remove(0);
        let captured = capture_selection(
            &root,
            &DomRange {
                start: at(&text, 3),
                end: at(&text, 8),
            },
        )
        .unwrap();
        assert_eq!((captured.start_offset, captured.end_offset), (3, 8));
        assert_eq!(captured.highlighted_text, "Hello");
    }

    #[test]
    fn element_boundaries_skip_section_controls() {
        let styled = crate::styler::transform("<h2>A</h2><p>alpha</p><h2>B</h2><p>beta</p>");
        let doc = Document::parse(&styled.styled_html);
        let root = doc.article_root();
        let units = find_all(&root, &|h| has_class(h, "section"));
        // After the first section's header, and after the whole second section.
        let range = DomRange {
            start: at(&units[0], 1),
            end: at(&units[1], 2),
        };
        let o = compute_offsets(&root, &range).unwrap();
        assert_eq!((o.start_offset, o.end_offset), (1, 11));
    }

    #[test]
    fn collapsed_and_foreign_selections_fail() {
        let doc = Document::parse("<p>abc</p>");
        let other = Document::parse("<p>zzz</p>");
        let root = doc.article_root();
        let text = find_all(&root, &|h| is_text(h)).remove(0);
        let range = DomRange {
            start: at(&text, 1),
            end: at(&text, 1),
        };
        assert!(matches!(
            compute_offsets(&root, &range),
            Err(AnchorError::EmptyRange { .. })
        ));

        let p = find_elem(other.root(), "p").unwrap();
        let range = DomRange {
            start: at(&p, 0),
            end: at(&p, 1),
        };
        assert_eq!(
            compute_offsets(&root, &range),
            Err(AnchorError::BoundaryOutsideRoot)
        );
    }

    #[test]
    fn container_paths() {
        let doc =
            Document::parse("<div>x</div><div><p>a</p><p>b</p></div><section id=\"s\"></section>");
        let ps = find_all(doc.root(), &|h| tag_name(h).as_deref() == Some("p"));
        assert_eq!(container_path(&ps[0]), "/html/body/div[2]/p");
        assert_eq!(container_path(&ps[1]), "/html/body/div[2]/p[2]");
        let s = find_elem(doc.root(), "section").unwrap();
        assert_eq!(container_path(&s), "//*[@id=\"s\"]");
    }

    #[test]
    fn captured_selection_reanchors_to_the_same_text() {
        let doc = Document::parse("<p>The quick <em>brown</em> fox</p>");
        let root = doc.article_root();
        let texts = find_all(&root, &|h| is_text(h));
        let range = DomRange {
            start: at(&texts[0], 4),
            end: at(&texts[2], 2),
        };
        let captured = capture_selection(&root, &range).unwrap();
        assert_eq!(captured.highlighted_text, "quick brown f");
        assert_eq!(captured.container_path, "/html/body/p");

        let anchor = HighlightAnchor {
            id: 11,
            start_offset: captured.start_offset,
            end_offset: captured.end_offset,
            color: HighlightColor::Green,
            highlighted_text: Some(captured.highlighted_text.clone()),
        };
        assert_eq!(apply_highlight(&anchor, &root), Ok(1));
        let marks = markers_for(11, &root);
        assert_eq!(text_content(&marks[0]), "quick brown f");
    }
}
