//! Flattened-text coordinates over a live tree.
//!
//! The coordinate space is the concatenation of every text node under the root
//! in document order, counted in UTF-16 code units as a browser counts
//! `textContent.length`. Section controls are skipped. Nothing about
//! presentation state is consulted: a collapsed section carries a class, its
//! text stays indexed.

use crate::dom::{utf16_len, utf16_to_byte};
use crate::error::AnchorError;
use crate::sections::is_control;
use markup5ever_rcdom::{Handle, NodeData};
use std::rc::Rc;

/// A point inside a text node, in UTF-16 units.
#[derive(Clone, Debug)]
pub struct TextPosition {
    pub node: Handle,
    pub offset: usize,
}

impl PartialEq for TextPosition {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node) && self.offset == other.offset
    }
}

impl Eq for TextPosition {}

#[derive(Clone, Debug)]
struct Leaf {
    node: Handle,
    start: usize,
    len: usize,
}

impl Leaf {
    fn position(&self, global: usize) -> Result<TextPosition, AnchorError> {
        let offset = global - self.start;
        check_boundary(&self.node, offset, global)?;
        Ok(TextPosition {
            node: self.node.clone(),
            offset,
        })
    }
}

fn check_boundary(node: &Handle, local: usize, global: usize) -> Result<(), AnchorError> {
    if let NodeData::Text { contents } = &node.data {
        if utf16_to_byte(&contents.borrow(), local).is_none() {
            return Err(AnchorError::SplitsCharacter { offset: global });
        }
    }
    Ok(())
}

/// Calls `visit` for every text node under `node` that belongs to the
/// coordinate space, in document order.
pub(crate) fn walk_text(node: &Handle, visit: &mut dyn FnMut(&Handle, usize)) {
    if let NodeData::Text { contents } = &node.data {
        visit(node, utf16_len(&contents.borrow()));
        return;
    }
    if is_control(node) {
        return;
    }
    for c in node.children.borrow().iter() {
        walk_text(c, visit);
    }
}

/// Snapshot of the text layout of a tree. Any mutation that splits, merges
/// or moves text nodes invalidates it; rebuild rather than patch.
#[derive(Clone, Debug, Default)]
pub struct OffsetIndex {
    leaves: Vec<Leaf>,
    len: usize,
}

impl OffsetIndex {
    pub fn build(root: &Handle) -> Self {
        let mut index = OffsetIndex::default();
        walk_text(root, &mut |node: &Handle, len: usize| {
            if len > 0 {
                index.leaves.push(Leaf {
                    node: node.clone(),
                    start: index.len,
                    len,
                });
                index.len += len;
            }
        });
        index
    }

    /// Total length of the flattened text.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for leaf in &self.leaves {
            if let NodeData::Text { contents } = &leaf.node.data {
                out.push_str(&contents.borrow());
            }
        }
        out
    }

    pub fn text_between(&self, start: usize, end: usize) -> String {
        let units: Vec<u16> = self.text().encode_utf16().collect();
        let end = end.min(units.len());
        let start = start.min(end);
        String::from_utf16_lossy(&units[start..end])
    }

    /// Global offset of `local` units into the text node `node`.
    pub fn locate(&self, node: &Handle, local: usize) -> Result<usize, AnchorError> {
        let leaf = self
            .leaves
            .iter()
            .find(|l| Rc::ptr_eq(&l.node, node))
            .ok_or(AnchorError::NodeNotIndexed)?;
        if local > leaf.len {
            return Err(AnchorError::LocalOffsetOutOfRange {
                offset: local,
                len: leaf.len,
            });
        }
        check_boundary(node, local, leaf.start + local)?;
        Ok(leaf.start + local)
    }

    /// Text node and local offset for a global offset. A boundary between two
    /// text nodes resolves to the end of the earlier one.
    pub fn resolve(&self, global: usize) -> Result<TextPosition, AnchorError> {
        self.leaves
            .iter()
            .find(|l| l.start + l.len >= global)
            .ok_or(AnchorError::OffsetOutOfRange {
                offset: global,
                len: self.len,
            })?
            .position(global)
    }

    /// Like [`resolve`](Self::resolve), but a boundary resolves to the start
    /// of the later text node. Used for range starts so a range never begins
    /// with an empty slice of the previous node.
    pub fn resolve_forward(&self, global: usize) -> Result<TextPosition, AnchorError> {
        match self.leaves.iter().find(|l| l.start + l.len > global) {
            Some(l) => l.position(global),
            None => self.resolve(global),
        }
    }

    /// Text nodes from `first` to `last` inclusive, in document order.
    pub(crate) fn nodes_between(&self, first: &Handle, last: &Handle) -> Vec<Handle> {
        let Some(a) = self.leaves.iter().position(|l| Rc::ptr_eq(&l.node, first)) else {
            return Vec::new();
        };
        let Some(b) = self.leaves.iter().position(|l| Rc::ptr_eq(&l.node, last)) else {
            return Vec::new();
        };
        self.leaves[a..=b.max(a)].iter().map(|l| l.node.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{find_all, has_class, is_text, set_attr, text_of, Document};
    use crate::highlight::{apply_highlights, markers_for, HighlightAnchor, HighlightColor};

    const TWO_SECTIONS: &str = "<h1>T</h1><h2>A</h2><p>alpha</p><h2>B</h2><p>beta</p>";

    fn index_of(html: &str) -> (Document, OffsetIndex) {
        let doc = Document::parse(html);
        let index = OffsetIndex::build(&doc.article_root());
        (doc, index)
    }

    #[test]
    fn flattens_in_document_order() {
        let (_doc, index) = index_of("<p>Hello <b>wor</b>ld</p><p>!</p>");
        assert_eq!(index.text(), "Hello world!");
        assert_eq!(index.len(), 12);
        assert_eq!(index.text_between(4, 9), "o wor");
    }

    #[test]
    fn counts_utf16_units() {
        let (_doc, index) = index_of("<p>😀 Hello world</p>");
        assert_eq!(index.len(), 14);
        assert_eq!(index.text_between(3, 8), "Hello");
        assert_eq!(index.resolve(3).unwrap().offset, 3);
        assert_eq!(
            index.resolve(1),
            Err(AnchorError::SplitsCharacter { offset: 1 })
        );
    }

    #[test]
    fn locate_and_resolve() {
        let (doc, index) = index_of("<p>Hello <b>wor</b>ld</p>");
        let texts = find_all(doc.root(), &|h| is_text(h));
        assert_eq!(index.locate(&texts[1], 2).unwrap(), 8);

        let pos = index.resolve(8).unwrap();
        assert!(Rc::ptr_eq(&pos.node, &texts[1]));
        assert_eq!(pos.offset, 2);

        // Boundary belongs to the earlier node.
        let pos = index.resolve(6).unwrap();
        assert!(Rc::ptr_eq(&pos.node, &texts[0]));
        assert_eq!(pos.offset, 6);

        let pos = index.resolve_forward(6).unwrap();
        assert!(Rc::ptr_eq(&pos.node, &texts[1]));
        assert_eq!(pos.offset, 0);
    }

    #[test]
    fn resolve_past_end_is_out_of_range() {
        let (_doc, index) = index_of("<p>Hello</p>");
        assert!(index.resolve(5).is_ok());
        assert_eq!(
            index.resolve(6),
            Err(AnchorError::OffsetOutOfRange { offset: 6, len: 5 })
        );
        assert!(index.resolve_forward(6).is_err());
    }

    #[test]
    fn empty_tree_resolves_nothing() {
        let (_doc, index) = index_of("");
        assert!(index.is_empty());
        assert!(index.resolve(0).is_err());
    }

    #[test]
    fn round_trip_holds_for_every_canonical_position() {
        let (doc, index) =
            index_of("<h2>Bab</h2><p>ϕ(h,r,t) <em>s😀m</em></p><ul><li>a</li><li>bc</li></ul>");
        let texts = find_all(&doc.article_root(), &|h| is_text(h));

        for (i, node) in texts.iter().enumerate() {
            let text = text_of(node).unwrap();
            let mut boundaries = vec![0];
            boundaries.extend(text.chars().scan(0, |at, c| {
                *at += c.len_utf16();
                Some(*at)
            }));
            for k in boundaries.into_iter().filter(|&k| i == 0 || k > 0) {
                let global = index.locate(node, k).unwrap();
                let back = index.resolve(global).unwrap();
                assert!(Rc::ptr_eq(&back.node, node), "node mismatch at {i}:{k}");
                assert_eq!(back.offset, k);
            }
        }
    }

    #[test]
    fn locate_rejects_foreign_nodes_and_overlong_offsets() {
        let (doc, index) = index_of("<p>abc</p>");
        let p = crate::dom::find_elem(doc.root(), "p").unwrap();
        assert_eq!(index.locate(&p, 0), Err(AnchorError::NodeNotIndexed));
        let text = p.children.borrow()[0].clone();
        assert_eq!(
            index.locate(&text, 4),
            Err(AnchorError::LocalOffsetOutOfRange { offset: 4, len: 3 })
        );
    }

    #[test]
    fn section_controls_are_not_indexed() {
        let styled = crate::styler::transform(TWO_SECTIONS);
        let doc = Document::parse(&styled.styled_html);
        let index = OffsetIndex::build(&doc.article_root());
        assert_eq!(index.text(), "AalphaBbeta");
    }

    #[test]
    fn collapsing_a_section_keeps_later_highlights_anchored() {
        let styled = crate::styler::transform(TWO_SECTIONS);
        let doc = Document::parse(&styled.styled_html);
        let root = doc.article_root();
        let before = OffsetIndex::build(&root);
        let beta = before.text().find("beta").unwrap();

        // What the host does on collapse: hide the content, relabel the button.
        let content = find_all(&root, &|h| has_class(h, "section-content")).remove(0);
        set_attr(&content, "class", "section-content hidden");
        let button = find_all(&root, &crate::sections::is_control).remove(0);
        let label = button.children.borrow()[0].clone();
        if let NodeData::Text { contents } = &label.data {
            *contents.borrow_mut() = "Tampilkan".into();
        }

        let after = OffsetIndex::build(&root);
        assert_eq!(before.text(), after.text());
        assert_eq!(before.len(), after.len());

        let h = HighlightAnchor {
            id: 1,
            start_offset: beta,
            end_offset: beta + 4,
            color: HighlightColor::Yellow,
            highlighted_text: Some("beta".into()),
        };
        assert!(apply_highlights(&[h], &root).is_empty());
        assert_eq!(crate::dom::text_content(&markers_for(1, &root)[0]), "beta");
    }
}
