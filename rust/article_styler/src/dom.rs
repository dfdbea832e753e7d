//! Mutable HTML tree built on `markup5ever_rcdom`.
//!
//! Everything in the crate works on [`Handle`]s. This module owns parsing,
//! the small set of tree surgery primitives the pipeline and the anchor engine
//! need, and serialization back to markup.

use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};
use std::cell::RefCell;
use std::rc::Rc;

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Class of the element the assembler puts the article body in.
pub const CONTENT_CLASS: &str = "content";

/// A parsed document.
///
/// Parsing never fails: html5ever closes unclosed tags, keeps unknown tags as
/// ordinary elements and synthesizes `html`/`head`/`body`.
pub struct Document {
    dom: RcDom,
}

impl Document {
    pub fn parse(input: &str) -> Self {
        Self {
            dom: parse_document(RcDom::default(), Default::default()).one(input),
        }
    }

    /// The document node itself.
    pub fn root(&self) -> &Handle {
        &self.dom.document
    }

    pub fn head(&self) -> Option<Handle> {
        find_elem(&self.dom.document, "head")
    }

    pub fn body(&self) -> Option<Handle> {
        find_elem(&self.dom.document, "body")
    }

    /// The node highlight offsets are measured from: the styled document's
    /// `div.content`, else `<body>`, else the document node.
    pub fn article_root(&self) -> Handle {
        find_first(&self.dom.document, &|h| {
            tag_name(h).as_deref() == Some("div") && has_class(h, CONTENT_CLASS)
        })
        .or_else(|| self.body())
        .unwrap_or_else(|| self.dom.document.clone())
    }

    /// Serialize the whole document, doctype included.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for c in self.dom.document.children.borrow().iter() {
            serialize_node(&mut out, c);
        }
        out
    }
}

pub fn find_elem(node: &Handle, name: &str) -> Option<Handle> {
    if let NodeData::Element { name: q, .. } = &node.data {
        if q.local.to_string().eq_ignore_ascii_case(name) {
            return Some(node.clone());
        }
    }
    for c in node.children.borrow().iter() {
        if let Some(x) = find_elem(c, name) {
            return Some(x);
        }
    }
    None
}

pub fn find_first(node: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    if pred(node) {
        return Some(node.clone());
    }
    for c in node.children.borrow().iter() {
        if let Some(x) = find_first(c, pred) {
            return Some(x);
        }
    }
    None
}

/// All nodes under `node` (inclusive) matching `pred`, in document order.
pub fn find_all(node: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Vec<Handle> {
    fn walk(node: &Handle, pred: &dyn Fn(&Handle) -> bool, out: &mut Vec<Handle>) {
        if pred(node) {
            out.push(node.clone());
        }
        for c in node.children.borrow().iter() {
            walk(c, pred, out);
        }
    }

    let mut out = Vec::new();
    walk(node, pred, &mut out);
    out
}

pub fn tag_name(h: &Handle) -> Option<String> {
    match &h.data {
        NodeData::Element { name, .. } => Some(name.local.to_string().to_ascii_lowercase()),
        _ => None,
    }
}

/// Rank of an `h1`..`h6` element.
pub fn heading_level(h: &Handle) -> Option<u8> {
    let tag = tag_name(h)?;
    let rest = tag.strip_prefix('h')?;
    match rest.parse::<u8>() {
        Ok(level @ 1..=6) if rest.len() == 1 => Some(level),
        _ => None,
    }
}

pub fn is_text(h: &Handle) -> bool {
    matches!(h.data, NodeData::Text { .. })
}

pub fn text_of(h: &Handle) -> Option<String> {
    match &h.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

pub fn attr(h: &Handle, name: &str) -> Option<String> {
    match &h.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn set_attr(h: &Handle, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &h.data {
        let mut attrs = attrs.borrow_mut();
        match attrs.iter_mut().find(|a| &*a.name.local == name) {
            Some(a) => a.value = StrTendril::from(value),
            None => attrs.push(new_attr(name, value)),
        }
    }
}

pub fn has_class(h: &Handle, class: &str) -> bool {
    attr(h, "class")
        .map(|c| c.split_whitespace().any(|x| x == class))
        .unwrap_or(false)
}

/// Concatenated text of every text node under `h`.
pub fn text_content(h: &Handle) -> String {
    fn walk(node: &Handle, out: &mut String) {
        if let NodeData::Text { contents } = &node.data {
            out.push_str(&contents.borrow());
        }
        for c in node.children.borrow().iter() {
            walk(c, out);
        }
    }

    let mut out = String::new();
    walk(h, &mut out);
    out
}

fn new_attr(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: StrTendril::from(value),
    }
}

pub fn new_element(tag: &str, attrs: &[(&str, &str)]) -> Handle {
    Node::new(NodeData::Element {
        name: QualName::new(None, Namespace::from(HTML_NS), LocalName::from(tag)),
        attrs: RefCell::new(attrs.iter().map(|(k, v)| new_attr(k, v)).collect()),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

pub fn new_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

pub fn parent_of(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    node.parent.set(weak);
    parent
}

pub fn index_in_parent(node: &Handle) -> Option<(Handle, usize)> {
    let parent = parent_of(node)?;
    let idx = parent
        .children
        .borrow()
        .iter()
        .position(|c| Rc::ptr_eq(c, node))?;
    Some((parent, idx))
}

/// Remove `node` from its parent, if it has one.
pub fn detach(node: &Handle) {
    if let Some((parent, idx)) = index_in_parent(node) {
        parent.children.borrow_mut().remove(idx);
    }
    node.parent.set(None);
}

pub fn insert_child(parent: &Handle, index: usize, child: Handle) {
    detach(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    let mut kids = parent.children.borrow_mut();
    let index = index.min(kids.len());
    kids.insert(index, child);
}

pub fn append_child(parent: &Handle, child: Handle) {
    let len = parent.children.borrow().len();
    insert_child(parent, len, child);
}

/// Replace `node` with its own children, in place.
pub fn unwrap_element(node: &Handle) {
    let Some((parent, idx)) = index_in_parent(node) else {
        return;
    };
    let kids: Vec<Handle> = node.children.borrow_mut().drain(..).collect();
    parent.children.borrow_mut().remove(idx);
    node.parent.set(None);
    for (offset, kid) in kids.into_iter().enumerate() {
        kid.parent.set(None);
        insert_child(&parent, idx + offset, kid);
    }
}

/// Merge runs of adjacent text children of `parent` and drop empty ones.
pub fn merge_text_nodes(parent: &Handle) {
    let kids: Vec<Handle> = parent.children.borrow().clone();
    let mut kept: Vec<Handle> = Vec::with_capacity(kids.len());

    for kid in kids {
        if let NodeData::Text { contents } = &kid.data {
            if contents.borrow().is_empty() {
                kid.parent.set(None);
                continue;
            }
            if let Some(NodeData::Text { contents: prev }) = kept.last().map(|p| &p.data) {
                prev.borrow_mut().push_tendril(&contents.borrow());
                kid.parent.set(None);
                continue;
            }
        }
        kept.push(kid);
    }

    *parent.children.borrow_mut() = kept;
}

/// Length of `s` in UTF-16 code units, the unit browsers measure text in.
pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Byte index of the point `units` UTF-16 code units into `s`. `None` when
/// the point is past the end or falls between the halves of a surrogate pair.
pub fn utf16_to_byte(s: &str, units: usize) -> Option<usize> {
    let mut seen = 0;
    for (i, ch) in s.char_indices() {
        if seen == units {
            return Some(i);
        }
        if seen > units {
            return None;
        }
        seen += ch.len_utf16();
    }
    (seen == units).then_some(s.len())
}

/// Split a text node `at` UTF-16 units. The node keeps the left part; the
/// right part becomes a new sibling directly after it and is returned.
/// Returns `None` when the split point is at either end or inside a
/// surrogate pair.
pub fn split_text(node: &Handle, at: usize) -> Option<Handle> {
    let NodeData::Text { contents } = &node.data else {
        return None;
    };
    let text = contents.borrow().to_string();
    let byte_at = utf16_to_byte(&text, at)?;
    if byte_at == 0 || byte_at == text.len() {
        return None;
    }
    let (left, right) = text.split_at(byte_at);
    let right = new_text(right);
    *contents.borrow_mut() = StrTendril::from(left);

    if let Some((parent, idx)) = index_in_parent(node) {
        insert_child(&parent, idx + 1, right.clone());
    }
    Some(right)
}

pub fn esc_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn esc_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

// Text inside these is emitted verbatim.
fn is_raw_text(tag: &str) -> bool {
    matches!(
        tag,
        "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" | "plaintext"
    )
}

pub fn serialize_node(out: &mut String, node: &Handle) {
    serialize_in(out, node, false);
}

fn serialize_in(out: &mut String, node: &Handle, raw: bool) {
    match &node.data {
        NodeData::Document => {
            for c in node.children.borrow().iter() {
                serialize_in(out, c, false);
            }
        }
        NodeData::Doctype { name, .. } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::ProcessingInstruction { .. } => {}
        NodeData::Text { contents } => {
            if raw {
                out.push_str(&contents.borrow());
            } else {
                out.push_str(&esc_text(&contents.borrow()));
            }
        }
        NodeData::Comment { contents } => {
            out.push_str("<!--");
            out.push_str(contents);
            out.push_str("-->");
        }
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let tag = name.local.to_string();
            out.push('<');
            out.push_str(&tag);
            for a in attrs.borrow().iter() {
                out.push(' ');
                out.push_str(&a.name.local);
                out.push_str("=\"");
                out.push_str(&esc_attr(&a.value));
                out.push('"');
            }

            let lower = tag.to_ascii_lowercase();
            if is_void(&lower) {
                out.push_str("/>");
                return;
            }
            out.push('>');

            let raw_kids = is_raw_text(&lower);
            if let Some(contents) = template_contents.borrow().as_ref() {
                for c in contents.children.borrow().iter() {
                    serialize_in(out, c, raw_kids);
                }
            }
            for c in node.children.borrow().iter() {
                serialize_in(out, c, raw_kids);
            }

            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }
    }
}

pub fn inner_html(node: &Handle) -> String {
    let mut out = String::new();
    for c in node.children.borrow().iter() {
        serialize_node(&mut out, c);
    }
    out
}

pub fn outer_html(node: &Handle) -> String {
    let mut out = String::new();
    serialize_node(&mut out, node);
    out
}
