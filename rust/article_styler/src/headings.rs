use crate::dom::{attr, find_all, heading_level, set_attr, text_content, Document};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[-\s]+").unwrap();
}

/// One table-of-contents line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HeadingEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Lower-case, drop everything but word characters, whitespace and `-`, then
/// collapse whitespace/hyphen runs into a single `-`.
pub fn slugify_heading(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    let stripped = NON_WORD.replace_all(&lower, "");
    SEPARATORS.replace_all(&stripped, "-").into_owned()
}

/// Give every `h1`..`h6` in the document an id and return the headings in
/// document order.
///
/// An existing non-empty id is kept verbatim. Otherwise the id is
/// `section-{n}-{slug}` with `n` the 1-based position among all headings, so
/// two headings with the same text never collide.
pub fn index_headings(doc: &Document) -> Vec<HeadingEntry> {
    let headings = find_all(doc.root(), &|h| heading_level(h).is_some());
    let mut toc = Vec::with_capacity(headings.len());

    for (i, heading) in headings.iter().enumerate() {
        let text = text_content(heading).trim().to_string();
        let id = match attr(heading, "id").filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                let id = format!("section-{}-{}", i + 1, slugify_heading(&text));
                set_attr(heading, "id", &id);
                id
            }
        };
        toc.push(HeadingEntry {
            id,
            text,
            level: heading_level(heading).unwrap_or(1),
        });
    }

    log::debug!("indexed {} headings", toc.len());
    toc
}
