//! Raw HTML in, styled article out.
//!
//! `transform` runs the whole pipeline: parse, index headings, wrap sections,
//! promote the first `h1` to the header, and lay the result out in the reader
//! shell (navigation, header, content, controls).

use crate::dom::{
    detach, esc_attr, esc_text, find_elem, find_first, heading_level, inner_html, outer_html,
    text_content, Document,
};
use crate::headings::{index_headings, HeadingEntry};
use crate::options::StyleOptions;
use crate::sections::wrap_sections;
use markup5ever_rcdom::Handle;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledArticle {
    pub styled_html: String,
    pub title: String,
    /// Navigation entries, without the heading promoted to the header.
    pub toc: Vec<HeadingEntry>,
}

pub fn transform(raw_html: &str) -> StyledArticle {
    transform_with(raw_html, &StyleOptions::default())
}

pub fn transform_with(raw_html: &str, opts: &StyleOptions) -> StyledArticle {
    let title = extract_title_or(raw_html, &opts.untitled);
    let doc = Document::parse(raw_html);

    let mut toc = index_headings(&doc);
    let sections = doc
        .body()
        .map(|body| wrap_sections(&body, &opts.toggle_label))
        .unwrap_or(0);

    let header = find_first(doc.root(), &|h| heading_level(h) == Some(1));
    if let Some(h1) = &header {
        detach(h1);
        if let Some(pos) = toc.iter().position(|e| e.level == 1) {
            toc.remove(pos);
        }
    }

    let body = doc.body().map(|b| inner_html(&b)).unwrap_or_default();
    let styled_html = assemble(opts, &title, &toc, header.as_ref(), &body);

    log::debug!(
        "styled article {:?}: {} toc entries, {} sections, header: {}",
        title,
        toc.len(),
        sections,
        header.is_some()
    );

    StyledArticle {
        styled_html,
        title,
        toc,
    }
}

fn nav_html(out: &mut String, opts: &StyleOptions, toc: &[HeadingEntry]) {
    out.push_str("<nav class=\"sidebar\"><div class=\"nav-header\">");
    out.push_str(&esc_text(&opts.nav_title));
    out.push_str("</div><ul class=\"nav-menu\">");
    for item in toc {
        out.push_str("<li class=\"nav-item\"><a class=\"nav-link h");
        out.push_str(&item.level.to_string());
        out.push_str("\" href=\"#");
        out.push_str(&esc_attr(&item.id));
        out.push_str("\">");
        out.push_str(&esc_text(&item.text));
        out.push_str("</a></li>");
    }
    out.push_str("</ul></nav>");
}

fn assemble(
    opts: &StyleOptions,
    title: &str,
    toc: &[HeadingEntry],
    header: Option<&Handle>,
    body: &str,
) -> String {
    let mut out = String::with_capacity(body.len() + 1024);
    out.push_str("<!DOCTYPE html>\n<html lang=\"");
    out.push_str(&esc_attr(&opts.lang));
    out.push_str("\">\n<head>\n<meta charset=\"UTF-8\">\n");
    out.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n<title>",
    );
    out.push_str(&esc_text(title));
    out.push_str("</title>\n</head>\n<body>\n");
    out.push_str("<button class=\"toggle-nav\" aria-label=\"Toggle Navigation\">☰</button>\n");
    out.push_str("<div class=\"container\">\n");
    nav_html(&mut out, opts, toc);
    out.push_str("\n<div class=\"main-content\">\n");
    if let Some(h1) = header {
        out.push_str("<div class=\"header\">");
        out.push_str(&outer_html(h1));
        out.push_str("</div>\n");
    }
    // No padding inside .content: its text is the highlight coordinate space.
    out.push_str("<div class=\"content\">");
    out.push_str(body);
    out.push_str("</div>\n</div>\n</div>\n");
    out.push_str("<button class=\"back-to-top\" aria-label=\"Back to Top\">↑</button>\n");
    out.push_str("</body>\n</html>\n");
    out
}

pub fn extract_title(raw_html: &str) -> String {
    extract_title_or(raw_html, &StyleOptions::default().untitled)
}

/// `<title>`, else the first `h1`, else the first heading of any rank, else
/// `fallback`.
pub fn extract_title_or(raw_html: &str, fallback: &str) -> String {
    let doc = Document::parse(raw_html);

    let non_empty = |h: Handle| {
        let t = text_content(&h).trim().to_string();
        (!t.is_empty()).then_some(t)
    };

    doc.head()
        .and_then(|head| find_elem(&head, "title"))
        .and_then(non_empty)
        .or_else(|| find_first(doc.root(), &|h| heading_level(h) == Some(1)).and_then(non_empty))
        .or_else(|| find_first(doc.root(), &|h| heading_level(h).is_some()).and_then(non_empty))
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{find_all, has_class, tag_name};

    fn by_class(doc: &Document, class: &str) -> Vec<Handle> {
        find_all(doc.root(), &|h| has_class(h, class))
    }

    #[test]
    fn title_prefers_title_tag() {
        let html = "<html><head><title> Judul </title></head><body><h1>H</h1></body></html>";
        assert_eq!(extract_title(html), "Judul");
    }

    #[test]
    fn title_falls_back_through_headings() {
        assert_eq!(extract_title("<h2>Second</h2><h1>First</h1>"), "First");
        assert_eq!(extract_title("<p>x</p><h5>Deep</h5>"), "Deep");
        assert_eq!(extract_title("<h1>  </h1><p>x</p>"), "Untitled Article");
        assert_eq!(extract_title(""), "Untitled Article");
    }

    #[test]
    fn title_extraction_leaves_input_alone() {
        let raw = "<h2>A</h2><p>b</p>".to_string();
        let before = raw.clone();
        let _ = extract_title(&raw);
        assert_eq!(raw, before);
    }

    #[test]
    fn header_is_promoted_and_removed_from_body() {
        let out = transform("<h1>Title</h1><h2>A</h2><p>x</p>");
        let doc = Document::parse(&out.styled_html);

        let header = by_class(&doc, "header").remove(0);
        assert_eq!(text_content(&header), "Title");
        let content = doc.article_root();
        assert!(!text_content(&content).contains("Title"));
        assert_eq!(out.title, "Title");
    }

    #[test]
    fn no_h1_means_no_header_block() {
        let out = transform("<h2>A</h2><p>x</p>");
        let doc = Document::parse(&out.styled_html);
        assert!(by_class(&doc, "header").is_empty());
        assert_eq!(out.toc.len(), 1);
    }

    #[test]
    fn empty_input_still_yields_a_shell() {
        let out = transform("");
        let doc = Document::parse(&out.styled_html);
        assert_eq!(out.title, "Untitled Article");
        assert!(out.toc.is_empty());
        assert_eq!(by_class(&doc, "toggle-nav").len(), 1);
        assert_eq!(by_class(&doc, "back-to-top").len(), 1);
        assert_eq!(by_class(&doc, "sidebar").len(), 1);
        assert!(doc.article_root().children.borrow().is_empty());
    }

    #[test]
    fn nav_links_jump_to_heading_ids() {
        let out = transform("<h2>One</h2><h3 id=\"two\">Two</h3>");
        let doc = Document::parse(&out.styled_html);
        let links = by_class(&doc, "nav-link");
        let hrefs: Vec<String> = links
            .iter()
            .filter_map(|a| crate::dom::attr(a, "href"))
            .collect();
        assert_eq!(hrefs, ["#section-1-one", "#two"]);
        assert!(has_class(&links[1], "h3"));
        assert_eq!(tag_name(&links[0]).as_deref(), Some("a"));
    }

    #[test]
    fn custom_options_reach_the_chrome() {
        let opts = StyleOptions {
            lang: "en".into(),
            nav_title: "Contents".into(),
            toggle_label: "Hide".into(),
            untitled: "Nothing".into(),
        };
        let out = transform_with("<h2>A</h2>", &opts);
        assert!(out.styled_html.contains("<html lang=\"en\">"));
        assert!(out.styled_html.contains(">Contents</div>"));
        assert!(out.styled_html.contains(">Hide</button>"));
        assert_eq!(out.title, "A");
    }
}
