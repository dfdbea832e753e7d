//! JSON request and response bodies of the host boundary.

use crate::dom::Document;
use crate::highlight::{apply_highlights, remove_highlight, HighlightAnchor, HighlightId};
use crate::options::StyleOptions;
use crate::styler::transform_with;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct HighlightRequest {
    html: String,
    #[serde(default)]
    highlights: Vec<HighlightAnchor>,
}

#[derive(Debug, Serialize)]
struct HighlightResponse {
    html: String,
    unanchored: Vec<HighlightId>,
}

#[derive(Debug, Deserialize)]
struct RemoveRequest {
    html: String,
    id: HighlightId,
}

/// Style `raw` with the options in `options_json` (defaults when `None`).
/// Output is `{styledHtml, title, toc}`.
pub fn transform_request(raw: &str, options_json: Option<&str>) -> serde_json::Result<String> {
    let options: StyleOptions = match options_json {
        Some(json) => serde_json::from_str(json)?,
        None => StyleOptions::default(),
    };
    serde_json::to_string(&transform_with(raw, &options))
}

/// `{html, highlights}` in, `{html, unanchored}` out.
pub fn apply_request(request: &str) -> serde_json::Result<String> {
    let req: HighlightRequest = serde_json::from_str(request)?;
    let doc = Document::parse(&req.html);
    let unanchored = apply_highlights(&req.highlights, &doc.article_root());
    serde_json::to_string(&HighlightResponse {
        html: doc.to_html(),
        unanchored,
    })
}

/// `{html, id}` in, the markup without that highlight out.
pub fn remove_request(request: &str) -> serde_json::Result<String> {
    let req: RemoveRequest = serde_json::from_str(request)?;
    let doc = Document::parse(&req.html);
    remove_highlight(req.id, &doc.article_root());
    Ok(doc.to_html())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_reports_title_and_toc() {
        let out = transform_request("<h1>T</h1><h2>A</h2><p>x</p>", None).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["title"], "T");
        assert_eq!(v["toc"][0]["text"], "A");
        assert!(v["styledHtml"].as_str().unwrap().contains("section-content"));
    }

    #[test]
    fn transform_accepts_partial_options() {
        let out = transform_request("<h2>A</h2>", Some(r#"{"toggleLabel":"Hide"}"#)).unwrap();
        assert!(out.contains("Hide"));
        assert!(transform_request("<p>x</p>", Some("{")).is_err());
    }

    #[test]
    fn apply_then_remove() {
        let req = r#"{"html":"<p>Hello world</p>","highlights":[
            {"id":1,"startOffset":0,"endOffset":5,"color":"green"},
            {"id":2,"startOffset":50,"endOffset":60}]}"#;
        let out: serde_json::Value = serde_json::from_str(&apply_request(req).unwrap()).unwrap();
        assert_eq!(out["unanchored"], serde_json::json!([2]));
        let html = out["html"].as_str().unwrap();
        assert!(html.contains("data-highlight-id=\"1\""));

        let remove = serde_json::json!({ "html": html, "id": 1 }).to_string();
        let cleaned = remove_request(&remove).unwrap();
        assert!(!cleaned.contains("<mark"));
        assert!(cleaned.contains("<p>Hello world</p>"));
    }

    #[test]
    fn malformed_requests_are_errors() {
        assert!(apply_request("not json").is_err());
        assert!(remove_request(r#"{"html":"x"}"#).is_err());
    }
}
