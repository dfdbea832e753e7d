use crate::dom::{append_child, attr, has_class, heading_level, new_element, new_text, tag_name};
use markup5ever_rcdom::Handle;

pub const TOGGLE_CLASS: &str = "toggle-btn";

/// Section controls whose label the host may rewrite. Their text is not part
/// of the article and is left out of the highlight coordinate space.
pub fn is_control(h: &Handle) -> bool {
    tag_name(h).as_deref() == Some("button") && has_class(h, TOGGLE_CLASS)
}

/// Ranks that open a collapsible section.
fn opens_section(h: &Handle) -> bool {
    matches!(heading_level(h), Some(2..=4))
}

/// Ranks that close the section before them.
fn closes_section(h: &Handle) -> bool {
    matches!(heading_level(h), Some(1..=4))
}

/// Wrap every `h2`..`h4` and the siblings that follow it, up to the next
/// `h1`..`h4`, in a collapsible section unit. Applies inside every container
/// under `root`. Returns the number of sections created.
///
/// ```text
/// div.section#section-wrapper-{id}
///   div.section-header: {heading} button.toggle-btn[data-target={id}]
///   div.section-content#content-{id}: {siblings}
/// ```
pub fn wrap_sections(root: &Handle, toggle_label: &str) -> usize {
    let mut count = 0;
    wrap_in(root, toggle_label, &mut count);
    count
}

fn wrap_in(container: &Handle, toggle_label: &str, count: &mut usize) {
    let kids: Vec<Handle> = container.children.borrow().clone();

    for kid in &kids {
        if tag_name(kid).is_some() && heading_level(kid).is_none() {
            wrap_in(kid, toggle_label, count);
        }
    }

    if !kids.iter().any(opens_section) {
        return;
    }

    container.children.borrow_mut().clear();

    let mut i = 0;
    while i < kids.len() {
        let kid = &kids[i];
        if !opens_section(kid) {
            append_child(container, kid.clone());
            i += 1;
            continue;
        }

        let mut end = i + 1;
        while end < kids.len() && !closes_section(&kids[end]) {
            end += 1;
        }

        let unit = section_unit(kid, &kids[i + 1..end], toggle_label);
        append_child(container, unit);
        *count += 1;
        i = end;
    }
}

fn section_unit(heading: &Handle, body: &[Handle], toggle_label: &str) -> Handle {
    let id = attr(heading, "id").unwrap_or_default();

    let unit = new_element(
        "div",
        &[("class", "section"), ("id", &format!("section-wrapper-{id}"))],
    );
    let header = new_element("div", &[("class", "section-header")]);
    let toggle = new_element("button", &[("class", TOGGLE_CLASS), ("data-target", &id)]);
    append_child(&toggle, new_text(toggle_label));
    append_child(&header, heading.clone());
    append_child(&header, toggle);

    // Present even when empty so every section has the same shape.
    let content = new_element(
        "div",
        &[("class", "section-content"), ("id", &format!("content-{id}"))],
    );
    for node in body {
        append_child(&content, node.clone());
    }

    append_child(&unit, header);
    append_child(&unit, content);
    unit
}
