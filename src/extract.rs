//! Verse unit extraction.
//!
//! Turns rendered scripture markup into addressable verses. The layout is
//! decided per marker, so one page can freely mix both shapes:
//!
//! - **Prose**: the marker sits inline in a paragraph. The text between it
//!   and the next marker is moved into a new `span.verse-wrapper` inserted
//!   right after the marker.
//! - **Poetry**: the marker sits inside a `.line` span. The line itself is
//!   tagged, and every other line whose id carries the same verse digits
//!   (`p58001005_06-1` belongs to `v58001005`) is tagged as a further owner.
//!   A line holding several markers cannot belong to one verse, so its
//!   markers are wrapped as prose inside the line.
//!
//! Extraction is idempotent: wrappers and tagged lines left by an earlier
//! run are recognized and reused.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::conventions::MarkupConventions;
use crate::dom::{ArenaDom, ArenaNodeId, Attribute};
use crate::verse::{VerseId, VerseIndex};

/// A verse/chapter number element found under the content root.
struct Marker {
    node: ArenaNodeId,
    /// `None` when the marker's id is malformed. Such markers still end the
    /// preceding verse's text run.
    verse: Option<VerseId>,
    line: Option<ArenaNodeId>,
}

/// Annotate the markup under `root` and index its verses.
pub fn extract_verses(
    dom: &mut ArenaDom,
    root: ArenaNodeId,
    conventions: &MarkupConventions,
) -> VerseIndex {
    let markers = find_markers(dom, root, conventions);

    let mut markers_per_line: HashMap<ArenaNodeId, usize> = HashMap::new();
    for marker in &markers {
        if let (Some(line), Some(_)) = (marker.line, marker.verse) {
            *markers_per_line.entry(line).or_default() += 1;
        }
    }

    let mut index = VerseIndex::new();
    let mut prose_wrappers = 0usize;
    let mut tagged_lines = 0usize;

    for marker in &markers {
        let Some(verse) = marker.verse else {
            continue;
        };

        match marker.line {
            Some(line) if markers_per_line.get(&line) == Some(&1) => {
                tag_owner(dom, line, verse, conventions);
                index.attach(verse, line);
                tagged_lines += 1;
            }
            _ => {
                if let Some(wrapper) = wrap_prose(dom, marker.node, verse, conventions) {
                    index.attach(verse, wrapper);
                    prose_wrappers += 1;
                } else {
                    debug!("marker {verse} has no text to wrap");
                }
            }
        }
    }

    // Continuation lines: poetry lines without a marker of their own.
    let known: HashSet<VerseId> = markers.iter().filter_map(|m| m.verse).collect();
    let lines: Vec<ArenaNodeId> = dom
        .descendants(root)
        .filter(|&id| dom.has_class(id, &conventions.line_class))
        .filter(|id| !markers_per_line.contains_key(id))
        .collect();

    for line in lines {
        let Some(verse) = dom.element_id(line).and_then(VerseId::from_line_id) else {
            continue;
        };
        if !known.contains(&verse) {
            debug!("line for {verse} has no matching marker on this page");
            continue;
        }
        tag_owner(dom, line, verse, conventions);
        index.attach(verse, line);
        tagged_lines += 1;
    }

    let position: HashMap<ArenaNodeId, usize> = dom
        .descendants(root)
        .enumerate()
        .map(|(i, id)| (id, i))
        .collect();
    index.sort_by_document_order(|id| position.get(&id).copied().unwrap_or(usize::MAX));

    debug!(
        "extracted {} verses ({} prose wrappers, {} poetry lines, {} markers)",
        index.len(),
        prose_wrappers,
        tagged_lines,
        markers.len()
    );

    index
}

fn find_markers(
    dom: &ArenaDom,
    root: ArenaNodeId,
    conventions: &MarkupConventions,
) -> Vec<Marker> {
    dom.descendants(root)
        .filter(|&id| is_marker(dom, id, conventions))
        .map(|node| {
            let verse = dom.element_id(node).and_then(VerseId::from_marker_id);
            if verse.is_none() {
                debug!("skipping marker with malformed id {:?}", dom.element_id(node));
            }
            let line = dom.closest(node, root, |d, id| {
                d.has_class(id, &conventions.line_class)
            });
            Marker { node, verse, line }
        })
        .collect()
}

fn is_marker(dom: &ArenaDom, id: ArenaNodeId, conventions: &MarkupConventions) -> bool {
    dom.has_any_class(id, &conventions.marker_classes)
}

fn contains_marker(dom: &ArenaDom, id: ArenaNodeId, conventions: &MarkupConventions) -> bool {
    dom.descendants(id)
        .any(|child| is_marker(dom, child, conventions))
}

fn is_identified_line(dom: &ArenaDom, id: ArenaNodeId, conventions: &MarkupConventions) -> bool {
    dom.has_class(id, &conventions.line_class)
        && dom.element_id(id).and_then(VerseId::from_line_id).is_some()
}

fn is_blank_text(dom: &ArenaDom, id: ArenaNodeId) -> bool {
    dom.text_content(id).is_some_and(|t| t.trim().is_empty())
}

fn is_wrapper_for(
    dom: &ArenaDom,
    id: ArenaNodeId,
    verse: VerseId,
    conventions: &MarkupConventions,
) -> bool {
    dom.has_class(id, &conventions.wrapper_class)
        && dom.get_attr(id, "data-verse-id") == Some(verse.to_string().as_str())
}

/// Move the run of siblings after `marker` into a new wrapper span.
///
/// The run ends at the next sibling that is, or contains, a marker, and at
/// a poetry line carrying a verse id, which is owned through its id instead.
/// Whitespace-only text and comments stay where they are.
fn wrap_prose(
    dom: &mut ArenaDom,
    marker: ArenaNodeId,
    verse: VerseId,
    conventions: &MarkupConventions,
) -> Option<ArenaNodeId> {
    let mut cursor = dom.next_sibling(marker);
    while let Some(node) = cursor
        && is_blank_text(dom, node)
    {
        cursor = dom.next_sibling(node);
    }
    if let Some(node) = cursor
        && is_wrapper_for(dom, node, verse, conventions)
    {
        return Some(node);
    }

    let mut run = Vec::new();
    while let Some(node) = cursor {
        if is_marker(dom, node, conventions)
            || contains_marker(dom, node, conventions)
            || is_identified_line(dom, node, conventions)
        {
            break;
        }
        if dom.is_element(node) || (dom.is_text(node) && !is_blank_text(dom, node)) {
            run.push(node);
        }
        cursor = dom.next_sibling(node);
    }

    if run.is_empty() {
        return None;
    }

    let wrapper = dom.create_html_element("span", Vec::<Attribute>::new());
    tag_owner(dom, wrapper, verse, conventions);
    dom.insert_after(marker, wrapper);
    for node in run {
        dom.append(wrapper, node);
    }
    Some(wrapper)
}

/// Write the verse-wrapper class and data attributes onto an owner node.
fn tag_owner(
    dom: &mut ArenaDom,
    node: ArenaNodeId,
    verse: VerseId,
    conventions: &MarkupConventions,
) {
    dom.add_class(node, &conventions.wrapper_class);
    dom.set_attr(node, "data-verse-id", &verse.to_string());
    dom.set_attr(node, "data-book", &verse.book_name());
    dom.set_attr(node, "data-chapter", &verse.chapter.to_string());
    dom.set_attr(node, "data-verse", &verse.verse.to_string());
}
