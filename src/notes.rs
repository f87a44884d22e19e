//! Footnote and cross-reference markers.
//!
//! Footnote markers carry their text in `data-footnote` or, as delivered by
//! the ESV API, in an escaped `title`. Cross-reference markers carry either
//! an enriched `data-crossrefs` JSON array or a `title` such as
//! `"Gen. 1:1; [Col. 1:17; 1 John 1:1]"`.

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::conventions::MarkupConventions;
use crate::dom::{ArenaDom, ArenaNodeId, parse_html};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const ESV_BASE: &str = "https://www.esv.org/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Footnote {
    #[serde(skip)]
    pub marker: ArenaNodeId,
    /// Number of the verse the note belongs to, as printed on the page.
    pub verse_label: Option<String>,
    pub text: String,
}

impl Footnote {
    /// Read the note attached to a footnote marker. `None` when the marker
    /// carries no text.
    pub fn from_marker(
        dom: &ArenaDom,
        marker: ArenaNodeId,
        conventions: &MarkupConventions,
    ) -> Option<Self> {
        let raw = dom
            .get_attr(marker, "data-footnote")
            .filter(|s| !s.is_empty())
            .or_else(|| dom.get_attr(marker, "title"))?;

        let text = plain_text(raw);
        if text.is_empty() {
            return None;
        }

        Some(Self {
            marker,
            verse_label: verse_label(dom, marker, conventions),
            text,
        })
    }
}

/// Decode entities and drop tags, including tags that were escaped twice.
fn plain_text(raw: &str) -> String {
    let fragment = parse_html(raw);
    let decoded = fragment
        .find_by_tag("body")
        .map(|body| fragment.subtree_text(body))
        .unwrap_or_default();
    TAG.replace_all(&decoded, "").trim().to_string()
}

/// Text of the verse number nearest to `node`: the last marker before it
/// in the enclosing paragraph or poetry line, else the first marker of the
/// line just before.
fn verse_label(dom: &ArenaDom, node: ArenaNodeId, conventions: &MarkupConventions) -> Option<String> {
    let document = dom.document();
    let is_line = |d: &ArenaDom, id: ArenaNodeId| d.has_class(id, &conventions.line_class);

    let container = dom.closest(node, document, |d, id| d.is_tag(id, "p") || is_line(d, id));
    if let Some(label) = container.and_then(|c| marker_before(dom, c, node, conventions)) {
        return Some(label);
    }

    let line = dom.closest(node, document, is_line)?;
    let mut prev = dom.prev_sibling(line);
    while let Some(sibling) = prev {
        if dom.is_element(sibling) && !dom.is_tag(sibling, "br") {
            return dom
                .descendants(sibling)
                .find(|&id| is_marker(dom, id, conventions))
                .and_then(|marker| marker_text(dom, marker));
        }
        prev = dom.prev_sibling(sibling);
    }
    None
}

fn marker_before(
    dom: &ArenaDom,
    container: ArenaNodeId,
    node: ArenaNodeId,
    conventions: &MarkupConventions,
) -> Option<String> {
    dom.descendants(container)
        .take_while(|&id| id != node)
        .filter(|&id| is_marker(dom, id, conventions))
        .last()
        .and_then(|marker| marker_text(dom, marker))
}

fn is_marker(dom: &ArenaDom, id: ArenaNodeId, conventions: &MarkupConventions) -> bool {
    dom.has_any_class(id, &conventions.marker_classes)
}

fn marker_text(dom: &ArenaDom, marker: ArenaNodeId) -> Option<String> {
    let label = dom.subtree_text(marker).trim().to_string();
    (!label.is_empty()).then_some(label)
}

/// One cross-referenced passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossRef {
    pub reference: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub esv_url: String,
}

impl CrossRef {
    pub fn new(reference: &str) -> Self {
        Self {
            reference: reference.to_string(),
            text: None,
            esv_url: esv_url(reference),
        }
    }
}

/// Link to a passage on esv.org.
pub fn esv_url(reference: &str) -> String {
    format!("{ESV_BASE}{}", utf8_percent_encode(reference, COMPONENT))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossRefs {
    #[serde(skip)]
    pub marker: ArenaNodeId,
    pub entries: Vec<CrossRef>,
}

impl CrossRefs {
    /// Read the references attached to a cross-reference marker.
    ///
    /// Enriched `data-crossrefs` data wins; malformed or empty data falls
    /// back to the `title` list. A marker with neither yields no entries.
    pub fn from_marker(dom: &ArenaDom, marker: ArenaNodeId) -> Self {
        let mut entries = dom
            .get_attr(marker, "data-crossrefs")
            .map(parse_enriched)
            .unwrap_or_default();

        if entries.is_empty() {
            entries = dom.get_attr(marker, "title").map(parse_title).unwrap_or_default();
        }

        Self { marker, entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_enriched(json: &str) -> Vec<CrossRef> {
    match serde_json::from_str::<Vec<CrossRef>>(json) {
        Ok(mut entries) => {
            for entry in &mut entries {
                if entry.esv_url.is_empty() {
                    entry.esv_url = esv_url(&entry.reference);
                }
            }
            entries
        }
        Err(e) => {
            log::warn!("could not parse crossref data: {e}");
            Vec::new()
        }
    }
}

fn parse_title(title: &str) -> Vec<CrossRef> {
    title
        .split(';')
        .map(|r| r.trim().replace(['[', ']'], ""))
        .filter(|r| !r.is_empty())
        .map(|r| CrossRef::new(&r))
        .collect()
}
