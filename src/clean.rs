//! Plain text of verse units, without annotation markup.
//!
//! The traversal reads the tree and skips excluded subtrees; it never
//! edits the live markup.

use std::sync::LazyLock;

use regex::Regex;

use crate::conventions::MarkupConventions;
use crate::dom::{ArenaDom, ArenaNodeId};

static FOOTNOTE_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]").expect("valid bracket pattern"));

static CROSSREF_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\w+\)").expect("valid letter pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Clean text of one verse, read from its owner nodes.
///
/// Footnote and cross-reference markers are dropped. A verse number inside
/// a poetry line is part of the line and is kept. Leftover `[1]` and `(a)`
/// tokens are stripped and whitespace collapsed.
///
/// ```
/// use lectio::clean::clean_text;
/// use lectio::conventions::MarkupConventions;
/// use lectio::dom::parse_html;
///
/// let dom = parse_html("<p id=v>In the beginning [1] God created (a) the heavens</p>");
/// let p = dom.get_by_id("v").unwrap();
/// let text = clean_text(&dom, &[p], &MarkupConventions::default());
/// assert_eq!(text, "In the beginning God created the heavens");
/// ```
pub fn clean_text(dom: &ArenaDom, owners: &[ArenaNodeId], conventions: &MarkupConventions) -> String {
    let annotations = conventions.annotation_classes();
    let skip = |d: &ArenaDom, id: ArenaNodeId| is_annotation(d, id, &annotations);

    let mut raw = String::new();
    for &owner in owners {
        dom.collect_text(owner, &mut raw, &skip);
        raw.push(' ');
    }

    let raw = FOOTNOTE_BRACKET.replace_all(&raw, "");
    let raw = CROSSREF_LETTER.replace_all(&raw, "");
    collapse_whitespace(&raw)
}

/// Text of a whole content area for sharing: verse numbers, note markers
/// and note listings removed, whitespace collapsed.
pub fn content_text(dom: &ArenaDom, root: ArenaNodeId, conventions: &MarkupConventions) -> String {
    let annotations = conventions.annotation_classes();
    let skip = |d: &ArenaDom, id: ArenaNodeId| {
        is_annotation(d, id, &annotations)
            || d.has_any_class(id, &conventions.marker_classes)
            || d.has_any_class(id, &conventions.note_block_classes)
    };

    let mut raw = String::new();
    dom.collect_text(root, &mut raw, &skip);
    collapse_whitespace(&raw)
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// A footnote or cross-reference marker, or a `sup` that wraps one.
fn is_annotation(dom: &ArenaDom, id: ArenaNodeId, annotations: &[String]) -> bool {
    if !dom.is_element(id) {
        return false;
    }
    if dom.has_any_class(id, annotations) {
        return true;
    }
    dom.is_tag(id, "sup")
        && dom
            .descendants(id)
            .any(|child| dom.has_any_class(child, annotations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn clean(html: &str) -> String {
        let dom = parse_html(html);
        let owners: Vec<ArenaNodeId> = dom
            .descendants(dom.document())
            .filter(|&id| dom.has_class(id, "owner"))
            .collect();
        clean_text(&dom, &owners, &MarkupConventions::default())
    }

    #[test]
    fn test_strips_brackets_and_letters() {
        assert_eq!(
            clean(r#"<span class="owner">In the beginning [1] God created (a) the heavens</span>"#),
            "In the beginning God created the heavens"
        );
    }

    #[test]
    fn test_skips_note_markers() {
        assert_eq!(
            clean(
                r##"<span class="owner">For God so loved<sup class="footnote"><a class="fn" href="#f1">[1]</a></sup> the world,<sup class="crossref"><a class="cf" title="Rom. 5:8">(a)</a></sup> that he gave</span>"##
            ),
            "For God so loved the world, that he gave"
        );
    }

    #[test]
    fn test_sup_wrapping_note_is_dropped_whole() {
        assert_eq!(
            clean(r#"<span class="owner">grace<sup>note <a class="fn">b</a></sup> upon grace</span>"#),
            "grace upon grace"
        );
    }

    #[test]
    fn test_plain_sup_is_kept() {
        assert_eq!(
            clean(r#"<span class="owner">the 1<sup>st</sup> day</span>"#),
            "the 1st day"
        );
    }

    #[test]
    fn test_poetry_lines_keep_their_number() {
        assert_eq!(
            clean(
                r#"<span class="owner line"><b class="chapter-num">23:1&nbsp;</b>The Lord is my shepherd;</span>
                   <span class="owner line">   I shall not want.</span>"#
            ),
            "23:1 The Lord is my shepherd; I shall not want."
        );
    }

    #[test]
    fn test_empty_is_valid() {
        assert_eq!(clean(r#"<span class="owner"><a class="fn">[2]</a>  </span>"#), "");
        assert_eq!(clean("<p>no owners</p>"), "");
    }

    #[test]
    fn test_live_tree_untouched() {
        let dom = parse_html(r#"<span id="o">text<a class="fn">1</a></span>"#);
        let owner = dom.get_by_id("o").unwrap();
        let before = dom.attached_len();
        clean_text(&dom, &[owner], &MarkupConventions::default());
        assert_eq!(dom.attached_len(), before);
        assert_eq!(dom.subtree_text(owner), "text1");
    }

    #[test]
    fn test_content_text_drops_verse_numbers_and_note_listings() {
        let dom = parse_html(
            r#"<div class="bible-content"><p><b class="verse-num">1 </b>Blessed is the man<sup><a class="fn">a</a></sup></p>
               <div class="footnotes"><p>[a] Or happy</p></div></div>"#,
        );
        let root = dom.find_by_class("bible-content").unwrap();
        assert_eq!(
            content_text(&dom, root, &MarkupConventions::default()),
            "Blessed is the man"
        );
    }
}
