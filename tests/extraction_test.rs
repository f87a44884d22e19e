//! Verse extraction over ESV-style reading fragments.
//!
//! Fixtures cover the three layouts a reading page can have: prose
//! paragraphs, poetry line groups, and prose interleaved with quoted poetry.

use lectio::dom::{ArenaDom, inner_html, parse_html};
use lectio::{MarkupConventions, ReadingSession, VerseId, VerseIndex, extract_verses};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("{}/{}", FIXTURES_DIR, name)).expect("Failed to read fixture")
}

fn verses(index: &VerseIndex) -> Vec<(u32, u32)> {
    index.iter().map(|u| (u.chapter, u.verse)).collect()
}

// ============================================================================
// Prose
// ============================================================================

#[test]
fn test_prose_fixture_units() {
    let session = ReadingSession::from_html(&fixture("hebrews1_prose.html"));
    assert_eq!(session.dom().element_id(session.root()), Some("bibleContent"));
    assert_eq!(verses(session.index()), vec![(1, 1), (1, 2), (1, 3), (1, 4)]);

    for unit in session.index() {
        assert_eq!(unit.book, "Hebrews");
        assert_eq!(unit.owners.len(), 1, "prose verse {} has one wrapper", unit.id);
    }

    assert_eq!(
        session.verse_text(&VerseId::new(58, 1, 2)).unwrap(),
        "but in these last days he has spoken to us by his Son, whom he appointed the heir of all things, through whom also he created the world."
    );
    assert_eq!(
        session.verse_text(&VerseId::new(58, 1, 3)).unwrap(),
        "He is the radiance of the glory of God and the exact imprint of his nature, and he upholds the universe by the word of his power. After making purification for sins, he sat down at the right hand of the Majesty on high,"
    );
}

#[test]
fn test_prose_heading_and_note_listing_untouched() {
    let session = ReadingSession::from_html(&fixture("hebrews1_prose.html"));
    let dom = session.dom();
    let heading = dom.find_by_tag("h3").unwrap();
    assert!(!dom.has_class(heading, "verse-wrapper"));
    let listing = dom.find_by_class("footnotes").unwrap();
    assert!(dom.descendants(listing).all(|id| !dom.has_class(id, "verse-wrapper")));
}

// ============================================================================
// Poetry
// ============================================================================

#[test]
fn test_poetry_fixture_owners() {
    let session = ReadingSession::from_html(&fixture("psalm23_poetry.html"));
    assert_eq!(verses(session.index()), vec![(23, 1), (23, 2), (23, 3)]);

    let owners: Vec<usize> = session.index().iter().map(|u| u.owners.len()).collect();
    assert_eq!(owners, vec![1, 2, 3]);

    let dom = session.dom();
    for unit in session.index() {
        for &owner in &unit.owners {
            assert!(dom.has_class(owner, "line"), "poetry owners are the lines themselves");
        }
    }

    assert_eq!(
        session.verse_text(&VerseId::new(19, 23, 3)).unwrap(),
        "3 He restores my soul. He leads me in paths of righteousness for his name\u{2019}s sake."
    );
}

#[test]
fn test_poetry_headings_not_mistaken_for_lines() {
    let session = ReadingSession::from_html(&fixture("psalm23_poetry.html"));
    let dom = session.dom();
    let title = dom.find_by_class("psalm-title").unwrap();
    assert!(!dom.has_class(title, "verse-wrapper"));
    assert!(session.index().unit_owning(title).is_none());
}

// ============================================================================
// Mixed prose and poetry
// ============================================================================

#[test]
fn test_mixed_fixture_quote_lines_join_their_verse() {
    let session = ReadingSession::from_html(&fixture("hebrews1_mixed.html"));
    // Verse 7's marker id is malformed and is skipped.
    assert_eq!(verses(session.index()), vec![(1, 4), (1, 5), (1, 6)]);

    let five = session.index().get(&VerseId::new(58, 1, 5)).unwrap();
    assert_eq!(five.owners.len(), 3);
    let dom = session.dom();
    assert!(dom.is_tag(five.owners[0], "span") && !dom.has_class(five.owners[0], "line"));
    assert!(dom.has_class(five.owners[1], "line"));
    assert!(dom.has_class(five.owners[2], "line"));

    assert_eq!(
        session.verse_text(&VerseId::new(58, 1, 5)).unwrap(),
        "For to which of the angels did God ever say, \u{201c}You are my Son, today I have begotten you\u{201d}?"
    );
    assert_eq!(
        session.verse_text(&VerseId::new(58, 1, 6)).unwrap(),
        "And again, when he brings the firstborn into the world, he says, \u{201c}Let all God\u{2019}s angels worship him.\u{201d}"
    );
}

#[test]
fn test_inline_quote_line_belongs_to_its_own_verse() {
    let session = ReadingSession::from_html(
        r#"<div id="bibleContent">
             <p><b class="verse-num" id="v58001004-1">4&nbsp;</b>having become superior, <span id="p58001005_02-1" class="line">You are my Son</span></p>
             <p><b class="verse-num" id="v58001005-1">5&nbsp;</b>For to which</p>
           </div>"#,
    );
    assert_eq!(session.index().owner_count(), 3);
    assert_eq!(session.verse_text(&VerseId::new(58, 1, 4)).unwrap(), "having become superior,");
    assert_eq!(session.verse_text(&VerseId::new(58, 1, 5)).unwrap(), "You are my Son For to which");
}

// ============================================================================
// Tagging convention and idempotence
// ============================================================================

#[test]
fn test_data_attributes_round_trip_identity() {
    for name in ["hebrews1_prose.html", "psalm23_poetry.html", "hebrews1_mixed.html"] {
        let session = ReadingSession::from_html(&fixture(name));
        let dom = session.dom();
        for unit in session.index() {
            for &owner in &unit.owners {
                let id: VerseId = dom.get_attr(owner, "data-verse-id").unwrap().parse().unwrap();
                assert_eq!(id, unit.id, "{name}");
                assert_eq!(dom.get_attr(owner, "data-book"), Some(unit.book.as_ref()));
                assert_eq!(dom.get_attr(owner, "data-chapter"), Some(unit.chapter.to_string().as_str()));
                assert_eq!(dom.get_attr(owner, "data-verse"), Some(unit.verse.to_string().as_str()));
                assert!(dom.has_class(owner, "verse-wrapper"));
            }
        }
    }
}

fn extract_twice(html: &str) -> (ArenaDom, VerseIndex, VerseIndex, usize, usize) {
    let mut dom = parse_html(html);
    let root = dom.find_by_tag("body").unwrap();
    let conventions = MarkupConventions::default();
    let first = extract_verses(&mut dom, root, &conventions);
    let nodes_first = dom.attached_len();
    let second = extract_verses(&mut dom, root, &conventions);
    let nodes_second = dom.attached_len();
    (dom, first, second, nodes_first, nodes_second)
}

#[test]
fn test_second_extraction_keeps_node_count() {
    for name in ["hebrews1_prose.html", "psalm23_poetry.html", "hebrews1_mixed.html"] {
        let (_, first, second, nodes_first, nodes_second) = extract_twice(&fixture(name));
        assert_eq!(nodes_first, nodes_second, "{name}");
        assert_eq!(first.owner_count(), second.owner_count(), "{name}");
        let shape = |i: &VerseIndex| i.iter().map(|u| (u.id, u.owners.clone())).collect::<Vec<_>>();
        assert_eq!(shape(&first), shape(&second), "{name}");
    }
}

#[test]
fn test_annotated_markup_reparses_to_same_units() {
    let session = ReadingSession::from_html(&fixture("hebrews1_mixed.html"));
    let annotated = session.annotated_html();

    let reparsed = ReadingSession::from_html(&annotated);
    assert_eq!(verses(reparsed.index()), verses(session.index()));
    // The parser drops whitespace ahead of the implied <body>.
    assert_eq!(
        inner_html(reparsed.dom(), reparsed.root()).trim(),
        annotated.trim()
    );
}
