//! Verse identities, verse units and the per-page verse index.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::books::name_for_index;
use crate::dom::ArenaNodeId;

/// Marker ids look like `v58001005-1`: book, chapter, verse, then a
/// per-occurrence suffix the engine ignores.
static MARKER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d{2})(\d{3})(\d{3})-").expect("valid marker pattern"));

/// Poetry line ids look like `p58001005_06-1`; the eight digits name the
/// verse the line belongs to.
static LINE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^p(\d{2})(\d{3})(\d{3})").expect("valid line pattern"));

/// Canonical form written to `data-verse-id`.
static CANONICAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d{2})(\d{3})(\d{3})$").expect("valid canonical pattern"));

/// Identity of one verse: book index, chapter and verse number.
///
/// Ordering is by book, then chapter, then verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerseId {
    pub book: u32,
    pub chapter: u32,
    pub verse: u32,
}

impl VerseId {
    pub fn new(book: u32, chapter: u32, verse: u32) -> Self {
        Self {
            book,
            chapter,
            verse,
        }
    }

    /// Parse a verse/chapter marker id such as `v58001005-1`.
    ///
    /// Returns `None` for anything that does not match the fixed-width
    /// pattern, and for chapter or verse zero.
    pub fn from_marker_id(id: &str) -> Option<Self> {
        Self::from_captures(&MARKER_ID, id)
    }

    /// Parse the verse prefix of a poetry line id such as `p58001005_06-1`.
    pub fn from_line_id(id: &str) -> Option<Self> {
        Self::from_captures(&LINE_ID, id)
    }

    fn from_captures(pattern: &Regex, text: &str) -> Option<Self> {
        let caps = pattern.captures(text)?;
        let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let id = Self::new(field(1)?, field(2)?, field(3)?);
        (id.chapter > 0 && id.verse > 0).then_some(id)
    }

    /// Canonical book name for this verse.
    pub fn book_name(&self) -> Cow<'static, str> {
        name_for_index(self.book)
    }
}

impl fmt::Display for VerseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{:02}{:03}{:03}", self.book, self.chapter, self.verse)
    }
}

/// Error returned when a string is not a canonical verse id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVerseIdError(pub String);

impl fmt::Display for ParseVerseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a verse id: {:?}", self.0)
    }
}

impl std::error::Error for ParseVerseIdError {}

impl FromStr for VerseId {
    type Err = ParseVerseIdError;

    /// Parse the canonical `vBBCCCVVV` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_captures(&CANONICAL_ID, s).ok_or_else(|| ParseVerseIdError(s.to_string()))
    }
}

impl Serialize for VerseId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One selectable verse and the rendered nodes that hold its text.
///
/// Prose verses have a single owner (the wrapper span); poetry verses own
/// every line they span. The unit never stores text: it is read from the
/// owners on demand so it always reflects the live tree.
#[derive(Debug, Clone, Serialize)]
pub struct VerseUnit {
    pub id: VerseId,
    pub book: Cow<'static, str>,
    pub chapter: u32,
    pub verse: u32,
    #[serde(skip)]
    pub owners: Vec<ArenaNodeId>,
}

impl VerseUnit {
    pub fn new(id: VerseId) -> Self {
        Self {
            id,
            book: id.book_name(),
            chapter: id.chapter,
            verse: id.verse,
            owners: Vec::new(),
        }
    }
}

/// All verse units of one page, in document order of their first owner.
///
/// Built once by extraction and never edited afterwards; replacing the
/// page content means building a new index.
#[derive(Debug, Clone, Default)]
pub struct VerseIndex {
    units: Vec<VerseUnit>,
    lookup: HashMap<VerseId, usize>,
}

impl VerseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an owner node to a verse, creating the unit on first sight.
    pub(crate) fn attach(&mut self, id: VerseId, owner: ArenaNodeId) {
        let slot = match self.lookup.get(&id) {
            Some(&slot) => slot,
            None => {
                self.units.push(VerseUnit::new(id));
                self.lookup.insert(id, self.units.len() - 1);
                self.units.len() - 1
            }
        };
        let owners = &mut self.units[slot].owners;
        if !owners.contains(&owner) {
            owners.push(owner);
        }
    }

    /// Order owners within each unit, and units by their first owner,
    /// using the given document position of each node.
    pub(crate) fn sort_by_document_order<F>(&mut self, position: F)
    where
        F: Fn(ArenaNodeId) -> usize,
    {
        for unit in &mut self.units {
            unit.owners.sort_by_key(|&owner| position(owner));
        }
        self.units.sort_by_key(|unit| {
            unit.owners
                .first()
                .map(|&owner| position(owner))
                .unwrap_or(usize::MAX)
        });
        self.lookup = self
            .units
            .iter()
            .enumerate()
            .map(|(slot, unit)| (unit.id, slot))
            .collect();
    }

    pub fn get(&self, id: &VerseId) -> Option<&VerseUnit> {
        self.lookup.get(id).map(|&slot| &self.units[slot])
    }

    pub fn contains(&self, id: &VerseId) -> bool {
        self.lookup.contains_key(id)
    }

    /// Owner nodes of a verse; empty for unknown ids.
    pub fn owners(&self, id: &VerseId) -> &[ArenaNodeId] {
        self.get(id).map(|u| u.owners.as_slice()).unwrap_or(&[])
    }

    /// The verse a node belongs to, if it is one of the recorded owners.
    pub fn unit_owning(&self, node: ArenaNodeId) -> Option<&VerseUnit> {
        self.units.iter().find(|u| u.owners.contains(&node))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VerseUnit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Total number of owner nodes across all units.
    pub fn owner_count(&self) -> usize {
        self.units.iter().map(|u| u.owners.len()).sum()
    }
}

impl<'a> IntoIterator for &'a VerseIndex {
    type Item = &'a VerseUnit;
    type IntoIter = std::slice::Iter<'a, VerseUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_id() {
        let id = VerseId::from_marker_id("v58001005-1").unwrap();
        assert_eq!(id, VerseId::new(58, 1, 5));
        assert_eq!(id.book_name(), "Hebrews");
        assert_eq!(id.to_string(), "v58001005");
    }

    #[test]
    fn test_marker_id_rejects_malformed() {
        assert_eq!(VerseId::from_marker_id("v58001005"), None);
        assert_eq!(VerseId::from_marker_id("v5800105-1"), None);
        assert_eq!(VerseId::from_marker_id("x58001005-1"), None);
        assert_eq!(VerseId::from_marker_id("va8001005-1"), None);
        assert_eq!(VerseId::from_marker_id("v58000005-1"), None);
        assert_eq!(VerseId::from_marker_id("v58001000-1"), None);
        assert_eq!(VerseId::from_marker_id(""), None);
    }

    #[test]
    fn test_line_id() {
        assert_eq!(
            VerseId::from_line_id("p58001005_06-1"),
            Some(VerseId::new(58, 1, 5))
        );
        assert_eq!(VerseId::from_line_id("p5800100"), None);
        assert_eq!(VerseId::from_line_id("v58001005-1"), None);
    }

    #[test]
    fn test_canonical_roundtrip() {
        let id = VerseId::new(19, 119, 176);
        assert_eq!(id.to_string(), "v19119176");
        assert_eq!("v19119176".parse::<VerseId>(), Ok(id));
        assert!("v19119176-1".parse::<VerseId>().is_err());
    }

    #[test]
    fn test_ordering_is_book_chapter_verse() {
        let mut ids = vec![
            VerseId::new(58, 2, 1),
            VerseId::new(58, 1, 10),
            VerseId::new(1, 50, 26),
            VerseId::new(58, 1, 9),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                VerseId::new(1, 50, 26),
                VerseId::new(58, 1, 9),
                VerseId::new(58, 1, 10),
                VerseId::new(58, 2, 1),
            ]
        );
    }

    #[test]
    fn test_index_attach_dedupes_owners() {
        let mut index = VerseIndex::new();
        let id = VerseId::new(19, 23, 1);
        index.attach(id, ArenaNodeId(4));
        index.attach(id, ArenaNodeId(9));
        index.attach(id, ArenaNodeId(4));

        assert_eq!(index.len(), 1);
        assert_eq!(index.owners(&id), &[ArenaNodeId(4), ArenaNodeId(9)]);
        assert_eq!(index.unit_owning(ArenaNodeId(9)).map(|u| u.id), Some(id));
        assert!(index.owners(&VerseId::new(19, 23, 2)).is_empty());
    }

    #[test]
    fn test_unit_serializes_without_owners() {
        let mut index = VerseIndex::new();
        index.attach(VerseId::new(43, 3, 16), ArenaNodeId(1));
        let json = serde_json::to_string(index.iter().next().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"id":"v43003016","book":"John","chapter":3,"verse":16}"#
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_canonical_id_round_trips(book in 1u32..=66, chapter in 1u32..=150, verse in 1u32..=176) {
                let id = VerseId::new(book, chapter, verse);
                let text = id.to_string();
                prop_assert_eq!(text.len(), 9);
                prop_assert_eq!(text.parse::<VerseId>().unwrap(), id);
                let marker = format!("{text}-1");
                prop_assert_eq!(VerseId::from_marker_id(&marker), Some(id));
            }
        }
    }
}
