//! Canonical citation strings for a verse selection.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::verse::VerseUnit;

/// The verse part of a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "verses", rename_all = "snake_case")]
pub enum VerseSpec {
    Single(u32),
    /// First and last of a run of consecutive verses.
    Range(u32, u32),
    List(Vec<u32>),
}

impl VerseSpec {
    /// Build from verse numbers that are already in canonical order.
    fn from_sorted(verses: &[u32]) -> Option<Self> {
        match verses {
            [] => None,
            [only] => Some(Self::Single(*only)),
            [first, .., last] if verses.windows(2).all(|w| w[0].checked_add(1) == Some(w[1])) => {
                Some(Self::Range(*first, *last))
            }
            _ => Some(Self::List(verses.to_vec())),
        }
    }
}

impl fmt::Display for VerseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(v) => write!(f, "{v}"),
            Self::Range(first, last) => write!(f, "{first}-{last}"),
            Self::List(verses) => {
                for (i, v) in verses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                Ok(())
            }
        }
    }
}

/// A citation such as `John 3:16-18`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub book: Cow<'static, str>,
    pub chapter: u32,
    pub verses: VerseSpec,
}

impl Reference {
    /// Build the reference for a set of selected units.
    ///
    /// Units are put in `(chapter, verse)` order and the book and chapter
    /// are taken from the first one. Selections spanning chapters or books
    /// are not rejected: their verse numbers are listed under the first
    /// unit's chapter. Returns `None` for an empty selection.
    ///
    /// ```
    /// use lectio::reference::Reference;
    /// use lectio::verse::{VerseId, VerseUnit};
    ///
    /// let units: Vec<VerseUnit> = [5, 3, 4]
    ///     .into_iter()
    ///     .map(|v| VerseUnit::new(VerseId::new(1, 1, v)))
    ///     .collect();
    /// let reference = Reference::from_units(units.iter()).unwrap();
    /// assert_eq!(reference.to_string(), "Genesis 1:3-5");
    /// ```
    pub fn from_units<'a, I>(units: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a VerseUnit>,
    {
        let mut sorted: Vec<&VerseUnit> = units.into_iter().collect();
        sorted.sort_by_key(|u| (u.chapter, u.verse));

        let first = *sorted.first()?;
        let verses: Vec<u32> = sorted.iter().map(|u| u.verse).collect();

        Some(Self {
            book: first.book.clone(),
            chapter: first.chapter,
            verses: VerseSpec::from_sorted(&verses)?,
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verses)
    }
}
