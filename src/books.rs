//! Canonical English book names, indexed 1 to 66 in Protestant canon order.

use std::borrow::Cow;

const BOOK_NAMES: [&str; 66] = [
    "Genesis",
    "Exodus",
    "Leviticus",
    "Numbers",
    "Deuteronomy",
    "Joshua",
    "Judges",
    "Ruth",
    "1 Samuel",
    "2 Samuel",
    "1 Kings",
    "2 Kings",
    "1 Chronicles",
    "2 Chronicles",
    "Ezra",
    "Nehemiah",
    "Esther",
    "Job",
    "Psalms",
    "Proverbs",
    "Ecclesiastes",
    "Song of Solomon",
    "Isaiah",
    "Jeremiah",
    "Lamentations",
    "Ezekiel",
    "Daniel",
    "Hosea",
    "Joel",
    "Amos",
    "Obadiah",
    "Jonah",
    "Micah",
    "Nahum",
    "Habakkuk",
    "Zephaniah",
    "Haggai",
    "Zechariah",
    "Malachi",
    "Matthew",
    "Mark",
    "Luke",
    "John",
    "Acts",
    "Romans",
    "1 Corinthians",
    "2 Corinthians",
    "Galatians",
    "Ephesians",
    "Philippians",
    "Colossians",
    "1 Thessalonians",
    "2 Thessalonians",
    "1 Timothy",
    "2 Timothy",
    "Titus",
    "Philemon",
    "Hebrews",
    "James",
    "1 Peter",
    "2 Peter",
    "1 John",
    "2 John",
    "3 John",
    "Jude",
    "Revelation",
];

/// Number of books in the table.
pub const BOOK_COUNT: u32 = BOOK_NAMES.len() as u32;

/// Name of the book at `index` (1-based).
///
/// Never fails: indices outside 1..=66 come back as `"Book {index}"`.
///
/// ```
/// use lectio::books::name_for_index;
///
/// assert_eq!(name_for_index(58), "Hebrews");
/// assert_eq!(name_for_index(67), "Book 67");
/// ```
pub fn name_for_index(index: u32) -> Cow<'static, str> {
    match index.checked_sub(1).and_then(|i| BOOK_NAMES.get(i as usize)) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("Book {index}")),
    }
}

/// Reverse lookup, exact match on the canonical name.
pub fn index_for_name(name: &str) -> Option<u32> {
    BOOK_NAMES
        .iter()
        .position(|b| *b == name)
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(name_for_index(1), "Genesis");
        assert_eq!(name_for_index(66), "Revelation");
        assert_eq!(name_for_index(19), "Psalms");
        assert_eq!(name_for_index(22), "Song of Solomon");
    }

    #[test]
    fn test_out_of_range_is_total() {
        assert_eq!(name_for_index(0), "Book 0");
        assert_eq!(name_for_index(99), "Book 99");
        assert_eq!(name_for_index(u32::MAX), format!("Book {}", u32::MAX));
    }

    #[test]
    fn test_index_roundtrip() {
        for index in 1..=BOOK_COUNT {
            assert_eq!(index_for_name(&name_for_index(index)), Some(index));
        }
        assert_eq!(index_for_name("Book 67"), None);
    }
}
