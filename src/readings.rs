//! Daily readings data of a built site.
//!
//! Every year has a `years/{year}/readings.json` file listing the day's
//! passage and the collection (reading plan) it belongs to. A year is
//! fetched at most once; years that are missing or unreadable are cached
//! as empty so the calendar can still render them.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{decode_text, extract_meta_charset};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| Error::InvalidDate(s.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReading {
    /// ISO date, kept as written so a bad entry cannot sink its year.
    pub date: String,
    pub passage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

impl DailyReading {
    pub fn parsed_date(&self) -> Result<NaiveDate> {
        parse_date(&self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearReadings {
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub readings: Vec<DailyReading>,
}

impl YearReadings {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }
}

/// Where year files come from.
pub trait YearSource {
    /// Raw JSON for `year`, or `None` if the site has no such year.
    fn fetch(&self, year: i32) -> Result<Option<String>>;
}

/// A built site on the local filesystem.
#[derive(Debug, Clone)]
pub struct SiteDir {
    root: PathBuf,
}

impl SiteDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn year_dir(&self, year: i32) -> PathBuf {
        self.root.join("years").join(year.to_string())
    }

    /// The rendered scripture fragment for one day, decoded to UTF-8.
    pub fn fragment(&self, date: NaiveDate) -> Result<Option<String>> {
        let path = self
            .year_dir(date.year())
            .join("daily_readings")
            .join(format!("{}_reading.html", date.format(DATE_FORMAT)));
        match fs::read(&path) {
            Ok(bytes) => {
                let charset = extract_meta_charset(&bytes);
                Ok(Some(decode_text(&bytes, charset).into_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl YearSource for SiteDir {
    fn fetch(&self, year: i32) -> Result<Option<String>> {
        let path = self.year_dir(year).join("readings.json");
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// A source with no years of its own, for stores the host fills through
/// [`ReadingStore::insert_json`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Preloaded;

impl YearSource for Preloaded {
    fn fetch(&self, _year: i32) -> Result<Option<String>> {
        Ok(None)
    }
}

/// A collection with the readings that belong to it across all loaded years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub collection: Collection,
    /// Readings in date order.
    pub readings: Vec<DailyReading>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl CollectionSummary {
    /// Display range such as `"Mar - May 2025"`; empty with no dated readings.
    pub fn date_range(&self) -> String {
        match (self.start, self.end) {
            (Some(start), Some(end)) => format_date_range(start, end),
            _ => String::new(),
        }
    }

    fn has_year(&self, year: i32) -> bool {
        let prefix = year.to_string();
        self.readings.iter().any(|r| r.date.starts_with(&prefix))
    }
}

/// In-memory cache of year files over a [`YearSource`].
#[derive(Debug)]
pub struct ReadingStore<S> {
    source: S,
    years: BTreeMap<i32, YearReadings>,
}

impl<S: YearSource> ReadingStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            years: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The readings of `year`, fetched on first use.
    pub fn get_or_fetch(&mut self, year: i32) -> &YearReadings {
        if !self.years.contains_key(&year) {
            let data = self.load(year);
            self.years.insert(year, data);
        } else {
            log::debug!("year {year} served from cache");
        }
        &self.years[&year]
    }

    /// Fetch every year in the range that is not cached yet.
    pub fn fetch_years(&mut self, years: impl IntoIterator<Item = i32>) {
        for year in years {
            self.get_or_fetch(year);
        }
    }

    fn load(&self, year: i32) -> YearReadings {
        let json = match self.source.fetch(year) {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::debug!("no readings for {year}");
                return YearReadings::empty(year);
            }
            Err(e) => {
                log::warn!("could not load readings for {year}: {e}");
                return YearReadings::empty(year);
            }
        };

        parse_year(year, &json)
    }

    /// Cache a year from JSON the host fetched itself, replacing any
    /// earlier entry.
    pub fn insert_json(&mut self, year: i32, json: &str) {
        self.years.insert(year, parse_year(year, json));
    }

    /// Years loaded so far, oldest first.
    pub fn cached_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// Readings of one month (1-based), in file order.
    pub fn readings_for_month(&mut self, year: i32, month: u32) -> Vec<DailyReading> {
        let prefix = format!("{year}-{month:02}");
        self.get_or_fetch(year)
            .readings
            .iter()
            .filter(|r| r.date.starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// The reading scheduled for a date.
    pub fn reading_on(&mut self, date: NaiveDate) -> Option<DailyReading> {
        let key = date.format(DATE_FORMAT).to_string();
        self.get_or_fetch(date.year())
            .readings
            .iter()
            .find(|r| r.date == key)
            .cloned()
    }

    /// Readings across cached years whose passage contains `query`
    /// (case-insensitive), newest first. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<&DailyReading> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        let mut results: Vec<&DailyReading> = self
            .years
            .values()
            .flat_map(|y| &y.readings)
            .filter(|r| r.passage.to_lowercase().contains(&query))
            .collect();
        results.sort_by(|a, b| b.date.cmp(&a.date));
        results
    }

    /// Color of a collection, looked up across cached years.
    pub fn collection_color(&self, id: &str) -> Option<&str> {
        self.years
            .values()
            .flat_map(|y| &y.collections)
            .find(|c| c.id == id)
            .and_then(|c| c.color.as_deref())
    }

    /// Every collection known to the cached years, with its readings.
    ///
    /// A collection listed by several years keeps the first definition
    /// seen. Readings naming an unknown collection are ignored.
    pub fn collections(&self) -> Vec<CollectionSummary> {
        let mut summaries: Vec<CollectionSummary> = Vec::new();
        for collection in self.years.values().flat_map(|y| &y.collections) {
            if !summaries.iter().any(|s| s.collection.id == collection.id) {
                summaries.push(CollectionSummary {
                    collection: collection.clone(),
                    readings: Vec::new(),
                    start: None,
                    end: None,
                });
            }
        }

        for reading in self.years.values().flat_map(|y| &y.readings) {
            let Some(id) = reading.collection.as_deref() else {
                continue;
            };
            if let Some(summary) = summaries.iter_mut().find(|s| s.collection.id == id) {
                summary.readings.push(reading.clone());
            }
        }

        for summary in &mut summaries {
            summary.readings.sort_by(|a, b| a.date.cmp(&b.date));
            let mut dates = summary.readings.iter().filter_map(|r| match r.parsed_date() {
                Ok(date) => Some(date),
                Err(e) => {
                    log::debug!("skipping reading: {e}");
                    None
                }
            });
            summary.start = dates.next();
            summary.end = dates.last().or(summary.start);
        }

        summaries
    }

    /// Collections with at least one reading in `year`, by start date.
    /// Collections without dated readings sort last.
    pub fn collections_for_year(&self, year: i32) -> Vec<CollectionSummary> {
        let mut summaries: Vec<CollectionSummary> = self
            .collections()
            .into_iter()
            .filter(|s| s.has_year(year))
            .collect();
        summaries.sort_by_key(|s| (s.start.is_none(), s.start));
        summaries
    }
}

fn parse_year(year: i32, json: &str) -> YearReadings {
    match serde_json::from_str::<YearReadings>(json) {
        Ok(mut data) => {
            data.year = year;
            data
        }
        Err(e) => {
            log::warn!("could not parse readings for {year}: {e}");
            YearReadings::empty(year)
        }
    }
}

/// Short month range of a collection, e.g. `"Mar 2025"`,
/// `"Mar - May 2025"` or `"Dec 2024 - Jan 2025"`.
pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    let start_month = start.format("%b");
    let end_month = end.format("%b");
    if start.year() != end.year() {
        return format!("{start_month} {} - {end_month} {}", start.year(), end.year());
    }
    if start.month() == end.month() {
        format!("{start_month} {}", start.year())
    } else {
        format!("{start_month} - {end_month} {}", start.year())
    }
}

/// The days linked as previous and next from a reading page.
pub fn neighbors(date: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
    (date.pred_opt(), date.succ_opt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned JSON and counts fetches.
    struct Canned {
        files: HashMap<i32, &'static str>,
        fetches: RefCell<Vec<i32>>,
    }

    impl Canned {
        fn new(files: &[(i32, &'static str)]) -> Self {
            Self {
                files: files.iter().copied().collect(),
                fetches: RefCell::new(Vec::new()),
            }
        }
    }

    impl YearSource for Canned {
        fn fetch(&self, year: i32) -> Result<Option<String>> {
            self.fetches.borrow_mut().push(year);
            Ok(self.files.get(&year).map(|s| s.to_string()))
        }
    }

    const Y2024: &str = r##"{
        "year": 2024,
        "collections": [{"id": "advent", "name": "Advent", "color": "#6b4c9a"}],
        "readings": [
            {"date": "2024-12-01", "passage": "Isaiah 9:1-7", "collection": "advent"},
            {"date": "2024-12-24", "passage": "Luke 2:1-20", "collection": "advent"}
        ]
    }"##;

    const Y2025: &str = r##"{
        "year": 2025,
        "collections": [
            {"id": "advent", "name": "Advent (duplicate)"},
            {"id": "lent", "name": "Lent", "description": "Forty days"}
        ],
        "readings": [
            {"date": "2025-01-05", "passage": "Luke 2:21-40", "collection": "advent"},
            {"date": "2025-03-05", "passage": "Psalm 51", "collection": "lent", "theme": "Repentance"},
            {"date": "2025-04-17", "passage": "John 13:1-17", "collection": "lent"},
            {"date": "2025-04-18", "passage": "Luke 23:26-49"},
            {"date": "not-a-date", "passage": "Luke 24", "collection": "lent"}
        ]
    }"##;

    fn store() -> ReadingStore<Canned> {
        let mut store = ReadingStore::new(Canned::new(&[(2024, Y2024), (2025, Y2025), (2023, "{oops")]));
        store.fetch_years(2023..=2025);
        store
    }

    #[test]
    fn test_fetch_once() {
        let mut store = store();
        store.get_or_fetch(2025);
        store.get_or_fetch(2025);
        assert_eq!(*store.source().fetches.borrow(), vec![2023, 2024, 2025]);
    }

    #[test]
    fn test_missing_and_bad_years_are_empty() {
        let mut store = store();
        assert_eq!(store.get_or_fetch(2023), &YearReadings::empty(2023));
        assert_eq!(store.get_or_fetch(1999), &YearReadings::empty(1999));
    }

    #[test]
    fn test_readings_for_month() {
        let mut store = store();
        let april: Vec<String> = store
            .readings_for_month(2025, 4)
            .into_iter()
            .map(|r| r.passage)
            .collect();
        assert_eq!(april, vec!["John 13:1-17", "Luke 23:26-49"]);
        assert!(store.readings_for_month(2025, 2).is_empty());
    }

    #[test]
    fn test_reading_on() {
        let mut store = store();
        let date = parse_date("2025-03-05").unwrap();
        assert_eq!(store.reading_on(date).unwrap().theme.as_deref(), Some("Repentance"));
    }

    #[test]
    fn test_search_newest_first() {
        let store = store();
        let dates: Vec<&str> = store.search("  LUKE 2:").iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-01-05", "2024-12-24"]);
        assert_eq!(store.search("psalm").len(), 1);
        assert!(store.search("   ").is_empty());
    }

    #[test]
    fn test_collections_span_years() {
        let store = store();
        let collections = store.collections();
        assert_eq!(collections.len(), 2);

        let advent = &collections[0];
        assert_eq!(advent.collection.name, "Advent");
        assert_eq!(advent.readings.len(), 3);
        assert_eq!(advent.date_range(), "Dec 2024 - Jan 2025");

        let lent = &collections[1];
        assert_eq!(lent.start, Some(parse_date("2025-03-05").unwrap()));
        assert_eq!(lent.end, Some(parse_date("2025-04-17").unwrap()));
        assert_eq!(lent.date_range(), "Mar - Apr 2025");
        assert_eq!(store.collection_color("advent"), Some("#6b4c9a"));
        assert_eq!(store.collection_color("lent"), None);
    }

    #[test]
    fn test_collections_for_year_sorted_by_start() {
        let store = store();
        let ids = |year| {
            store
                .collections_for_year(year)
                .into_iter()
                .map(|s| s.collection.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(2025), vec!["advent", "lent"]);
        assert_eq!(ids(2024), vec!["advent"]);
        assert!(ids(2022).is_empty());
    }

    #[test]
    fn test_format_date_range() {
        let d = |s| parse_date(s).unwrap();
        assert_eq!(format_date_range(d("2025-03-01"), d("2025-03-31")), "Mar 2025");
        assert_eq!(format_date_range(d("2025-03-01"), d("2025-05-02")), "Mar - May 2025");
        assert_eq!(format_date_range(d("2024-12-01"), d("2025-01-06")), "Dec 2024 - Jan 2025");
    }

    #[test]
    fn test_neighbors_cross_year() {
        let (prev, next) = neighbors(parse_date("2025-01-01").unwrap());
        assert_eq!(prev, Some(parse_date("2024-12-31").unwrap()));
        assert_eq!(next, Some(parse_date("2025-01-02").unwrap()));
    }

    #[test]
    fn test_insert_json_without_source() {
        let mut store = ReadingStore::new(Preloaded);
        store.insert_json(2024, Y2024);
        assert_eq!(store.get_or_fetch(2024).readings.len(), 2);
        assert!(store.get_or_fetch(2030).readings.is_empty());
        assert_eq!(store.cached_years().collect::<Vec<_>>(), vec![2024, 2030]);
    }

    #[test]
    fn test_invalid_date() {
        assert!(matches!(parse_date("2025-02-30"), Err(Error::InvalidDate(_))));
    }
}
