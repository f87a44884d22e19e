//! WASM bindings for browser reading pages.
//!
//! The page hands over its scripture markup as a string, swaps in the
//! annotated markup the session returns, and forwards clicks by the
//! `data-verse-id` of the clicked `.verse-wrapper`. Structured results are
//! returned as JSON strings. Footnotes and cross-references are listed in
//! document order, matching `querySelectorAll` over the same markup.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::books::name_for_index;
use crate::export::{ClipboardError, ExportPhase, ExportState, Step};
use crate::readings::{self, Preloaded, ReadingStore};
use crate::session::ReadingSession;
use crate::verse::VerseId;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Host-facing shape of an export step.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum StepView {
    Primary { text: String },
    Fallback { text: String },
    Confirm { notice: &'static str, hold_ms: u64 },
    Failed { notice: &'static str },
}

impl From<Step> for StepView {
    fn from(step: Step) -> Self {
        match step {
            Step::Primary(text) => Self::Primary { text },
            Step::Fallback(text) => Self::Fallback { text },
            Step::Confirm { notice, hold } => Self::Confirm {
                notice,
                hold_ms: hold.as_millis() as u64,
            },
            Step::Failed { notice } => Self::Failed { notice },
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn step_json(step: Option<Step>) -> Result<Option<String>, JsValue> {
    step.map(|s| to_json(&StepView::from(s))).transpose()
}

fn export_state_name(state: ExportState) -> &'static str {
    match state {
        ExportState::Idle => "idle",
        ExportState::Exporting(ExportPhase::Primary) => "primary",
        ExportState::Exporting(ExportPhase::Fallback) => "fallback",
        ExportState::Exporting(ExportPhase::Confirming) => "confirming",
    }
}

fn outcome(ok: bool, error: Option<String>) -> Result<(), ClipboardError> {
    if ok {
        Ok(())
    } else {
        Err(ClipboardError(error.unwrap_or_else(|| "write rejected".into())))
    }
}

/// The verse selector of one reading page.
#[wasm_bindgen]
pub struct VerseSession {
    inner: ReadingSession,
}

#[wasm_bindgen]
impl VerseSession {
    #[wasm_bindgen(constructor)]
    pub fn new(html: &str) -> VerseSession {
        VerseSession {
            inner: ReadingSession::from_html(html),
        }
    }

    /// Content container markup with verse wrappers applied.
    #[wasm_bindgen(js_name = annotatedHtml)]
    pub fn annotated_html(&self) -> String {
        self.inner.annotated_html()
    }

    #[wasm_bindgen(js_name = replaceContent)]
    pub fn replace_content(&mut self, html: &str) {
        self.inner.replace_content(html);
    }

    /// All verse units as a JSON array.
    #[wasm_bindgen(js_name = unitsJson)]
    pub fn units_json(&self) -> Result<String, JsValue> {
        to_json(&self.inner.index().iter().collect::<Vec<_>>())
    }

    /// Toggle the verse with the given canonical id, e.g. `v43003016`.
    pub fn toggle(&mut self, verse_id: &str) -> Result<usize, JsValue> {
        let id: VerseId = verse_id
            .parse()
            .map_err(|e: crate::verse::ParseVerseIdError| JsValue::from_str(&e.to_string()))?;
        Ok(self.inner.toggle(id))
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }

    /// Whether the copy button should be enabled.
    #[wasm_bindgen(js_name = canExport)]
    pub fn can_export(&self) -> bool {
        self.inner.can_export()
    }

    /// `"idle"`, `"primary"`, `"fallback"` or `"confirming"`.
    #[wasm_bindgen(js_name = exportState)]
    pub fn export_state(&self) -> String {
        export_state_name(self.inner.export_state()).to_string()
    }

    /// Selected verse ids, in selection order, as a JSON array.
    #[wasm_bindgen(js_name = selectedJson)]
    pub fn selected_json(&self) -> Result<String, JsValue> {
        to_json(&self.inner.selection().iter().collect::<Vec<_>>())
    }

    pub fn reference(&self) -> Option<String> {
        self.inner.reference().map(|r| r.to_string())
    }

    #[wasm_bindgen(js_name = exportText)]
    pub fn export_text(&self) -> Option<String> {
        self.inner.export_text()
    }

    /// Start a copy. Returns the first step as JSON, or nothing if there is
    /// no selection or a copy is already running.
    #[wasm_bindgen(js_name = beginExport)]
    pub fn begin_export(&mut self) -> Result<Option<String>, JsValue> {
        step_json(self.inner.begin_export())
    }

    #[wasm_bindgen(js_name = completePrimary)]
    pub fn complete_primary(&mut self, ok: bool, error: Option<String>) -> Result<Option<String>, JsValue> {
        step_json(self.inner.complete_primary(outcome(ok, error)))
    }

    #[wasm_bindgen(js_name = completeFallback)]
    pub fn complete_fallback(&mut self, ok: bool, error: Option<String>) -> Result<Option<String>, JsValue> {
        step_json(self.inner.complete_fallback(outcome(ok, error)))
    }

    /// Call when the confirmation hold has elapsed.
    pub fn settle(&mut self) -> bool {
        self.inner.settle()
    }

    #[wasm_bindgen(js_name = footnotesJson)]
    pub fn footnotes_json(&self) -> Result<String, JsValue> {
        to_json(&self.inner.footnotes())
    }

    #[wasm_bindgen(js_name = crossrefsJson)]
    pub fn crossrefs_json(&self) -> Result<String, JsValue> {
        to_json(&self.inner.crossrefs())
    }

    #[wasm_bindgen(js_name = passageText)]
    pub fn passage_text(&self, passage: &str) -> String {
        self.inner.passage_text(passage)
    }
}

/// Readings calendar over year files the page fetched itself.
#[wasm_bindgen]
pub struct ReadingsCalendar {
    store: ReadingStore<Preloaded>,
}

#[wasm_bindgen]
impl ReadingsCalendar {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ReadingsCalendar {
        ReadingsCalendar {
            store: ReadingStore::new(Preloaded),
        }
    }

    /// Add a fetched `readings.json`. Invalid JSON caches an empty year.
    #[wasm_bindgen(js_name = insertYear)]
    pub fn insert_year(&mut self, year: i32, json: &str) {
        self.store.insert_json(year, json);
    }

    #[wasm_bindgen(js_name = monthJson)]
    pub fn month_json(&mut self, year: i32, month: u32) -> Result<String, JsValue> {
        to_json(&self.store.readings_for_month(year, month))
    }

    #[wasm_bindgen(js_name = searchJson)]
    pub fn search_json(&self, query: &str) -> Result<String, JsValue> {
        to_json(&self.store.search(query))
    }

    #[wasm_bindgen(js_name = collectionsJson)]
    pub fn collections_json(&self, year: i32) -> Result<String, JsValue> {
        let collections: Vec<serde_json::Value> = self
            .store
            .collections_for_year(year)
            .iter()
            .map(|summary| {
                serde_json::json!({
                    "collection": summary.collection,
                    "start": summary.start,
                    "end": summary.end,
                    "date_range": summary.date_range(),
                    "readings": summary.readings.len(),
                })
            })
            .collect();
        to_json(&collections)
    }

    #[wasm_bindgen(js_name = collectionColor)]
    pub fn collection_color(&self, id: &str) -> Option<String> {
        self.store.collection_color(id).map(str::to_string)
    }
}

impl Default for ReadingsCalendar {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen(js_name = bookName)]
pub fn book_name(index: u32) -> String {
    name_for_index(index).into_owned()
}

/// `"Mar - May 2025"` style range for two ISO dates.
#[wasm_bindgen(js_name = formatDateRange)]
pub fn format_date_range(start: &str, end: &str) -> Result<String, JsValue> {
    let start = readings::parse_date(start).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let end = readings::parse_date(end).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(readings::format_date_range(start, end))
}
