//! One page of scripture under interactive selection.

use crate::clean::{clean_text, content_text};
use crate::conventions::MarkupConventions;
use crate::dom::{ArenaDom, ArenaNodeId, inner_html, parse_html};
use crate::export::{Clipboard, ClipboardError, ExportConfig, ExportMachine, ExportState, Step};
use crate::extract::extract_verses;
use crate::notes::{CrossRefs, Footnote};
use crate::reference::Reference;
use crate::selection::Selection;
use crate::verse::{VerseId, VerseIndex, VerseUnit};

/// The verse selector of a reading page.
///
/// Owns the parsed markup, the verse index built from it, the current
/// selection and the export machine. Each page gets its own session; there
/// is no shared state between sessions.
///
/// ```
/// use lectio::ReadingSession;
/// use lectio::export::MemoryClipboard;
/// use lectio::verse::VerseId;
///
/// let mut session = ReadingSession::from_html(
///     r#"<div id="bibleContent"><p><b class="verse-num" id="v43011035-1">35 </b>Jesus wept.</p></div>"#,
/// );
/// session.toggle(VerseId::new(43, 11, 35));
///
/// let mut clipboard = MemoryClipboard::new();
/// session.copy_selection(&mut clipboard, &mut MemoryClipboard::unavailable());
/// assert_eq!(clipboard.contents(), Some("Jesus wept. - John 11:35"));
/// ```
#[derive(Debug)]
pub struct ReadingSession {
    dom: ArenaDom,
    root: ArenaNodeId,
    conventions: MarkupConventions,
    index: VerseIndex,
    selection: Selection,
    exporter: ExportMachine,
}

impl ReadingSession {
    /// Parse a page or fragment with the default conventions.
    pub fn from_html(html: &str) -> Self {
        Self::from_dom(parse_html(html), MarkupConventions::default(), ExportConfig::default())
    }

    pub fn from_html_with(html: &str, conventions: MarkupConventions, config: ExportConfig) -> Self {
        Self::from_dom(parse_html(html), conventions, config)
    }

    /// Annotate an already parsed tree.
    pub fn from_dom(mut dom: ArenaDom, conventions: MarkupConventions, config: ExportConfig) -> Self {
        let root = content_root(&dom, &conventions);
        let index = extract_verses(&mut dom, root, &conventions);
        Self {
            dom,
            root,
            conventions,
            index,
            selection: Selection::new(),
            exporter: ExportMachine::new(config),
        }
    }

    /// Swap in new page content. The selection is dropped and the verse
    /// index rebuilt; an export in flight is abandoned.
    pub fn replace_content(&mut self, html: &str) {
        self.dom = parse_html(html);
        self.root = content_root(&self.dom, &self.conventions);
        self.index = extract_verses(&mut self.dom, self.root, &self.conventions);
        self.selection.reset();
        self.exporter = ExportMachine::new(self.exporter.config().clone());
    }

    pub fn dom(&self) -> &ArenaDom {
        &self.dom
    }

    /// The scripture container the session works in.
    pub fn root(&self) -> ArenaNodeId {
        self.root
    }

    pub fn conventions(&self) -> &MarkupConventions {
        &self.conventions
    }

    pub fn index(&self) -> &VerseIndex {
        &self.index
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn export_state(&self) -> ExportState {
        self.exporter.state()
    }

    /// Toggle a verse. Unknown ids leave the selection as is.
    pub fn toggle(&mut self, id: VerseId) -> usize {
        self.selection
            .toggle(&mut self.dom, &self.index, id, &self.conventions)
    }

    /// Toggle whatever verse a click on `node` lands in.
    pub fn toggle_at(&mut self, node: ArenaNodeId) -> Option<usize> {
        let id = self.hit_test(node)?;
        Some(self.toggle(id))
    }

    /// The verse owning `node`, unless the node sits inside a footnote or
    /// cross-reference marker.
    pub fn hit_test(&self, node: ArenaNodeId) -> Option<VerseId> {
        let annotations = self.conventions.annotation_classes();
        if self
            .dom
            .closest(node, self.root, |d, id| d.has_any_class(id, &annotations))
            .is_some()
        {
            return None;
        }
        let owner = self.dom.closest(node, self.root, |d, id| {
            d.has_class(id, &self.conventions.wrapper_class)
        })?;
        let id: VerseId = self.dom.get_attr(owner, "data-verse-id")?.parse().ok()?;
        self.index.contains(&id).then_some(id)
    }

    pub fn clear(&mut self) {
        self.selection
            .clear(&mut self.dom, &self.index, &self.conventions);
    }

    pub fn count(&self) -> usize {
        self.selection.count()
    }

    /// Whether the copy affordance should be enabled: something is
    /// selected and no export is running.
    pub fn can_export(&self) -> bool {
        self.count() > 0 && self.exporter.is_idle()
    }

    pub fn is_exporting(&self) -> bool {
        !self.exporter.is_idle()
    }

    /// Selected units in canonical `(chapter, verse)` order.
    pub fn selected_units(&self) -> Vec<&VerseUnit> {
        let mut units = self.selection.units(&self.index);
        units.sort_by_key(|u| (u.chapter, u.verse));
        units
    }

    pub fn reference(&self) -> Option<Reference> {
        Reference::from_units(self.selection.units(&self.index))
    }

    /// Clean text of one verse.
    pub fn verse_text(&self, id: &VerseId) -> Option<String> {
        let unit = self.index.get(id)?;
        Some(clean_text(&self.dom, &unit.owners, &self.conventions))
    }

    /// Clean text of the selection, verses joined by a space in canonical order.
    pub fn selection_text(&self) -> String {
        self.selected_units()
            .iter()
            .map(|u| clean_text(&self.dom, &u.owners, &self.conventions))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The string an export would write, or `None` with nothing selected.
    pub fn export_text(&self) -> Option<String> {
        let reference = self.reference()?;
        Some(
            self.exporter
                .config()
                .format(&self.selection_text(), &reference.to_string()),
        )
    }

    /// Start an export of the selection. `None` with nothing selected or
    /// while an earlier export is still running.
    pub fn begin_export(&mut self) -> Option<Step> {
        if !self.exporter.is_idle() {
            log::debug!("export already in progress, ignoring trigger");
            return None;
        }
        let text = self.export_text()?;
        self.exporter.begin(text)
    }

    pub fn complete_primary(&mut self, outcome: Result<(), ClipboardError>) -> Option<Step> {
        self.exporter.complete_primary(outcome)
    }

    pub fn complete_fallback(&mut self, outcome: Result<(), ClipboardError>) -> Option<Step> {
        self.exporter.complete_fallback(outcome)
    }

    /// End the confirmation window, clearing the selection if a copy was
    /// being confirmed. Returns whether anything happened.
    pub fn settle(&mut self) -> bool {
        let settled = self.exporter.settle();
        if settled {
            self.clear();
        }
        settled
    }

    /// Export synchronously: try `primary`, then `fallback`.
    ///
    /// A successful copy is settled right away, which clears the selection;
    /// hosts that show a confirmation window drive the steps themselves.
    pub fn copy_selection(
        &mut self,
        primary: &mut dyn Clipboard,
        fallback: &mut dyn Clipboard,
    ) -> Option<Step> {
        if !self.exporter.is_idle() {
            return None;
        }
        let text = self.export_text()?;
        let step = self.exporter.run(text, primary, fallback)?;
        self.settle();
        Some(step)
    }

    /// The content container's markup, with wrappers and classes applied.
    pub fn annotated_html(&self) -> String {
        inner_html(&self.dom, self.root)
    }

    /// Every footnote on the page that carries text.
    pub fn footnotes(&self) -> Vec<Footnote> {
        self.dom
            .descendants(self.root)
            .filter(|&id| self.dom.has_any_class(id, &self.conventions.footnote_classes))
            .filter_map(|id| Footnote::from_marker(&self.dom, id, &self.conventions))
            .collect()
    }

    /// Every cross-reference marker on the page that lists passages.
    pub fn crossrefs(&self) -> Vec<CrossRefs> {
        self.dom
            .descendants(self.root)
            .filter(|&id| self.dom.has_any_class(id, &self.conventions.crossref_classes))
            .map(|id| CrossRefs::from_marker(&self.dom, id))
            .filter(|refs| !refs.is_empty())
            .collect()
    }

    /// The whole passage as shareable text, attributed to `passage`.
    pub fn passage_text(&self, passage: &str) -> String {
        let text = content_text(&self.dom, self.root, &self.conventions);
        let passage = passage.trim();
        if text.is_empty() || passage.is_empty() {
            return text;
        }
        format!("{text}\n\n\u{2014} {passage} (ESV)")
    }
}

/// The scripture container: first matching content id, then content
/// class, then `<body>`, then the document itself.
fn content_root(dom: &ArenaDom, conventions: &MarkupConventions) -> ArenaNodeId {
    conventions
        .content_ids
        .iter()
        .find_map(|id| dom.get_by_id(id))
        .or_else(|| {
            conventions
                .content_classes
                .iter()
                .find_map(|class| dom.find_by_class(class))
        })
        .or_else(|| dom.find_by_tag("body"))
        .unwrap_or_else(|| dom.document())
}
