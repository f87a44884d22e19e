//! Class and id conventions of the rendered reading markup.
//!
//! The page generator emits ESV-style HTML: verse numbers are
//! `<b class="verse-num" id="v58001005-1">`, poetry lines are
//! `<span class="line" id="p58001005_06-1">`, footnotes are `a.fn` and
//! cross-references `a.cf`. Everything that matches markup by class goes
//! through [`MarkupConventions`] so a different generator can be supported
//! by configuration alone.

/// Configuration of the markup classes the engine recognizes and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupConventions {
    /// Classes that identify verse/chapter number markers.
    pub marker_classes: Vec<String>,
    /// Class of a per-line poetry container.
    pub line_class: String,
    /// Classes of footnote markers.
    pub footnote_classes: Vec<String>,
    /// Classes of cross-reference markers.
    pub crossref_classes: Vec<String>,
    /// Classes of the note listings rendered after the passage.
    pub note_block_classes: Vec<String>,
    /// Class written on every verse owner.
    pub wrapper_class: String,
    /// Class toggled on selected verse owners.
    pub selected_class: String,
    /// Element ids tried, in order, to find the scripture container.
    pub content_ids: Vec<String>,
    /// Classes tried, in order, when no content id matches.
    pub content_classes: Vec<String>,
}

impl Default for MarkupConventions {
    fn default() -> Self {
        Self {
            marker_classes: strings(&["verse-num", "chapter-num"]),
            line_class: "line".into(),
            footnote_classes: strings(&["footnote", "fn"]),
            crossref_classes: strings(&["cf", "crossref"]),
            note_block_classes: strings(&["crossrefs", "footnotes"]),
            wrapper_class: "verse-wrapper".into(),
            selected_class: "selected".into(),
            content_ids: strings(&["bibleContent"]),
            content_classes: strings(&["bible-content"]),
        }
    }
}

impl MarkupConventions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker_classes(mut self, classes: &[&str]) -> Self {
        self.marker_classes = strings(classes);
        self
    }

    pub fn with_line_class(mut self, class: &str) -> Self {
        self.line_class = class.into();
        self
    }

    pub fn with_footnote_classes(mut self, classes: &[&str]) -> Self {
        self.footnote_classes = strings(classes);
        self
    }

    pub fn with_crossref_classes(mut self, classes: &[&str]) -> Self {
        self.crossref_classes = strings(classes);
        self
    }

    pub fn with_selected_class(mut self, class: &str) -> Self {
        self.selected_class = class.into();
        self
    }

    /// Footnote and cross-reference classes together: everything that is
    /// an annotation rather than scripture text.
    pub fn annotation_classes(&self) -> Vec<String> {
        self.footnote_classes
            .iter()
            .chain(&self.crossref_classes)
            .cloned()
            .collect()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
