//! # lectio
//!
//! Verse selection, citation formatting and clipboard export for daily
//! Bible reading pages.
//!
//! ## Features
//!
//! - Turns rendered ESV-style scripture markup into addressable verses,
//!   for prose paragraphs and poetry line groups alike
//! - Tracks an ordered multi-verse selection and marks it in the markup
//! - Formats canonical references such as `John 3:16-18` or `Psalms 23:1, 4`
//! - Exports clean text without footnote or cross-reference debris
//! - Reads footnote and cross-reference popups' data
//! - Queries a site's per-year readings calendar
//!
//! ## Quick Start
//!
//! ```
//! use lectio::{ReadingSession, VerseId};
//!
//! let mut session = ReadingSession::from_html(
//!     r#"<div class="bible-content"><p>
//!         <b class="verse-num" id="v19023001-1">1 </b>The Lord is my shepherd;
//!         <b class="verse-num" id="v19023002-1">2 </b>he makes me lie down in green pastures.
//!     </p></div>"#,
//! );
//!
//! session.toggle(VerseId::new(19, 23, 2));
//! session.toggle(VerseId::new(19, 23, 1));
//!
//! assert_eq!(session.reference().unwrap().to_string(), "Psalms 23:1-2");
//! assert_eq!(
//!     session.export_text().unwrap(),
//!     "The Lord is my shepherd; he makes me lie down in green pastures. - Psalms 23:1-2"
//! );
//! ```
//!
//! ## Working with the Markup
//!
//! The session owns an arena DOM. After extraction every verse owner carries
//! `class="verse-wrapper"` and `data-verse-id`, `data-book`,
//! `data-chapter` and `data-verse` attributes; selected owners additionally
//! carry `selected`. [`ReadingSession::annotated_html`] hands the result back
//! to a host page.

pub mod books;
pub mod clean;
pub mod conventions;
pub mod dom;
pub mod error;
pub mod export;
pub mod extract;
pub mod notes;
pub mod readings;
pub mod reference;
pub mod selection;
pub mod session;
pub(crate) mod util;
pub mod verse;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use conventions::MarkupConventions;
pub use error::{Error, Result};
pub use export::{Clipboard, ClipboardError, ExportConfig, ExportOrder, Step};
pub use extract::extract_verses;
pub use readings::{Preloaded, ReadingStore, SiteDir, YearSource};
pub use reference::{Reference, VerseSpec};
pub use selection::Selection;
pub use session::ReadingSession;
pub use verse::{VerseId, VerseIndex, VerseUnit};
