//! HTML DOM for reading markup.
//!
//! Reading fragments are parsed with html5ever into an [`ArenaDom`], edited
//! in place by verse extraction and selection, and serialized back to HTML
//! for hosts that render the annotated markup.
//!
//! ```
//! use lectio::dom::{inner_html, parse_html};
//!
//! let dom = parse_html(r#"<p id="p01001001-1">In the beginning</p>"#);
//! let p = dom.get_by_id("p01001001-1").unwrap();
//! assert_eq!(inner_html(&dom, p), "In the beginning");
//! ```

mod arena;
mod serialize;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute, ChildrenIter, Descendants};
pub use serialize::{escape_html, inner_html, outer_html};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::ArenaSink;

/// Parse HTML (a full document or a bare fragment) into an arena DOM.
///
/// Fragments get the implied `<html>`/`<body>` wrappers a browser would add.
pub fn parse_html(html: &str) -> ArenaDom {
    let sink = ArenaSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Parse HTML bytes, detecting the encoding from a `<meta charset>` hint.
pub fn parse_html_bytes(html: &[u8]) -> ArenaDom {
    let hint = crate::util::extract_meta_charset(html);
    let text = crate::util::decode_text(html, hint);
    parse_html(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bytes_windows_1252() {
        let html = b"<meta charset=\"windows-1252\"><p>caf\xe9</p>";
        let dom = parse_html_bytes(html);
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(dom.subtree_text(p), "café");
    }

    #[test]
    fn test_parse_bytes_utf8() {
        let dom = parse_html_bytes("<p>— Hebrews 1</p>".as_bytes());
        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(dom.subtree_text(p), "— Hebrews 1");
    }
}
