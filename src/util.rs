//! Encoding helpers for reading fragments loaded from disk.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// 1. UTF-8 first (a BOM is handled by encoding_rs)
/// 2. If malformed, the hint encoding (from `<meta charset>`)
/// 3. Windows-1252 as the last resort
///
/// Returns `Cow::Borrowed` when the input is already valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the charset label from a `<meta charset=...>` or
/// `<meta http-equiv=... content="...; charset=...">` near the top of a page.
///
/// Only the first 1024 bytes are examined, the same window browsers use for
/// their prescan.
pub fn extract_meta_charset(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(1024)];

    let pos = prefix
        .windows(8)
        .position(|w| w.eq_ignore_ascii_case(b"charset="))?;
    let after = &prefix[pos + 8..];

    let (start, terminator): (usize, &[u8]) = match after.first()? {
        b'"' => (1, b"\""),
        b'\'' => (1, b"'"),
        _ => (0, b"\"'; >/"),
    };
    let value = &after[start..];
    let end = value
        .iter()
        .position(|b| terminator.contains(b) || b.is_ascii_whitespace())
        .unwrap_or(value.len());

    if end == 0 {
        return None;
    }
    std::str::from_utf8(&value[..end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_utf8_borrows() {
        let decoded = decode_text("Psalms 23".as_bytes(), Some("windows-1252"));
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded, "Psalms 23");
    }

    #[test]
    fn test_decode_falls_back_to_windows_1252() {
        let decoded = decode_text(b"\x93Amen\x94", None);
        assert_eq!(decoded, "\u{201c}Amen\u{201d}");
    }

    #[test]
    fn test_decode_uses_hint() {
        let decoded = decode_text(b"\xe9", Some("iso-8859-1"));
        assert_eq!(decoded, "é");
    }

    #[test]
    fn test_meta_charset_quoted() {
        assert_eq!(
            extract_meta_charset(br#"<meta charset="windows-1252">"#),
            Some("windows-1252")
        );
    }

    #[test]
    fn test_meta_charset_http_equiv() {
        let html = br#"<meta http-equiv="Content-Type" content="text/html; charset=utf-8">"#;
        assert_eq!(extract_meta_charset(html), Some("utf-8"));
    }

    #[test]
    fn test_meta_charset_missing() {
        assert_eq!(extract_meta_charset(b"<p>no meta</p>"), None);
        assert_eq!(extract_meta_charset(b"charset="), None);
    }
}
