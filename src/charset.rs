//! Character encoding detection for byte input
//!
//! Fragments handed over as bytes (straight from an HTTP body, a database
//! column, a file) are decoded to UTF-8 before parsing. The charset is picked
//! with a three-level cascade:
//!
//! 1. **Content-Type**: the `charset=` parameter of a Content-Type value
//! 2. **Byte-order mark**: a UTF-8 or UTF-16 BOM at the start of the input
//! 3. **Default**: UTF-8
//!
//! Fragments carry no `<head>`, so `<meta charset>` declarations are not
//! consulted.
//!
//! # Examples
//!
//! ```rust
//! use html_fragment_filter::charset::detect_charset;
//!
//! let charset = detect_charset(Some("text/html; charset=ISO-8859-1"), b"<b>x</b>");
//! assert_eq!(charset, "ISO-8859-1");
//!
//! let charset = detect_charset(None, b"<b>x</b>");
//! assert_eq!(charset, "UTF-8");
//! ```

use encoding_rs::Encoding;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::error::FilterError;

/// Default charset when detection fails
const DEFAULT_CHARSET: &str = "UTF-8";

/// Detect the character encoding of a byte fragment
///
/// Always returns a charset label, uppercased, defaulting to `"UTF-8"`.
pub fn detect_charset(content_type: Option<&str>, bytes: &[u8]) -> String {
    if let Some(ct) = content_type
        && let Some(charset) = extract_charset_from_content_type(ct)
    {
        return charset.to_uppercase();
    }

    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding.name().to_uppercase();
    }

    DEFAULT_CHARSET.to_string()
}

/// Extract the charset parameter from a Content-Type value
///
/// Accepts quoted and unquoted values, with or without whitespace around the
/// `=`, among other parameters.
///
/// ```rust
/// use html_fragment_filter::charset::extract_charset_from_content_type;
///
/// assert_eq!(
///     extract_charset_from_content_type("text/html; charset=\"UTF-8\""),
///     Some("UTF-8".to_string())
/// );
/// assert_eq!(extract_charset_from_content_type("text/html"), None);
/// ```
pub fn extract_charset_from_content_type(content_type: &str) -> Option<String> {
    static CHARSET_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex =
        CHARSET_REGEX.get_or_init(|| Regex::new(r#"(?i)charset\s*=\s*"?([^";,\s]+)"?"#).ok());
    let regex = regex.as_ref()?;

    regex
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decode bytes to UTF-8 with the given charset label
///
/// A leading BOM matching the charset is skipped. Malformed byte sequences
/// are rejected rather than replaced, so the filter never sees text the
/// sender did not write.
///
/// # Errors
///
/// `FilterError::Encoding` when the label is unknown or the bytes are not
/// valid in that encoding.
pub fn decode<'a>(bytes: &'a [u8], charset: &str) -> Result<Cow<'a, str>, FilterError> {
    let encoding = Encoding::for_label(charset.as_bytes()).ok_or_else(|| {
        FilterError::Encoding(format!("Unsupported charset '{}'", charset))
    })?;

    let bytes = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
        _ => bytes,
    };

    if encoding == encoding_rs::UTF_8 {
        return std::str::from_utf8(bytes).map(Cow::Borrowed).map_err(|e| {
            FilterError::Encoding(format!(
                "Invalid UTF-8 at byte position {}: {}",
                e.valid_up_to(),
                e
            ))
        });
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| {
            FilterError::Encoding(format!("Invalid byte sequence for charset '{}'", charset))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extract_charset_from_content_type_basic() {
        assert_eq!(
            extract_charset_from_content_type("text/html; charset=UTF-8"),
            Some("UTF-8".to_string())
        );
    }

    #[test]
    fn test_extract_charset_from_content_type_no_space() {
        assert_eq!(
            extract_charset_from_content_type("text/html;charset=windows-1252"),
            Some("windows-1252".to_string())
        );
    }

    #[test]
    fn test_extract_charset_from_content_type_multiple_params() {
        assert_eq!(
            extract_charset_from_content_type("text/html; charset=UTF-8; boundary=something"),
            Some("UTF-8".to_string())
        );
    }

    #[test]
    fn test_extract_charset_from_content_type_case_insensitive() {
        assert_eq!(
            extract_charset_from_content_type("text/html; CHARSET=iso-8859-1"),
            Some("iso-8859-1".to_string())
        );
    }

    #[test]
    fn test_extract_charset_from_content_type_no_charset() {
        assert_eq!(extract_charset_from_content_type("text/html"), None);
        assert_eq!(extract_charset_from_content_type(""), None);
    }

    #[test]
    fn test_detect_charset_from_bom() {
        assert_eq!(detect_charset(None, b"\xEF\xBB\xBF<b>x</b>"), "UTF-8");
        assert_eq!(detect_charset(None, b"\xFF\xFE<\x00b\x00"), "UTF-16LE");
    }

    #[test]
    fn test_detect_charset_content_type_beats_bom() {
        assert_eq!(
            detect_charset(Some("text/html; charset=windows-1252"), b"\xEF\xBB\xBFx"),
            "WINDOWS-1252"
        );
    }

    #[test]
    fn test_detect_charset_default() {
        assert_eq!(detect_charset(None, b"plain"), "UTF-8");
        assert_eq!(detect_charset(Some("text/html"), b"plain"), "UTF-8");
    }

    #[test]
    fn test_decode_utf8_borrows() {
        let decoded = decode(b"<b>ok</b>", "UTF-8").expect("valid UTF-8");
        assert!(matches!(decoded, Cow::Borrowed("<b>ok</b>")));
    }

    #[test]
    fn test_decode_strips_matching_bom() {
        let decoded = decode(b"\xEF\xBB\xBF<b>ok</b>", "UTF-8").expect("valid UTF-8");
        assert_eq!(decoded, "<b>ok</b>");
    }

    #[test]
    fn test_decode_iso_8859_1() {
        let decoded = decode(b"Caf\xE9", "ISO-8859-1").expect("latin-1 decodes");
        assert_eq!(decoded, "Café");
    }

    #[test]
    fn test_decode_invalid_utf8() {
        match decode(b"\xC3\x28", "UTF-8") {
            Err(FilterError::Encoding(msg)) => assert!(msg.contains("Invalid UTF-8")),
            other => panic!("Expected Encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_label() {
        match decode(b"x", "x-unknown-test") {
            Err(FilterError::Encoding(msg)) => assert!(msg.contains("Unsupported charset")),
            other => panic!("Expected Encoding error, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_content_type_charset_is_uppercased(
            charset in prop::sample::select(vec!["utf-8", "iso-8859-1", "windows-1252", "shift_jis"]),
        ) {
            let content_type = format!("text/html; charset={}", charset);
            prop_assert_eq!(
                detect_charset(Some(&content_type), b"<p>x</p>"),
                charset.to_uppercase()
            );
        }
    }
}
