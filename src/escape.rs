//! Escaping for serialized output
//!
//! Attribute values are always written double-quoted, so the quote characters
//! and the markup delimiters are replaced by character references. Text is
//! escaped for the delimiters only.

use std::borrow::Cow;

/// Escape an attribute value for a double-quoted attribute
///
/// # Examples
///
/// ```
/// use html_fragment_filter::escape::escape_attribute_value;
///
/// assert_eq!(escape_attribute_value("plain"), "plain");
/// assert_eq!(
///     escape_attribute_value(r#"say "hi" & <go>"#),
///     "say &quot;hi&quot; &amp; &lt;go&gt;"
/// );
/// ```
pub fn escape_attribute_value(value: &str) -> Cow<'_, str> {
    escape_with(value, |c| match c {
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    })
}

/// Escape character data for a text node
///
/// ```
/// use html_fragment_filter::escape::escape_text;
///
/// assert_eq!(escape_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
/// ```
pub fn escape_text(text: &str) -> Cow<'_, str> {
    escape_with(text, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    })
}

fn escape_with(input: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    let Some(first) = input.find(|c| replacement(c).is_some()) else {
        return Cow::Borrowed(input);
    };

    let mut output = String::with_capacity(input.len() + 16);
    output.push_str(&input[..first]);
    for c in input[first..].chars() {
        match replacement(c) {
            Some(entity) => output.push_str(entity),
            None => output.push(c),
        }
    }
    Cow::Owned(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unescaped_input_is_borrowed() {
        assert!(matches!(escape_attribute_value("https://e"), Cow::Borrowed(_)));
        assert!(matches!(escape_text("Hello World"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_attribute_quotes() {
        assert_eq!(escape_attribute_value("\""), "&quot;");
        assert_eq!(escape_attribute_value("'"), "&#39;");
        assert_eq!(escape_attribute_value("a\"b'c"), "a&quot;b&#39;c");
    }

    #[test]
    fn test_text_keeps_quotes() {
        assert_eq!(escape_text(r#"say "hi""#), r#"say "hi""#);
    }

    #[test]
    fn test_multibyte_text_survives() {
        assert_eq!(escape_text("世界 <ok>"), "世界 &lt;ok&gt;");
        assert_eq!(escape_attribute_value("😀\""), "😀&quot;");
    }

    proptest! {
        #[test]
        fn prop_escaped_attribute_has_no_delimiters(value in ".{0,64}") {
            let escaped = escape_attribute_value(&value);
            prop_assert!(!escaped.contains('"'));
            prop_assert!(!escaped.contains('\''));
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
        }

        #[test]
        fn prop_escaped_text_has_no_tag_delimiters(text in ".{0,64}") {
            let escaped = escape_text(&text);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
        }
    }
}
