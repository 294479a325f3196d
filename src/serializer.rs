//! Output serialization and container trimming
//!
//! The filtered tree is written with [`FragmentSerializer`], an
//! implementation of html5ever's `Serializer` trait driven by
//! `markup5ever_rcdom`'s tree walk. Compared to html5ever's own HTML
//! serializer it escapes both quote characters and `<`/`>` inside attribute
//! values, and it writes raw-text content verbatim only when that content
//! holds no `<` and every open element is in the HTML namespace. Anything
//! else is escaped, so the result cannot re-open markup when it is embedded
//! and parsed again.
//!
//! Text starting with a newline directly after `pre`, `textarea` or
//! `listing` gets an extra newline, since the parser drops the first one.
//!
//! The container element is serialized with its own markers, which are then
//! removed with exact string rules (see [`trim_container`]).

use html5ever::QualName;
use html5ever::serialize::{AttrRef, Serialize, Serializer, TraversalScope};
use markup5ever_rcdom::{Handle, SerializableHandle};
use std::io;

use crate::error::FilterError;
use crate::escape::{escape_attribute_value, escape_text};

/// Open tag of the container as the serializer writes it
pub const CONTAINER_OPEN: &str = "<body>";

/// Close tag of the container
pub const CONTAINER_CLOSE: &str = "</body>";

/// Serialized form of a container without children
pub const CONTAINER_EMPTY: &str = "<body></body>";

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// HTML elements written without an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// HTML elements whose content the parser reads without decoding entities
///
/// `noscript` is left out: its content is markup when scripting is off.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// HTML elements that drop a newline directly after their start tag
const NEWLINE_STRIPPING_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// Serializer writing markup into an in-memory string
#[derive(Debug, Default)]
pub struct FragmentSerializer {
    output: String,
    open_elements: Vec<QualName>,
    after_newline_stripping_start: bool,
}

impl FragmentSerializer {
    /// Create a serializer with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the serializer and return the markup written so far
    pub fn into_string(self) -> String {
        self.output
    }

    fn push_attribute_name(&mut self, name: &QualName) {
        match &*name.ns {
            XML_NAMESPACE => self.output.push_str("xml:"),
            XMLNS_NAMESPACE if &*name.local != "xmlns" => self.output.push_str("xmlns:"),
            XLINK_NAMESPACE => self.output.push_str("xlink:"),
            _ => {}
        }
        self.output.push_str(&name.local);
    }

    /// Whether text in the current element can be written as is
    fn writes_raw_text(&self, text: &str) -> bool {
        let Some(parent) = self.open_elements.last() else {
            return false;
        };
        is_html_element(parent, RAW_TEXT_ELEMENTS)
            && self.open_elements.iter().all(|name| &*name.ns == HTML_NAMESPACE)
            && !text.contains('<')
    }
}

fn is_html_element(name: &QualName, local_names: &[&str]) -> bool {
    &*name.ns == HTML_NAMESPACE && local_names.contains(&&*name.local)
}

fn is_void_element(name: &QualName) -> bool {
    is_html_element(name, VOID_ELEMENTS)
}

impl Serializer for FragmentSerializer {
    fn start_elem<'a, AttrIter>(&mut self, name: QualName, attrs: AttrIter) -> io::Result<()>
    where
        AttrIter: Iterator<Item = AttrRef<'a>>,
    {
        self.output.push('<');
        self.output.push_str(&name.local);
        for (attr_name, value) in attrs {
            self.output.push(' ');
            self.push_attribute_name(attr_name);
            self.output.push_str("=\"");
            self.output.push_str(&escape_attribute_value(value));
            self.output.push('"');
        }
        self.output.push('>');

        self.after_newline_stripping_start = is_html_element(&name, NEWLINE_STRIPPING_ELEMENTS);
        if !is_void_element(&name) {
            self.open_elements.push(name);
        }
        Ok(())
    }

    fn end_elem(&mut self, name: QualName) -> io::Result<()> {
        self.after_newline_stripping_start = false;
        if is_void_element(&name) {
            return Ok(());
        }
        self.open_elements.pop();
        self.output.push_str("</");
        self.output.push_str(&name.local);
        self.output.push('>');
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        if std::mem::take(&mut self.after_newline_stripping_start) && text.starts_with('\n') {
            self.output.push('\n');
        }

        if self.writes_raw_text(text) {
            self.output.push_str(text);
        } else {
            self.output.push_str(&escape_text(text));
        }
        Ok(())
    }

    fn write_comment(&mut self, text: &str) -> io::Result<()> {
        self.after_newline_stripping_start = false;
        self.output.push_str("<!--");
        self.output.push_str(text);
        self.output.push_str("-->");
        Ok(())
    }

    fn write_doctype(&mut self, name: &str) -> io::Result<()> {
        self.output.push_str("<!DOCTYPE ");
        self.output.push_str(name);
        self.output.push('>');
        Ok(())
    }

    fn write_processing_instruction(&mut self, target: &str, data: &str) -> io::Result<()> {
        self.output.push_str("<?");
        self.output.push_str(target);
        self.output.push(' ');
        self.output.push_str(data);
        self.output.push('>');
        Ok(())
    }
}

/// Serialize a container element, including its own start and end tags
///
/// # Errors
///
/// `FilterError::Serialization` if the tree walk reports an I/O error.
pub fn serialize_container(container: &Handle) -> Result<String, FilterError> {
    let mut serializer = FragmentSerializer::new();
    SerializableHandle::from(container.clone())
        .serialize(&mut serializer, TraversalScope::IncludeNode)
        .map_err(|e| FilterError::Serialization(e.to_string()))?;
    Ok(serializer.into_string())
}

/// Remove the container markers from a serialized container
///
/// The rules are literal and applied in order:
/// 1. the empty container form becomes the empty string;
/// 2. a leading [`CONTAINER_OPEN`] is removed;
/// 3. then, independently, a trailing [`CONTAINER_CLOSE`] is removed.
///
/// ```
/// use html_fragment_filter::serializer::trim_container;
///
/// assert_eq!(trim_container("<body></body>"), "");
/// assert_eq!(trim_container("<body><b>x</b></body>"), "<b>x</b>");
/// assert_eq!(trim_container("text"), "text");
/// ```
pub fn trim_container(serialized: &str) -> &str {
    if serialized == CONTAINER_EMPTY {
        return "";
    }

    let trimmed = serialized.strip_prefix(CONTAINER_OPEN).unwrap_or(serialized);
    trimmed.strip_suffix(CONTAINER_CLOSE).unwrap_or(trimmed)
}
