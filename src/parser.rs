//! Fragment parsing using html5ever
//!
//! A fragment has no guaranteed root, so it is prefixed with
//! `<!DOCTYPE html><html><body>` and parsed as a document. The `body` element
//! then acts as the container: its children are the fragment. Nothing is
//! appended after the fragment; html5ever closes open elements at end of
//! input, and trailing markup would be swallowed by an unterminated comment or
//! raw-text element.
//!
//! # Error Handling
//!
//! html5ever implements the WHATWG error-recovery rules, so every input
//! yields a tree. The parse errors it reports are collected on the `RcDom`
//! of the call that produced them; this module only keeps their count and
//! drops the messages together with the tree. No process-wide parser state is
//! touched, which keeps concurrent calls on different threads independent.
//!
//! # Examples
//!
//! ```rust
//! use html_fragment_filter::parser::{find_container, parse_fragment};
//!
//! let parsed = parse_fragment("<b>Hello <i>World</b>");
//! let body = find_container(&parsed.dom.document).expect("body exists");
//! assert_eq!(body.children.borrow().len(), 1);
//! ```

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::charset::{decode, detect_charset};
use crate::error::FilterError;

/// Local name of the synthetic container element
pub const CONTAINER_TAG: &str = "body";

/// Markup placed before the fragment; the doctype keeps the parser in
/// no-quirks mode
const WRAPPER_OPEN: &str = "<!DOCTYPE html><html><body>";

/// A parsed fragment together with its discarded diagnostics
pub struct ParsedFragment {
    /// The parsed document
    pub dom: RcDom,
    /// Number of parse errors html5ever recovered from
    pub error_count: usize,
}

/// Parse a fragment of markup into a document tree
///
/// Never fails: malformed markup is recovered the way a browser would.
pub fn parse_fragment(html: &str) -> ParsedFragment {
    let mut wrapped = String::with_capacity(WRAPPER_OPEN.len() + html.len());
    wrapped.push_str(WRAPPER_OPEN);
    wrapped.push_str(html);

    let dom = parse_document(RcDom::default(), Default::default()).one(wrapped.as_str());

    // Keep the count only; messages stay with the tree and are dropped with it.
    let error_count = dom.errors.borrow().len();

    ParsedFragment { dom, error_count }
}

/// Decode a byte fragment and parse it
///
/// The charset comes from the Content-Type value when present, then from a
/// byte-order mark, else UTF-8.
///
/// # Errors
///
/// `FilterError::Encoding` when the bytes cannot be decoded.
pub fn parse_fragment_bytes(
    html: &[u8],
    content_type: Option<&str>,
) -> Result<ParsedFragment, FilterError> {
    let charset = detect_charset(content_type, html);
    let text = decode(html, &charset)?;
    Ok(parse_fragment(&text))
}

/// Create an empty output document with its own container
pub fn new_output_tree() -> RcDom {
    parse_fragment("").dom
}

/// Find the container element of a parsed document
///
/// Searches depth-first for the first element named [`CONTAINER_TAG`].
pub fn find_container(document: &Handle) -> Option<Handle> {
    let mut stack = vec![document.clone()];

    while let Some(node) = stack.pop() {
        if let NodeData::Element { ref name, .. } = node.data
            && name.local.as_ref() == CONTAINER_TAG
        {
            return Some(node);
        }

        // Reverse so the first child is searched first.
        stack.extend(node.children.borrow().iter().rev().cloned());
    }

    None
}
