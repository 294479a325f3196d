//! Allow-list filter engine
//!
//! The filter walks the parsed source fragment and builds a separate output
//! tree containing only what the policy approves. For every source node it
//! decides one of three outcomes:
//!
//! - **keep**: text, comments and allowed elements are copied. An allowed
//!   element is copied with its allowed attributes, then its children are
//!   walked into the copy.
//! - **unwrap**: a disallowed element produces no output node, but its
//!   children are still walked, into the *current* destination. Wrapper tags
//!   disappear while their content moves up to the nearest kept ancestor.
//! - **drop**: a disallowed element without children leaves nothing behind.
//!
//! # Traversal
//!
//! The walk is depth-first and pre-order, keeps sibling order, and runs on an
//! explicit work stack instead of recursion, so deeply nested input cannot
//! exhaust the call stack. Nesting deeper than
//! [`FilterOptions::max_depth`] fails the call with
//! [`FilterError::TooDeeplyNested`].
//!
//! # Examples
//!
//! ```rust
//! use html_fragment_filter::filter::HtmlFilter;
//! use html_fragment_filter::policy::AllowList;
//!
//! let policy = AllowList::new()
//!     .allow_tags(["b", "a"])
//!     .allow_attribute("a", "href");
//!
//! let html = r#"<b onclick="x">Hello <i>World</i> <a href="http://e" onclick="y">link</a></b>"#;
//! let filtered = HtmlFilter::new().filter(&policy, html).expect("filter");
//! assert_eq!(filtered, r#"<b>Hello World <a href="http://e">link</a></b>"#);
//! ```

use html5ever::Attribute;
use html5ever::tree_builder::{ElementFlags, NodeOrText, TreeSink};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::borrow::Cow;
use tracing::{debug, trace, warn};

use crate::error::FilterError;
use crate::parser::{
    CONTAINER_TAG, ParsedFragment, find_container, new_output_tree, parse_fragment,
    parse_fragment_bytes,
};
use crate::policy::FilterPolicy;
use crate::serializer::{serialize_container, trim_container};

/// Default maximum element nesting depth
pub const MAX_NESTING_DEPTH: usize = 1000;

/// Filter options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    /// Maximum element nesting depth (`None` disables the limit)
    pub max_depth: Option<usize>,
    /// Maximum input size in bytes (`None` disables the limit)
    pub max_input_bytes: Option<usize>,
    /// Copy comments to the output
    pub keep_comments: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(MAX_NESTING_DEPTH),
            max_input_bytes: None,
            keep_comments: true,
        }
    }
}

impl FilterOptions {
    /// Options without depth or size limits
    pub fn unbounded() -> Self {
        Self {
            max_depth: None,
            max_input_bytes: None,
            ..Default::default()
        }
    }
}

/// Counters describing one filter call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Elements copied to the output
    pub kept_elements: usize,
    /// Disallowed elements whose children were moved up
    pub unwrapped_elements: usize,
    /// Disallowed elements without children
    pub dropped_elements: usize,
    /// Text nodes copied
    pub text_nodes: usize,
    /// Comments copied
    pub comments: usize,
    /// Comments left out because `keep_comments` is off
    pub stripped_comments: usize,
    /// Attributes rejected on kept elements
    pub dropped_attributes: usize,
    /// Policy queries that returned an error
    pub policy_failures: usize,
    /// Parse errors html5ever recovered from
    pub parse_errors: usize,
}

/// Filtered markup together with its report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutput {
    /// The filtered fragment
    pub html: String,
    /// What happened while filtering
    pub report: FilterReport,
}

/// One pending source node and where its output goes
struct WalkEntry {
    node: Handle,
    destination: Handle,
    depth: usize,
}

/// Allow-list HTML fragment filter
///
/// Holds only options; every call builds and drops its own trees, so one
/// filter can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct HtmlFilter {
    options: FilterOptions,
}

impl HtmlFilter {
    /// Create a filter with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter with custom options
    ///
    /// ```rust
    /// use html_fragment_filter::filter::{FilterOptions, HtmlFilter};
    ///
    /// let filter = HtmlFilter::with_options(FilterOptions {
    ///     keep_comments: false,
    ///     ..Default::default()
    /// });
    /// assert!(!filter.options().keep_comments);
    /// ```
    pub fn with_options(options: FilterOptions) -> Self {
        Self { options }
    }

    /// The options this filter was built with
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Filter a fragment against a policy
    ///
    /// Malformed markup is never an error.
    ///
    /// # Errors
    ///
    /// - `FilterError::InputTooLarge` when `max_input_bytes` is exceeded
    /// - `FilterError::TooDeeplyNested` when `max_depth` is exceeded
    pub fn filter<P>(&self, policy: &P, html: &str) -> Result<String, FilterError>
    where
        P: FilterPolicy + ?Sized,
    {
        self.filter_with_report(policy, html)
            .map(|output| output.html)
    }

    /// Filter a fragment and report what was kept and removed
    pub fn filter_with_report<P>(&self, policy: &P, html: &str) -> Result<FilterOutput, FilterError>
    where
        P: FilterPolicy + ?Sized,
    {
        self.check_input_size(html.len())?;
        self.filter_parsed(policy, parse_fragment(html), html.len())
    }

    /// Filter a byte fragment, decoding it first
    ///
    /// The charset comes from `content_type` when it has a `charset`
    /// parameter, then from a byte-order mark, else UTF-8.
    ///
    /// # Errors
    ///
    /// Same as [`filter`](Self::filter), plus `FilterError::Encoding` when the
    /// bytes cannot be decoded.
    pub fn filter_bytes<P>(
        &self,
        policy: &P,
        html: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, FilterError>
    where
        P: FilterPolicy + ?Sized,
    {
        self.check_input_size(html.len())?;
        let parsed = parse_fragment_bytes(html, content_type)?;
        self.filter_parsed(policy, parsed, html.len())
            .map(|output| output.html)
    }

    fn check_input_size(&self, len: usize) -> Result<(), FilterError> {
        match self.options.max_input_bytes {
            Some(max) if len > max => {
                warn!(len, max, "Fragment exceeds maximum input size");
                Err(FilterError::InputTooLarge { len, max })
            }
            _ => Ok(()),
        }
    }

    fn filter_parsed<P>(
        &self,
        policy: &P,
        parsed: ParsedFragment,
        input_len: usize,
    ) -> Result<FilterOutput, FilterError>
    where
        P: FilterPolicy + ?Sized,
    {
        let mut report = FilterReport {
            parse_errors: parsed.error_count,
            ..Default::default()
        };

        // The wrapper's explicit <body> makes html5ever ignore a later
        // <frameset>, so the container is always present.
        let source = find_container(&parsed.dom.document)
            .ok_or(FilterError::ContainerMissing(CONTAINER_TAG))?;

        let output = new_output_tree();
        let destination =
            find_container(&output.document).ok_or(FilterError::ContainerMissing(CONTAINER_TAG))?;
        self.copy_allowed_children(policy, &output, &source, &destination, &mut report)?;

        let serialized = serialize_container(&destination)?;
        let html = trim_container(&serialized).to_string();

        debug!(
            input_len,
            output_len = html.len(),
            kept = report.kept_elements,
            unwrapped = report.unwrapped_elements,
            dropped = report.dropped_elements,
            dropped_attributes = report.dropped_attributes,
            parse_errors = report.parse_errors,
            "Filtered HTML fragment"
        );

        Ok(FilterOutput { html, report })
    }

    /// Copy the allowed content under `source` into `destination`
    fn copy_allowed_children<P>(
        &self,
        policy: &P,
        sink: &RcDom,
        source: &Handle,
        destination: &Handle,
        report: &mut FilterReport,
    ) -> Result<(), FilterError>
    where
        P: FilterPolicy + ?Sized,
    {
        let mut stack = Vec::new();
        push_children(&mut stack, source, destination, 1);

        while let Some(WalkEntry {
            node,
            destination,
            depth,
        }) = stack.pop()
        {
            match node.data {
                NodeData::Text { ref contents } => {
                    sink.append(&destination, NodeOrText::AppendText(contents.borrow().clone()));
                    report.text_nodes += 1;
                }
                NodeData::Comment { ref contents } => {
                    if self.options.keep_comments {
                        let comment = sink.create_comment(contents.clone());
                        sink.append(&destination, NodeOrText::AppendNode(comment));
                        report.comments += 1;
                    } else {
                        report.stripped_comments += 1;
                    }
                }
                NodeData::Element {
                    ref name,
                    ref attrs,
                    ref template_contents,
                    ..
                } => {
                    if let Some(max_depth) = self.options.max_depth
                        && depth > max_depth
                    {
                        warn!(depth, max_depth, "Fragment nesting exceeds maximum depth");
                        return Err(FilterError::TooDeeplyNested { depth, max_depth });
                    }

                    let tag_name = name.local.as_ref();
                    // Template children live in a separate fragment.
                    let children_of = template_contents
                        .borrow()
                        .clone()
                        .unwrap_or_else(|| node.clone());

                    let allowed =
                        is_serializable_name(tag_name) && check_tag(policy, tag_name, report);
                    if allowed {
                        trace!(tag_name, depth, "keep");
                        let copied_attrs =
                            copy_allowed_attributes(policy, tag_name, &attrs.borrow(), report);
                        let copied =
                            sink.create_element(name.clone(), copied_attrs, ElementFlags::default());
                        sink.append(&destination, NodeOrText::AppendNode(copied.clone()));
                        report.kept_elements += 1;
                        push_children(&mut stack, &children_of, &copied, depth + 1);
                    } else if children_of.children.borrow().is_empty() {
                        trace!(tag_name, depth, "drop");
                        report.dropped_elements += 1;
                    } else {
                        trace!(tag_name, depth, "unwrap");
                        report.unwrapped_elements += 1;
                        push_children(&mut stack, &children_of, &destination, depth + 1);
                    }
                }
                // Doctypes and processing instructions never reach the output.
                _ => {}
            }
        }

        Ok(())
    }
}

/// Queue the children of `parent`, first child on top
fn push_children(stack: &mut Vec<WalkEntry>, parent: &Handle, destination: &Handle, depth: usize) {
    stack.extend(parent.children.borrow().iter().rev().map(|child| WalkEntry {
        node: child.clone(),
        destination: destination.clone(),
        depth,
    }));
}

fn check_tag<P>(policy: &P, tag_name: &str, report: &mut FilterReport) -> bool
where
    P: FilterPolicy + ?Sized,
{
    match policy.check_tag(tag_name) {
        Ok(allowed) => allowed,
        Err(err) => {
            warn!(tag_name, error = %err, "Policy failed on tag, treating as not allowed");
            report.policy_failures += 1;
            false
        }
    }
}

fn copy_allowed_attributes<P>(
    policy: &P,
    tag_name: &str,
    attrs: &[Attribute],
    report: &mut FilterReport,
) -> Vec<Attribute>
where
    P: FilterPolicy + ?Sized,
{
    let mut copied = Vec::with_capacity(attrs.len());

    for attr in attrs {
        let attribute_name = qualified_attribute_name(attr);
        if !is_serializable_name(&attribute_name) {
            trace!(tag_name, attribute_name = %attribute_name, "drop unwritable attribute");
            report.dropped_attributes += 1;
            continue;
        }

        let allowed = match policy.check_attribute(tag_name, &attribute_name, &attr.value) {
            Ok(allowed) => allowed,
            Err(err) => {
                warn!(
                    tag_name,
                    attribute_name = %attribute_name,
                    error = %err,
                    "Policy failed on attribute, treating as not allowed"
                );
                report.policy_failures += 1;
                false
            }
        };

        if allowed {
            copied.push(attr.clone());
        } else {
            trace!(tag_name, attribute_name = %attribute_name, "drop attribute");
            report.dropped_attributes += 1;
        }
    }

    copied
}

/// Whether a tag or attribute name can be written back as the same name
///
/// The tokenizer accepts quotes and `<` inside names; written out unquoted
/// they would change the meaning of the surrounding markup.
fn is_serializable_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            matches!(c, '"' | '\'' | '<' | '>' | '/' | '=' | '`')
                || c.is_whitespace()
                || c.is_control()
        })
}

/// Attribute name as written in markup (`xlink:href`, `class`)
fn qualified_attribute_name(attr: &Attribute) -> Cow<'_, str> {
    match attr.name.prefix {
        Some(ref prefix) => Cow::Owned(format!("{}:{}", prefix, attr.name.local)),
        None => Cow::Borrowed(attr.name.local.as_ref()),
    }
}
