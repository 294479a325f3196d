//! HTML Fragment Filter
//!
//! This library sanitizes untrusted HTML fragments against an explicit
//! allow-list. The output contains only approved elements, approved
//! attributes, text and comments, and can be embedded in a larger document
//! without opening a path to script injection or markup escape.
//!
//! # Architecture
//!
//! The library is structured into several modules:
//! - `parser`: fragment parsing using html5ever
//! - `filter`: the allow-list walk building the output tree
//! - `policy`: the `FilterPolicy` trait and the `AllowList` policy
//! - `serializer`: output serialization and container trimming
//! - `escape`: attribute and text escaping
//! - `charset`: charset detection and decoding for byte input
//!
//! # Example
//!
//! ```rust
//! use html_fragment_filter::AllowList;
//!
//! let policy = AllowList::new().allow_tag("b");
//! let filtered = html_fragment_filter::filter(&policy, "<b>bold</b><script>x()</script>")
//!     .expect("filter");
//! assert_eq!(filtered, "<b>bold</b>x()");
//! ```
//!
//! Disallowed elements are unwrapped, not deleted with their subtree: the
//! text of the `script` above survives as inert, escaped text.

// Module declarations
pub mod charset;
pub mod error;
pub mod escape;
pub mod filter;
pub mod parser;
pub mod policy;
pub mod serializer;

// Re-export main types for convenience
pub use error::FilterError;
pub use filter::{FilterOptions, FilterOutput, FilterReport, HtmlFilter};
pub use policy::{AllowList, FilterPolicy, PolicyError};

/// Filter a fragment with default options
///
/// Shorthand for `HtmlFilter::new().filter(policy, html)`.
pub fn filter<P>(policy: &P, html: &str) -> Result<String, FilterError>
where
    P: FilterPolicy + ?Sized,
{
    HtmlFilter::new().filter(policy, html)
}
