//! Allow-list policies
//!
//! The filter never decides on its own which markup is acceptable. It asks a
//! [`FilterPolicy`] for every element and every attribute it meets, and keeps
//! only what the policy approves. Text and comments are never submitted to the
//! policy.
//!
//! [`AllowList`] is a ready-made policy built from static sets of names. Any
//! other rule set (regex checks on values, context-aware rules, rules loaded
//! from configuration) can implement the trait directly.
//!
//! # Examples
//!
//! ```
//! use html_fragment_filter::policy::{AllowList, FilterPolicy};
//!
//! let policy = AllowList::new()
//!     .allow_tags(["b", "a"])
//!     .allow_attribute("a", "href");
//!
//! assert!(policy.is_allowed_tag("b"));
//! assert!(!policy.is_allowed_tag("script"));
//! assert!(policy.is_allowed_attribute("a", "href", "http://e"));
//! assert!(!policy.is_allowed_attribute("b", "href", "http://e"));
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Error returned by a policy that could not reach a decision
///
/// The filter treats such a failure as "not allowed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyError {
    message: String,
}

impl PolicyError {
    /// Create a policy error with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Policy error: {}", self.message)
    }
}

impl std::error::Error for PolicyError {}

/// Allow-list decisions consulted by the filter
///
/// Implementations must be deterministic and free of observable side effects.
/// Tag and attribute names arrive exactly as the parser produced them (HTML
/// names lowercased, SVG/MathML names in their canonical case); whether the
/// comparison is case-sensitive is up to the implementation. Names that
/// cannot be written back unchanged (a quote or `<` inside, for instance)
/// are never offered: such elements are unwrapped and such
/// attributes dropped.
pub trait FilterPolicy {
    /// Whether an element with this tag name may appear in the output
    fn is_allowed_tag(&self, tag_name: &str) -> bool;

    /// Whether this attribute may be kept on an element with `tag_name`
    fn is_allowed_attribute(&self, tag_name: &str, attribute_name: &str, value: &str) -> bool;

    /// Fallible form of [`is_allowed_tag`](Self::is_allowed_tag)
    ///
    /// This is what the filter calls. Policies that can fail override it;
    /// an `Err` is handled as "not allowed".
    fn check_tag(&self, tag_name: &str) -> Result<bool, PolicyError> {
        Ok(self.is_allowed_tag(tag_name))
    }

    /// Fallible form of [`is_allowed_attribute`](Self::is_allowed_attribute)
    fn check_attribute(
        &self,
        tag_name: &str,
        attribute_name: &str,
        value: &str,
    ) -> Result<bool, PolicyError> {
        Ok(self.is_allowed_attribute(tag_name, attribute_name, value))
    }
}

impl<P: FilterPolicy + ?Sized> FilterPolicy for &P {
    fn is_allowed_tag(&self, tag_name: &str) -> bool {
        (**self).is_allowed_tag(tag_name)
    }

    fn is_allowed_attribute(&self, tag_name: &str, attribute_name: &str, value: &str) -> bool {
        (**self).is_allowed_attribute(tag_name, attribute_name, value)
    }

    fn check_tag(&self, tag_name: &str) -> Result<bool, PolicyError> {
        (**self).check_tag(tag_name)
    }

    fn check_attribute(
        &self,
        tag_name: &str,
        attribute_name: &str,
        value: &str,
    ) -> Result<bool, PolicyError> {
        (**self).check_attribute(tag_name, attribute_name, value)
    }
}

macro_rules! forward_policy_impl {
    ($($pointer:ident),*) => {
        $(
            impl<P: FilterPolicy + ?Sized> FilterPolicy for $pointer<P> {
                fn is_allowed_tag(&self, tag_name: &str) -> bool {
                    (**self).is_allowed_tag(tag_name)
                }

                fn is_allowed_attribute(
                    &self,
                    tag_name: &str,
                    attribute_name: &str,
                    value: &str,
                ) -> bool {
                    (**self).is_allowed_attribute(tag_name, attribute_name, value)
                }

                fn check_tag(&self, tag_name: &str) -> Result<bool, PolicyError> {
                    (**self).check_tag(tag_name)
                }

                fn check_attribute(
                    &self,
                    tag_name: &str,
                    attribute_name: &str,
                    value: &str,
                ) -> Result<bool, PolicyError> {
                    (**self).check_attribute(tag_name, attribute_name, value)
                }
            }
        )*
    };
}

forward_policy_impl!(Box, Rc, Arc);

/// Predicate applied to the value of an allowed attribute
type ValueCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Static allow-list policy
///
/// Holds three kinds of rules:
/// - allowed tags;
/// - attributes allowed on every allowed tag ("global" attributes);
/// - attributes allowed only on a specific tag.
///
/// An allowed attribute can additionally carry a value predicate, registered
/// with [`AllowList::check_value`]. Names are compared ASCII-case-insensitively.
#[derive(Clone, Default)]
pub struct AllowList {
    tags: HashSet<String>,
    global_attributes: HashSet<String>,
    tag_attributes: HashMap<String, HashSet<String>>,
    value_checks: HashMap<String, ValueCheck>,
}

impl AllowList {
    /// Create an empty allow-list (rejects everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow one tag
    pub fn allow_tag(mut self, tag_name: &str) -> Self {
        self.tags.insert(tag_name.to_ascii_lowercase());
        self
    }

    /// Allow several tags
    pub fn allow_tags<'a>(mut self, tag_names: impl IntoIterator<Item = &'a str>) -> Self {
        self.tags
            .extend(tag_names.into_iter().map(str::to_ascii_lowercase));
        self
    }

    /// Allow an attribute on any tag
    pub fn allow_global_attribute(mut self, attribute_name: &str) -> Self {
        self.global_attributes
            .insert(attribute_name.to_ascii_lowercase());
        self
    }

    /// Allow an attribute only on the given tag
    ///
    /// This does not allow the tag itself.
    pub fn allow_attribute(mut self, tag_name: &str, attribute_name: &str) -> Self {
        self.tag_attributes
            .entry(tag_name.to_ascii_lowercase())
            .or_default()
            .insert(attribute_name.to_ascii_lowercase());
        self
    }

    /// Restrict the values of an attribute, wherever it is allowed
    ///
    /// ```
    /// use html_fragment_filter::policy::{AllowList, FilterPolicy};
    ///
    /// let policy = AllowList::new()
    ///     .allow_tag("a")
    ///     .allow_attribute("a", "href")
    ///     .check_value("href", |v| v.starts_with("https://"));
    ///
    /// assert!(policy.is_allowed_attribute("a", "href", "https://e"));
    /// assert!(!policy.is_allowed_attribute("a", "href", "javascript:alert(1)"));
    /// ```
    pub fn check_value<F>(mut self, attribute_name: &str, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.value_checks
            .insert(attribute_name.to_ascii_lowercase(), Arc::new(check));
        self
    }

    /// Number of allowed tags
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}

impl FilterPolicy for AllowList {
    fn is_allowed_tag(&self, tag_name: &str) -> bool {
        self.tags.contains(&tag_name.to_ascii_lowercase())
    }

    fn is_allowed_attribute(&self, tag_name: &str, attribute_name: &str, value: &str) -> bool {
        let attribute_name = attribute_name.to_ascii_lowercase();

        let name_allowed = self.global_attributes.contains(&attribute_name)
            || self
                .tag_attributes
                .get(&tag_name.to_ascii_lowercase())
                .is_some_and(|names| names.contains(&attribute_name));
        if !name_allowed {
            return false;
        }

        match self.value_checks.get(&attribute_name) {
            Some(check) => check(value),
            None => true,
        }
    }
}

impl fmt::Debug for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value_checks: Vec<&String> = self.value_checks.keys().collect();
        value_checks.sort();
        f.debug_struct("AllowList")
            .field("tags", &self.tags)
            .field("global_attributes", &self.global_attributes)
            .field("tag_attributes", &self.tag_attributes)
            .field("value_checks", &value_checks)
            .finish()
    }
}
