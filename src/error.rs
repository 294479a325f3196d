//! Error types for filter operations

use std::fmt;

/// Errors that can occur while filtering an HTML fragment
///
/// Malformed markup is never an error: html5ever recovers from it and the
/// filter works on whatever tree it produced. These variants cover resource
/// limits and the few internal failures that can still happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Input nesting exceeded the configured maximum depth
    TooDeeplyNested {
        /// Depth at which the limit was hit
        depth: usize,
        /// Configured maximum
        max_depth: usize,
    },
    /// Input exceeded the configured maximum size in bytes
    InputTooLarge {
        /// Input length in bytes
        len: usize,
        /// Configured maximum
        max: usize,
    },
    /// Byte input could not be decoded with the detected charset
    Encoding(String),
    /// The parsed tree has no container element
    ContainerMissing(&'static str),
    /// Writing the output tree failed
    Serialization(String),
}

impl FilterError {
    /// Get numeric error code
    pub fn code(&self) -> u32 {
        match self {
            FilterError::TooDeeplyNested { .. } => 1,
            FilterError::InputTooLarge { .. } => 2,
            FilterError::Encoding(_) => 3,
            FilterError::ContainerMissing(_) => 4,
            FilterError::Serialization(_) => 5,
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::TooDeeplyNested { depth, max_depth } => write!(
                f,
                "HTML nesting depth {} exceeds maximum allowed depth {}",
                depth, max_depth
            ),
            FilterError::InputTooLarge { len, max } => write!(
                f,
                "Input of {} bytes exceeds maximum allowed size {}",
                len, max
            ),
            FilterError::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            FilterError::ContainerMissing(tag) => {
                write!(f, "Container element <{}> not found in parsed tree", tag)
            }
            FilterError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for FilterError {}
