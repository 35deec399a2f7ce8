//! Defines the wrapping type for a segment-matching regex.

use regex::Regex;

use std::cmp::Ordering;
use std::fmt;
use std::panic::AssertUnwindSafe;

/// A unwind-safe wrapper for Regex that implements PartialEq, Eq, PartialOrd, and Ord.  These
/// traits are implemented by comparing the source of the expression as it was written in the
/// route pattern, so two constraints spelled the same way share one subtree.
pub struct ConstrainedSegmentRegex {
    source: String,
    regex: AssertUnwindSafe<Regex>,
}

impl ConstrainedSegmentRegex {
    /// Creates a new ConstrainedSegmentRegex from a provided string.
    ///
    /// It wraps the string in begin and end of line anchors to prevent it from matching more than
    /// intended. Compilation happens here, at registration time, so an invalid expression is
    /// reported before any request is served.
    pub fn new(regex: &str) -> Result<Self, regex::Error> {
        let compiled = Regex::new(&format!("^(?:{})$", regex))?;

        Ok(ConstrainedSegmentRegex {
            source: regex.to_owned(),
            regex: AssertUnwindSafe(compiled),
        })
    }

    /// Returns the expression as written in the route pattern.
    #[inline]
    pub(crate) fn as_str(&self) -> &str {
        &self.source
    }

    /// Wraps `regex::Regex::is_match` to return true if and only if the regex matches the string
    /// given.
    #[inline]
    pub(crate) fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl fmt::Debug for ConstrainedSegmentRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConstrainedSegmentRegex")
            .field(&self.source)
            .finish()
    }
}

impl PartialEq for ConstrainedSegmentRegex {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ConstrainedSegmentRegex {}

impl PartialOrd for ConstrainedSegmentRegex {
    fn partial_cmp(&self, other: &ConstrainedSegmentRegex) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConstrainedSegmentRegex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Clone for ConstrainedSegmentRegex {
    fn clone(&self) -> ConstrainedSegmentRegex {
        ConstrainedSegmentRegex {
            source: self.source.clone(),
            regex: AssertUnwindSafe(self.regex.0.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_the_whole_segment() {
        let re = ConstrainedSegmentRegex::new("[0-9]+").unwrap();
        assert!(re.is_match("42"));
        assert!(!re.is_match("42a"));
        assert!(!re.is_match("a42"));
    }

    #[test]
    fn anchors_every_alternative() {
        let re = ConstrainedSegmentRegex::new("json|xml").unwrap();
        assert!(re.is_match("xml"));
        assert!(!re.is_match("jsonp"));
    }

    #[test]
    fn reports_invalid_expressions() {
        assert!(ConstrainedSegmentRegex::new("[0-9").is_err());
    }
}
