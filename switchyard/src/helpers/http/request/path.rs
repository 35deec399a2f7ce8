//! Defines helper functions for processing the request path

use crate::helpers::http::PercentDecoded;

const EXCLUDED_SEGMENTS: [&str; 1] = [""];

/// Holder for `Request` URI path segments that have been split into individual segments.
///
/// Used by the `Router` when traversing its routing trees and when scoping filters.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestPathSegments {
    segments: Vec<String>,
    decoded: bool,
}

impl RequestPathSegments {
    /// Creates a new RequestPathSegments instance by splitting a `Request` URI path.
    ///
    /// Empty segments are skipped when generating the `RequestPathSegments` value. So, a request
    /// path of `/some/path/to//my/handler/` will be split into segments:
    ///
    /// ```plain
    /// ["some", "path", "to", "my", "handler"]
    /// ```
    ///
    /// A segment which does not decode to valid UTF-8 is kept in its encoded form, and the path
    /// is marked as undecodable.
    pub(crate) fn new(path: &str) -> Self {
        let mut decoded = true;
        let segments = path
            .split('/')
            .filter(|s| !EXCLUDED_SEGMENTS.contains(s))
            .map(|s| match PercentDecoded::new(s) {
                Some(pd) => pd.as_ref().to_owned(),
                None => {
                    decoded = false;
                    s.to_owned()
                }
            })
            .collect();

        RequestPathSegments { segments, decoded }
    }

    /// `false` when a segment could not be decoded, in which case the path must not be routed.
    pub fn is_decoded(&self) -> bool {
        self.decoded
    }

    /// The segments as string slices, decoded when `is_decoded` is true.
    pub fn as_strs(&self) -> Vec<&str> {
        self.segments.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_path_segments_tests() {
        // Validate the claim made in the doc comment above.
        let rps = RequestPathSegments::new("/some/path/to//my/handler/");

        assert_eq!(
            rps.as_strs(),
            vec!["some", "path", "to", "my", "handler"]
        );
    }

    #[test]
    fn decodes_segments_individually() {
        let rps = RequestPathSegments::new("/files/a%2Fb/%7Euser");
        assert_eq!(rps.as_strs(), vec!["files", "a/b", "~user"]);
        assert!(rps.is_decoded());
    }

    #[test]
    fn undecodable_segments_are_kept_and_flagged() {
        let rps = RequestPathSegments::new("/user/%FF/x");
        assert_eq!(rps.as_strs(), vec!["user", "%FF", "x"]);
        assert!(!rps.is_decoded());
    }
}
