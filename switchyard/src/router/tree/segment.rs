//! Defines `SegmentType` and the parsed form of a route pattern.
//!
//! Patterns are written as `/`-separated segments:
//!
//! | Segment | Meaning |
//! |---|---|
//! | `users` | matched exactly |
//! | `\:users` | matched exactly, the leading `\` is removed |
//! | `:id` | captures one segment as `id` |
//! | `:id([0-9]+)` | captures one segment as `id` when the expression matches all of it |
//! | `?:id` | as `:id`, but this and every following segment may be absent |
//! | `*` or `:splat` | captures the rest of the path as `splat` |
//! | `*.*` | captures the rest of the path, split at the last `.` into `path` and `ext` |
use std::fmt;

use log::trace;

use crate::error::{ConfigError, PatternError};
use crate::router::tree::regex::ConstrainedSegmentRegex;

/// The parameter name used by `*` and `:splat`.
pub const SPLAT: &str = "splat";

/// Indicates the type of segment which is being represented by a `Node`.
///
/// The ordering of the variants is the matching precedence: a request segment is offered to
/// static children first, then constrained, then dynamic, and finally to the glob.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum SegmentType {
    /// Is matched exactly (string equality) to the segment for incoming request paths.
    ///
    /// Unlike all other `SegmentTypes`, values determined to be associated with this segment
    /// within a `Request` path are **not** stored as parameters.
    Static,

    /// Uses the supplied regex to determine match against incoming request paths.
    Constrained {
        /// Regex used to match against a single segment of a request path.
        regex: ConstrainedSegmentRegex,
    },

    /// Matches any corresponding segment for incoming request paths.
    Dynamic,

    /// Matches one or more path segments until the end of the request path.
    Glob {
        /// When set, the captured path is split into `path` and `ext` at the last `.`.
        split_ext: bool,
    },
}

/// One segment of a parsed pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    value: String,
    segment_type: SegmentType,
    optional: bool,
}

impl Segment {
    /// A segment matched exactly.
    pub fn fixed<S: Into<String>>(value: S) -> Self {
        Segment {
            value: value.into(),
            segment_type: SegmentType::Static,
            optional: false,
        }
    }

    /// A trailing `*`, capturing the rest of the path as `splat`.
    pub fn wildcard() -> Self {
        glob(SPLAT, false, false)
    }

    /// The literal for static segments, otherwise the parameter name.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// How the segment matches.
    pub fn segment_type(&self) -> &SegmentType {
        &self.segment_type
    }

    /// `true` when the route also matches without this segment.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// `true` for every segment which stores a parameter.
    pub fn is_capturing(&self) -> bool {
        self.segment_type != SegmentType::Static
    }

    /// Writes the segment back out in pattern syntax.
    fn write_to(&self, out: &mut String) {
        if self.optional {
            out.push('?');
        }
        match self.segment_type {
            SegmentType::Static => {
                if self.value.starts_with(|c| c == ':' || c == '*' || c == '?' || c == '\\') {
                    out.push('\\');
                }
                out.push_str(&self.value);
            }
            SegmentType::Constrained { ref regex } => {
                out.push(':');
                out.push_str(&self.value);
                out.push('(');
                out.push_str(regex.as_str());
                out.push(')');
            }
            SegmentType::Dynamic => {
                out.push(':');
                out.push_str(&self.value);
            }
            SegmentType::Glob { split_ext: true } => out.push_str("*.*"),
            SegmentType::Glob { split_ext: false } if self.optional => out.push_str(":splat"),
            SegmentType::Glob { split_ext: false } => out.push('*'),
        }
    }
}

/// A route pattern, compiled into its segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compiles `pattern`.
    ///
    /// Empty segments are ignored, so `/`, `` and `//` all denote the root, and a trailing `/` is
    /// insignificant. Regular expressions are compiled here, which makes every malformed pattern
    /// a registration time `ConfigError`.
    ///
    /// ```rust
    /// use switchyard::router::tree::segment::Pattern;
    ///
    /// let pattern = Pattern::parse("/user/:id([0-9]+)/*").unwrap();
    /// assert_eq!(pattern.param_names(), vec!["id", "splat"]);
    /// assert!(Pattern::parse("/static/*/more").is_err());
    /// ```
    pub fn parse(pattern: &str) -> Result<Pattern, ConfigError> {
        trace!(" parsing pattern `{}`", pattern);
        parse_segments(pattern)
            .map(|segments| Pattern { segments })
            .map_err(|reason| ConfigError::invalid_pattern(pattern, reason))
    }

    /// The root pattern, matching only `/`.
    pub fn root() -> Pattern {
        Pattern {
            segments: Vec::new(),
        }
    }

    /// Builds a pattern from already parsed segments.
    pub(crate) fn from_segments(segments: Vec<Segment>) -> Pattern {
        Pattern { segments }
    }

    /// Compiles `prefix` for mounting other routes beneath it.
    ///
    /// A prefix must denote exactly one position in a tree, so it may not contain a wildcard or an
    /// optional segment.
    pub fn parse_prefix(prefix: &str) -> Result<Pattern, ConfigError> {
        let pattern = Pattern::parse(prefix)?;

        for segment in pattern.segments.iter() {
            if segment.optional || matches!(segment.segment_type, SegmentType::Glob { .. }) {
                let mut written = String::new();
                segment.write_to(&mut written);
                return Err(ConfigError::invalid_pattern(
                    prefix,
                    PatternError::UnsupportedPrefixSegment { segment: written },
                ));
            }
        }

        Ok(pattern)
    }

    /// The segments, in path order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the parameters this pattern stores, in path order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .flat_map(|s| match s.segment_type {
                SegmentType::Static => vec![],
                SegmentType::Glob { split_ext: true } => vec!["path", "ext"],
                _ => vec![s.value.as_str()],
            })
            .collect()
    }

    /// `true` if this pattern is the root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new pattern with `self` in front of `other`.
    pub fn join(&self, other: &Pattern) -> Pattern {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Pattern { segments }
    }
}

impl fmt::Display for Pattern {
    /// Writes the normalised pattern, always starting with `/`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }

        let mut out = String::new();
        for segment in self.segments.iter() {
            out.push('/');
            segment.write_to(&mut out);
        }
        f.write_str(&out)
    }
}

fn parse_segments(pattern: &str) -> Result<Vec<Segment>, PatternError> {
    let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments: Vec<Segment> = Vec::with_capacity(raw.len());

    for (i, token) in raw.iter().enumerate() {
        let segment = parse_segment(token)?;

        if let Some(last) = segments.last() {
            if matches!(last.segment_type, SegmentType::Glob { .. }) {
                return Err(PatternError::WildcardNotFinal {
                    segment: raw[i - 1].to_owned(),
                });
            }
            if last.optional && !segment.optional {
                return Err(PatternError::OptionalNotTrailing {
                    segment: raw[i - 1].to_owned(),
                });
            }
        }

        segments.push(segment);
    }

    Ok(segments)
}

fn parse_segment(token: &str) -> Result<Segment, PatternError> {
    if let Some(literal) = token.strip_prefix('\\') {
        return Ok(Segment::fixed(literal));
    }

    let (optional, body) = match token.strip_prefix("?:") {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix(':').unwrap_or(token)),
    };
    let is_param = optional || token.starts_with(':');

    if !is_param {
        return Ok(match token {
            "*" => glob(SPLAT, false, false),
            "*.*" => glob("", true, false),
            _ => Segment::fixed(token),
        });
    }

    let (name, constraint) = match body.find('(') {
        Some(open) => {
            if !body.ends_with(')') {
                return Err(PatternError::UnterminatedConstraint {
                    segment: token.to_owned(),
                });
            }
            (&body[..open], Some(&body[open + 1..body.len() - 1]))
        }
        None => (body, None),
    };

    if name.is_empty() {
        return Err(PatternError::EmptyParamName {
            segment: token.to_owned(),
        });
    }

    let segment_type = match constraint {
        Some(expr) => SegmentType::Constrained {
            regex: ConstrainedSegmentRegex::new(expr).map_err(|source| {
                PatternError::InvalidRegex {
                    name: name.to_owned(),
                    source,
                }
            })?,
        },
        None if name == SPLAT => return Ok(glob(SPLAT, false, optional)),
        None => SegmentType::Dynamic,
    };

    Ok(Segment {
        value: name.to_owned(),
        segment_type,
        optional,
    })
}

fn glob(name: &str, split_ext: bool, optional: bool) -> Segment {
    Segment {
        value: name.to_owned(),
        segment_type: SegmentType::Glob { split_ext },
        optional,
    }
}
