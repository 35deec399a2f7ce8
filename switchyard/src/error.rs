//! Errors raised while a router is being configured.
//!
//! Nothing in this module is produced while serving requests. A request that matches no route, or
//! matches a route under another method, is an ordinary outcome represented by
//! `RouteNonMatch`, and failures inside application code travel as `HandlerError`.
use thiserror::Error;

/// Describes why a single route pattern could not be compiled.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A `:` parameter segment without a name, such as `/user/:`.
    #[error("parameter segment `{segment}` has no name")]
    EmptyParamName {
        /// The offending segment.
        segment: String,
    },

    /// A wildcard segment that is followed by further segments.
    #[error("wildcard segment `{segment}` must be the final segment")]
    WildcardNotFinal {
        /// The offending segment.
        segment: String,
    },

    /// An optional `?:name` segment followed by a segment which is not optional.
    #[error("optional segment `{segment}` may only be followed by further optional segments")]
    OptionalNotTrailing {
        /// The offending segment.
        segment: String,
    },

    /// A constrained parameter whose `(` is never closed.
    #[error("constraint in segment `{segment}` is not terminated by `)`")]
    UnterminatedConstraint {
        /// The offending segment.
        segment: String,
    },

    /// A constrained parameter whose expression does not compile.
    #[error("constraint for parameter `{name}` is not a valid regular expression")]
    InvalidRegex {
        /// Name of the parameter carrying the constraint.
        name: String,
        /// The compilation failure reported by `regex`.
        #[source]
        source: regex::Error,
    },

    /// A prefix used to mount routes contains a wildcard or optional segment.
    #[error("segment `{segment}` cannot be used in a mount prefix")]
    UnsupportedPrefixSegment {
        /// The offending segment.
        segment: String,
    },
}

/// A fatal problem found while registering routes, filters or namespaces.
///
/// `build_router` returns the first `ConfigError` it encounters; the application is expected to
/// abort start up and report it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A route, filter or namespace pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The pattern as it was supplied.
        pattern: String,
        /// Why the pattern was rejected.
        #[source]
        reason: PatternError,
    },

    /// A controller method mapping string could not be parsed.
    #[error("invalid method mapping `{mapping}`: {reason}")]
    InvalidMapping {
        /// The mapping as it was supplied.
        mapping: String,
        /// Why the mapping was rejected.
        reason: String,
    },

    /// A method mapping refers to an action the controller does not export.
    #[error("controller does not export an action named `{action}` (mapped for {method})")]
    UnknownAction {
        /// The HTTP method the action was mapped for, or `*`.
        method: String,
        /// The missing action name.
        action: String,
    },

    /// A controller route resolved to no method at all.
    #[error("controller bound at `{pattern}` handles no HTTP method")]
    NoActions {
        /// The route pattern.
        pattern: String,
    },

    /// An automatic controller route was requested for a controller without a name.
    #[error("controller used with `auto` must report a name")]
    UnnamedController,
}

impl ConfigError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: PatternError) -> Self {
        ConfigError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pattern_names_the_offending_pattern() {
        let err = ConfigError::invalid_pattern(
            "/user/:/edit",
            PatternError::EmptyParamName {
                segment: ":".to_owned(),
            },
        );

        assert_eq!(
            err.to_string(),
            "invalid pattern `/user/:/edit`: parameter segment `:` has no name"
        );
    }
}
