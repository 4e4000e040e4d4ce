use http::Method;

use std::fmt;

/// An opaque error returned by handlers and context makers.
///
/// The mux never inspects or re-wraps these; they reach the error handler as-is.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Represents errors that can occur while configuring a mux or registering routes.
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Route patterns must begin with '/'.
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
    },
    /// The router refused the route, usually because it conflicts with one
    /// registered earlier for the same method.
    Insert {
        /// The method the route was registered for.
        method: Method,
        /// The pattern as it was passed to the mux.
        pattern: String,
        /// The underlying router error.
        source: matchit::InsertError,
    },
    /// A configuration option failed. Options after the failing one were not applied.
    Config(BoxError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern { pattern } => {
                write!(f, "path must begin with '/' in path '{}'", pattern)
            }
            Self::Insert {
                method,
                pattern,
                source,
            } => write!(f, "failed to register {} {}: {}", method, pattern, source),
            Self::Config(err) => write!(f, "mux configuration failed: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPattern { .. } => None,
            Self::Insert { source, .. } => Some(source),
            Self::Config(err) => Some(err.as_ref()),
        }
    }
}
