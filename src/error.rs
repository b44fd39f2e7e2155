use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Records all errors reported by this library.
#[derive(Error, Diagnostic, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The type is unknown, or carries no template or reverse pattern data.
    ///
    /// Callers should treat the type as unsupported for registry URLs.
    #[error("no registry configuration for type '{purl_type}'")]
    NoRegistryConfig {
        /// The package type that was looked up.
        purl_type: String,
    },

    /// The URL does not fit the reverse pattern of the requested type (or of any type).
    #[error("URL '{url}' does not match any known registry pattern")]
    NoMatch {
        /// The URL that failed to match.
        url: String,
    },

    /// Errors encountered while parsing a package URL.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Errors encountered while parsing a version constraint.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// The type dataset could not be loaded.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl Error {
    /// Construct a [`Error::NoRegistryConfig`] for the type.
    pub fn no_registry_config(purl_type: impl Into<String>) -> Self {
        Self::NoRegistryConfig {
            purl_type: purl_type.into(),
        }
    }

    /// Construct a [`Error::NoMatch`] for the URL.
    pub fn no_match(url: impl Into<String>) -> Self {
        Self::NoMatch { url: url.into() }
    }
}

/// Errors encountered when parsing a package URL.
#[derive(Error, Diagnostic, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// The provided value was empty, which is invalid for this type.
    #[error("input was empty, which is invalid for this type")]
    Empty,

    /// The input did not match the required syntax.
    #[error("input '{input}' did not match required syntax: {error}")]
    Syntax {
        /// The input originally provided.
        #[source_code]
        input: String,

        /// The error encountered while parsing.
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,

        /// The location of the error.
        #[label("here")]
        span: SourceSpan,
    },

    /// A component contained an invalid percent-encoded sequence.
    #[error("component '{component}' of input '{input}' is not validly percent-encoded")]
    Encoding {
        /// The component that failed to decode.
        component: &'static str,

        /// The input originally provided.
        #[source_code]
        input: String,

        /// The location of the component.
        #[label("component")]
        span: SourceSpan,
    },

    /// The package name was missing or empty.
    #[error("package name is required")]
    EmptyName,
}

/// Errors encountered when parsing a version constraint.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RangeError {
    /// The constraint was empty.
    #[error("constraint was empty")]
    Empty,

    /// The constraint did not match the syntax of its scheme.
    #[error("parse constraint {constraint:?} for scheme {scheme:?}: {message}")]
    Syntax {
        /// The constraint being parsed.
        constraint: String,

        /// The versioning scheme used to parse it.
        scheme: String,

        /// The error message.
        message: String,
    },

    /// The constraint is not valid semver.
    #[error("invalid semver constraint: {0}")]
    InvalidSemver(#[from] semver::Error),

    /// An unhandled semver operator was encountered.
    #[error("unhandled semver operator: {0:?}")]
    UnhandledSemverOperator(semver::Op),
}

/// Errors encountered when loading a type dataset.
///
/// Cloneable so that a failed load of the embedded dataset can be cached
/// and handed to every caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DatasetError {
    /// The dataset is not valid JSON, or does not match the dataset schema.
    #[error("malformed type dataset: {0}")]
    Malformed(String),

    /// A reverse pattern failed to compile.
    #[error("type '{purl_type}' has an invalid reverse pattern {pattern:?}: {message}")]
    Pattern {
        /// The type owning the pattern.
        purl_type: String,

        /// The pattern that failed.
        pattern: String,

        /// Why it failed to compile.
        message: String,
    },

    /// A reverse pattern's capture groups disagree with its component descriptor.
    #[error(
        "type '{purl_type}' reverse pattern has {found} capture groups, expected {min} to {max}"
    )]
    GroupCount {
        /// The type owning the pattern.
        purl_type: String,

        /// The minimum number of groups for the descriptor.
        min: usize,

        /// The maximum number of groups for the descriptor.
        max: usize,

        /// The number of groups in the pattern.
        found: usize,
    },
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Return the span of `substr` inside `text` as `(offset, length)`.
///
/// Falls back to the whole of `text` if `substr` is not found.
pub fn span(text: &str, substr: &str) -> (usize, usize) {
    text.find(substr)
        .map(|start| (start, substr.len()))
        .unwrap_or((0, text.len()))
}

/// Construct and return a new [`ParseError::Syntax`].
///
/// Provide the input, along with the part of it that failed, and the error.
///
/// ```ignore
/// error::syntax!(input => (0, 2), err);
/// ```
macro_rules! syntax {
    ($input:expr => $span:expr, $error:expr) => {
        $crate::error::ParseError::Syntax {
            input: $input.into(),
            span: $span.into(),
            error: $error.into(),
        }
    };
}
pub(crate) use syntax;
