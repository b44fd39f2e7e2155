//! Version constraints: reading the bounds out of a constraint written in
//! an ecosystem's native syntax, and reducing a constraint to a concrete version.

use std::str::FromStr;

use nom::{
    Finish, IResult, Parser,
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, multispace0, multispace1, satisfy},
    combinator::{all_consuming, opt, recognize},
    multi::separated_list1,
    sequence::delimited,
};
use semver::{Comparator, Op, VersionReq};
use serde::{Deserialize, Serialize};
use strum::EnumString;
use tracing::debug;
use utoipa::ToSchema;

use crate::RangeError;

/// A contiguous range of versions.
///
/// Bounds are the versions as written in the constraint; they are not normalized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Interval {
    /// The lower bound, if the constraint has one.
    pub min: Option<String>,

    /// The upper bound, if the constraint has one.
    pub max: Option<String>,
}

/// The syntax a constraint is written in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
enum Scheme {
    #[strum(serialize = "npm")]
    Npm,

    #[strum(serialize = "cargo")]
    Cargo,

    #[strum(serialize = "gem", serialize = "rubygems")]
    Gem,

    #[strum(serialize = "pypi", serialize = "pip")]
    Pypi,

    #[default]
    #[strum(disabled)]
    Generic,
}

impl Scheme {
    /// Operators recognized by the scheme, longest first so that prefixes don't shadow them.
    fn operators(self) -> &'static [&'static str] {
        match self {
            Scheme::Npm | Scheme::Cargo => &[">=", "<=", ">", "<", "=", "^", "~"],
            Scheme::Gem => &["~>", ">=", "<=", "!=", ">", "<", "="],
            Scheme::Pypi => &["~=", "===", "==", ">=", "<=", "!=", ">", "<"],
            Scheme::Generic => &[
                "~>", "~=", "===", "==", ">=", "<=", "!=", "^", "~", ">", "<", "=",
            ],
        }
    }

    /// Read the interval described by a single `||` alternative.
    ///
    /// `syntax` builds the error reported when the alternative is malformed.
    fn interval(
        self,
        alternative: &str,
        syntax: impl Fn(String) -> RangeError,
    ) -> Result<Interval, RangeError> {
        match self {
            Scheme::Cargo => cargo_interval(alternative),
            Scheme::Npm => match alternative.split_once(" - ") {
                Some((min, max)) => hyphen_interval(min, max).map_err(syntax),
                None => comparators(self.operators(), alternative)
                    .map(interval)
                    .map_err(syntax),
            },
            _ => comparators(self.operators(), alternative)
                .map(interval)
                .map_err(syntax),
        }
    }
}

/// Parse `||`-separated alternatives of comparators into one interval per alternative.
///
/// ```
/// # use purl_registry::{parse_range, Interval};
/// let intervals = parse_range(">= 1.0, < 2.0", "gem")?;
/// pretty_assertions::assert_eq!(intervals, vec![Interval {
///     min: Some(String::from("1.0")),
///     max: Some(String::from("2.0")),
/// }]);
/// # Ok::<(), purl_registry::RangeError>(())
/// ```
#[tracing::instrument(level = "debug")]
pub fn parse_range(constraint: &str, scheme: &str) -> Result<Vec<Interval>, RangeError> {
    let constraint = constraint.trim();
    if constraint.is_empty() {
        return Err(RangeError::Empty);
    }

    let syntax = |message: String| RangeError::Syntax {
        constraint: constraint.to_string(),
        scheme: scheme.to_string(),
        message,
    };

    let parsed = Scheme::from_str(scheme).unwrap_or_default();
    constraint
        .split("||")
        .map(str::trim)
        .map(|alternative| {
            if alternative.is_empty() {
                return Err(syntax(String::from("empty alternative")));
            }
            parsed.interval(alternative, syntax)
        })
        .collect()
}

/// Reduce a version constraint to a concrete version: the lower bound of its first interval.
///
/// Constraints that can't be parsed, or that have no lower bound, are returned unchanged.
///
/// ```
/// # use purl_registry::clean_version;
/// pretty_assertions::assert_eq!(clean_version("^1.0.0", "npm"), "1.0.0");
/// pretty_assertions::assert_eq!(clean_version("~> 1.0", "gem"), "1.0");
/// pretty_assertions::assert_eq!(clean_version("< 2.0", "gem"), "< 2.0");
/// ```
pub fn clean_version(version: &str, scheme: &str) -> String {
    if version.is_empty() {
        return String::new();
    }

    match parse_range(version, scheme) {
        Ok(intervals) => intervals
            .into_iter()
            .next()
            .and_then(|interval| interval.min)
            .filter(|min| !min.is_empty())
            .unwrap_or_else(|| version.to_string()),
        Err(err) => {
            debug!(%err, version, scheme, "constraint not parsed, passing it through");
            version.to_string()
        }
    }
}

/// Fold comparators into an interval; the first lower and first upper bound win.
fn interval<'a>(comparators: impl IntoIterator<Item = (&'a str, &'a str)>) -> Interval {
    let mut interval = Interval::default();
    for (op, version) in comparators {
        let bound = match op {
            "<" | "<=" => &mut interval.max,
            "!=" => continue,
            _ => &mut interval.min,
        };
        bound.get_or_insert_with(|| version.to_string());
    }
    interval
}

fn hyphen_interval(min: &str, max: &str) -> Result<Interval, String> {
    let (min, max) = (min.trim(), max.trim());
    if min.is_empty() || max.is_empty() {
        return Err(String::from("hyphen range needs both bounds"));
    }
    Ok(Interval {
        min: Some(min.to_string()),
        max: Some(max.to_string()),
    })
}

/// Cargo constraints are validated by the same parser Cargo uses.
fn cargo_interval(input: &str) -> Result<Interval, RangeError> {
    let mut interval = Interval::default();
    for comparator in VersionReq::parse(input)?.comparators {
        let bound = match comparator.op {
            Op::Exact | Op::Greater | Op::GreaterEq | Op::Tilde | Op::Caret | Op::Wildcard => {
                &mut interval.min
            }
            Op::Less | Op::LessEq => &mut interval.max,
            op => return Err(RangeError::UnhandledSemverOperator(op)),
        };
        bound.get_or_insert_with(|| comparator_version(&comparator));
    }
    Ok(interval)
}

/// Render the version of a comparator with only the parts it specifies.
fn comparator_version(comparator: &Comparator) -> String {
    let mut version = comparator.major.to_string();
    if let Some(minor) = comparator.minor {
        version.push_str(&format!(".{minor}"));
    }
    if let Some(patch) = comparator.patch {
        version.push_str(&format!(".{patch}"));
    }
    if !comparator.pre.is_empty() {
        version.push_str(&format!("-{}", comparator.pre));
    }
    version
}

/// Parse a list of comparators separated by commas or whitespace.
fn comparators<'a>(
    operators: &'static [&'static str],
    input: &'a str,
) -> Result<Vec<(&'a str, &'a str)>, String> {
    fn operator<'a>(operators: &[&str], input: &'a str) -> IResult<&'a str, &'a str> {
        operators
            .iter()
            .find(|op| input.starts_with(**op))
            .map(|op| (&input[op.len()..], &input[..op.len()]))
            .ok_or_else(|| {
                nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))
            })
    }

    fn version(input: &str) -> IResult<&str, &str> {
        recognize((
            satisfy(|c: char| c.is_ascii_alphanumeric()),
            take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_' | '*')),
        ))
        .parse(input)
    }

    fn separator(input: &str) -> IResult<&str, &str> {
        alt((
            recognize(delimited(multispace0, char(','), multispace0)),
            multispace1,
        ))
        .parse(input)
    }

    let comparator = |input: &'a str| -> IResult<&'a str, (&'a str, &'a str)> {
        let (input, op) = opt(|s: &'a str| operator(operators, s)).parse(input)?;
        let (input, _) = multispace0(input)?;
        let (input, version) = version(input)?;
        Ok((input, (op.unwrap_or_default(), version)))
    };

    all_consuming(separated_list1(separator, comparator))
        .parse_complete(input)
        .finish()
        .map(|(_, comparators)| comparators)
        .map_err(|err| format!("unexpected input at {:?}", err.input))
}
