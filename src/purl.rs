use std::{collections::BTreeMap, fmt, str::FromStr};

use bon::bon;
use derive_more::{Deref, DerefMut};
use nom::{
    Finish, IResult, Parser,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{char, satisfy},
    combinator::{all_consuming, recognize},
    multi::separated_list1,
    sequence::{separated_pair, terminated},
};
use serde::{Deserialize, Serialize, Serializer};

use crate::{
    Error, ParseError, TypeRegistry,
    canonical::{unescape, write_purl},
    error::{self, span},
};

/// The qualifier holding the registry a package was resolved from.
pub const REPOSITORY_URL: &str = "repository_url";

/// Qualifiers on a [`PackageReference`]: out-of-band key/value metadata.
///
/// Keys are stored lower-cased and are unique; iteration is sorted by key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deref, DerefMut)]
pub struct Qualifiers(BTreeMap<String, String>);

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Qualifiers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into().to_ascii_lowercase(), value.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for Qualifiers {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

/// The structured identity of a package: the parts of a package URL.
///
/// Construct one by parsing a package URL:
/// ```
/// # use purl_registry::PackageReference;
/// let purl = PackageReference::parse("pkg:npm/%40babel/core@7.24.0")?;
/// pretty_assertions::assert_eq!(purl.namespace(), Some("@babel"));
/// pretty_assertions::assert_eq!(purl.name(), "core");
/// pretty_assertions::assert_eq!(purl.to_string(), "pkg:npm/%40babel/core@7.24.0");
/// # Ok::<(), purl_registry::ParseError>(())
/// ```
///
/// Or with the builder:
/// ```
/// # use purl_registry::PackageReference;
/// let purl = PackageReference::builder()
///     .purl_type("maven")
///     .namespace("org.apache")
///     .name("commons")
///     .version("1.0")
///     .build()?;
/// pretty_assertions::assert_eq!(purl.to_string(), "pkg:maven/org.apache/commons@1.0");
/// # Ok::<(), purl_registry::ParseError>(())
/// ```
///
/// The name is never empty. Whether the type requires or prohibits a namespace
/// is not checked here; see [`TypeConfig`](crate::TypeConfig).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageReference {
    purl_type: String,
    namespace: Option<String>,
    name: String,
    version: Option<String>,
    qualifiers: Qualifiers,
    subpath: Option<String>,
}

#[bon]
impl PackageReference {
    /// Create a package reference from its parts.
    ///
    /// The type is lower-cased. Empty optional parts are treated as absent.
    #[builder]
    pub fn new(
        #[builder(into)] purl_type: String,
        #[builder(into)] namespace: Option<String>,
        #[builder(into)] name: String,
        #[builder(into)] version: Option<String>,
        #[builder(default)] qualifiers: Qualifiers,
        #[builder(into)] subpath: Option<String>,
    ) -> Result<Self, ParseError> {
        if name.is_empty() {
            return Err(ParseError::EmptyName);
        }

        Ok(Self {
            purl_type: purl_type.to_ascii_lowercase(),
            namespace: namespace.filter(|namespace| !namespace.is_empty()),
            name,
            version: version.filter(|version| !version.is_empty()),
            qualifiers,
            subpath: subpath.filter(|subpath| !subpath.is_empty()),
        })
    }
}

impl PackageReference {
    /// Parse a package URL.
    ///
    /// Components are percent-decoded; the type is lower-cased.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, ParseError> {
        /// `nom` parser for the scheme and type.
        fn parse_type(s: &str) -> IResult<&str, &str> {
            let (s, _) = tag_no_case("pkg:").parse(s)?;
            let (s, _) = take_while(|c: char| c == '/').parse(s)?;
            terminated(
                recognize((
                    satisfy(|c: char| c.is_ascii_alphabetic()),
                    take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-')),
                )),
                char('/'),
            )
            .parse(s)
        }

        /// `nom` parser for the `&`-separated `key=value` qualifier pairs.
        fn parse_qualifiers(s: &str) -> IResult<&str, Vec<(&str, &str)>> {
            all_consuming(separated_list1(
                char('&'),
                separated_pair(
                    take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')),
                    char('='),
                    take_while(|c: char| c != '&'),
                ),
            ))
            .parse(s)
        }

        /// Decode a single component, reporting where it failed.
        macro_rules! decode {
            ($input:expr, $component:literal, $fragment:expr) => {
                unescape($fragment).ok_or_else(|| ParseError::Encoding {
                    component: $component,
                    input: $input.to_string(),
                    span: span($input, $fragment).into(),
                })
            };
        }

        let input = input.as_ref().trim();
        if input.is_empty() {
            return Err(ParseError::Empty);
        }

        let (rest, purl_type) = match parse_type.parse_complete(input).finish() {
            Ok(parsed) => parsed,
            Err(err) => return Err(error::syntax!(input => span(input, err.input), err.cloned())),
        };

        let (rest, subpath) = match rest.rsplit_once('#') {
            Some((rest, subpath)) => (rest, subpath),
            None => (rest, ""),
        };
        let (rest, qualifiers) = match rest.rsplit_once('?') {
            Some((rest, qualifiers)) => (rest, qualifiers),
            None => (rest, ""),
        };

        let rest = rest.trim_matches('/');
        let (rest, version) = match rest.rsplit_once('@') {
            Some((rest, version)) if !version.contains('/') => (rest, version),
            _ => (rest, ""),
        };
        let (namespace, name) = rest.rsplit_once('/').unwrap_or(("", rest));

        let name = decode!(input, "name", name)?;
        let version = decode!(input, "version", version)?;

        let mut segments = Vec::new();
        for segment in namespace.split('/').filter(|s| !s.is_empty()) {
            segments.push(decode!(input, "namespace", segment)?);
        }

        let mut subpath_segments = Vec::new();
        for segment in subpath.split('/').filter(|s| !matches!(*s, "" | "." | "..")) {
            subpath_segments.push(decode!(input, "subpath", segment)?);
        }

        let qualifiers = if qualifiers.is_empty() {
            Qualifiers::default()
        } else {
            let pairs = match parse_qualifiers.parse_complete(qualifiers).finish() {
                Ok((_, pairs)) => pairs,
                Err(err) => {
                    return Err(error::syntax!(input => span(input, err.input), err.cloned()));
                }
            };

            let mut decoded = Qualifiers::default();
            for (key, value) in pairs {
                let value = decode!(input, "qualifiers", value)?;
                if !value.is_empty() {
                    decoded.insert(key.to_ascii_lowercase(), value.into_owned());
                }
            }
            decoded
        };

        Self::builder()
            .purl_type(purl_type)
            .namespace(segments.join("/"))
            .name(name)
            .version(version)
            .qualifiers(qualifiers)
            .subpath(subpath_segments.join("/"))
            .build()
    }

    /// The package type, such as `npm` or `maven`.
    pub fn purl_type(&self) -> &str {
        &self.purl_type
    }

    /// The namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The version, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The qualifiers.
    pub fn qualifiers(&self) -> &Qualifiers {
        &self.qualifiers
    }

    /// The subpath, if any.
    pub fn subpath(&self) -> Option<&str> {
        self.subpath.as_deref()
    }

    /// The value of a qualifier, if present.
    pub fn qualifier(&self, key: &str) -> Option<&str> {
        self.qualifiers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The `repository_url` qualifier, if present.
    pub fn repository_url(&self) -> Option<&str> {
        self.qualifier(REPOSITORY_URL)
    }

    /// The name as it is written in the package's ecosystem.
    ///
    /// Maven joins group and artifact with `:`; other types join namespace and name with `/`.
    ///
    /// ```
    /// # use purl_registry::PackageReference;
    /// let purl = PackageReference::parse("pkg:maven/org.apache/commons@1.0")?;
    /// pretty_assertions::assert_eq!(purl.full_name(), "org.apache:commons");
    /// let purl = PackageReference::parse("pkg:npm/%40babel/core")?;
    /// pretty_assertions::assert_eq!(purl.full_name(), "@babel/core");
    /// # Ok::<(), purl_registry::ParseError>(())
    /// ```
    pub fn full_name(&self) -> String {
        match (self.namespace(), self.purl_type()) {
            (None, _) => self.name.clone(),
            (Some(namespace), "maven") => format!("{namespace}:{}", self.name),
            (Some(namespace), _) => format!("{namespace}/{}", self.name),
        }
    }

    /// A copy of this reference with the version replaced.
    /// An empty version removes it.
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            version: Some(version).filter(|version| !version.is_empty()),
            ..self.clone()
        }
    }

    /// A copy of this reference without a version.
    pub fn without_version(&self) -> Self {
        Self {
            version: None,
            ..self.clone()
        }
    }

    /// A copy of this reference with the qualifier set, replacing any existing value.
    pub fn with_qualifier(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut purl = self.clone();
        purl.qualifiers
            .insert(key.into().to_ascii_lowercase(), value.into());
        purl
    }

    /// Whether the package comes from a registry other than its type's default.
    pub fn is_private_registry(&self, registry: &TypeRegistry) -> bool {
        self.repository_url()
            .is_some_and(|url| registry.is_non_default_registry(&self.purl_type, url))
    }

    /// The registry URL for the package, without the version.
    pub fn registry_url(&self, registry: &TypeRegistry) -> Result<String, Error> {
        registry.build_registry_url(self, false)
    }

    /// The registry URL for the package, including the version where the type supports it.
    pub fn registry_url_with_version(&self, registry: &TypeRegistry) -> Result<String, Error> {
        match self.version() {
            Some(_) => registry.build_registry_url(self, true),
            None => self.registry_url(registry),
        }
    }
}

impl FromStr for PackageReference {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_purl(
            f,
            &self.purl_type,
            self.namespace().unwrap_or_default(),
            &self.name,
            self.version().unwrap_or_default(),
            self.qualifiers
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
            self.subpath().unwrap_or_default(),
        )
    }
}

impl Serialize for PackageReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let input = String::deserialize(deserializer)?;
        Self::parse(&input).map_err(serde::de::Error::custom)
    }
}
