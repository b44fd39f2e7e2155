//! Translation between ecosystem names and package types,
//! and construction of package URLs from ecosystem-native identifiers.
//!
//! Ecosystems are the names communities use for their package managers
//! (`go`, `rubygems`, `packagist`); package types are the tokens used in package URLs
//! (`golang`, `gem`, `composer`). Most are the same; the tables here cover the rest.

use std::collections::HashSet;

use unicase::UniCase;

use crate::{Error, PackageReference, ParseError, REPOSITORY_URL, TypeRegistry, build_canonical_string};

/// Alternate ecosystem names and the canonical name they stand for.
const ALIASES: &[(&str, &str)] = &[
    ("go", "golang"),
    ("gem", "rubygems"),
    ("composer", "packagist"),
];

/// Ecosystems whose canonical name differs from their package type.
///
/// Package types must be unique in this table so that it can be read in reverse.
const PACKAGE_TYPES: &[(&str, &str)] = &[
    ("alpine", "apk"),
    ("arch", "alpm"),
    ("rubygems", "gem"),
    ("packagist", "composer"),
    ("github-actions", "githubactions"),
];

/// Display names used by vulnerability databases, keyed by package type.
const OBSERVABILITY_NAMES: &[(&str, &str)] = &[
    ("gem", "RubyGems"),
    ("npm", "npm"),
    ("pypi", "PyPI"),
    ("cargo", "crates.io"),
    ("golang", "Go"),
    ("maven", "Maven"),
    ("nuget", "NuGet"),
    ("composer", "Packagist"),
    ("hex", "Hex"),
    ("pub", "Pub"),
    ("cocoapods", "CocoaPods"),
    ("githubactions", "GitHub Actions"),
];

/// Namespaces implied by an ecosystem when its names carry none.
const DEFAULT_NAMESPACES: &[(&str, &str)] = &[("alpine", "alpine"), ("arch", "arch")];

fn find<'t>(table: &'t [(&'t str, &'t str)], key: &str) -> Option<&'t str> {
    let key = UniCase::new(key);
    table
        .iter()
        .find(|(candidate, _)| UniCase::new(*candidate) == key)
        .map(|(_, value)| *value)
}

/// The canonical name of an ecosystem.
///
/// Matching is case-insensitive; names without an alias are returned lower-cased.
///
/// ```
/// # use purl_registry::normalize;
/// pretty_assertions::assert_eq!(normalize("Go"), "golang");
/// pretty_assertions::assert_eq!(normalize("NPM"), "npm");
/// ```
pub fn normalize(ecosystem: &str) -> String {
    match find(ALIASES, ecosystem) {
        Some(canonical) => canonical.to_string(),
        None => ecosystem.to_lowercase(),
    }
}

/// The package type for an ecosystem.
///
/// ```
/// # use purl_registry::to_package_type;
/// pretty_assertions::assert_eq!(to_package_type("rubygems"), "gem");
/// pretty_assertions::assert_eq!(to_package_type("gem"), "gem");
/// pretty_assertions::assert_eq!(to_package_type("alpine"), "apk");
/// pretty_assertions::assert_eq!(to_package_type("cargo"), "cargo");
/// ```
pub fn to_package_type(ecosystem: &str) -> String {
    let normalized = normalize(ecosystem);
    match find(PACKAGE_TYPES, &normalized) {
        Some(purl_type) => purl_type.to_string(),
        None => normalized,
    }
}

/// The ecosystem for a package type; the inverse of [`to_package_type`].
///
/// Types without an entry are returned unchanged.
pub fn from_package_type(purl_type: &str) -> String {
    PACKAGE_TYPES
        .iter()
        .find(|(_, candidate)| *candidate == purl_type)
        .map_or_else(|| purl_type.to_string(), |(ecosystem, _)| ecosystem.to_string())
}

/// The name vulnerability databases use for an ecosystem.
///
/// Ecosystems without one are returned unchanged.
///
/// ```
/// # use purl_registry::to_observability_name;
/// pretty_assertions::assert_eq!(to_observability_name("gem"), "RubyGems");
/// pretty_assertions::assert_eq!(to_observability_name("cargo"), "crates.io");
/// pretty_assertions::assert_eq!(to_observability_name("Conan"), "Conan");
/// ```
pub fn to_observability_name(ecosystem: &str) -> String {
    match find(OBSERVABILITY_NAMES, &to_package_type(ecosystem)) {
        Some(name) => name.to_string(),
        None => ecosystem.to_string(),
    }
}

/// Split an ecosystem-native package name into namespace and name.
///
/// `ecosystem` must already be normalized.
fn split_native_name<'a>(ecosystem: &str, name: &'a str) -> (&'a str, &'a str) {
    let default = find(DEFAULT_NAMESPACES, ecosystem).unwrap_or_default();
    let split = match ecosystem {
        "npm" if name.starts_with('@') => name.split_once('/'),
        "golang" => name
            .rfind('/')
            .filter(|&index| index > 0)
            .map(|index| (&name[..index], &name[index + 1..])),
        "maven" => name.split_once(':'),
        "packagist" | "composer" => name.split_once('/'),
        "github-actions" => {
            let mut parts = name.splitn(3, '/');
            match (parts.next(), parts.next()) {
                (Some(owner), Some(repo)) => Some((owner, repo)),
                _ => None,
            }
        }
        _ => None,
    };
    split.unwrap_or((default, name))
}

/// Build a package reference from ecosystem-native identifiers.
///
/// The name is split into namespace and name the way the ecosystem writes them,
/// such as `@scope/name` for npm or `group:artifact` for Maven.
/// A non-empty `registry_url` that is not the type's default registry is recorded
/// as the `repository_url` qualifier.
///
/// ```
/// # use purl_registry::{make_purl, TypeRegistry};
/// let registry = TypeRegistry::embedded()?;
/// let purl = make_purl(registry, "maven", "org.apache:commons", "1.0", "")?;
/// pretty_assertions::assert_eq!(purl.to_string(), "pkg:maven/org.apache/commons@1.0");
/// # Ok::<(), purl_registry::Error>(())
/// ```
pub fn make_purl(
    registry: &TypeRegistry,
    ecosystem: &str,
    name: &str,
    version: &str,
    registry_url: &str,
) -> Result<PackageReference, Error> {
    let purl_type = to_package_type(ecosystem);
    let (namespace, name) = split_native_name(&normalize(ecosystem), name);

    let purl = PackageReference::builder()
        .purl_type(purl_type.as_str())
        .namespace(namespace)
        .name(name)
        .version(version)
        .build()?;

    Ok(if registry.is_non_default_registry(&purl_type, registry_url) {
        purl.with_qualifier(REPOSITORY_URL, registry_url)
    } else {
        purl
    })
}

/// Like [`make_purl`], but renders the package URL directly.
///
/// The output is identical to formatting the result of [`make_purl`].
///
/// ```
/// # use purl_registry::{make_purl_string, TypeRegistry};
/// let registry = TypeRegistry::embedded()?;
/// let purl = make_purl_string(registry, "npm", "lodash", "1.0.0", "https://npm.example.com")?;
/// pretty_assertions::assert_eq!(purl, "pkg:npm/lodash@1.0.0?repository_url=https:%2F%2Fnpm.example.com");
/// # Ok::<(), purl_registry::Error>(())
/// ```
pub fn make_purl_string(
    registry: &TypeRegistry,
    ecosystem: &str,
    name: &str,
    version: &str,
    registry_url: &str,
) -> Result<String, Error> {
    let purl_type = to_package_type(ecosystem);
    let (namespace, name) = split_native_name(&normalize(ecosystem), name);
    if name.is_empty() {
        return Err(ParseError::EmptyName.into());
    }

    let qualifier = registry
        .is_non_default_registry(&purl_type, registry_url)
        .then_some((REPOSITORY_URL, registry_url));
    Ok(build_canonical_string(&purl_type, namespace, name, version, qualifier))
}

/// All ecosystem names this crate understands: every known type,
/// then every alias, then every ecosystem whose type token differs.
pub fn supported_ecosystems(registry: &TypeRegistry) -> Vec<&str> {
    let mut seen = HashSet::new();
    registry
        .known_types()
        .into_iter()
        .chain(ALIASES.iter().map(|(alias, _)| *alias))
        .chain(PACKAGE_TYPES.iter().map(|(ecosystem, _)| *ecosystem))
        .filter(|ecosystem| seen.insert(*ecosystem))
        .collect()
}

/// Whether the ecosystem maps to a known package type.
pub fn is_valid_ecosystem(registry: &TypeRegistry, ecosystem: &str) -> bool {
    registry.is_known(&to_package_type(ecosystem))
}
