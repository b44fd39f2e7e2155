use std::{
    collections::HashMap,
    sync::{LazyLock, PoisonError, RwLock},
};

use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::{Components, DatasetError, Error, PackageReference, RegistryConfig, TypeRegistry};

/// Compiled reverse patterns, keyed by pattern text.
///
/// Two callers racing to compile the same pattern both compile it;
/// the last one to publish wins, and both results are equivalent.
///
/// Entries are never evicted. Registries built with [`TypeRegistry::from_json`]
/// share the cache, so every distinct pattern they load stays compiled for the
/// life of the process.
static REGEX_CACHE: LazyLock<RwLock<HashMap<String, Regex>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Return the compiled form of `pattern`, compiling and caching it on first use.
pub(crate) fn cached_regex(pattern: &str) -> Result<Regex, regex::Error> {
    {
        let cache = REGEX_CACHE.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(regex) = cache.get(pattern) {
            return Ok(regex.clone());
        }
    }

    debug!(pattern, "compiling reverse pattern");
    let regex = Regex::new(pattern)?;
    REGEX_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

/// The capture group holding each component in a reverse pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CaptureLayout {
    namespace: Option<usize>,
    name: usize,
    version: usize,
}

impl From<&Components> for CaptureLayout {
    fn from(components: &Components) -> Self {
        // Required and optional namespaces share a layout;
        // an optional namespace that did not participate in the match reads as empty.
        if components.namespace() {
            Self {
                namespace: Some(1),
                name: 2,
                version: 3,
            }
        } else {
            Self {
                namespace: None,
                name: 1,
                version: 2,
            }
        }
    }
}

impl CaptureLayout {
    fn extract<'h>(&self, captures: &Captures<'h>) -> (Option<&'h str>, &'h str, Option<&'h str>) {
        let group = |index: usize| captures.get(index).map(|m| m.as_str()).unwrap_or_default();
        let nonempty = |value: &'h str| Some(value).filter(|value| !value.is_empty());

        let namespace = self.namespace.map(group).and_then(nonempty);
        let version = nonempty(group(self.version));
        (namespace, group(self.name), version)
    }
}

impl RegistryConfig {
    /// Select the template for a package.
    ///
    /// A versioned template is chosen only when `versioned` is set and the type
    /// supports versions in its URLs; otherwise, or if the type has no versioned
    /// template, the unversioned templates are considered.
    fn select_template(&self, has_namespace: bool, versioned: bool) -> Option<&str> {
        let with_version = if !versioned || !self.components().version_in_url() {
            None
        } else if has_namespace {
            self.uri_template_with_version()
        } else {
            self.uri_template_with_version_no_namespace()
                .or_else(|| self.uri_template_with_version())
        };

        with_version.or_else(|| {
            if has_namespace {
                self.uri_template()
            } else {
                self.uri_template_no_namespace()
                    .or_else(|| self.uri_template())
            }
        })
    }

    /// The namespace as it is displayed in URLs, with the configured prefix applied.
    fn display_namespace(&self, namespace: &str) -> String {
        match self.components().namespace_prefix() {
            Some(prefix) if !namespace.starts_with(prefix) => format!("{prefix}{namespace}"),
            _ => namespace.to_string(),
        }
    }
}

impl TypeRegistry {
    fn registry_config(&self, purl_type: &str) -> Result<&RegistryConfig, Error> {
        self.lookup(purl_type)
            .and_then(|config| config.registry_config())
            .ok_or_else(|| Error::no_registry_config(purl_type))
    }

    /// Build the human facing registry URL for a package.
    ///
    /// The version is included only if `include_version` is set, the package
    /// has a version, and the type supports versions in its URLs.
    ///
    /// ```
    /// # use purl_registry::{PackageReference, TypeRegistry};
    /// let registry = TypeRegistry::embedded()?;
    /// let purl = PackageReference::parse("pkg:npm/%40babel/core@7.24.0")?;
    /// let url = registry.build_registry_url(&purl, true)?;
    /// pretty_assertions::assert_eq!(url, "https://www.npmjs.com/package/@babel/core/v/7.24.0");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn build_registry_url(
        &self,
        purl: &PackageReference,
        include_version: bool,
    ) -> Result<String, Error> {
        let config = self.registry_config(purl.purl_type())?;

        let namespace = purl.namespace().unwrap_or_default();
        let version = if include_version {
            purl.version().unwrap_or_default()
        } else {
            ""
        };

        let template = config
            .select_template(!namespace.is_empty(), !version.is_empty())
            .ok_or_else(|| Error::no_registry_config(purl.purl_type()))?;

        let namespace = if namespace.is_empty() {
            String::new()
        } else {
            config.display_namespace(namespace)
        };

        Ok(template
            .replace("{namespace}", &namespace)
            .replace("{name}", purl.name())
            .replace("{version}", version))
    }

    /// Extract a package from a registry URL using the reverse pattern of `purl_type`.
    #[tracing::instrument(skip(self))]
    pub fn match_registry_url(&self, url: &str, purl_type: &str) -> Result<PackageReference, Error> {
        let config = self.registry_config(purl_type)?;
        let pattern = config
            .reverse_regex()
            .ok_or_else(|| Error::no_registry_config(purl_type))?;

        let regex = cached_regex(pattern).map_err(|err| DatasetError::Pattern {
            purl_type: purl_type.to_string(),
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        let captures = regex.captures(url).ok_or_else(|| Error::no_match(url))?;

        let layout = CaptureLayout::from(config.components());
        let (namespace, name, version) = layout.extract(&captures);
        if name.is_empty() {
            return Err(Error::no_match(url));
        }

        PackageReference::builder()
            .purl_type(purl_type)
            .maybe_namespace(namespace)
            .name(name)
            .maybe_version(version)
            .build()
            .map_err(Error::from)
    }

    /// Extract a package from a registry URL, trying every known type in sorted order.
    ///
    /// The first type whose reverse pattern yields a package wins.
    #[tracing::instrument(skip(self))]
    pub fn match_registry_url_any(&self, url: &str) -> Result<PackageReference, Error> {
        for purl_type in self.known_types() {
            match self.match_registry_url(url, purl_type) {
                Ok(purl) => return Ok(purl),
                Err(err) => trace!(purl_type, %err, "type did not match"),
            }
        }
        Err(Error::no_match(url))
    }
}
