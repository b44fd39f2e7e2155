use std::{collections::BTreeMap, sync::OnceLock};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::debug;
use utoipa::ToSchema;

use crate::{DatasetError, registry::cached_regex};

/// The type dataset compiled into the library.
const TYPES_JSON: &str = include_str!("types.json");

static EMBEDDED: OnceLock<Result<TypeRegistry, DatasetError>> = OnceLock::new();

/// Whether a package type expects a namespace.
///
/// This is a property of the type; [`PackageReference`](crate::PackageReference)
/// does not enforce it.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NamespaceRequirement {
    /// The type requires a namespace.
    Required,

    /// The type does not allow a namespace.
    Prohibited,

    /// A namespace may or may not be present.
    /// Unrecognized values in a dataset are read as this.
    #[default]
    #[serde(other)]
    Optional,
}

/// Metadata for a single package type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct TypeConfig {
    description: String,
    default_registry: Option<String>,
    namespace_requirement: NamespaceRequirement,
    examples: Vec<String>,
    registry_config: Option<RegistryConfig>,
}

impl TypeConfig {
    /// Human readable description of the type.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The default registry for the type, if one is configured.
    pub fn default_registry(&self) -> Option<&str> {
        present(&self.default_registry)
    }

    /// Whether the type expects a namespace.
    pub fn namespace_requirement(&self) -> NamespaceRequirement {
        self.namespace_requirement
    }

    /// Whether the type requires a namespace.
    pub fn namespace_required(&self) -> bool {
        self.namespace_requirement == NamespaceRequirement::Required
    }

    /// Whether the type does not allow a namespace.
    pub fn namespace_prohibited(&self) -> bool {
        self.namespace_requirement == NamespaceRequirement::Prohibited
    }

    /// Example package URLs for the type.
    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    /// Registry URL templates for the type, if any.
    pub fn registry_config(&self) -> Option<&RegistryConfig> {
        self.registry_config.as_ref()
    }
}

/// The registry URL template set for a package type.
///
/// Templates substitute the literal placeholders `{namespace}`, `{name}`, and `{version}`.
/// The reverse pattern extracts those components back out of a URL;
/// which capture group holds which component is decided by [`Components`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegistryConfig {
    base_url: Option<String>,
    reverse_regex: Option<String>,
    uri_template: Option<String>,
    uri_template_no_namespace: Option<String>,
    uri_template_with_version: Option<String>,
    uri_template_with_version_no_namespace: Option<String>,
    components: Components,
}

impl RegistryConfig {
    /// The base URL of the registry web interface.
    pub fn base_url(&self) -> Option<&str> {
        present(&self.base_url)
    }

    /// The pattern used to match registry URLs for the type.
    pub fn reverse_regex(&self) -> Option<&str> {
        present(&self.reverse_regex)
    }

    /// The general template.
    pub fn uri_template(&self) -> Option<&str> {
        present(&self.uri_template)
    }

    /// The template used when the package has no namespace.
    pub fn uri_template_no_namespace(&self) -> Option<&str> {
        present(&self.uri_template_no_namespace)
    }

    /// The template used when the URL includes a version.
    pub fn uri_template_with_version(&self) -> Option<&str> {
        present(&self.uri_template_with_version)
    }

    /// The template used when the URL includes a version but the package has no namespace.
    pub fn uri_template_with_version_no_namespace(&self) -> Option<&str> {
        present(&self.uri_template_with_version_no_namespace)
    }

    /// Describes which components appear in registry URLs.
    pub fn components(&self) -> &Components {
        &self.components
    }
}

/// Describes which package components appear in registry URLs for a type.
///
/// Other keys in a dataset's `components` block are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Components {
    namespace: bool,
    namespace_required: bool,
    namespace_prefix: Option<String>,
    version_in_url: bool,
    version_path: Option<String>,
}

impl Components {
    /// Whether registry URLs have a namespace segment.
    pub fn namespace(&self) -> bool {
        self.namespace
    }

    /// Whether the namespace segment is always present.
    pub fn namespace_required(&self) -> bool {
        self.namespace_required
    }

    /// Prefix displayed before the namespace in URLs, such as `@` for npm scopes.
    pub fn namespace_prefix(&self) -> Option<&str> {
        present(&self.namespace_prefix)
    }

    /// Whether registry URLs can carry a version.
    pub fn version_in_url(&self) -> bool {
        self.version_in_url
    }

    /// The text separating the version from the rest of the URL.
    pub fn version_path(&self) -> Option<&str> {
        present(&self.version_path)
    }
}

/// The type configuration store: a read-only table of package types.
///
/// Every operation in this crate that needs type metadata takes a `&TypeRegistry`.
/// Use [`TypeRegistry::embedded`] for the dataset compiled into the library,
/// or [`TypeRegistry::from_json`] to build one from alternate data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TypeRegistry {
    #[serde(default)]
    version: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    source: String,

    #[serde(default)]
    last_updated: String,

    types: BTreeMap<String, TypeConfig>,
}

impl TypeRegistry {
    /// The registry built from the dataset compiled into the library.
    ///
    /// The dataset is loaded once; concurrent first callers wait for the load,
    /// and every caller observes the same result, including a load failure.
    pub fn embedded() -> Result<&'static TypeRegistry, DatasetError> {
        EMBEDDED
            .get_or_init(|| Self::from_json(TYPES_JSON))
            .as_ref()
            .map_err(|err| err.clone())
    }

    /// Build a registry from a JSON dataset.
    ///
    /// Every reverse pattern is compiled and its capture groups are checked
    /// against the [`Components`] of its type before the registry is returned.
    /// Compiled patterns go into a process-wide cache that is never evicted.
    #[tracing::instrument(skip_all)]
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let registry = serde_json::from_str::<Self>(json)?;
        registry.validate()?;
        debug!(
            version = %registry.version,
            types = registry.types.len(),
            "loaded type dataset"
        );
        Ok(registry)
    }

    fn validate(&self) -> Result<(), DatasetError> {
        for (purl_type, config) in &self.types {
            let Some(registry) = config.registry_config() else {
                continue;
            };
            let Some(pattern) = registry.reverse_regex() else {
                continue;
            };

            let regex = cached_regex(pattern).map_err(|err| DatasetError::Pattern {
                purl_type: purl_type.clone(),
                pattern: pattern.to_string(),
                message: err.to_string(),
            })?;

            // The version group is optional; namespace and name are not.
            let min = if registry.components().namespace() { 2 } else { 1 };
            let max = min + 1;
            let found = regex.captures_len() - 1;
            if !(min..=max).contains(&found) {
                return Err(DatasetError::GroupCount {
                    purl_type: purl_type.clone(),
                    min,
                    max,
                    found,
                });
            }
        }
        Ok(())
    }

    /// The version of the dataset.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Human readable description of the dataset.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Look up the configuration for a type.
    pub fn lookup(&self, purl_type: &str) -> Option<&TypeConfig> {
        self.types.get(purl_type)
    }

    /// The names of all known types, sorted.
    pub fn known_types(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    /// Whether the type is known.
    pub fn is_known(&self, purl_type: &str) -> bool {
        self.types.contains_key(purl_type)
    }

    /// The default registry for a type, if the type is known and has one.
    pub fn default_registry(&self, purl_type: &str) -> Option<&str> {
        self.lookup(purl_type).and_then(TypeConfig::default_registry)
    }

    /// Iterate over all types and their configuration, sorted by type name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeConfig)> {
        self.types.iter().map(|(name, config)| (name.as_str(), config))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}
