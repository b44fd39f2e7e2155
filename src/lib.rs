#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

mod canonical;
mod defaults;
mod ecosystem;
mod error;
mod purl;
mod range;
mod registry;
mod types;

pub use canonical::{build_canonical_string, escape_component, escape_qualifier_value};
pub use ecosystem::{
    from_package_type, is_valid_ecosystem, make_purl, make_purl_string, normalize,
    supported_ecosystems, to_observability_name, to_package_type,
};
pub use error::*;
pub use purl::{PackageReference, Qualifiers, REPOSITORY_URL};
pub use range::{Interval, clean_version, parse_range};
pub use types::{Components, NamespaceRequirement, RegistryConfig, TypeConfig, TypeRegistry};
