use maplit::btreemap;
use proptest::prelude::*;
use simple_test_case::test_case;

use purl_registry::*;

#[test_case("npm", "@babel", "core", "7.24.0", None, "pkg:npm/%40babel/core@7.24.0"; "npm scoped")]
#[test_case("maven", "org.apache", "commons", "1.0", None, "pkg:maven/org.apache/commons@1.0"; "maven")]
#[test_case("npm", "", "lodash", "1.0.0", Some(("repository_url", "https://npm.example.com")), "pkg:npm/lodash@1.0.0?repository_url=https:%2F%2Fnpm.example.com"; "repository url")]
#[test_case("golang", "github.com/gorilla", "mux", "v1.8.0", None, "pkg:golang/github.com/gorilla/mux@v1.8.0"; "namespace segments")]
#[test_case("generic", "", "name with space", "1.0+build", None, "pkg:generic/name%20with%20space@1.0%2Bbuild"; "escaped name and version")]
#[test]
fn build_canonical_string_output(
    purl_type: &str,
    namespace: &str,
    name: &str,
    version: &str,
    qualifier: Option<(&str, &str)>,
    expected: &str,
) {
    pretty_assertions::assert_eq!(
        build_canonical_string(purl_type, namespace, name, version, qualifier),
        expected
    );
}

#[test]
fn formatter_sorts_qualifiers() {
    let purl = PackageReference::builder()
        .purl_type("deb")
        .namespace("debian")
        .name("curl")
        .version("7.50.3-1")
        .qualifiers(Qualifiers::from(btreemap! {
            String::from("distro") => String::from("jessie"),
            String::from("Arch") => String::from("i386"),
        }))
        .build()
        .expect("must build");
    pretty_assertions::assert_eq!(
        purl.to_string(),
        "pkg:deb/debian/curl@7.50.3-1?arch=i386&distro=jessie"
    );
}

proptest! {
    /// Building directly and formatting a structured reference agree on every input.
    #[test]
    fn fast_path_matches_formatter(
        purl_type in "[a-zA-Z][a-zA-Z0-9.+-]{0,8}",
        namespace in "\\PC{0,16}",
        name in "\\PC{1,16}",
        version in "\\PC{0,10}",
        qualifier in proptest::option::of(("[a-z_]{1,8}", "\\PC{0,16}")),
    ) {
        let fast = build_canonical_string(
            &purl_type,
            &namespace,
            &name,
            &version,
            qualifier.as_ref().map(|(key, value)| (key.as_str(), value.as_str())),
        );

        let purl = PackageReference::builder()
            .purl_type(purl_type.as_str())
            .namespace(namespace.as_str())
            .name(name.as_str())
            .version(version.as_str())
            .qualifiers(qualifier.clone().into_iter().collect())
            .build()
            .expect("must build");
        prop_assert_eq!(fast, purl.to_string());
    }

    /// Canonical strings parse back to the reference they were built from.
    #[test]
    fn formatter_parses_back(
        purl_type in "[a-z][a-z0-9.+-]{0,8}",
        namespace in proptest::option::of("[^/\\p{C}]{1,8}(/[^/\\p{C}]{1,8}){0,2}"),
        name in "\\PC{1,16}",
        version in proptest::option::of("\\PC{1,10}"),
    ) {
        let purl = PackageReference::builder()
            .purl_type(purl_type)
            .maybe_namespace(namespace)
            .name(name)
            .maybe_version(version)
            .build()
            .expect("must build");
        let parsed = PackageReference::parse(purl.to_string()).expect("must parse");
        prop_assert_eq!(parsed, purl);
    }
}
