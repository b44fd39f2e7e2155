use assert_matches::assert_matches;
use proptest::prelude::*;
use simple_test_case::test_case;

use purl_registry::*;

use crate::embedded;

#[test_case("npm", "npm"; "npm")]
#[test_case("cargo", "cargo"; "cargo")]
#[test_case("go", "golang"; "go")]
#[test_case("golang", "golang"; "golang")]
#[test_case("gem", "gem"; "gem")]
#[test_case("rubygems", "gem"; "rubygems")]
#[test_case("RubyGems", "gem"; "rubygems mixed case")]
#[test_case("composer", "composer"; "composer")]
#[test_case("packagist", "composer"; "packagist")]
#[test_case("alpine", "apk"; "alpine")]
#[test_case("arch", "alpm"; "arch")]
#[test_case("github-actions", "githubactions"; "github actions")]
#[test_case("conan", "conan"; "passthrough")]
#[test]
fn package_type(ecosystem: &str, expected: &str) {
    pretty_assertions::assert_eq!(to_package_type(ecosystem), expected);
}

#[test_case("gem", "RubyGems"; "gem")]
#[test_case("rubygems", "RubyGems"; "rubygems")]
#[test_case("npm", "npm"; "npm")]
#[test_case("pypi", "PyPI"; "pypi")]
#[test_case("cargo", "crates.io"; "cargo")]
#[test_case("go", "Go"; "go")]
#[test_case("golang", "Go"; "golang")]
#[test_case("maven", "Maven"; "maven")]
#[test_case("nuget", "NuGet"; "nuget")]
#[test_case("composer", "Packagist"; "composer")]
#[test_case("packagist", "Packagist"; "packagist")]
#[test_case("hex", "Hex"; "hex")]
#[test_case("pub", "Pub"; "dart pub")]
#[test_case("cocoapods", "CocoaPods"; "cocoapods")]
#[test_case("github-actions", "GitHub Actions"; "github actions")]
#[test_case("unknown", "unknown"; "unknown")]
#[test]
fn observability_name(ecosystem: &str, expected: &str) {
    pretty_assertions::assert_eq!(to_observability_name(ecosystem), expected);
}

#[test_case("go"; "go")]
#[test_case("gem"; "gem")]
#[test_case("composer"; "composer")]
#[test_case("alpine"; "alpine")]
#[test_case("arch"; "arch")]
#[test_case("rubygems"; "rubygems")]
#[test_case("packagist"; "packagist")]
#[test_case("github-actions"; "github actions")]
#[test]
fn package_type_is_idempotent(ecosystem: &str) {
    let once = to_package_type(&normalize(ecosystem));
    pretty_assertions::assert_eq!(to_package_type(&once), once);
}

#[test_case("apk"; "apk")]
#[test_case("gem"; "gem")]
#[test_case("githubactions"; "githubactions")]
#[test_case("npm"; "npm")]
#[test]
fn from_package_type_round_trips(purl_type: &str) {
    pretty_assertions::assert_eq!(to_package_type(&from_package_type(purl_type)), purl_type);
}

#[test_case("npm", "lodash", "4.17.21", "pkg:npm/lodash@4.17.21"; "npm")]
#[test_case("npm", "@babel/core", "7.24.0", "pkg:npm/%40babel/core@7.24.0"; "npm scoped")]
#[test_case("go", "github.com/gorilla/mux", "v1.8.0", "pkg:golang/github.com/gorilla/mux@v1.8.0"; "go")]
#[test_case("maven", "org.apache:commons", "1.0", "pkg:maven/org.apache/commons@1.0"; "maven")]
#[test_case("composer", "symfony/console", "6.0.0", "pkg:composer/symfony/console@6.0.0"; "composer")]
#[test_case("packagist", "symfony/console", "6.0.0", "pkg:composer/symfony/console@6.0.0"; "packagist")]
#[test_case("gem", "rails", "7.0.4", "pkg:gem/rails@7.0.4"; "gem")]
#[test_case("rubygems", "rails", "7.0.4", "pkg:gem/rails@7.0.4"; "rubygems")]
#[test_case("alpine", "curl", "8.0.0", "pkg:apk/alpine/curl@8.0.0"; "alpine")]
#[test_case("arch", "base", "1.0", "pkg:alpm/arch/base@1.0"; "arch")]
#[test_case("github-actions", "actions/cache/restore", "v3", "pkg:githubactions/actions/cache@v3"; "github actions")]
#[test_case("cargo", "serde", "", "pkg:cargo/serde"; "no version")]
#[test_case("npm", "@ñ/café", "1.0-β", "pkg:npm/%40%C3%B1/caf%C3%A9@1.0-%CE%B2"; "multibyte")]
#[test]
fn make_purl_string_matches(ecosystem: &str, name: &str, version: &str, expected: &str) {
    let fast = make_purl_string(embedded(), ecosystem, name, version, "").expect("must build");
    pretty_assertions::assert_eq!(fast, expected);

    let purl = make_purl(embedded(), ecosystem, name, version, "").expect("must build");
    pretty_assertions::assert_eq!(purl.to_string(), expected);
}

#[test]
fn make_purl_private_registry() {
    let purl = make_purl(embedded(), "npm", "lodash", "1.0.0", "https://npm.example.com")
        .expect("must build");
    pretty_assertions::assert_eq!(purl.repository_url(), Some("https://npm.example.com"));
    assert!(purl.is_private_registry(embedded()));
    pretty_assertions::assert_eq!(
        purl.to_string(),
        "pkg:npm/lodash@1.0.0?repository_url=https:%2F%2Fnpm.example.com"
    );
}

#[test]
fn make_purl_default_registry() {
    let url = "https://registry.npmjs.org";
    let purl = make_purl(embedded(), "npm", "lodash", "1.0.0", url).expect("must build");
    pretty_assertions::assert_eq!(purl.repository_url(), None);
    assert!(!purl.is_private_registry(embedded()));

    let fast = make_purl_string(embedded(), "npm", "lodash", "1.0.0", url).expect("must build");
    pretty_assertions::assert_eq!(fast, "pkg:npm/lodash@1.0.0");
}

#[test_case("npm", "@babel/"; "npm empty name")]
#[test_case("cargo", ""; "empty")]
#[test]
fn make_purl_empty_name(ecosystem: &str, name: &str) {
    assert_matches!(
        make_purl(embedded(), ecosystem, name, "1.0", ""),
        Err(Error::Parse(ParseError::EmptyName))
    );
    assert_matches!(
        make_purl_string(embedded(), ecosystem, name, "1.0", ""),
        Err(Error::Parse(ParseError::EmptyName))
    );
}

#[test]
fn supported_ecosystems_lists_types_and_aliases() {
    let ecosystems = supported_ecosystems(embedded());
    for required in ["npm", "cargo", "pypi", "maven", "golang", "go", "gem", "alpine", "github-actions"] {
        assert!(ecosystems.contains(&required), "missing {required}");
    }

    let mut unique = ecosystems.clone();
    unique.sort_unstable();
    unique.dedup();
    pretty_assertions::assert_eq!(unique.len(), ecosystems.len(), "duplicates in {ecosystems:?}");
}

#[test_case("npm", true; "npm")]
#[test_case("cargo", true; "cargo")]
#[test_case("pypi", true; "pypi")]
#[test_case("golang", true; "golang")]
#[test_case("go", true; "go")]
#[test_case("gem", true; "gem")]
#[test_case("rubygems", true; "rubygems")]
#[test_case("alpine", true; "alpine")]
#[test_case("GitHub-Actions", true; "github actions")]
#[test_case("notarealecosystem", false; "unknown")]
#[test]
fn valid_ecosystem(ecosystem: &str, expected: bool) {
    pretty_assertions::assert_eq!(is_valid_ecosystem(embedded(), ecosystem), expected);
}

proptest! {
    /// The fast path and the structured formatter never disagree.
    #[test]
    fn fast_path_matches_formatter(
        ecosystem in "(npm|go|maven|composer|gem|alpine|arch|github-actions|cargo|pypi|NuGet)",
        name in "\\PC{1,24}",
        version in "\\PC{0,10}",
        registry_url in "(|https://registry\\.npmjs\\.org|https://[a-z]{1,8}\\.example\\.com/a b|https://ñ\\.example\\.com)",
    ) {
        let fast = make_purl_string(embedded(), &ecosystem, &name, &version, &registry_url);
        let structured = make_purl(embedded(), &ecosystem, &name, &version, &registry_url);
        match (fast, structured) {
            (Ok(fast), Ok(structured)) => prop_assert_eq!(fast, structured.to_string()),
            (Err(_), Err(_)) => {}
            (fast, structured) => prop_assert!(false, "disagree: {fast:?} vs {structured:?}"),
        }
    }
}
