use color_eyre::{Result, eyre::Context};

use purl_registry::*;

#[test]
fn error_wrappable_context() -> Result<()> {
    const INPUT: &str = "pkg:npm/lodash@4.17.21";

    let registry = TypeRegistry::embedded().context("can wrap")?;
    let parsed = PackageReference::parse(INPUT).context("can wrap")?;
    pretty_assertions::assert_eq!(parsed.name(), "lodash");

    let url = registry.build_registry_url(&parsed, true).context("can wrap")?;
    pretty_assertions::assert_eq!(url, "https://www.npmjs.com/package/lodash/v/4.17.21");

    let intervals = parse_range("^1.0.0", "npm").context("can wrap")?;
    pretty_assertions::assert_eq!(intervals.len(), 1);

    Ok(())
}

#[test]
fn error_wrappable_withcontext() -> Result<()> {
    const URL: &str = "https://crates.io/crates/serde";

    let registry = TypeRegistry::embedded().with_context(|| "can wrap")?;
    let parsed = registry
        .match_registry_url_any(URL)
        .with_context(|| format!("match {URL}"))?;
    pretty_assertions::assert_eq!(parsed.to_string(), "pkg:cargo/serde");

    let purl = make_purl(registry, "cargo", "serde", "1.0.0", "").with_context(|| "can wrap")?;
    pretty_assertions::assert_eq!(purl.to_string(), "pkg:cargo/serde@1.0.0");

    Ok(())
}

#[test]
fn error_reports_context() {
    let err = PackageReference::parse("npm/lodash")
        .context("parse package url")
        .expect_err("must fail");
    pretty_assertions::assert_eq!(err.to_string(), "parse package url");
    assert!(err.chain().any(|cause| cause.to_string().contains("npm/lodash")));
}

#[test]
fn range_error_wraps_semver_source() {
    let err = parse_range("^^1", "cargo")
        .context("parse cargo constraint")
        .expect_err("must fail");
    assert!(matches!(
        err.downcast_ref::<RangeError>(),
        Some(RangeError::InvalidSemver(_))
    ));
    assert!(err.chain().any(|cause| cause.to_string().starts_with("invalid semver constraint")));
}
