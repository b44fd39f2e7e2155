//! Escaping rules and the canonical string writer for package URLs.
//!
//! [`PackageReference`](crate::PackageReference) formats itself through the same writer
//! used by [`build_canonical_string`], so both always produce identical output.

use std::{borrow::Cow, fmt};

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Bytes left unescaped in namespace segments, names, versions, and subpath segments.
fn is_component_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"-._~!$&'()*,;=:".contains(&byte)
}

/// Bytes left unescaped in qualifier values.
fn is_qualifier_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"-._~:".contains(&byte)
}

/// Percent-encode every byte of a namespace segment, name, or version
/// outside of the component safe set.
///
/// ```
/// # use purl_registry::escape_component;
/// pretty_assertions::assert_eq!(escape_component("@babel"), "%40babel");
/// pretty_assertions::assert_eq!(escape_component("lodash"), "lodash");
/// ```
pub fn escape_component(value: &str) -> Cow<'_, str> {
    escape(value, is_component_safe)
}

/// Percent-encode every byte of a qualifier value outside of the qualifier safe set.
///
/// ```
/// # use purl_registry::escape_qualifier_value;
/// pretty_assertions::assert_eq!(
///     escape_qualifier_value("https://npm.example.com"),
///     "https:%2F%2Fnpm.example.com",
/// );
/// ```
pub fn escape_qualifier_value(value: &str) -> Cow<'_, str> {
    escape(value, is_qualifier_safe)
}

fn escape(value: &str, safe: fn(u8) -> bool) -> Cow<'_, str> {
    if value.bytes().all(safe) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + value.len() / 2);
    // Writing to a `String` does not fail.
    let _ = write_escaped(&mut out, value, safe);
    Cow::Owned(out)
}

/// Write `value`, percent-encoding bytes that are not `safe`.
fn write_escaped<W: fmt::Write>(out: &mut W, value: &str, safe: fn(u8) -> bool) -> fmt::Result {
    let bytes = value.as_bytes();
    let mut start = 0;
    for (index, &byte) in bytes.iter().enumerate() {
        if safe(byte) {
            continue;
        }

        // A non-empty run of safe bytes is ASCII, so it starts and ends on char boundaries.
        // Every byte of a multi-byte character is unsafe and escaped on its own.
        if start < index {
            out.write_str(&value[start..index])?;
        }
        out.write_char('%')?;
        out.write_char(char::from(HEX[usize::from(byte >> 4)]))?;
        out.write_char(char::from(HEX[usize::from(byte & 0x0F)]))?;
        start = index + 1;
    }
    if start < value.len() {
        out.write_str(&value[start..])?;
    }
    Ok(())
}

/// Decode percent-encoded sequences in `value`.
///
/// Returns `None` if an escape is truncated, is not hex, or decodes to invalid UTF-8.
pub(crate) fn unescape(value: &str) -> Option<Cow<'_, str>> {
    if !value.contains('%') {
        return Some(Cow::Borrowed(value));
    }

    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'%' => {
                let hi = hex_value(*bytes.get(index + 1)?)?;
                let lo = hex_value(*bytes.get(index + 2)?)?;
                out.push((hi << 4) | lo);
                index += 3;
            }
            byte => {
                out.push(byte);
                index += 1;
            }
        }
    }
    String::from_utf8(out).ok().map(Cow::Owned)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Write the canonical form of a package URL.
///
/// - The type and qualifier keys are lower-cased.
/// - Empty namespace segments are skipped.
/// - Qualifiers with empty values are skipped; the rest are written in the order given.
/// - Subpath segments that are empty, `.`, or `..` are skipped.
pub(crate) fn write_purl<'a, W: fmt::Write>(
    out: &mut W,
    purl_type: &str,
    namespace: &str,
    name: &str,
    version: &str,
    qualifiers: impl IntoIterator<Item = (&'a str, &'a str)>,
    subpath: &str,
) -> fmt::Result {
    out.write_str("pkg:")?;
    for c in purl_type.chars() {
        out.write_char(c.to_ascii_lowercase())?;
    }

    for segment in namespace.split('/').filter(|segment| !segment.is_empty()) {
        out.write_char('/')?;
        write_escaped(out, segment, is_component_safe)?;
    }

    out.write_char('/')?;
    write_escaped(out, name, is_component_safe)?;

    if !version.is_empty() {
        out.write_char('@')?;
        write_escaped(out, version, is_component_safe)?;
    }

    let mut separator = '?';
    for (key, value) in qualifiers {
        if value.is_empty() {
            continue;
        }
        out.write_char(separator)?;
        for c in key.chars() {
            out.write_char(c.to_ascii_lowercase())?;
        }
        out.write_char('=')?;
        write_escaped(out, value, is_qualifier_safe)?;
        separator = '&';
    }

    let mut separator = '#';
    for segment in subpath
        .split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
    {
        out.write_char(separator)?;
        write_escaped(out, segment, is_component_safe)?;
        separator = '/';
    }

    Ok(())
}

/// Build a canonical package URL string directly from its parts.
///
/// The namespace may contain `/`-delimited segments; each is escaped separately.
/// Empty `version` omits the version, and an optional single qualifier is
/// rendered as `?key=value`. The output is identical to formatting the equivalent
/// [`PackageReference`](crate::PackageReference).
///
/// ```
/// # use purl_registry::build_canonical_string;
/// let purl = build_canonical_string("npm", "@babel", "core", "7.24.0", None);
/// pretty_assertions::assert_eq!(purl, "pkg:npm/%40babel/core@7.24.0");
/// ```
pub fn build_canonical_string(
    purl_type: &str,
    namespace: &str,
    name: &str,
    version: &str,
    qualifier: Option<(&str, &str)>,
) -> String {
    let qualifier_len = qualifier.map_or(0, |(key, value)| key.len() + value.len() * 3 + 2);
    let mut out = String::with_capacity(
        "pkg:".len() + purl_type.len() + namespace.len() + name.len() + version.len() + qualifier_len + 4,
    );

    // Writing to a `String` does not fail.
    let _ = write_purl(&mut out, purl_type, namespace, name, version, qualifier, "");
    out
}
