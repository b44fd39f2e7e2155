use lazy_regex::regex_captures;

use crate::TypeRegistry;

/// Isolate the host of a URL: scheme, userinfo, path, query, and fragment are dropped.
///
/// The port, if any, is kept. Returns `None` if the URL has no scheme or no host.
fn host(url: &str) -> Option<String> {
    let (_, host) = regex_captures!(
        r"^[A-Za-z][A-Za-z0-9+.\-]*://(?:[^/?#@]*@)?([^/?#@\s]+)",
        url.trim()
    )?;
    Some(host.to_ascii_lowercase())
}

impl TypeRegistry {
    /// Whether `url` points at the default registry of `purl_type`, or a subdomain of it.
    ///
    /// An empty URL always refers to the default registry. A type that is unknown,
    /// or that has no default registry, has no URL that is default.
    ///
    /// ```
    /// # use purl_registry::TypeRegistry;
    /// let registry = TypeRegistry::embedded()?;
    /// assert!(registry.is_default_registry("npm", ""));
    /// assert!(registry.is_default_registry("npm", "https://registry.npmjs.org"));
    /// assert!(registry.is_default_registry("npm", "https://cdn.registry.npmjs.org"));
    /// assert!(!registry.is_default_registry("npm", "https://npm.example.com"));
    /// # Ok::<(), purl_registry::DatasetError>(())
    /// ```
    pub fn is_default_registry(&self, purl_type: &str, url: &str) -> bool {
        if url.is_empty() {
            return true;
        }

        let Some(default) = self.default_registry(purl_type) else {
            return false;
        };
        let (Some(default), Some(given)) = (host(default), host(url)) else {
            return false;
        };

        given == default
            || given
                .strip_suffix(default.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Whether `url` names a registry other than the default registry of `purl_type`.
    ///
    /// An empty URL is not a registry at all, so it is never non-default.
    pub fn is_non_default_registry(&self, purl_type: &str, url: &str) -> bool {
        !url.is_empty() && !self.is_default_registry(purl_type, url)
    }
}
