use std::fmt;
use url::Url;

/// An absolute URL together with the href it was resolved from
///
/// Extractors only produce `PageLink`s through [`PageLink::resolve`], so the
/// `url` is always absolute and uses an HTTP(S) scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageLink {
    /// The resolved absolute URL
    pub url: Url,

    /// The href exactly as it appeared in the page (trimmed)
    pub href: String,
}

impl PageLink {
    /// Resolves an href against a base origin
    ///
    /// Returns None if the link should be ignored:
    /// - empty or fragment-only hrefs
    /// - javascript:, mailto:, tel: and data: schemes
    /// - hrefs that do not resolve to an HTTP(S) URL
    ///
    /// # Example
    ///
    /// ```
    /// use forum_scribe::PageLink;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://forum.example.org").unwrap();
    /// let link = PageLink::resolve(&base, "./viewtopic.php?t=7").unwrap();
    /// assert_eq!(link.url.as_str(), "https://forum.example.org/viewtopic.php?t=7");
    /// ```
    pub fn resolve(base: &Url, href: &str) -> Option<Self> {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        if href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("data:")
        {
            return None;
        }

        let url = base.join(href).ok()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }

        Some(Self {
            url,
            href: href.to_string(),
        })
    }

    /// Wraps an already absolute URL (e.g. a configured start URL)
    pub fn from_absolute(url: Url) -> Self {
        let href = url.to_string();
        Self { url, href }
    }

    /// Returns the absolute URL as a string slice
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for PageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
