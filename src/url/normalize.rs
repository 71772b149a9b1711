use crate::url::CrawlTarget;
use crate::{UrlError, UrlResult};
use url::Url;

/// Turns user input into a crawlable seed
///
/// # Normalization Steps
///
/// 1. Trim whitespace; reject empty input
/// 2. Prepend `https://` when no scheme is present; reject other schemes
/// 3. Parse; reject non-HTTP(S) schemes and URLs without a host
/// 4. Remove the fragment
///
/// # Examples
///
/// ```
/// use site_sweep::url::normalize_seed;
///
/// let seed = normalize_seed("site.test").unwrap();
/// assert_eq!(seed.as_str(), "https://site.test/");
///
/// let seed = normalize_seed("http://site.test/start#top").unwrap();
/// assert_eq!(seed.as_str(), "http://site.test/start");
/// ```
pub fn normalize_seed(input: &str) -> UrlResult<CrawlTarget> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlError::Empty);
    }

    let lowered = input.to_ascii_lowercase();
    let with_scheme = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        input.to_string()
    } else if let Some(scheme) = leading_scheme(&lowered) {
        return Err(UrlError::InvalidScheme(scheme.to_string()));
    } else {
        format!("https://{}", input)
    };

    let mut url =
        Url::parse(&with_scheme).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;
    url.set_fragment(None);

    CrawlTarget::from_url(url)
}

/// Scheme written before `://`, if the input starts with one
///
/// A `://` that appears after a path, query or fragment starts is part of
/// that component, not a scheme.
fn leading_scheme(input: &str) -> Option<&str> {
    let (scheme, _) = input.split_once("://")?;
    if scheme.is_empty() || scheme.contains(['/', '?', '#']) {
        None
    } else {
        Some(scheme)
    }
}

/// Canonicalizes a URL so that equivalent spellings share one dedup key
///
/// # Canonicalization Steps
///
/// 1. Remove the fragment
/// 2. Lowercase the host and drop a default port (done by the parser)
/// 3. Remove a trailing slash from the path (except for the root `/`)
/// 4. Sort query parameters; drop an empty query string
///
/// # Examples
///
/// ```
/// use site_sweep::url::canonicalize;
/// use url::Url;
///
/// let a = canonicalize(Url::parse("https://Site.Test/page/?b=2&a=1#s").unwrap());
/// let b = canonicalize(Url::parse("https://site.test:443/page?a=1&b=2").unwrap());
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "https://site.test/page?a=1&b=2");
/// ```
pub fn canonicalize(mut url: Url) -> Url {
    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
        url.set_path(&trimmed);
    }

    if url.query().is_some() {
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            pairs.sort();
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
    }

    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_scheme_prepended() {
        let seed = normalize_seed("site.test/blog").unwrap();
        assert_eq!(seed.as_str(), "https://site.test/blog");
    }

    #[test]
    fn test_seed_with_url_in_query_gets_scheme() {
        let seed = normalize_seed("site.test/go?to=https://other.test/").unwrap();
        assert_eq!(seed.as_str(), "https://site.test/go?to=https://other.test/");

        let seed = normalize_seed("site.test/out/https://other.test").unwrap();
        assert_eq!(seed.as_str(), "https://site.test/out/https://other.test");
    }

    #[test]
    fn test_seed_existing_scheme_kept() {
        let seed = normalize_seed("http://site.test/").unwrap();
        assert_eq!(seed.as_str(), "http://site.test/");

        let seed = normalize_seed("HTTPS://site.test/").unwrap();
        assert_eq!(seed.as_str(), "https://site.test/");
    }

    #[test]
    fn test_seed_whitespace_trimmed() {
        let seed = normalize_seed("  site.test  ").unwrap();
        assert_eq!(seed.as_str(), "https://site.test/");
    }

    #[test]
    fn test_seed_empty() {
        assert_eq!(normalize_seed("   "), Err(UrlError::Empty));
    }

    #[test]
    fn test_seed_fragment_removed() {
        let seed = normalize_seed("https://site.test/page#section").unwrap();
        assert_eq!(seed.as_str(), "https://site.test/page");
    }

    #[test]
    fn test_seed_with_unsupported_scheme() {
        assert_eq!(
            normalize_seed("ftp://site.test"),
            Err(UrlError::InvalidScheme("ftp".to_string()))
        );
    }

    #[test]
    fn test_canonicalize_trailing_slash() {
        let url = canonicalize(Url::parse("https://site.test/page/").unwrap());
        assert_eq!(url.as_str(), "https://site.test/page");
    }

    #[test]
    fn test_canonicalize_keeps_root() {
        let url = canonicalize(Url::parse("https://site.test/").unwrap());
        assert_eq!(url.as_str(), "https://site.test/");
    }

    #[test]
    fn test_canonicalize_strips_fragment() {
        let url = canonicalize(Url::parse("https://site.test/page#section").unwrap());
        assert_eq!(url.as_str(), "https://site.test/page");
    }

    #[test]
    fn test_canonicalize_sorts_query() {
        let url = canonicalize(Url::parse("https://site.test/?z=1&a=2").unwrap());
        assert_eq!(url.as_str(), "https://site.test/?a=2&z=1");
    }

    #[test]
    fn test_canonicalize_empty_query_removed() {
        let url = canonicalize(Url::parse("https://site.test/page?").unwrap());
        assert_eq!(url.as_str(), "https://site.test/page");
    }

    #[test]
    fn test_canonicalize_dot_segments() {
        let url = canonicalize(Url::parse("https://site.test/a/./b/../c").unwrap());
        assert_eq!(url.as_str(), "https://site.test/a/c");
    }
}
