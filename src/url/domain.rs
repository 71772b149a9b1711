use url::Url;

/// Extracts the network location of a URL used for same-origin checks
///
/// The key is the lowercase host, followed by `:port` when the URL names a
/// non-default port. Subdomains are distinct origins: `blog.site.test` does
/// not match `site.test`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_sweep::url::origin_key;
///
/// let url = Url::parse("https://Site.Test/path").unwrap();
/// assert_eq!(origin_key(&url), "site.test");
///
/// let url = Url::parse("http://127.0.0.1:9000/").unwrap();
/// assert_eq!(origin_key(&url), "127.0.0.1:9000");
///
/// let url = Url::parse("https://site.test:443/").unwrap();
/// assert_eq!(origin_key(&url), "site.test");
/// ```
pub fn origin_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}
