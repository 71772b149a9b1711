//! Image harvesting
//!
//! Downloads the images referenced by each page into a folder. Lazy-loading
//! attributes are honored, files already on disk are left alone, and an image
//! URL is downloaded at most once per run.

use super::{HandlerError, PageHandler};
use crate::crawler::{FetchedPage, Fetcher};
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::sync::Mutex;
use url::Url;

/// `-{width}x{height}` right before the final extension, as produced by
/// thumbnailing CMSes (`photo-300x200.jpg`)
static RESOLUTION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-\d+x\d+(\.\w+)$").expect("Failed to compile resolution suffix regex")
});

/// Returns the URL of the full-size variant of a thumbnail
///
/// # Example
///
/// ```
/// use site_sweep::handlers::largest_variant_url;
///
/// assert_eq!(
///     largest_variant_url("https://site.test/photo-300x200.jpg"),
///     "https://site.test/photo.jpg"
/// );
/// assert_eq!(
///     largest_variant_url("https://site.test/banner.jpg"),
///     "https://site.test/banner.jpg"
/// );
/// ```
pub fn largest_variant_url(url: &str) -> String {
    RESOLUTION_SUFFIX.replace(url, "$1").into_owned()
}

/// Which image URL a page's `<img>` tags are mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageMode {
    /// The served source, including lazy-loading attributes
    #[default]
    Basic,
    /// The full-size variant: larger-image attributes, decoded, size suffix stripped
    Largest,
}

impl ImageMode {
    /// Attributes consulted in order; the first non-empty one wins
    fn source_attributes(&self) -> &'static [&'static str] {
        match self {
            Self::Basic => &["src", "data-src", "data-lazy"],
            Self::Largest => &["src", "data-src", "data-large", "data-full-url"],
        }
    }

    fn resolve(&self, raw: &str, base_url: &Url) -> Option<Url> {
        match self {
            Self::Basic => base_url.join(raw).ok(),
            Self::Largest => {
                let decoded = urlencoding::decode(raw)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| raw.to_string());
                let joined = base_url.join(&decoded).ok()?;
                Url::parse(&largest_variant_url(joined.as_str())).ok()
            }
        }
    }
}

/// What harvesting one page produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageHarvest {
    pub page: String,

    /// `<img>` tags on the page
    pub found: usize,

    /// Files written by this page
    pub saved: Vec<PathBuf>,

    /// Skipped because the file was already on disk
    pub already_present: usize,

    /// Skipped because the URL was downloaded earlier in the run
    pub duplicates: usize,

    /// Downloads or writes that failed
    pub failed: usize,
}

/// Downloads the images of every fetched page
pub struct ImageHandler {
    fetcher: Fetcher,
    folder: PathBuf,
    mode: ImageMode,
    downloaded: Mutex<HashSet<String>>,
}

impl ImageHandler {
    /// Creates a handler saving into `folder` (created on first use)
    pub fn new(fetcher: Fetcher, folder: impl Into<PathBuf>, mode: ImageMode) -> Self {
        Self {
            fetcher,
            folder: folder.into(),
            mode,
            downloaded: Mutex::new(HashSet::new()),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn mode(&self) -> ImageMode {
        self.mode
    }

    /// Number of distinct image URLs downloaded so far
    pub async fn downloaded_count(&self) -> usize {
        self.downloaded.lock().await.len()
    }

    async fn save(&self, index: usize, url: &Url, harvest: &mut ImageHarvest) {
        if self.downloaded.lock().await.contains(url.as_str()) {
            tracing::debug!("[{}] Duplicate, skipping {}", index, url);
            harvest.duplicates += 1;
            return;
        }

        let path = self.folder.join(file_name_for(url, index));
        if tokio::fs::metadata(&path).await.is_ok() {
            tracing::debug!("[{}] Already exists: {}", index, path.display());
            harvest.already_present += 1;
            return;
        }

        let bytes = match self.fetcher.fetch_bytes(url).await {
            Ok(bytes) => bytes,
            Err(failure) => {
                tracing::warn!("[{}] Failed to download {}: {}", index, url, failure);
                harvest.failed += 1;
                return;
            }
        };

        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            tracing::warn!("[{}] Failed to write {}: {}", index, path.display(), e);
            harvest.failed += 1;
            return;
        }

        self.downloaded.lock().await.insert(url.to_string());
        tracing::info!(
            "[{}] Saved {} ({} KB)",
            index,
            path.display(),
            bytes.len() / 1024
        );
        harvest.saved.push(path);
    }
}

#[async_trait]
impl PageHandler for ImageHandler {
    type Record = ImageHarvest;

    fn name(&self) -> &'static str {
        "images"
    }

    async fn handle(&self, page: &FetchedPage) -> Result<ImageHarvest, HandlerError> {
        let (found, sources) = image_sources(&page.body, &page.final_url, self.mode)?;
        tracing::info!("{}: {} images found", page.requested, found);

        tokio::fs::create_dir_all(&self.folder).await?;

        let mut harvest = ImageHarvest {
            page: page.requested.to_string(),
            found,
            ..ImageHarvest::default()
        };

        for (index, url) in sources {
            self.save(index, &url, &mut harvest).await;
        }

        Ok(harvest)
    }
}

/// Resolves the image URL of every `<img>` tag
///
/// # Returns
///
/// The number of `<img>` tags, and the resolved URLs paired with the 1-based
/// position of their tag. Tags without any usable source are left out.
fn image_sources(
    html: &str,
    base_url: &Url,
    mode: ImageMode,
) -> Result<(usize, Vec<(usize, Url)>), HandlerError> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse("img").map_err(|e| HandlerError::Selector(format!("img: {:?}", e)))?;

    let mut found = 0;
    let mut sources = Vec::new();

    for (position, img) in document.select(&selector).enumerate() {
        found += 1;

        let raw = mode
            .source_attributes()
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty());

        if let Some(url) = raw.and_then(|raw| mode.resolve(raw, base_url)) {
            sources.push((position + 1, url));
        }
    }

    Ok((found, sources))
}

/// Last path segment (decoded, query dropped), or `image_{index}.jpg`
fn file_name_for(url: &Url, index: usize) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .filter(|name| {
            !name.is_empty() && name != "." && name != ".." && !name.contains(|c| c == '/' || c == '\\')
        })
        .unwrap_or_else(|| format!("image_{}.jpg", index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::url::CrawlTarget;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn base() -> Url {
        Url::parse("https://site.test/gallery/").unwrap()
    }

    fn urls(html: &str, mode: ImageMode) -> Vec<String> {
        image_sources(html, &base(), mode)
            .unwrap()
            .1
            .into_iter()
            .map(|(_, u)| u.to_string())
            .collect()
    }

    #[test]
    fn test_largest_variant_strips_resolution() {
        assert_eq!(largest_variant_url("photo-300x200.jpg"), "photo.jpg");
        assert_eq!(
            largest_variant_url("https://site.test/a/photo-1024x768.webp"),
            "https://site.test/a/photo.webp"
        );
    }

    #[test]
    fn test_largest_variant_leaves_plain_names() {
        assert_eq!(largest_variant_url("banner.jpg"), "banner.jpg");
        assert_eq!(largest_variant_url("photo-300x200"), "photo-300x200");
        assert_eq!(largest_variant_url("photo-300x200.jpg?v=2"), "photo-300x200.jpg?v=2");
    }

    #[test]
    fn test_basic_sources() {
        let html = r#"
            <img src="a.jpg">
            <img data-src="/lazy.png">
            <img src="" data-lazy="late.gif">
            <img alt="no source">
            <img src="thumb-300x200.jpg">
        "#;
        assert_eq!(
            urls(html, ImageMode::Basic),
            vec![
                "https://site.test/gallery/a.jpg",
                "https://site.test/lazy.png",
                "https://site.test/gallery/late.gif",
                "https://site.test/gallery/thumb-300x200.jpg",
            ]
        );
    }

    #[test]
    fn test_largest_sources() {
        let html = r#"
            <img src="thumb-300x200.jpg">
            <img data-large="big%20photo-640x480.png">
            <img data-full-url="/full.jpg">
            <img data-lazy="ignored.jpg">
        "#;
        assert_eq!(
            urls(html, ImageMode::Largest),
            vec![
                "https://site.test/gallery/thumb.jpg",
                "https://site.test/gallery/big%20photo.png",
                "https://site.test/full.jpg",
            ]
        );
    }

    #[test]
    fn test_positions_count_every_tag() {
        let html = r#"<img alt="x"><img src="b.jpg">"#;
        let (found, sources) = image_sources(html, &base(), ImageMode::Basic).unwrap();
        assert_eq!(found, 2);
        assert_eq!(sources[0].0, 2);
    }

    #[test]
    fn test_file_names() {
        let url = Url::parse("https://site.test/img/cat.png?w=100").unwrap();
        assert_eq!(file_name_for(&url, 1), "cat.png");

        let url = Url::parse("https://site.test/img/big%20cat.png").unwrap();
        assert_eq!(file_name_for(&url, 1), "big cat.png");

        let url = Url::parse("https://site.test/img/").unwrap();
        assert_eq!(file_name_for(&url, 7), "image_7.jpg");

        let url = Url::parse("https://site.test/img/..%2F..%2Fetc").unwrap();
        assert_eq!(file_name_for(&url, 3), "image_3.jpg");
    }

    fn fetcher() -> Fetcher {
        Fetcher::from_client(
            crate::crawler::build_http_client(&ClientConfig::default(), Duration::from_secs(5))
                .unwrap(),
            Duration::from_secs(5),
        )
    }

    fn page(server: &MockServer, body: &str) -> FetchedPage {
        let url = format!("{}/", server.uri());
        FetchedPage {
            requested: CrawlTarget::parse(&url).unwrap(),
            final_url: Url::parse(&url).unwrap(),
            status_code: 200,
            content_type: Some("text/html".to_string()),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_harvest_downloads_and_skips() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/one.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/kept.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9]))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kept.png"), b"old").unwrap();

        let handler = ImageHandler::new(fetcher(), dir.path(), ImageMode::Basic);
        let html = r#"<img src="/one.png"><img src="/kept.png"><img src="/missing.png"><img src="/one.png">"#;

        let harvest = handler.handle(&page(&server, html)).await.unwrap();

        assert_eq!(harvest.found, 4);
        assert_eq!(harvest.saved, vec![dir.path().join("one.png")]);
        assert_eq!(harvest.already_present, 1);
        assert_eq!(harvest.failed, 1);
        assert_eq!(harvest.duplicates, 1);
        assert_eq!(std::fs::read(dir.path().join("one.png")).unwrap(), vec![1, 2, 3]);
        assert_eq!(std::fs::read(dir.path().join("kept.png")).unwrap(), b"old");
        assert_eq!(handler.downloaded_count().await, 1);
    }

    #[tokio::test]
    async fn test_harvest_creates_folder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pic-300x200.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0]))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pic.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7, 7]))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("nested").join("images");
        let handler = ImageHandler::new(fetcher(), &folder, ImageMode::Largest);

        let harvest = handler
            .handle(&page(&server, r#"<img src="/pic-300x200.jpg">"#))
            .await
            .unwrap();

        assert_eq!(harvest.saved, vec![folder.join("pic.jpg")]);
        assert!(folder.join("pic.jpg").exists());
    }
}
