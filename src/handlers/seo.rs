//! SEO metadata extraction
//!
//! Turns a fetched document into an [`SeoRecord`]: title and meta description
//! with their lengths, heading counts, image alt coverage, Schema.org
//! microdata types, OpenGraph and Twitter Card tags.

use super::{HandlerError, PageHandler};
use crate::crawler::FetchedPage;
use crate::url::origin_key;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Title lengths in this range are considered fine
const TITLE_RANGE: (usize, usize) = (50, 60);

/// Meta description lengths in this range are considered fine
const META_RANGE: (usize, usize) = (120, 160);

/// One `<img>` element of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// `src` resolved against the page URL
    pub src: Option<String>,
    /// `alt` attribute; None when the attribute is absent
    pub alt: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    /// `loading` attribute (`lazy` is recommended)
    pub loading: Option<String>,
}

/// SEO facts about one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoRecord {
    pub url: String,

    /// `<title>` text exactly as served
    pub title: Option<String>,

    /// Character count of the untrimmed title
    pub title_length: usize,

    /// Character count of the title without surrounding whitespace
    pub title_trimmed_length: usize,

    /// `content` of `<meta name="description">`
    pub meta_description: Option<String>,
    pub meta_length: usize,

    pub h1_count: usize,
    pub h2_count: usize,
    pub h3_count: usize,

    pub images: Vec<ImageInfo>,

    /// `itemtype` of every `[itemscope]` element, `unspecified` when absent
    pub schema_types: Vec<String>,

    /// `og:*` properties and their content
    pub og_tags: BTreeMap<String, String>,

    /// `twitter:*` names and their content
    pub twitter_tags: BTreeMap<String, String>,

    pub status: u16,

    /// Origin of the crawled site
    pub domain: String,
}

impl SeoRecord {
    pub fn images_total(&self) -> usize {
        self.images.len()
    }

    /// Images with no `alt` attribute at all (an empty alt counts as present)
    pub fn images_without_alt(&self) -> usize {
        self.images.iter().filter(|img| img.alt.is_none()).count()
    }

    pub fn has_schema(&self) -> bool {
        !self.schema_types.is_empty()
    }
}

/// How a measured length compares to its recommended range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthVerdict {
    Ok,
    TooShort,
    TooLong,
}

impl LengthVerdict {
    fn classify(length: usize, (min, max): (usize, usize)) -> Self {
        if length < min {
            Self::TooShort
        } else if length > max {
            Self::TooLong
        } else {
            Self::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::TooShort => "Too short",
            Self::TooLong => "Too long",
        }
    }
}

impl fmt::Display for LengthVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title verdict: 50 to 60 characters is OK
pub fn title_recommendation(length: usize) -> LengthVerdict {
    LengthVerdict::classify(length, TITLE_RANGE)
}

/// Meta description verdict: 120 to 160 characters is OK
pub fn meta_recommendation(length: usize) -> LengthVerdict {
    LengthVerdict::classify(length, META_RANGE)
}

/// Image alt verdict
pub fn images_recommendation(without_alt: usize) -> String {
    if without_alt == 0 {
        "OK".to_string()
    } else {
        format!("{} without alt", without_alt)
    }
}

/// Extracts [`SeoRecord`]s
#[derive(Debug, Clone, Default)]
pub struct SeoHandler;

impl SeoHandler {
    pub fn new() -> Self {
        Self
    }

    /// Analyzes one document
    ///
    /// # Arguments
    ///
    /// * `page` - The fetched page
    ///
    /// # Returns
    ///
    /// * `Ok(SeoRecord)` - The extracted facts
    /// * `Err(HandlerError)` - A selector failed to compile
    pub fn analyze(&self, page: &FetchedPage) -> Result<SeoRecord, HandlerError> {
        let document = Html::parse_document(&page.body);

        let title = select_first(&document, "title")?.map(|el| el.text().collect::<String>());
        let title_length = title.as_deref().map_or(0, |t| t.chars().count());
        let title_trimmed_length = title.as_deref().map_or(0, |t| t.trim().chars().count());

        let meta_description = select_first(&document, r#"meta[name="description"]"#)?
            .and_then(|el| el.value().attr("content"))
            .map(str::to_string);
        let meta_length = meta_description.as_deref().map_or(0, |m| m.chars().count());

        let images = select_all(&document, "img")?
            .into_iter()
            .map(|img| {
                let attr = |name: &str| img.value().attr(name).map(str::to_string);
                ImageInfo {
                    src: img
                        .value()
                        .attr("src")
                        .and_then(|src| page.final_url.join(src.trim()).ok())
                        .map(|u| u.to_string()),
                    alt: attr("alt"),
                    width: attr("width"),
                    height: attr("height"),
                    loading: attr("loading"),
                }
            })
            .collect();

        let schema_types = select_all(&document, "[itemscope]")?
            .into_iter()
            .map(|el| el.value().attr("itemtype").unwrap_or("unspecified").to_string())
            .collect();

        let og_tags = select_all(&document, "meta[property]")?
            .into_iter()
            .filter_map(|el| {
                let property = el.value().attr("property")?;
                property.starts_with("og:").then(|| {
                    (
                        property.to_string(),
                        el.value().attr("content").unwrap_or_default().to_string(),
                    )
                })
            })
            .collect();

        let twitter_tags = select_all(&document, "meta[name]")?
            .into_iter()
            .filter_map(|el| {
                let name = el.value().attr("name")?;
                name.starts_with("twitter:").then(|| {
                    (
                        name.to_string(),
                        el.value().attr("content").unwrap_or_default().to_string(),
                    )
                })
            })
            .collect();

        Ok(SeoRecord {
            url: page.requested.to_string(),
            title,
            title_length,
            title_trimmed_length,
            meta_description,
            meta_length,
            h1_count: select_all(&document, "h1")?.len(),
            h2_count: select_all(&document, "h2")?.len(),
            h3_count: select_all(&document, "h3")?.len(),
            images,
            schema_types,
            og_tags,
            twitter_tags,
            status: page.status_code,
            domain: origin_key(page.requested.url()),
        })
    }
}

#[async_trait]
impl PageHandler for SeoHandler {
    type Record = SeoRecord;

    fn name(&self) -> &'static str {
        "seo"
    }

    async fn handle(&self, page: &FetchedPage) -> Result<SeoRecord, HandlerError> {
        let record = self.analyze(page)?;

        if record.title.is_some() && record.title_length != record.title_trimmed_length {
            tracing::debug!(
                "{}: title has surrounding whitespace ({} vs {} chars)",
                record.url,
                record.title_length,
                record.title_trimmed_length
            );
        }

        Ok(record)
    }
}

fn selector(css: &str) -> Result<Selector, HandlerError> {
    Selector::parse(css).map_err(|e| HandlerError::Selector(format!("{}: {:?}", css, e)))
}

fn select_first<'a>(document: &'a Html, css: &str) -> Result<Option<ElementRef<'a>>, HandlerError> {
    let sel = selector(css)?;
    Ok(document.select(&sel).next())
}

fn select_all<'a>(document: &'a Html, css: &str) -> Result<Vec<ElementRef<'a>>, HandlerError> {
    let sel = selector(css)?;
    Ok(document.select(&sel).collect())
}
