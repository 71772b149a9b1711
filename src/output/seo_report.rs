//! SEO report generation
//!
//! Writes the per-page CSV report, the microdata samples JSON file and the
//! per-domain summary.

use super::{write_bom, OutputResult};
use crate::handlers::{
    images_recommendation, meta_recommendation, title_recommendation, SeoRecord,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Number of pages with OpenGraph tags sampled into the microdata file
const MICRODATA_SAMPLES: usize = 2;

/// One CSV row of the SEO report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoReportRow<'a> {
    #[serde(rename = "URL")]
    pub url: &'a str,
    #[serde(rename = "Title")]
    pub title: Option<&'a str>,
    #[serde(rename = "Title_Length")]
    pub title_length: usize,
    #[serde(rename = "Title_Trimmed_Length")]
    pub title_trimmed_length: usize,
    #[serde(rename = "Meta_Description")]
    pub meta_description: Option<&'a str>,
    #[serde(rename = "Meta_Length")]
    pub meta_length: usize,
    #[serde(rename = "H1_Count")]
    pub h1_count: usize,
    #[serde(rename = "H2_Count")]
    pub h2_count: usize,
    #[serde(rename = "H3_Count")]
    pub h3_count: usize,
    #[serde(rename = "Images_Total")]
    pub images_total: usize,
    #[serde(rename = "Images_Without_Alt")]
    pub images_without_alt: usize,
    #[serde(rename = "Schema_Types")]
    pub schema_types: String,
    #[serde(rename = "OG_Tags")]
    pub og_tags: usize,
    #[serde(rename = "Twitter_Tags")]
    pub twitter_tags: usize,
    #[serde(rename = "Status")]
    pub status: u16,
    #[serde(rename = "Domain")]
    pub domain: &'a str,
    #[serde(rename = "Title_Recommendation")]
    pub title_recommendation: &'static str,
    #[serde(rename = "Meta_Recommendation")]
    pub meta_recommendation: &'static str,
    #[serde(rename = "Images_Recommendation")]
    pub images_recommendation: String,
}

impl<'a> From<&'a SeoRecord> for SeoReportRow<'a> {
    fn from(record: &'a SeoRecord) -> Self {
        let images_without_alt = record.images_without_alt();
        Self {
            url: &record.url,
            title: record.title.as_deref(),
            title_length: record.title_length,
            title_trimmed_length: record.title_trimmed_length,
            meta_description: record.meta_description.as_deref(),
            meta_length: record.meta_length,
            h1_count: record.h1_count,
            h2_count: record.h2_count,
            h3_count: record.h3_count,
            images_total: record.images_total(),
            images_without_alt,
            schema_types: if record.has_schema() {
                record.schema_types.join(", ")
            } else {
                "none".to_string()
            },
            og_tags: record.og_tags.len(),
            twitter_tags: record.twitter_tags.len(),
            status: record.status,
            domain: &record.domain,
            title_recommendation: title_recommendation(record.title_length).as_str(),
            meta_recommendation: meta_recommendation(record.meta_length).as_str(),
            images_recommendation: images_recommendation(images_without_alt),
        }
    }
}

/// File name of the SEO report for a run started at `timestamp`
pub fn seo_report_file_name(timestamp: &str) -> String {
    format!("advanced_seo_report_{}.csv", timestamp)
}

/// File name of the microdata samples for a run started at `timestamp`
pub fn microdata_file_name(timestamp: &str) -> String {
    format!("microdata_samples_{}.json", timestamp)
}

/// Writes the SEO report as UTF-8 CSV with a byte order mark
///
/// # Arguments
///
/// * `records` - One record per processed page, in visit order
/// * `directory` - Directory the report is written to
/// * `timestamp` - Run timestamp used in the file name
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_seo_report(
    records: &[SeoRecord],
    directory: &Path,
    timestamp: &str,
) -> OutputResult<PathBuf> {
    let path = directory.join(seo_report_file_name(timestamp));

    let mut file = BufWriter::new(File::create(&path)?);
    write_bom(&mut file)?;

    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(SeoReportRow::from(record))?;
    }
    writer.flush()?;

    tracing::info!("Wrote SEO report for {} pages to {}", records.len(), path.display());
    Ok(path)
}

/// Microdata of one sampled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MicrodataSample {
    pub og: BTreeMap<String, String>,
    pub schema: Vec<String>,
}

/// Picks the first pages carrying OpenGraph tags
pub fn microdata_samples(records: &[SeoRecord]) -> BTreeMap<String, MicrodataSample> {
    records
        .iter()
        .filter(|record| !record.og_tags.is_empty())
        .take(MICRODATA_SAMPLES)
        .map(|record| {
            (
                record.url.clone(),
                MicrodataSample {
                    og: record.og_tags.clone(),
                    schema: record.schema_types.clone(),
                },
            )
        })
        .collect()
}

/// Writes the microdata samples as pretty-printed JSON
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(OutputError)` - Failed to write the file
pub fn write_microdata_samples(
    records: &[SeoRecord],
    directory: &Path,
    timestamp: &str,
) -> OutputResult<PathBuf> {
    let path = directory.join(microdata_file_name(timestamp));
    let samples = microdata_samples(records);

    let mut file = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut file, &samples)?;
    file.flush()?;

    tracing::info!("Wrote {} microdata samples to {}", samples.len(), path.display());
    Ok(path)
}

/// Aggregates over the pages of one domain
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSummary {
    pub domain: String,
    pub pages: usize,
    pub mean_h1: f64,
    pub images_without_alt: usize,
    pub mean_og_tags: f64,
    /// Fraction of pages declaring at least one schema type
    pub schema_share: f64,
}

/// Groups records by domain, ordered by domain name
pub fn summarize_by_domain(records: &[SeoRecord]) -> Vec<DomainSummary> {
    let mut groups: BTreeMap<&str, Vec<&SeoRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.domain.as_str()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(domain, pages)| {
            let count = pages.len() as f64;
            DomainSummary {
                domain: domain.to_string(),
                pages: pages.len(),
                mean_h1: pages.iter().map(|p| p.h1_count).sum::<usize>() as f64 / count,
                images_without_alt: pages.iter().map(|p| p.images_without_alt()).sum(),
                mean_og_tags: pages.iter().map(|p| p.og_tags.len()).sum::<usize>() as f64 / count,
                schema_share: pages.iter().filter(|p| p.has_schema()).count() as f64 / count,
            }
        })
        .collect()
}

/// Prints the per-domain summary table to stdout
pub fn print_domain_summary(summaries: &[DomainSummary]) {
    println!("=== Summary by Domain ===\n");
    println!(
        "{:<32} {:>6} {:>8} {:>14} {:>8} {:>8}",
        "Domain", "Pages", "H1 avg", "No-alt images", "OG avg", "Schema"
    );

    for summary in summaries {
        println!(
            "{:<32} {:>6} {:>8.2} {:>14} {:>8.2} {:>8.2}",
            summary.domain,
            summary.pages,
            summary.mean_h1,
            summary.images_without_alt,
            summary.mean_og_tags,
            summary.schema_share
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ImageInfo;

    fn record(url: &str, domain: &str, h1: usize, og: usize, schema: bool) -> SeoRecord {
        SeoRecord {
            url: url.to_string(),
            title: Some("A title".to_string()),
            title_length: 7,
            title_trimmed_length: 7,
            meta_description: None,
            meta_length: 0,
            h1_count: h1,
            h2_count: 0,
            h3_count: 0,
            images: vec![
                ImageInfo {
                    src: Some(format!("{}/a.png", url)),
                    alt: None,
                    width: None,
                    height: None,
                    loading: None,
                },
            ],
            schema_types: if schema {
                vec!["https://schema.org/WebPage".to_string()]
            } else {
                vec![]
            },
            og_tags: (0..og)
                .map(|i| (format!("og:tag{}", i), "v".to_string()))
                .collect(),
            twitter_tags: BTreeMap::new(),
            status: 200,
            domain: domain.to_string(),
        }
    }

    #[test]
    fn test_report_row() {
        let rec = record("https://a.test/", "a.test", 1, 0, false);
        let row = SeoReportRow::from(&rec);

        assert_eq!(row.schema_types, "none");
        assert_eq!(row.title_recommendation, "Too short");
        assert_eq!(row.meta_recommendation, "Too short");
        assert_eq!(row.images_recommendation, "1 without alt");
        assert_eq!(row.title, Some("A title"));
    }

    #[test]
    fn test_write_seo_report_has_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("https://a.test/", "a.test", 1, 0, false)];

        let path = write_seo_report(&records, dir.path(), "20240101_1200").unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "advanced_seo_report_20240101_1200.csv"
        );

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));

        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("URL,Title,Title_Length,"));
        assert!(lines.next().unwrap().starts_with("https://a.test/,A title,7,7,,0,1,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_microdata_samples_take_first_two_with_og() {
        let records = vec![
            record("https://a.test/1", "a.test", 1, 0, false),
            record("https://a.test/2", "a.test", 1, 2, true),
            record("https://a.test/3", "a.test", 1, 1, false),
            record("https://a.test/4", "a.test", 1, 3, false),
        ];

        let samples = microdata_samples(&records);
        assert_eq!(samples.len(), 2);
        assert!(samples.contains_key("https://a.test/2"));
        assert!(samples.contains_key("https://a.test/3"));
        assert_eq!(samples["https://a.test/2"].og.len(), 2);
        assert_eq!(samples["https://a.test/2"].schema.len(), 1);
    }

    #[test]
    fn test_write_microdata_samples() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("https://a.test/", "a.test", 1, 1, false)];

        let path = write_microdata_samples(&records, dir.path(), "20240101_1200").unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(json["https://a.test/"]["og"]["og:tag0"], "v");
        assert!(json["https://a.test/"]["schema"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_summarize_by_domain() {
        let records = vec![
            record("https://b.test/", "b.test", 2, 4, true),
            record("https://a.test/", "a.test", 1, 0, false),
            record("https://b.test/x", "b.test", 0, 2, false),
        ];

        let summaries = summarize_by_domain(&records);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].domain, "a.test");

        let b = &summaries[1];
        assert_eq!(b.pages, 2);
        assert!((b.mean_h1 - 1.0).abs() < f64::EPSILON);
        assert_eq!(b.images_without_alt, 2);
        assert!((b.mean_og_tags - 3.0).abs() < f64::EPSILON);
        assert!((b.schema_share - 0.5).abs() < f64::EPSILON);
    }
}
