//! Search position report

use super::OutputResult;
use crate::serp::KeywordPositions;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const SERP_REPORT_FILE: &str = "serp_results.csv";

#[derive(Debug, Serialize)]
struct SerpRow<'a> {
    keyword: &'a str,
    google: String,
    yandex: String,
}

/// Positions as `2, 14`; empty when the site was not found
pub fn format_positions(positions: &[usize]) -> String {
    positions
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Writes one row per keyword to `serp_results.csv`
pub fn write_serp_results(results: &[KeywordPositions], directory: &Path) -> OutputResult<PathBuf> {
    let path = directory.join(SERP_REPORT_FILE);
    let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(&path)?));

    for result in results {
        writer.serialize(SerpRow {
            keyword: &result.keyword,
            google: format_positions(&result.google),
            yandex: format_positions(&result.yandex),
        })?;
    }
    writer.flush()?;

    tracing::info!("Wrote positions for {} keywords to {}", results.len(), path.display());
    Ok(path)
}
