//! Broken link report

use super::OutputResult;
use crate::handlers::LinkCheck;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct BrokenLinkRow<'a> {
    url: &'a str,
    reason: &'a str,
}

/// `broken_links_{origin with dots replaced by underscores}.csv`
pub fn broken_links_file_name(origin: &str) -> String {
    format!("broken_links_{}.csv", origin.replace('.', "_"))
}

/// Writes the broken checks of a run to CSV
///
/// Only checks flagged broken are written; other failures are left out.
///
/// # Arguments
///
/// * `checks` - Every check of the run, in visit order
/// * `directory` - Directory the report is written to
/// * `origin` - Origin of the crawled site, used in the file name
///
/// # Returns
///
/// * `Ok((PathBuf, usize))` - Path of the report and number of broken links
/// * `Err(OutputError)` - Failed to write the report
pub fn write_broken_links(
    checks: &[LinkCheck],
    directory: &Path,
    origin: &str,
) -> OutputResult<(PathBuf, usize)> {
    let path = directory.join(broken_links_file_name(origin));
    let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(&path)?));

    let mut broken = 0;
    for check in checks.iter().filter(|c| c.broken) {
        writer.serialize(BrokenLinkRow {
            url: &check.url,
            reason: check.reason.as_deref().unwrap_or_default(),
        })?;
        broken += 1;
    }

    // Keep the header even when nothing is broken
    if broken == 0 {
        writer.write_record(["url", "reason"])?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} broken links to {}", broken, path.display());
    Ok((path, broken))
}
