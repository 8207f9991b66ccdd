// src/pipeline/mod.rs
//! Drives one run: for each catalogued category, fetch its pages, extract
//! and merge the tables, and hand the result to both sinks. Categories fail
//! independently unless the failure poisons the whole run.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::export::csv::write_csv;
use crate::export::workbook::WorkbookWriter;
use crate::export::{self, ExportManifest};
use crate::extract::{extract_tables, RawTable};
use crate::fetch::urls::{Category, CATEGORIES};
use crate::fetch::Fetcher;
use crate::normalize::{normalize, NormalizedTable};

#[derive(Debug, Clone, Serialize)]
pub struct SkippedCategory {
    pub category: String,
    pub reason: String,
}

/// What the run accomplished: which categories produced files, which were
/// skipped and why, and where everything landed.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub player_id: u32,
    pub exported: Vec<String>,
    pub skipped: Vec<SkippedCategory>,
    pub manifest: ExportManifest,
    pub finished_at: DateTime<Utc>,
}

/// Run the whole pipeline for one player.
///
/// Recoverable per-category failures (unparseable page, schema collision,
/// exhausted retries) are recorded and the next category proceeds. Fatal
/// failures (bot defense, unknown player, export trouble) abort
/// immediately; whatever was already written stays on disk.
pub fn run(
    fetcher: &mut dyn Fetcher,
    player_id: u32,
    out_dir: &Path,
) -> Result<RunSummary, ScrapeError> {
    export::prepare_out_dir(out_dir)?;
    let mut manifest = ExportManifest::new(out_dir);
    let mut book = WorkbookWriter::new();
    let mut exported: Vec<String> = Vec::new();
    let mut skipped: Vec<SkippedCategory> = Vec::new();

    for category in CATEGORIES {
        match scrape_category(fetcher, player_id, category) {
            Ok(Some(table)) => {
                let csv_path =
                    out_dir.join(format!("{}.csv", export::safe_filename(category.label)));
                write_csv(&table, &csv_path)?;
                book.add_sheet(&table)?;
                manifest.record_csv(category.label, csv_path);
                info!(
                    category = category.label,
                    rows = table.rows.len(),
                    columns = table.columns.len(),
                    "exported"
                );
                exported.push(category.label.to_string());
            }
            Ok(None) => {
                // A player with no record in this category; nothing to write.
                info!(category = category.label, "no data tables, nothing to export");
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(category = category.label, error = %err, "skipping category");
                skipped.push(SkippedCategory {
                    category: category.label.to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    if !book.is_empty() {
        let workbook_path = out_dir.join(format!("player_{player_id}_cricinfo_tables.xlsx"));
        book.save(&workbook_path)?;
        manifest.workbook = Some(workbook_path);
    }

    let summary = RunSummary {
        player_id,
        exported,
        skipped,
        manifest,
        finished_at: Utc::now(),
    };
    if !summary.skipped.is_empty() {
        write_skip_log(out_dir, &summary.skipped)?;
    }
    info!(
        player_id,
        exported = summary.exported.len(),
        skipped = summary.skipped.len(),
        "run complete"
    );
    Ok(summary)
}

fn scrape_category(
    fetcher: &mut dyn Fetcher,
    player_id: u32,
    category: &Category,
) -> Result<Option<NormalizedTable>, ScrapeError> {
    let mut raw: Vec<RawTable> = Vec::new();
    for request in category.page_requests(player_id) {
        let html = fetcher.fetch(&request.url)?;
        let tables = extract_tables(&html)?;
        debug!(
            category = request.category,
            url = %request.url,
            tables = tables.len(),
            "extracted"
        );
        raw.extend(tables);
    }
    normalize(category.label, &raw)
}

fn write_skip_log(out_dir: &Path, skipped: &[SkippedCategory]) -> Result<(), ScrapeError> {
    let path = out_dir.join("skipped_categories.json");
    let json = serde_json::to_string_pretty(skipped)
        .map_err(|e| ScrapeError::ExportIo(e.into()))?;
    std::fs::write(&path, json)?;
    debug!(path = %path.display(), "wrote skip log");
    Ok(())
}
