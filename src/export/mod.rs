// src/export/mod.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::ScrapeError;

pub mod csv;
pub mod workbook;

static FILENAME_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

/// Record of everything a run wrote: one CSV per exported category plus the
/// workbook, all under `out_dir`.
#[derive(Debug, Clone, Serialize)]
pub struct ExportManifest {
    pub out_dir: PathBuf,
    pub csv_files: BTreeMap<String, PathBuf>,
    pub workbook: Option<PathBuf>,
}

impl ExportManifest {
    pub fn new(out_dir: &Path) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            csv_files: BTreeMap::new(),
            workbook: None,
        }
    }

    pub fn record_csv(&mut self, category: &str, path: PathBuf) {
        self.csv_files.insert(category.to_string(), path);
    }
}

/// Create the output directory before anything is written. Either it exists
/// when the first write happens or the run fails here, before any file.
pub fn prepare_out_dir(dir: &Path) -> Result<(), ScrapeError> {
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Collapse anything outside `[A-Za-z0-9._-]` to `_` and cap the length,
/// for names derived from page text.
pub fn safe_filename(name: &str) -> String {
    let cleaned = FILENAME_UNSAFE.replace_all(name.trim(), "_");
    let mut out = cleaned.trim_matches('_').to_string();
    if out.is_empty() {
        out.push_str("table");
    }
    // Pure ASCII after the replace, so byte truncation is safe.
    out.truncate(180);
    out
}
