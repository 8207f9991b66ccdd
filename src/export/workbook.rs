// src/export/workbook.rs
use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::Workbook;
use tracing::debug;

use crate::error::ScrapeError;
use crate::normalize::NormalizedTable;

/// Excel's hard cap on sheet name length.
pub const MAX_SHEET_NAME: usize = 31;

const FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\', '\''];

/// Aggregates every exported category into one workbook, one sheet per
/// category. Sheets accumulate in memory; `save` writes the file once at
/// the end of the run.
pub struct WorkbookWriter {
    book: Workbook,
    used_names: HashSet<String>,
}

impl WorkbookWriter {
    pub fn new() -> Self {
        Self {
            book: Workbook::new(),
            used_names: HashSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.used_names.is_empty()
    }

    pub fn sheet_count(&self) -> usize {
        self.used_names.len()
    }

    /// Append `table` as a new sheet named after its category.
    pub fn add_sheet(&mut self, table: &NormalizedTable) -> Result<(), ScrapeError> {
        let name = self.claim_name(&table.category);
        let sheet = self.book.add_worksheet();
        sheet.set_name(&name)?;
        for (col, header) in table.columns.iter().enumerate() {
            sheet.write_string(0, col as u16, header)?;
        }
        for (r, row) in table.rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                sheet.write_string((r + 1) as u32, c as u16, value)?;
            }
        }
        debug!(sheet = %name, rows = table.rows.len(), "added worksheet");
        Ok(())
    }

    pub fn save(mut self, path: &Path) -> Result<(), ScrapeError> {
        self.book.save(path)?;
        debug!(path = %path.display(), sheets = self.used_names.len(), "saved workbook");
        Ok(())
    }

    /// Sanitized name, made unique with a numeric suffix on collision.
    fn claim_name(&mut self, label: &str) -> String {
        let base = sanitize_sheet_name(label);
        let mut name = base.clone();
        let mut n = 2;
        while self.used_names.contains(&name) {
            let suffix = format!("_{n}");
            let keep = MAX_SHEET_NAME.saturating_sub(suffix.len());
            name = base.chars().take(keep).collect::<String>() + &suffix;
            n += 1;
        }
        self.used_names.insert(name.clone());
        name
    }
}

impl Default for WorkbookWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace the characters Excel forbids in sheet names and cap the length.
pub fn sanitize_sheet_name(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect();
    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}
