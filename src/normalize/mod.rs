// src/normalize/mod.rs
//! Reconciles the header drift between a category's tables. Statsguru splits
//! a category across format classes whose tables mostly, but not entirely,
//! agree on columns; the merged schema is the union in first-seen order.

use std::collections::{HashMap, HashSet};

use crate::error::ScrapeError;
use crate::extract::RawTable;

/// A rectangular table ready for export: every row has exactly
/// `columns.len()` values and column names are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub category: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Merge a category's raw tables into one rectangular table.
///
/// Rows from tables that lack a merged column carry an empty value for it.
/// Values stay text; coercing here would corrupt markers like "-" or "57*"
/// (type handling belongs to whatever consumes the files). `Ok(None)` means
/// the category genuinely has no data, which is not an error.
pub fn normalize(
    category: &str,
    tables: &[RawTable],
) -> Result<Option<NormalizedTable>, ScrapeError> {
    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for table in tables {
        let mut seen_in_table: HashSet<&str> = HashSet::new();
        for header in &table.headers {
            if !seen_in_table.insert(header.as_str()) {
                return Err(ScrapeError::Schema {
                    category: category.to_string(),
                    column: header.clone(),
                });
            }
            if !index.contains_key(header) {
                index.insert(header.clone(), columns.len());
                columns.push(header.clone());
            }
        }
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    for table in tables {
        for raw_row in &table.rows {
            let mut row = vec![String::new(); columns.len()];
            // zip truncates over-long raw rows to their table's own width.
            for (value, header) in raw_row.iter().zip(&table.headers) {
                if let Some(&at) = index.get(header) {
                    row[at] = value.clone();
                }
            }
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(NormalizedTable {
        category: category.to_string(),
        columns,
        rows,
    }))
}
