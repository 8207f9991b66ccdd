// src/export/csv.rs
use std::path::Path;

use csv::Writer;
use tracing::debug;

use crate::error::ScrapeError;
use crate::normalize::NormalizedTable;

/// Write one table to `path`: header row first, then the data rows, with
/// the default comma delimiter and minimal quoting so the file round-trips
/// through any standard CSV reader.
pub fn write_csv(table: &NormalizedTable, path: &Path) -> Result<(), ScrapeError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    debug!(
        category = %table.category,
        path = %path.display(),
        rows = table.rows.len(),
        "wrote CSV"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NormalizedTable {
        NormalizedTable {
            category: "batting".into(),
            columns: vec!["Mat".into(), "Runs".into(), "Opposition".into()],
            rows: vec![
                vec!["10".into(), "500".into(), "v Australia".into()],
                vec!["12".into(), "-".into(), "v \"The\" XI, away".into()],
            ],
        }
    }

    #[test]
    fn csv_round_trips_rows_and_columns_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("batting.csv");
        let table = sample();
        write_csv(&table, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(headers, table.columns);

        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|s| s.to_string()).collect())
            .collect();
        assert_eq!(rows, table.rows);
    }

    #[test]
    fn rewriting_the_same_table_is_byte_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("a.csv");
        let second = tmp.path().join("b.csv");
        write_csv(&sample(), &first).unwrap();
        write_csv(&sample(), &second).unwrap();
        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }
}
