// src/extract/mod.rs
//! Structural HTML table extraction. Tables are located by shape (a header
//! row plus at least one data row), never by id, class, or position, so the
//! site can shuffle its markup without breaking the pipeline.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScrapeError;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").expect("valid selector"));

/// One HTML table, exactly as the page claims it: header texts plus data
/// rows. Lives only for the fetch-parse cycle that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Pull every structurally valid table out of `html`.
///
/// A page without any qualifying table yields `Ok(vec![])`; that is the
/// normal answer for a player with no record in a category. Only a blank
/// document is an error, since the HTML parser itself tolerates anything.
pub fn extract_tables(html: &str) -> Result<Vec<RawTable>, ScrapeError> {
    if html.trim().is_empty() {
        return Err(ScrapeError::Parse("empty document".to_string()));
    }
    let document = Html::parse_document(html);
    Ok(document.select(&TABLE).filter_map(extract_one).collect())
}

fn extract_one(table: ElementRef) -> Option<RawTable> {
    // Only rows whose nearest enclosing table is this one; Statsguru nests
    // layout tables inside data cells.
    let rows: Vec<ElementRef> = table
        .select(&ROW)
        .filter(|row| owned_by(*row, "table", table))
        .collect();

    let header_idx = rows.iter().position(|row| is_header_row(*row))?;
    let header_texts: Vec<String> = cells_of(rows[header_idx])
        .iter()
        .map(|cell| cell_text(*cell))
        .collect();
    if header_texts.iter().all(String::is_empty) {
        return None;
    }
    // Unnamed columns keep a positional name so their cells stay addressable.
    let headers: Vec<String> = header_texts
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if h.is_empty() {
                format!("col{}", i + 1)
            } else {
                h.clone()
            }
        })
        .collect();

    let mut data = Vec::new();
    for row in rows.into_iter().skip(header_idx + 1) {
        let values: Vec<String> = cells_of(row)
            .iter()
            .map(|cell| cell_text(*cell))
            .collect();
        if values.iter().all(String::is_empty) {
            continue;
        }
        // Long Statsguru tables repeat the header row mid-body.
        if values == header_texts {
            continue;
        }
        data.push(values);
    }
    if data.is_empty() {
        return None;
    }

    Some(RawTable { headers, rows: data })
}

/// Header row: lives in a `<thead>`, or consists entirely of `<th>` cells.
fn is_header_row(row: ElementRef) -> bool {
    if nearest_ancestor(row, "thead").is_some() {
        return true;
    }
    let cells = cells_of(row);
    !cells.is_empty() && cells.iter().all(|cell| cell.value().name() == "th")
}

fn cells_of<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.select(&CELL)
        .filter(|cell| owned_by(*cell, "tr", row))
        .collect()
}

fn nearest_ancestor<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == tag)
}

fn owned_by(el: ElementRef, tag: &str, owner: ElementRef) -> bool {
    nearest_ancestor(el, tag).map_or(false, |a| a.id() == owner.id())
}

/// Flatten a cell to text: join text nodes, swap non-breaking spaces for
/// plain ones, collapse runs of whitespace.
fn cell_text(cell: ElementRef) -> String {
    let joined = cell.text().collect::<Vec<_>>().join(" ");
    joined
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS_PAGE: &str = r#"<html><body>
        <div class="pnl650M">
        <table class="engineTable">
          <thead><tr><th>Mat</th><th>Runs</th><th>Avg</th></tr></thead>
          <tbody>
            <tr><td>10</td><td>500</td><td>50.0</td></tr>
            <tr><td>12</td><td>300</td><td>25.0</td></tr>
          </tbody>
        </table>
        </div>
        <table><tr><td>navigation only</td></tr></table>
        </body></html>"#;

    #[test]
    fn finds_tables_by_shape_not_class() {
        let tables = extract_tables(STATS_PAGE).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["Mat", "Runs", "Avg"]);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[0], vec!["10", "500", "50.0"]);
    }

    #[test]
    fn page_without_tables_is_empty_not_an_error() {
        let html = "<html><body><p>No records available to match this query</p></body></html>";
        assert!(extract_tables(html).unwrap().is_empty());
    }

    #[test]
    fn blank_document_is_a_parse_error() {
        assert!(matches!(
            extract_tables("   \n  "),
            Err(ScrapeError::Parse(_))
        ));
    }

    #[test]
    fn header_only_table_is_skipped() {
        let html = r#"<table><thead><tr><th>Mat</th></tr></thead></table>"#;
        assert!(extract_tables(html).unwrap().is_empty());
    }

    #[test]
    fn all_th_first_row_counts_as_header_without_thead() {
        let html = r#"<table>
            <tr><th>Wkts</th><th>Econ</th></tr>
            <tr><td>7</td><td>4.21</td></tr>
        </table>"#;
        let tables = extract_tables(html).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["Wkts", "Econ"]);
        assert_eq!(tables[0].rows, vec![vec!["7", "4.21"]]);
    }

    #[test]
    fn repeated_header_rows_in_body_are_dropped() {
        let html = r#"<table>
            <thead><tr><th>Mat</th><th>Runs</th></tr></thead>
            <tbody>
              <tr><td>5</td><td>210</td></tr>
              <tr><td>Mat</td><td>Runs</td></tr>
              <tr><td>6</td><td>180</td></tr>
            </tbody>
        </table>"#;
        let tables = extract_tables(html).unwrap();
        assert_eq!(tables[0].rows.len(), 2);
    }

    #[test]
    fn empty_header_cells_get_positional_names() {
        let html = r#"<table>
            <thead><tr><th>Ground</th><th></th><th>Date</th></tr></thead>
            <tbody><tr><td>Lord's</td><td>won</td><td>2019</td></tr></tbody>
        </table>"#;
        let tables = extract_tables(html).unwrap();
        assert_eq!(tables[0].headers, vec!["Ground", "col2", "Date"]);
    }

    #[test]
    fn nested_tables_do_not_leak_rows_into_each_other() {
        let html = r#"<table>
            <thead><tr><th>Outer</th></tr></thead>
            <tbody><tr><td>
                <table>
                  <thead><tr><th>Inner</th></tr></thead>
                  <tbody><tr><td>x</td></tr></tbody>
                </table>
            </td></tr></tbody>
        </table>"#;
        let tables = extract_tables(html).unwrap();
        assert_eq!(tables.len(), 2);
        let outer = tables.iter().find(|t| t.headers == ["Outer"]).unwrap();
        let inner = tables.iter().find(|t| t.headers == ["Inner"]).unwrap();
        assert_eq!(outer.rows.len(), 1);
        assert_eq!(inner.rows, vec![vec!["x"]]);
    }

    #[test]
    fn cell_text_collapses_whitespace_and_nbsp() {
        let html = "<table><thead><tr><th>Player</th></tr></thead>\
                    <tbody><tr><td>  JE&nbsp;Root \n (ENG)  </td></tr></tbody></table>";
        let tables = extract_tables(html).unwrap();
        assert_eq!(tables[0].rows[0][0], "JE Root (ENG)");
    }
}
