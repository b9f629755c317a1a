//! Scraped breakdown-table handling: locate the table on a history page and
//! type its cells.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

/// Header row plus string body cells of one scraped table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Index of a column by its on-page header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

struct Selectors {
    table: Selector,
    row: Selector,
    cell: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            table: Selector::parse("table.breakdown-table").expect("table selector"),
            row: Selector::parse("tr").expect("row selector"),
            cell: Selector::parse("th, td").expect("cell selector"),
        }
    }
}

/// Pulls the first breakdown table out of a history page. `None` when the
/// page carries no such table: the site has never recorded data for the
/// app, which the collector records as an absent item, not a failure.
pub fn breakdown_table(html: &str) -> Option<RawTable> {
    let selectors = Selectors::new();
    let doc = Html::parse_document(html);
    let table = doc.select(&selectors.table).next()?;

    let mut rows = table.select(&selectors.row);
    let headers: Vec<String> = rows.next()?.select(&selectors.cell).map(cell_text).collect();
    if headers.is_empty() {
        return None;
    }

    let body: Vec<Vec<String>> = rows
        .map(|tr| tr.select(&selectors.cell).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    Some(RawTable { headers, rows: body })
}

fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Cell parsers
// ---------------------------------------------------------------------------

/// `$12.34` / `$1,234.56` → 12.34. The currency symbol and thousands
/// separators are locale noise, not data.
pub fn parse_price(cell: &str) -> Option<f64> {
    cell.trim().trim_start_matches('$').replace(',', "").parse().ok()
}

/// `12,345` → 12345.
pub fn parse_count(cell: &str) -> Option<u64> {
    cell.trim().replace(',', "").parse().ok()
}

const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%Y-%m-%d"];

/// Full calendar dates as the price site prints them (`May 29, 2024`).
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    DATE_FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
}

const MONTH_FORMATS: &[&str] = &["%B %Y %d", "%b %Y %d"];

/// Month labels as the player site prints them (`March 2023`) → the first
/// day of that month.
pub fn parse_month(cell: &str) -> Option<NaiveDate> {
    let padded = format!("{} 1", cell.trim());
    MONTH_FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(&padded, fmt).ok())
}
