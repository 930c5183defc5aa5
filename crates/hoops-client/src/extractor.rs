use hoops_core::error::AppError;
use hoops_core::layout::TableLayout;
use hoops_core::models::SalaryRecord;
use hoops_core::traits::RecordExtractor;
use scraper::{ElementRef, Html, Selector};

/// Reads salary records out of an HTML table described by a [`TableLayout`].
///
/// Selectors are compiled once at construction; extraction itself cannot fail.
/// Rows without a name (headers, separators, totals) are skipped.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    row: Selector,
    name: Selector,
    amounts: Vec<Selector>,
}

impl TableExtractor {
    pub fn new(layout: &TableLayout) -> Result<Self, AppError> {
        Ok(Self {
            row: compile(&layout.row)?,
            name: compile(&layout.name)?,
            amounts: layout
                .amounts
                .iter()
                .map(|s| compile(s))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Extract from an already parsed document.
    pub fn extract_document(&self, document: &Html) -> Vec<SalaryRecord> {
        let mut rows = 0usize;
        let records: Vec<SalaryRecord> = document
            .select(&self.row)
            .inspect(|_| rows += 1)
            .filter_map(|row| self.read_row(row))
            .collect();

        tracing::debug!(rows, records = records.len(), "Extracted salary table");
        records
    }

    fn read_row(&self, row: ElementRef<'_>) -> Option<SalaryRecord> {
        let name = collapse_ws(&cell_text(row, &self.name));
        if name.is_empty() {
            return None;
        }
        let cells: Vec<String> = self.amounts.iter().map(|s| cell_text(row, s)).collect();
        Some(SalaryRecord::from_cells(&name, cells.as_slice()))
    }
}

impl RecordExtractor for TableExtractor {
    fn extract(&self, html: &str) -> Vec<SalaryRecord> {
        self.extract_document(&Html::parse_document(html))
    }
}

fn compile(selector: &str) -> Result<Selector, AppError> {
    Selector::parse(selector)
        .map_err(|e| AppError::ConfigError(format!("Invalid selector '{selector}': {e}")))
}

/// Concatenated text of every match inside `row`, trimmed.
fn cell_text(row: ElementRef<'_>, selector: &Selector) -> String {
    row.select(selector)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
