//! In-memory workbook model: an ordered list of sheets holding typed rows.
//!
//! The merger treats these sheets as durable storage ("workbook as
//! database"). All concrete spreadsheet-format I/O lives behind the
//! serializer in `clubfund-io`; `Money` and `Date` cells carry their
//! export formatting intent so pipeline code never touches a format
//! library.

use chrono::{Days, NaiveDate};

use crate::money;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// Cents; exported with a currency number format.
    Money(i64),
    /// Exported with a date number format.
    Date(NaiveDate),
    Bool(bool),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display form used for header matching, reference comparison and
    /// column-width estimation. Whole floats render without a decimal
    /// point so numeric journal references read back cleanly.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Money(cents) => money::format_cents(*cents),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }

    /// Interpret the cell as a calendar date. Numbers are treated as Excel
    /// serial days, text as a small set of common date renderings.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Number(n) => excel_serial_to_date(*n),
            Self::Text(s) => {
                let s = s.trim();
                for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"] {
                    if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                        return Some(d);
                    }
                }
                None
            }
            _ => None,
        }
    }

    /// Interpret the cell as a money amount in cents.
    pub fn as_cents(&self) -> Option<i64> {
        match self {
            Self::Money(cents) => Some(*cents),
            Self::Number(n) => Some(money::f64_to_cents(*n)),
            Self::Text(s) => money::parse_cents(s),
            _ => None,
        }
    }
}

/// Excel serial day (1900 date system) to a calendar date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_465.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_days(Days::new(serial.floor() as u64))
}

/// Calendar date to an Excel serial day (1900 date system).
pub fn date_to_excel_serial(date: NaiveDate) -> f64 {
    let base = match NaiveDate::from_ymd_opt(1899, 12, 30) {
        Some(d) => d,
        None => return 0.0,
    };
    (date - base).num_days() as f64
}

// ---------------------------------------------------------------------------
// Sheets
// ---------------------------------------------------------------------------

pub type Row = Vec<Cell>;

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
    /// Row 0 is a header: exported bold with panes frozen below it.
    pub frozen_header: bool,
    /// Column widths in character units; empty means exporter defaults.
    pub col_widths: Vec<usize>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            frozen_header: false,
            col_widths: Vec::new(),
        }
    }

    /// New sheet with a bold, frozen header row.
    pub fn with_header(name: impl Into<String>, headers: &[&str]) -> Self {
        let mut sheet = Self::new(name);
        sheet.frozen_header = true;
        sheet.rows.push(headers.iter().map(|h| Cell::text(*h)).collect());
        sheet
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }

    pub fn append_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn max_cols(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Column index of `label` within the given header row.
    pub fn find_column(&self, header_row: usize, label: &str) -> Option<usize> {
        self.rows.get(header_row)?.iter().position(|c| c.display().trim() == label)
    }

    /// Number of data rows below row 0.
    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

// ---------------------------------------------------------------------------
// Workbook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// Fetch the named sheet, creating it with the given header if absent.
    pub fn ensure_sheet(&mut self, name: &str, headers: &[&str]) -> &mut Sheet {
        if !self.contains(name) {
            self.sheets.push(Sheet::with_header(name, headers));
        }
        // The sheet exists by now; position lookup keeps the borrow local.
        let idx = self
            .sheets
            .iter()
            .position(|s| s.name == name)
            .unwrap_or(self.sheets.len() - 1);
        &mut self.sheets[idx]
    }

    /// Reorder sheets: those in `desired` first, in that order; any sheet
    /// not listed keeps its relative position after them.
    pub fn reorder(&mut self, desired: &[String]) {
        let mut ordered = Vec::with_capacity(self.sheets.len());
        for name in desired {
            if let Some(pos) = self.sheets.iter().position(|s| &s.name == name) {
                ordered.push(self.sheets.remove(pos));
            }
        }
        ordered.append(&mut self.sheets);
        self.sheets = ordered;
    }
}

/// Sheet-safe rendering of a club name: characters invalid in sheet names
/// become underscores and the result is capped at 31 characters.
pub fn safe_sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '\\' | '/' | '*' | '?' | ':' | '[' | ']' => '_',
            other => other,
        })
        .take(31)
        .collect()
}

/// Content-based column widths: padded max display length, floor of 10.
/// Dates and money use fixed estimates since their export rendering is
/// wider than the model's display form.
pub fn auto_widths(sheet: &Sheet) -> Vec<usize> {
    let cols = sheet.max_cols();
    let mut widths = vec![10usize; cols];
    for row in &sheet.rows {
        for (i, cell) in row.iter().enumerate() {
            let len = match cell {
                Cell::Date(_) => 12,
                Cell::Money(_) => 15,
                other => other.display().chars().count(),
            };
            if len + 2 > widths[i] {
                widths[i] = len + 2;
            }
        }
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_display_round_numbers() {
        assert_eq!(Cell::Number(1234.0).display(), "1234");
        assert_eq!(Cell::Number(12.5).display(), "12.5");
    }

    #[test]
    fn cell_as_date_from_serial_and_text() {
        let d = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert_eq!(Cell::Number(date_to_excel_serial(d)).as_date(), Some(d));
        assert_eq!(Cell::text("2025-07-01").as_date(), Some(d));
        assert_eq!(Cell::text("7/1/2025").as_date(), Some(d));
        assert_eq!(Cell::text("donor").as_date(), None);
    }

    #[test]
    fn cell_as_cents() {
        assert_eq!(Cell::Money(150).as_cents(), Some(150));
        assert_eq!(Cell::Number(1.5).as_cents(), Some(150));
        assert_eq!(Cell::text("$1.50").as_cents(), Some(150));
        assert_eq!(Cell::text("n/a").as_cents(), None);
    }

    #[test]
    fn ensure_sheet_creates_once() {
        let mut wb = Workbook::new();
        wb.ensure_sheet("Archery", &["Date", "Ref"]);
        wb.ensure_sheet("Archery", &["Date", "Ref"]);
        assert_eq!(wb.sheets().len(), 1);
        assert!(wb.sheet("Archery").unwrap().frozen_header);
        assert_eq!(wb.sheet("Archery").unwrap().rows.len(), 1);
    }

    #[test]
    fn reorder_keeps_unlisted_sheets() {
        let mut wb = Workbook::new();
        for name in ["Zulu", "Summary", "Alpha"] {
            wb.add_sheet(Sheet::new(name));
        }
        wb.reorder(&["Summary".into(), "Alpha".into()]);
        assert_eq!(wb.sheet_names(), vec!["Summary", "Alpha", "Zulu"]);
    }

    #[test]
    fn sheet_name_sanitized_and_capped() {
        assert_eq!(safe_sheet_name("A/B:C*D?E[F]"), "A_B_C_D_E_F_");
        assert_eq!(safe_sheet_name(&"x".repeat(40)).len(), 31);
    }
}
