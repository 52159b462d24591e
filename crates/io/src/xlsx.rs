//! Excel import/export for the reconciliation workbook model.
//!
//! Import maps calamine's cell data onto the engine's typed `Cell`s;
//! export writes the model back through rust_xlsxwriter, applying the
//! formatting intent carried by `Money` and `Date` cells (currency and
//! date number formats, bold frozen headers, stored column widths). The
//! pipeline itself never touches either library.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

use clubfund_recon::config::LedgerConfig;
use clubfund_recon::workbook::{
    date_to_excel_serial, excel_serial_to_date, Cell, Sheet, Workbook,
};

pub const CURRENCY_FORMAT: &str = "$#,##0.00";
pub const DATE_FORMAT: &str = "m/d/yyyy";

#[derive(Debug, Default)]
pub struct ImportResult {
    pub sheets_imported: usize,
    pub cells_imported: usize,
    pub warnings: Vec<String>,
}

/// Import an Excel workbook (xlsx, xls, xlsb, ods) into the typed grid.
pub fn import(path: &Path) -> Result<(Workbook, ImportResult), String> {
    let mut source = open_workbook_auto(path)
        .map_err(|e| format!("failed to open {}: {e}", path.display()))?;

    let sheet_names: Vec<String> = source.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(format!("{}: workbook contains no sheets", path.display()));
    }

    let mut workbook = Workbook::new();
    let mut result = ImportResult::default();

    for sheet_name in &sheet_names {
        let range = source
            .worksheet_range(sheet_name)
            .map_err(|e| format!("failed to read sheet '{sheet_name}': {e}"))?;

        let mut sheet = Sheet::new(sheet_name);
        let (height, width) = range.get_size();
        if height > 0 && width > 0 {
            // Data may not begin at A1; pad so model positions stay
            // absolute.
            let (start_row, start_col) = range.start().unwrap_or((0, 0));
            for row in range.rows() {
                let mut cells: Vec<Cell> = vec![Cell::Empty; start_col as usize];
                for data in row {
                    let cell = convert_cell(data, sheet_name, &mut result.warnings);
                    if !matches!(cell, Cell::Empty) {
                        result.cells_imported += 1;
                    }
                    cells.push(cell);
                }
                sheet.append_row(cells);
            }
            if start_row > 0 {
                let mut rows = vec![Vec::new(); start_row as usize];
                rows.append(&mut sheet.rows);
                sheet.rows = rows;
            }
        }

        workbook.add_sheet(sheet);
        result.sheets_imported += 1;
    }

    Ok((workbook, result))
}

fn convert_cell(data: &Data, sheet_name: &str, warnings: &mut Vec<String>) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.is_empty() {
                Cell::Empty
            } else {
                Cell::text(s.clone())
            }
        }
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => {
            // Time-of-day is irrelevant to reconciliation; keep the day.
            let serial = dt.as_f64();
            match excel_serial_to_date(serial) {
                Some(date) => Cell::Date(date),
                None => {
                    warnings.push(format!(
                        "sheet '{sheet_name}': datetime serial {serial} out of range, kept as number"
                    ));
                    Cell::Number(serial)
                }
            }
        }
        Data::DateTimeIso(s) => {
            match chrono::NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d") {
                Ok(date) => Cell::Date(date),
                Err(_) => Cell::text(s.clone()),
            }
        }
        Data::DurationIso(s) => Cell::text(s.clone()),
        Data::Error(e) => Cell::text(format!("#{e:?}")),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub cells_exported: usize,
}

/// Export the workbook model to an xlsx file.
pub fn export(workbook: &Workbook, path: &Path) -> Result<ExportResult, String> {
    let mut result = ExportResult::default();
    let mut xlsx = XlsxWorkbook::new();

    let header_format = Format::new().set_bold();
    let money_format = Format::new().set_num_format(CURRENCY_FORMAT);
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    for sheet in workbook.sheets() {
        let worksheet = xlsx
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| format!("failed to create sheet '{}': {e}", sheet.name))?;

        for (row_idx, row) in sheet.rows.iter().enumerate() {
            let row32 = row_idx as u32;
            for (col_idx, cell) in row.iter().enumerate() {
                let col16 = col_idx as u16;
                let write_err =
                    |e| format!("sheet '{}': failed to write ({row_idx}, {col_idx}): {e}", sheet.name);

                match cell {
                    Cell::Empty => continue,
                    Cell::Text(s) => {
                        if row_idx == 0 && sheet.frozen_header {
                            worksheet
                                .write_string_with_format(row32, col16, s, &header_format)
                                .map_err(write_err)?;
                        } else {
                            worksheet.write_string(row32, col16, s).map_err(write_err)?;
                        }
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row32, col16, *n).map_err(write_err)?;
                    }
                    Cell::Money(cents) => {
                        worksheet
                            .write_number_with_format(
                                row32,
                                col16,
                                *cents as f64 / 100.0,
                                &money_format,
                            )
                            .map_err(write_err)?;
                    }
                    Cell::Date(date) => {
                        worksheet
                            .write_number_with_format(
                                row32,
                                col16,
                                date_to_excel_serial(*date),
                                &date_format,
                            )
                            .map_err(write_err)?;
                    }
                    Cell::Bool(b) => {
                        worksheet.write_boolean(row32, col16, *b).map_err(write_err)?;
                    }
                }
                result.cells_exported += 1;
            }
        }

        if sheet.frozen_header {
            worksheet
                .set_freeze_panes(1, 0)
                .map_err(|e| format!("sheet '{}': failed to freeze header: {e}", sheet.name))?;
        }

        for (col_idx, width) in sheet.col_widths.iter().enumerate() {
            worksheet
                .set_column_width(col_idx as u16, *width as f64)
                .map_err(|e| format!("sheet '{}': failed to set column width: {e}", sheet.name))?;
        }

        result.sheets_exported += 1;
    }

    xlsx.save(path)
        .map_err(|e| format!("failed to save {}: {e}", path.display()))?;
    Ok(result)
}

// ---------------------------------------------------------------------------
// Sheet selection
// ---------------------------------------------------------------------------

/// Pick the ledger activity sheet: first sheet whose name contains one of
/// the configured hints (case-insensitive), then the exact fallback name,
/// then the first sheet.
pub fn find_ledger_sheet<'a>(workbook: &'a Workbook, config: &LedgerConfig) -> Option<&'a Sheet> {
    for hint in &config.sheet_hints {
        let hint = hint.to_lowercase();
        if let Some(sheet) = workbook
            .sheets()
            .iter()
            .find(|s| s.name.to_lowercase().contains(&hint))
        {
            return Some(sheet);
        }
    }
    if let Some(fallback) = &config.sheet_fallback {
        if let Some(sheet) = workbook.sheets().iter().find(|s| &s.name == fallback) {
            return Some(sheet);
        }
    }
    workbook.sheets().first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn round_trip_preserves_typed_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clubs.xlsx");

        let mut wb = Workbook::new();
        let mut sheet = Sheet::with_header(
            "Archery Club",
            &["Date", "Journal Ref", "Type", "Description", "Contribution", "Fees", "Net"],
        );
        sheet.append_row(vec![
            Cell::Date(date("2025-07-15")),
            Cell::text("AB1234"),
            Cell::text("Contribution"),
            Cell::text("Jane Donor"),
            Cell::Money(10000),
            Cell::Money(500),
            Cell::Money(9500),
        ]);
        sheet.col_widths = vec![12, 12, 14, 24, 15, 15, 15];
        wb.add_sheet(sheet);

        export(&wb, &path).unwrap();
        let (reloaded, result) = import(&path).unwrap();

        assert_eq!(result.sheets_imported, 1);
        let sheet = reloaded.sheet("Archery Club").unwrap();
        assert_eq!(sheet.cell(0, 0).display(), "Date");
        assert_eq!(sheet.cell(1, 0).as_date(), Some(date("2025-07-15")));
        assert_eq!(sheet.cell(1, 1).display(), "AB1234");
        assert_eq!(sheet.cell(1, 4).as_cents(), Some(10000));
        assert_eq!(sheet.cell(1, 6).as_cents(), Some(9500));
    }

    #[test]
    fn export_rejects_nothing_on_empty_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");

        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::new("Blank"));
        let result = export(&wb, &path).unwrap();
        assert_eq!(result.sheets_exported, 1);
        assert_eq!(result.cells_exported, 0);

        let (reloaded, _) = import(&path).unwrap();
        assert!(reloaded.contains("Blank"));
    }

    #[test]
    fn ledger_sheet_heuristic_priority() {
        let config = LedgerConfig::default();
        let named = |names: &[&str]| {
            let mut wb = Workbook::new();
            for name in names {
                wb.add_sheet(Sheet::new(*name));
            }
            wb
        };

        // Hint match beats everything.
        let wb = named(&["Misc", "July Activity", "4100-774390"]);
        assert_eq!(find_ledger_sheet(&wb, &config).unwrap().name, "July Activity");

        // Exact fallback when no hint matches.
        let wb = named(&["Misc", "4100-774390"]);
        assert_eq!(find_ledger_sheet(&wb, &config).unwrap().name, "4100-774390");

        // First sheet otherwise.
        let wb = named(&["Whatever", "Else"]);
        assert_eq!(find_ledger_sheet(&wb, &config).unwrap().name, "Whatever");

        assert!(find_ledger_sheet(&Workbook::new(), &config).is_none());
    }
}
