//! Ledger extractor: walks the ledger export's rows, scoped to recognized
//! accounting sections, and emits typed transaction lines.
//!
//! The export has no fixed layout: the header row is located by its
//! required labels, and section banners (`Account: ...`) switch extraction
//! on and off. Row handling is an explicit state machine so each
//! classification and transition is testable on its own.

use crate::config::{LedgerColumns, LedgerConfig};
use crate::error::ReconError;
use crate::model::{DateWindow, LedgerLine, LineKind, TransactionLine};
use crate::money;
use crate::workbook::{Cell, Sheet};

pub struct ExtractOutput {
    pub lines: Vec<LedgerLine>,
    /// Ledger rows dated outside the donor window, counted per row.
    pub skipped_out_of_range: usize,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Header location
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct HeaderMap {
    row: usize,
    date: usize,
    description: usize,
    debit: usize,
    credit: usize,
    transaction_number: Option<usize>,
}

/// Find the first row containing every required column label and record
/// the column indices. The header can sit anywhere in the sheet.
fn locate_header(sheet: &Sheet, columns: &LedgerColumns) -> Result<HeaderMap, ReconError> {
    for (idx, row) in sheet.rows.iter().enumerate() {
        let labels: Vec<String> = row.iter().map(|c| c.display().trim().to_string()).collect();
        let find = |label: &str| labels.iter().position(|l| l == label);

        if let (Some(date), Some(description), Some(debit), Some(credit)) = (
            find(&columns.date),
            find(&columns.description),
            find(&columns.debit),
            find(&columns.credit),
        ) {
            let transaction_number =
                columns.transaction_number.as_deref().and_then(find);
            return Ok(HeaderMap { row: idx, date, description, debit, credit, transaction_number });
        }
    }
    Err(ReconError::MissingHeader {
        sheet: sheet.name.clone(),
        columns: vec![
            columns.date.clone(),
            columns.description.clone(),
            columns.debit.clone(),
            columns.credit.clone(),
        ],
    })
}

// ---------------------------------------------------------------------------
// Row classification + scan state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum RowClass {
    /// `Account: ...` banner; carries the kind when the section is in the
    /// allow-list, `None` when it should deactivate extraction.
    Banner(Option<LineKind>),
    Blank,
    Subtotal,
    GrandTotal,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Inactive,
    Active(LineKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Skip,
    EmitData,
    Stop,
}

/// The transition table: (state, row class) -> (next state, action).
fn transition(state: ScanState, class: &RowClass) -> (ScanState, Action) {
    match (state, class) {
        (_, RowClass::Banner(Some(kind))) => (ScanState::Active(*kind), Action::Skip),
        (_, RowClass::Banner(None)) => (ScanState::Inactive, Action::Skip),
        (_, RowClass::Blank) | (_, RowClass::Subtotal) => (ScanState::Inactive, Action::Skip),
        (_, RowClass::GrandTotal) => (ScanState::Inactive, Action::Stop),
        (ScanState::Active(kind), RowClass::Data) => (ScanState::Active(kind), Action::EmitData),
        (ScanState::Inactive, RowClass::Data) => (ScanState::Inactive, Action::Skip),
    }
}

fn classify_row(row: &[Cell], config: &LedgerConfig) -> RowClass {
    if row.iter().all(Cell::is_empty) {
        return RowClass::Blank;
    }
    let first = row.first().map(|c| c.display()).unwrap_or_default();
    let first = first.trim();
    if let Some(section) = banner_section_name(first) {
        let kind = config
            .sections
            .iter()
            .find(|rule| rule.name == section)
            .map(|rule| rule.kind);
        return RowClass::Banner(kind);
    }
    let lowered = first.to_lowercase();
    if lowered.contains("grand total") {
        return RowClass::GrandTotal;
    }
    if lowered.contains("total") {
        return RowClass::Subtotal;
    }
    RowClass::Data
}

/// Section name from an `Account:` banner, lower-cased. The name is the
/// parenthesized suffix when present (`Account: 4100-1 (Contributions -
/// Cash)`), otherwise everything after the colon.
fn banner_section_name(first_cell: &str) -> Option<String> {
    let rest = first_cell.strip_prefix("Account:")?;
    let name = match rest.find('(') {
        Some(open) => rest[open + 1..].trim_end().trim_end_matches(')'),
        None => rest,
    };
    Some(name.trim().to_lowercase())
}

// ---------------------------------------------------------------------------
// Reference extraction
// ---------------------------------------------------------------------------

/// Journal reference by priority: trailing alphanumeric token (>= 3
/// chars) of the description, then a digit-bearing transaction-number
/// column, then the last slash-delimited description token if it contains
/// a digit and is longer than 4 characters.
fn extract_ref(description: &str, transaction_number: Option<&str>) -> Option<String> {
    let trimmed = description.trim_end();
    let tail: String = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if tail.len() >= 3 {
        return Some(tail);
    }

    if let Some(num) = transaction_number {
        let num = num.trim();
        if num.chars().any(|c| c.is_ascii_digit()) {
            return Some(num.to_string());
        }
    }

    if description.contains('/') {
        if let Some(last) = description.rsplit('/').next() {
            let token: String = last.trim().chars().filter(|c| *c != '\u{a0}').collect();
            let token = token.trim().to_string();
            if token.chars().any(|c| c.is_ascii_digit()) && token.len() > 4 {
                return Some(token);
            }
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Scan the ledger sheet and emit one `LedgerLine` per usable data row in
/// an active section. Structural failure (no header row) is fatal; row
/// failures degrade to warnings.
pub fn extract_lines(
    sheet: &Sheet,
    config: &LedgerConfig,
    window: Option<&DateWindow>,
) -> Result<ExtractOutput, ReconError> {
    let header = locate_header(sheet, &config.columns)?;

    let mut output = ExtractOutput {
        lines: Vec::new(),
        skipped_out_of_range: 0,
        warnings: Vec::new(),
    };
    let mut state = ScanState::Inactive;

    for (idx, row) in sheet.rows.iter().enumerate() {
        if idx == header.row {
            continue;
        }

        let class = classify_row(row, config);
        let (next, action) = transition(state, &class);
        state = next;

        match action {
            Action::Stop => break,
            Action::Skip => continue,
            Action::EmitData => {}
        }
        let kind = match state {
            ScanState::Active(kind) => kind,
            ScanState::Inactive => continue,
        };

        let description = row
            .get(header.description)
            .map(|c| c.display())
            .unwrap_or_default();

        let date = match row.get(header.date).and_then(Cell::as_date) {
            Some(d) => d,
            None => {
                output
                    .warnings
                    .push(format!("ledger row {}: unparseable date, row skipped", idx + 1));
                continue;
            }
        };

        if let Some(window) = window {
            if !window.contains(date) {
                output.skipped_out_of_range += 1;
                continue;
            }
        }

        let transaction_number = header
            .transaction_number
            .and_then(|col| row.get(col))
            .map(|c| c.display());
        let raw_ref = match extract_ref(&description, transaction_number.as_deref()) {
            Some(r) => r,
            None => {
                output.warnings.push(format!(
                    "ledger row {}: no journal reference in '{}', row skipped",
                    idx + 1,
                    description.trim()
                ));
                continue;
            }
        };

        let amount_cents = match kind {
            // Contribution credits are stored positive regardless of sign
            // convention in the export.
            LineKind::Contribution => cell_cents_abs(row.get(header.credit)),
            LineKind::Fee => cell_cents(row.get(header.debit)),
        };
        if amount_cents == 0 {
            continue;
        }

        output.lines.push(LedgerLine {
            raw_ref,
            line: TransactionLine {
                kind,
                amount_cents,
                raw_description: description,
                date,
            },
        });
    }

    Ok(output)
}

fn cell_cents(cell: Option<&Cell>) -> i64 {
    cell.and_then(Cell::as_cents).unwrap_or(0)
}

fn cell_cents_abs(cell: Option<&Cell>) -> i64 {
    cell.and_then(Cell::as_cents)
        .map(i64::abs)
        .unwrap_or(0)
}
