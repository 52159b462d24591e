//! Shared fixtures for unit tests.

use chrono::NaiveDate;

use crate::model::{AggregatedTransaction, LineKind, TransactionLine};
use crate::workbook::{Cell, Sheet, Workbook};

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Workbook holding a Summary sheet in the standard layout: a title row,
/// the six-column header, one zeroed row per club, a grand-total row.
pub(crate) fn summary_workbook(clubs: &[&str]) -> Workbook {
    let mut wb = Workbook::new();
    let mut summary = Sheet::new("Summary");
    summary.append_row(vec![Cell::text("Club Sport Fund Overview")]);
    summary.append_row(vec![
        Cell::text("Sports Clubs"),
        Cell::text("Rollover"),
        Cell::text("Sum of Contribution"),
        Cell::text("Sum of Chgs/offset"),
        Cell::text("Sum of Expenses"),
        Cell::text("Sum of Remaining"),
    ]);
    for club in clubs {
        summary.append_row(vec![
            Cell::text(*club),
            Cell::Money(0),
            Cell::Money(0),
            Cell::Money(0),
            Cell::Money(0),
            Cell::Money(0),
        ]);
    }
    summary.append_row(vec![Cell::text("Grand Total")]);
    wb.add_sheet(summary);
    wb
}

pub(crate) fn tx(
    normalized_ref: &str,
    date_s: &str,
    contribution: i64,
    fee: i64,
    designation: Option<&str>,
) -> AggregatedTransaction {
    AggregatedTransaction {
        normalized_ref: normalized_ref.to_string(),
        raw_ref: normalized_ref.to_string(),
        date: date(date_s),
        contribution_cents: contribution,
        fee_cents: fee,
        primary_description: "Jane Donor".into(),
        designation: designation.map(str::to_string),
        lines: vec![TransactionLine {
            kind: LineKind::Contribution,
            amount_cents: contribution,
            raw_description: "Jane Donor".into(),
            date: date(date_s),
        }],
    }
}
