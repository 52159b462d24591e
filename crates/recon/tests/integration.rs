//! End-to-end pipeline tests: ledger + donor + summary in, merged
//! workbook and run counters out.

use std::collections::HashSet;

use chrono::NaiveDate;

use clubfund_recon::model::EntryStatus;
use clubfund_recon::refs::normalize_ref;
use clubfund_recon::review::apply_review;
use clubfund_recon::workbook::{Cell, Sheet, Workbook};
use clubfund_recon::{run, ReconConfig, RunInput};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn text_row(cells: &[&str]) -> Vec<Cell> {
    cells.iter().map(|c| Cell::text(*c)).collect()
}

/// Ledger activity sheet: one contribution banner, the given data rows,
/// a fee banner, its data rows.
fn ledger_sheet(contributions: &[(&str, &str, &str)], fees: &[(&str, &str, &str)]) -> Sheet {
    let mut sheet = Sheet::new("Activity");
    sheet.append_row(text_row(&["Run date: 2025-08-01"]));
    sheet.append_row(text_row(&[
        "Post Date",
        "Transaction#",
        "Invoice Description / Journal Ref",
        "Debit",
        "Credit",
    ]));
    sheet.append_row(text_row(&["Account: 4100-774390 (Contributions - Cash)"]));
    for (date_s, desc, credit) in contributions {
        sheet.append_row(vec![
            Cell::text(*date_s),
            Cell::Empty,
            Cell::text(*desc),
            Cell::Empty,
            Cell::text(*credit),
        ]);
    }
    sheet.append_row(text_row(&["Account: 9020-1 (Transfer Out - Administrative Gift Fee)"]));
    for (date_s, desc, debit) in fees {
        sheet.append_row(vec![
            Cell::text(*date_s),
            Cell::Empty,
            Cell::text(*desc),
            Cell::text(*debit),
            Cell::Empty,
        ]);
    }
    sheet.append_row(text_row(&["Grand Total"]));
    sheet
}

/// Donor acknowledgement sheet: skip rows then positional columns.
fn donor_sheet(rows: &[(&str, &str, &str)]) -> Sheet {
    let config = ReconConfig::default();
    let mut sheet = Sheet::new(&config.donor.sheet);
    for _ in 0..config.donor.skip_rows {
        sheet.append_row(vec![Cell::Empty]);
    }
    for (reference, date_s, designation) in rows {
        let mut row = vec![Cell::Empty; config.donor.designation_col + 1];
        row[config.donor.reference_col] = Cell::text(*reference);
        row[config.donor.date_col] = Cell::text(*date_s);
        row[config.donor.designation_col] = Cell::text(*designation);
        sheet.append_row(row);
    }
    sheet
}

fn summary_workbook(clubs: &[&str]) -> Workbook {
    let mut wb = Workbook::new();
    let mut summary = Sheet::new("Summary");
    summary.append_row(vec![Cell::text("Club Sport Fund Overview")]);
    summary.append_row(text_row(&[
        "Sports Clubs",
        "Rollover",
        "Sum of Contribution",
        "Sum of Chgs/offset",
        "Sum of Expenses",
        "Sum of Remaining",
    ]));
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
    summary.append_row(text_row(&["Grand Total"]));
    wb.add_sheet(summary);
    wb
}

fn run_once(
    ledger: Sheet,
    donor: Sheet,
    workbook: Workbook,
    known_refs: &HashSet<String>,
) -> clubfund_recon::model::RunOutput {
    let config = ReconConfig::default();
    run(
        &config,
        RunInput { ledger, donor, workbook },
        known_refs,
        date("2025-08-01"),
    )
    .unwrap()
}

#[test]
fn scenario_a_matched_contribution() {
    let ledger = ledger_sheet(
        &[("2025-07-15", "Cash Contribution - Jane Donor/AB1234", "100.00")],
        &[],
    );
    let donor = donor_sheet(&[("AB1234", "2025-07-15", "Archery Club")]);
    let workbook = summary_workbook(&["Archery Club", "Chess Club"]);

    let out = run_once(ledger, donor, workbook, &HashSet::new());

    assert_eq!(out.summary.processed, 1);
    assert_eq!(out.summary.needs_review, 0);

    let club = out.workbook.sheet("Archery Club").unwrap();
    assert_eq!(club.data_row_count(), 1);
    assert_eq!(club.cell(1, 1).display(), "AB1234");
    assert_eq!(club.cell(1, 4).as_cents(), Some(10000));
    assert_eq!(club.cell(1, 5).as_cents(), Some(0));
    assert_eq!(club.cell(1, 6).as_cents(), Some(10000));

    assert_eq!(out.new_entries.len(), 1);
    let entry = &out.new_entries[0];
    assert_eq!(entry.assigned_club.as_deref(), Some("Archery Club"));
    assert_eq!(entry.status, EntryStatus::Reconciled);
}

#[test]
fn scenario_b_unmatched_designation_goes_to_review() {
    let ledger = ledger_sheet(
        &[("2025-07-15", "Cash Contribution - Jane Donor/AB1234", "100.00")],
        &[],
    );
    let donor = donor_sheet(&[("AB1234", "2025-07-15", "Unknown Team Xyz")]);
    let workbook = summary_workbook(&["Archery Club"]);

    let out = run_once(ledger, donor, workbook, &HashSet::new());

    assert_eq!(out.summary.processed, 0);
    assert_eq!(out.summary.needs_review, 1);

    let review = out.workbook.sheet("Needs Review").unwrap();
    assert_eq!(review.data_row_count(), 1);
    // Original designation text preserved for the reviewer.
    assert_eq!(review.cell(1, 3).display(), "Unknown Team Xyz");
    assert_eq!(out.new_entries[0].status, EntryStatus::NeedsReview);
}

#[test]
fn scenario_c_rerun_detects_sheet_duplicate() {
    let make_ledger = || {
        ledger_sheet(
            &[("2025-07-15", "Cash Contribution - Jane Donor/AB1234", "100.00")],
            &[],
        )
    };
    let make_donor = || donor_sheet(&[("AB1234", "2025-07-15", "Archery Club")]);
    let workbook = summary_workbook(&["Archery Club"]);

    let first = run_once(make_ledger(), make_donor(), workbook, &HashSet::new());
    assert_eq!(first.summary.processed, 1);
    let rows_after_first: usize = first.workbook.sheets().iter().map(|s| s.rows.len()).sum();

    let known: HashSet<String> =
        first.new_entries.iter().map(|e| e.normalized_ref.clone()).collect();
    let second = run_once(make_ledger(), make_donor(), first.workbook, &known);

    assert_eq!(second.summary.processed, 0);
    assert_eq!(second.summary.duplicate_in_sheet, 1);
    assert!(second.new_entries.is_empty());
    let rows_after_second: usize = second.workbook.sheets().iter().map(|s| s.rows.len()).sum();
    assert_eq!(rows_after_first, rows_after_second);
}

#[test]
fn scenario_d_fee_and_contribution_share_a_reference() {
    let ledger = ledger_sheet(
        &[("2025-07-15", "Cash Contribution - Jane Donor/AB1234", "100.00")],
        &[("2025-07-15", "ADMINISTRATIVE GIFT FEE/AB1234", "5.00")],
    );
    let donor = donor_sheet(&[("AB1234", "2025-07-15", "Archery Club")]);
    let workbook = summary_workbook(&["Archery Club"]);

    let out = run_once(ledger, donor, workbook, &HashSet::new());

    assert_eq!(out.summary.processed, 1);
    let entry = &out.new_entries[0];
    assert_eq!(entry.gross_cents, 10000);
    assert_eq!(entry.fees_cents, 500);
    assert_eq!(entry.net_cents, 9500);

    let club = out.workbook.sheet("Archery Club").unwrap();
    assert_eq!(club.data_row_count(), 1);
    assert_eq!(club.cell(1, 6).as_cents(), Some(9500));
}

#[test]
fn out_of_window_ledger_rows_skipped_and_counted() {
    // Donor window covers July only; June and August rows are excluded.
    let ledger = ledger_sheet(
        &[
            ("2025-06-15", "Early Gift/AA1111", "40.00"),
            ("2025-07-15", "Cash Contribution - Jane Donor/AB1234", "100.00"),
            ("2025-08-15", "Late Gift/CC3333", "60.00"),
        ],
        &[],
    );
    let donor = donor_sheet(&[
        ("AB1234", "2025-07-01", "Archery Club"),
        ("ZZ9999", "2025-07-31", "Archery Club"),
    ]);
    let workbook = summary_workbook(&["Archery Club"]);

    let out = run_once(ledger, donor, workbook, &HashSet::new());
    assert_eq!(out.summary.processed, 1);
    assert_eq!(out.summary.skipped_out_of_range, 2);
}

#[test]
fn fiscal_year_boundary_in_summary_rollup() {
    // Both rows merge, but only the July 1 row lands in the fiscal-year
    // sums when "today" is in the new fiscal year.
    let ledger = ledger_sheet(
        &[
            ("2025-06-30", "Gift A/AA1111", "50.00"),
            ("2025-07-01", "Gift B/BB2222", "70.00"),
        ],
        &[],
    );
    let donor = donor_sheet(&[
        ("AA1111", "2025-06-30", "Archery Club"),
        ("BB2222", "2025-07-01", "Archery Club"),
    ]);
    let workbook = summary_workbook(&["Archery Club"]);

    let out = run_once(ledger, donor, workbook, &HashSet::new());
    assert_eq!(out.summary.processed, 2);

    let summary = out.workbook.sheet("Summary").unwrap();
    // Title, header, club row, grand total.
    assert_eq!(summary.cell(2, 2).as_cents(), Some(7000));
    assert_eq!(summary.cell(2, 5).as_cents(), Some(7000));
}

#[test]
fn missing_ledger_header_aborts_run() {
    let mut ledger = Sheet::new("Activity");
    ledger.append_row(text_row(&["nothing", "recognizable"]));
    let donor = donor_sheet(&[("AB1234", "2025-07-15", "Archery Club")]);
    let workbook = summary_workbook(&["Archery Club"]);

    let config = ReconConfig::default();
    let err = run(
        &config,
        RunInput { ledger, donor, workbook },
        &HashSet::new(),
        date("2025-08-01"),
    )
    .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Post Date"), "error should name the missing column: {message}");
}

#[test]
fn review_assignment_replays_into_club_sheet() {
    let ledger = ledger_sheet(
        &[("2025-07-15", "Cash Contribution - Jane Donor/AB1234", "100.00")],
        &[],
    );
    let donor = donor_sheet(&[("AB1234", "2025-07-15", "Unknown Team Xyz")]);
    let workbook = summary_workbook(&["Archery Club"]);

    let out = run_once(ledger, donor, workbook, &HashSet::new());
    assert_eq!(out.summary.needs_review, 1);
    let entry = out.new_entries[0].clone();

    let config = ReconConfig::default();
    let updated =
        apply_review(&out.workbook, &entry, "Archery Club", &config, date("2025-08-01")).unwrap();

    assert_eq!(updated.sheet("Needs Review").unwrap().data_row_count(), 0);
    assert_eq!(updated.sheet("Archery Club").unwrap().data_row_count(), 1);
    let summary = updated.sheet("Summary").unwrap();
    assert_eq!(summary.cell(2, 2).as_cents(), Some(10000));

    // The failed path leaves the workbook untouched.
    let err = apply_review(&updated, &entry, "Nope", &config, date("2025-08-01")).unwrap_err();
    assert!(err.to_string().contains("Nope"));
    assert_eq!(updated.sheet("Archery Club").unwrap().data_row_count(), 1);
}

#[test]
fn normalization_is_idempotent_across_pipeline_keys() {
    for raw in ["0001234", "AB1234", " ab1234 ", "42", "JRN/9-X"] {
        let once = normalize_ref(raw);
        assert_eq!(normalize_ref(&once), once);
    }
}

#[test]
fn donor_and_ledger_refs_join_through_normalization() {
    // Ledger ref "0042" and donor ref "42" are the same transaction.
    let ledger = ledger_sheet(&[("2025-07-15", "Gift - Pat Q/0042", "25.00")], &[]);
    let donor = donor_sheet(&[("42", "2025-07-15", "Chess Club")]);
    let workbook = summary_workbook(&["Chess Club"]);

    let out = run_once(ledger, donor, workbook, &HashSet::new());
    assert_eq!(out.summary.processed, 1);
    assert_eq!(out.workbook.sheet("Chess Club").unwrap().data_row_count(), 1);
}
