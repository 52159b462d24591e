//! Workbook merger: idempotently writes aggregated transactions into the
//! per-club workbook and recomputes the fiscal-year summary.
//!
//! The Summary sheet is authoritative twice over: its club rows define
//! the known-club universe for matching, and its money columns are
//! recomputed from the club sheets at the end of every merge.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::config::{ReconConfig, SummaryConfig};
use crate::error::ReconError;
use crate::fiscal::fiscal_year_start;
use crate::matcher::{match_club, MatchOutcome};
use crate::model::{AggregatedTransaction, ReconciledEntry};
use crate::refs::normalize_ref;
use crate::workbook::{auto_widths, safe_sheet_name, Cell, Sheet, Workbook};

pub const CLUB_SHEET_HEADERS: [&str; 7] =
    ["Date", "Journal Ref", "Type", "Description", "Contribution", "Fees", "Net"];

pub const NEEDS_REVIEW_HEADERS: [&str; 7] =
    ["Date", "Journal Ref", "Description", "Designation", "Contribution", "Fees", "Net"];

pub const SUMMARY_INDIVIDUAL_HEADERS: [&str; 7] =
    ["Date", "Club", "Journal Ref", "Description", "Contribution", "Fees", "Net"];

// ---------------------------------------------------------------------------
// Summary layout + club universe
// ---------------------------------------------------------------------------

/// Located positions of the Summary sheet's six logical columns.
#[derive(Debug, Clone, Copy)]
pub struct SummaryLayout {
    pub header_row: usize,
    pub club: usize,
    pub rollover: usize,
    pub contribution: usize,
    pub charges: usize,
    pub expenses: usize,
    pub remaining: usize,
}

/// Locate the Summary header within the first `header_scan_rows` rows.
/// All six labels must sit on one row; anything less is fatal.
pub fn locate_summary(sheet: &Sheet, config: &SummaryConfig) -> Result<SummaryLayout, ReconError> {
    let labels = &config.columns;
    for (idx, row) in sheet.rows.iter().take(config.header_scan_rows).enumerate() {
        let cells: Vec<String> = row.iter().map(|c| c.display().trim().to_string()).collect();
        let find = |label: &str| cells.iter().position(|c| c == label);

        if let (Some(club), Some(rollover), Some(contribution), Some(charges), Some(expenses), Some(remaining)) = (
            find(&labels.club),
            find(&labels.rollover),
            find(&labels.contribution),
            find(&labels.charges),
            find(&labels.expenses),
            find(&labels.remaining),
        ) {
            return Ok(SummaryLayout {
                header_row: idx,
                club,
                rollover,
                contribution,
                charges,
                expenses,
                remaining,
            });
        }
    }
    Err(ReconError::MissingHeader {
        sheet: sheet.name.clone(),
        columns: vec![
            labels.club.clone(),
            labels.rollover.clone(),
            labels.contribution.clone(),
            labels.charges.clone(),
            labels.expenses.clone(),
            labels.remaining.clone(),
        ],
    })
}

fn is_grand_total(text: &str) -> bool {
    text.trim().to_lowercase().contains("grand total")
}

/// Club names below the Summary header, excluding the grand-total row.
pub fn club_universe(sheet: &Sheet, layout: &SummaryLayout) -> Vec<String> {
    sheet
        .rows
        .iter()
        .skip(layout.header_row + 1)
        .filter_map(|row| {
            let name = row.get(layout.club).map(|c| c.display())?;
            let name = name.trim();
            if name.is_empty() || is_grand_total(name) {
                None
            } else {
                Some(name.to_string())
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub processed: usize,
    pub needs_review: usize,
    pub duplicate_in_sheet: usize,
    pub duplicate_in_store: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Entries the caller should commit to the persistence gateway.
    pub new_entries: Vec<ReconciledEntry>,
}

/// Scan a sheet's journal-reference column for a normalized match.
fn sheet_has_ref(sheet: &Sheet, normalized: &str) -> bool {
    let col = sheet.find_column(0, "Journal Ref").unwrap_or(1);
    sheet
        .rows
        .iter()
        .skip(1)
        .any(|row| row.get(col).is_some_and(|c| normalize_ref(&c.display()) == normalized))
}

/// Merge aggregated transactions into the workbook: match each to a club,
/// dedupe against the target sheet, append, rebuild Summary Individual,
/// recompute the Summary, and normalize sheet order and widths.
///
/// `known_refs` is the persistence gateway's reference set; transactions
/// absent from it are returned as `new_entries` for the caller to commit.
pub fn merge_transactions(
    workbook: &mut Workbook,
    transactions: &[AggregatedTransaction],
    config: &ReconConfig,
    known_refs: &HashSet<String>,
    today: NaiveDate,
) -> Result<MergeOutcome, ReconError> {
    let summary_sheet = workbook
        .sheet(&config.summary.sheet)
        .ok_or_else(|| ReconError::MissingSheet {
            role: "summary".into(),
            sheet: config.summary.sheet.clone(),
        })?;
    let layout = locate_summary(summary_sheet, &config.summary)?;
    let clubs = club_universe(summary_sheet, &layout);
    if clubs.is_empty() {
        return Err(ReconError::NoClubs { sheet: config.summary.sheet.clone() });
    }

    // Structural sheets plus one sheet per club, created up front so the
    // per-transaction path only ever appends. Re-mark the frozen header on
    // sheets reloaded from a prior artifact.
    workbook
        .ensure_sheet(&config.sheets.needs_review, &NEEDS_REVIEW_HEADERS)
        .frozen_header = true;
    workbook
        .ensure_sheet(&config.sheets.summary_individual, &SUMMARY_INDIVIDUAL_HEADERS)
        .frozen_header = true;
    let club_sheets: BTreeMap<String, String> = clubs
        .iter()
        .map(|club| (club.clone(), safe_sheet_name(club)))
        .collect();
    for sheet_name in club_sheets.values() {
        workbook.ensure_sheet(sheet_name, &CLUB_SHEET_HEADERS).frozen_header = true;
    }

    let mut outcome = MergeOutcome::default();

    for tx in transactions {
        let designation = tx.designation.as_deref().unwrap_or("");
        let matched_club = match match_club(designation, &clubs) {
            MatchOutcome::Matched(club) => Some(club),
            MatchOutcome::NoMatch => None,
            MatchOutcome::Ambiguous(candidates) => {
                outcome.warnings.push(format!(
                    "ref {}: designation '{}' matches multiple clubs ({}); routed to review",
                    tx.raw_ref,
                    designation,
                    candidates.join(", ")
                ));
                None
            }
        };

        // Fall back to the review queue when the matched club's sheet is
        // unexpectedly absent (sanitized-name collision or external edit).
        let club_target = matched_club.as_ref().and_then(|club| {
            let sheet_name = club_sheets.get(club)?;
            if workbook.contains(sheet_name) {
                Some((club.clone(), sheet_name.clone()))
            } else {
                outcome.errors.push(format!(
                    "ref {}: sheet '{sheet_name}' for club '{club}' is missing; routed to review",
                    tx.raw_ref
                ));
                None
            }
        });

        let (assigned, target_sheet) = match &club_target {
            Some((club, sheet_name)) => (Some(club.as_str()), sheet_name.as_str()),
            None => (None, config.sheets.needs_review.as_str()),
        };

        let target = workbook
            .sheet_mut(target_sheet)
            .expect("target sheet ensured above");
        if sheet_has_ref(target, &tx.normalized_ref) {
            outcome.duplicate_in_sheet += 1;
            continue;
        }

        if assigned.is_some() {
            target.append_row(club_row(tx));
            outcome.processed += 1;
        } else {
            target.append_row(needs_review_row(tx));
            outcome.needs_review += 1;
        }

        if known_refs.contains(&tx.normalized_ref) {
            outcome.duplicate_in_store += 1;
        } else {
            outcome
                .new_entries
                .push(ReconciledEntry::from_transaction(tx, assigned));
        }
    }

    rebuild_summary_individual(workbook, config, &club_sheets);
    recalculate_summary(workbook, config, today)?;
    finalize(workbook, config);

    Ok(outcome)
}

fn club_row(tx: &AggregatedTransaction) -> Vec<Cell> {
    vec![
        Cell::Date(tx.date),
        Cell::text(tx.raw_ref.clone()),
        Cell::text(tx.kind_label()),
        Cell::text(tx.primary_description.clone()),
        Cell::Money(tx.contribution_cents),
        Cell::Money(tx.fee_cents),
        Cell::Money(tx.net_cents()),
    ]
}

fn needs_review_row(tx: &AggregatedTransaction) -> Vec<Cell> {
    vec![
        Cell::Date(tx.date),
        Cell::text(tx.raw_ref.clone()),
        Cell::text(tx.primary_description.clone()),
        Cell::text(tx.designation.clone().unwrap_or_default()),
        Cell::Money(tx.contribution_cents),
        Cell::Money(tx.fee_cents),
        Cell::Money(tx.net_cents()),
    ]
}

// ---------------------------------------------------------------------------
// Summary Individual rebuild
// ---------------------------------------------------------------------------

/// Rebuild the flat list of all reconciled rows from the club sheets:
/// cleared below the header, repopulated sorted by date then club name.
pub fn rebuild_summary_individual(
    workbook: &mut Workbook,
    config: &ReconConfig,
    club_sheets: &BTreeMap<String, String>,
) {
    struct IndividualRow {
        date: Option<NaiveDate>,
        club: String,
        cells: Vec<Cell>,
    }

    let mut collected: Vec<IndividualRow> = Vec::new();
    for (club, sheet_name) in club_sheets {
        let Some(sheet) = workbook.sheet(sheet_name) else { continue };
        let date_col = sheet.find_column(0, "Date").unwrap_or(0);
        let ref_col = sheet.find_column(0, "Journal Ref").unwrap_or(1);
        let desc_col = sheet.find_column(0, "Description").unwrap_or(3);
        let contribution_col = sheet.find_column(0, "Contribution").unwrap_or(4);
        let fees_col = sheet.find_column(0, "Fees").unwrap_or(5);
        let net_col = sheet.find_column(0, "Net").unwrap_or(6);

        for row in sheet.rows.iter().skip(1) {
            if row.iter().all(Cell::is_empty) {
                continue;
            }
            let date = row.get(date_col).and_then(Cell::as_date);
            collected.push(IndividualRow {
                date,
                club: club.clone(),
                cells: vec![
                    row.get(date_col).cloned().unwrap_or(Cell::Empty),
                    Cell::text(club.clone()),
                    row.get(ref_col).cloned().unwrap_or(Cell::Empty),
                    row.get(desc_col).cloned().unwrap_or(Cell::Empty),
                    row.get(contribution_col).cloned().unwrap_or(Cell::Empty),
                    row.get(fees_col).cloned().unwrap_or(Cell::Empty),
                    row.get(net_col).cloned().unwrap_or(Cell::Empty),
                ],
            });
        }
    }

    collected.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.club.cmp(&b.club)));

    let sheet = workbook.ensure_sheet(&config.sheets.summary_individual, &SUMMARY_INDIVIDUAL_HEADERS);
    sheet.rows.truncate(1);
    for row in collected {
        sheet.append_row(row.cells);
    }
}

// ---------------------------------------------------------------------------
// Summary recalculation + finalize
// ---------------------------------------------------------------------------

/// Recompute every Summary club row from its club sheet, restricted to
/// dates on or after the fiscal-year start. Rollover and expenses are read
/// as-is; `remaining = rollover + contribution - charges - expenses`. A
/// grand-total row, when present, becomes the column sums of the club rows.
pub fn recalculate_summary(
    workbook: &mut Workbook,
    config: &ReconConfig,
    today: NaiveDate,
) -> Result<(), ReconError> {
    let fy_start = fiscal_year_start(today, config.fiscal.start_month);

    let summary = workbook
        .sheet(&config.summary.sheet)
        .ok_or_else(|| ReconError::MissingSheet {
            role: "summary".into(),
            sheet: config.summary.sheet.clone(),
        })?;
    let layout = locate_summary(summary, &config.summary)?;

    // Per-club fiscal-year sums, gathered before taking the summary sheet
    // mutably.
    let clubs = club_universe(summary, &layout);
    let mut sums: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for club in &clubs {
        let sheet_name = safe_sheet_name(club);
        let Some(sheet) = workbook.sheet(&sheet_name) else {
            sums.insert(club.clone(), (0, 0));
            continue;
        };
        let date_col = sheet.find_column(0, "Date").unwrap_or(0);
        let contribution_col = sheet.find_column(0, "Contribution").unwrap_or(4);
        let fees_col = sheet.find_column(0, "Fees").unwrap_or(5);

        let mut contribution = 0i64;
        let mut fees = 0i64;
        for row in sheet.rows.iter().skip(1) {
            let in_year = row
                .get(date_col)
                .and_then(Cell::as_date)
                .is_some_and(|d| d >= fy_start);
            if !in_year {
                continue;
            }
            contribution += row.get(contribution_col).and_then(Cell::as_cents).unwrap_or(0);
            fees += row.get(fees_col).and_then(Cell::as_cents).unwrap_or(0);
        }
        sums.insert(club.clone(), (contribution, fees));
    }

    let summary = workbook
        .sheet_mut(&config.summary.sheet)
        .expect("summary sheet checked above");

    let mut totals = (0i64, 0i64, 0i64, 0i64, 0i64);
    let mut grand_total_row: Option<usize> = None;
    for idx in layout.header_row + 1..summary.rows.len() {
        let name = summary.cell(idx, layout.club).display();
        let name = name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        if is_grand_total(&name) {
            grand_total_row = Some(idx);
            continue;
        }
        let (contribution, charges) = sums.get(&name).copied().unwrap_or((0, 0));
        let rollover = summary.cell(idx, layout.rollover).as_cents().unwrap_or(0);
        let expenses = summary.cell(idx, layout.expenses).as_cents().unwrap_or(0);
        let remaining = rollover + contribution - charges - expenses;

        let row = &mut summary.rows[idx];
        let width = [layout.contribution, layout.charges, layout.remaining]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1;
        if row.len() < width {
            row.resize(width, Cell::Empty);
        }
        row[layout.contribution] = Cell::Money(contribution);
        row[layout.charges] = Cell::Money(charges);
        row[layout.remaining] = Cell::Money(remaining);

        totals.0 += rollover;
        totals.1 += contribution;
        totals.2 += charges;
        totals.3 += expenses;
        totals.4 += remaining;
    }

    if let Some(idx) = grand_total_row {
        let row = &mut summary.rows[idx];
        let width = [
            layout.rollover,
            layout.contribution,
            layout.charges,
            layout.expenses,
            layout.remaining,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1;
        if row.len() < width {
            row.resize(width, Cell::Empty);
        }
        row[layout.rollover] = Cell::Money(totals.0);
        row[layout.contribution] = Cell::Money(totals.1);
        row[layout.charges] = Cell::Money(totals.2);
        row[layout.expenses] = Cell::Money(totals.3);
        row[layout.remaining] = Cell::Money(totals.4);
    }

    Ok(())
}

/// Deterministic sheet order (Summary, Summary Individual, Needs Review,
/// then club sheets alphabetically) and content-based column widths.
pub fn finalize(workbook: &mut Workbook, config: &ReconConfig) {
    let structural = [
        config.summary.sheet.clone(),
        config.sheets.summary_individual.clone(),
        config.sheets.needs_review.clone(),
    ];
    let mut club_names: Vec<String> = workbook
        .sheet_names()
        .into_iter()
        .filter(|name| !structural.contains(name))
        .collect();
    club_names.sort();

    let mut desired: Vec<String> = structural.to_vec();
    desired.extend(club_names);
    workbook.reorder(&desired);

    for idx in 0..workbook.sheets().len() {
        let widths = auto_widths(&workbook.sheets()[idx]);
        let name = workbook.sheets()[idx].name.clone();
        if let Some(sheet) = workbook.sheet_mut(&name) {
            sheet.col_widths = widths;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{date, summary_workbook, tx};

    fn run_merge(
        wb: &mut Workbook,
        transactions: &[AggregatedTransaction],
    ) -> MergeOutcome {
        let config = ReconConfig::default();
        merge_transactions(wb, transactions, &config, &HashSet::new(), date("2025-08-01"))
            .unwrap()
    }

    #[test]
    fn missing_summary_sheet_fatal() {
        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::new("Other"));
        let config = ReconConfig::default();
        let err =
            merge_transactions(&mut wb, &[], &config, &HashSet::new(), date("2025-08-01"))
                .unwrap_err();
        assert!(matches!(err, ReconError::MissingSheet { .. }));
    }

    #[test]
    fn missing_summary_header_fatal() {
        let mut wb = Workbook::new();
        let mut summary = Sheet::new("Summary");
        summary.append_row(vec![Cell::text("nothing useful")]);
        wb.add_sheet(summary);
        let config = ReconConfig::default();
        let err =
            merge_transactions(&mut wb, &[], &config, &HashSet::new(), date("2025-08-01"))
                .unwrap_err();
        assert!(matches!(err, ReconError::MissingHeader { .. }));
    }

    #[test]
    fn matched_transaction_lands_in_club_sheet() {
        let mut wb = summary_workbook(&["Archery Club", "Chess Club"]);
        let out = run_merge(&mut wb, &[tx("AB1234", "2025-07-15", 10000, 0, Some("Archery Club"))]);

        assert_eq!(out.processed, 1);
        assert_eq!(out.needs_review, 0);
        assert_eq!(out.new_entries.len(), 1);
        assert_eq!(out.new_entries[0].assigned_club.as_deref(), Some("Archery Club"));

        let sheet = wb.sheet("Archery Club").unwrap();
        assert_eq!(sheet.data_row_count(), 1);
        assert_eq!(sheet.cell(1, 4).as_cents(), Some(10000));
        assert_eq!(sheet.cell(1, 6).as_cents(), Some(10000));
    }

    #[test]
    fn unmatched_designation_routes_to_review_preserving_text() {
        let mut wb = summary_workbook(&["Archery Club"]);
        let out =
            run_merge(&mut wb, &[tx("AB1234", "2025-07-15", 10000, 0, Some("Unknown Team Xyz"))]);

        assert_eq!(out.processed, 0);
        assert_eq!(out.needs_review, 1);
        let review = wb.sheet("Needs Review").unwrap();
        assert_eq!(review.data_row_count(), 1);
        assert_eq!(review.cell(1, 3).display(), "Unknown Team Xyz");
    }

    #[test]
    fn rerun_is_idempotent() {
        let mut wb = summary_workbook(&["Archery Club"]);
        let txns = vec![tx("AB1234", "2025-07-15", 10000, 500, Some("Archery Club"))];
        let first = run_merge(&mut wb, &txns);
        assert_eq!(first.processed, 1);
        let rows_after_first: usize =
            wb.sheets().iter().map(|s| s.rows.len()).sum();

        let second = run_merge(&mut wb, &txns);
        assert_eq!(second.processed, 0);
        assert_eq!(second.duplicate_in_sheet, 1);
        assert!(second.new_entries.is_empty());
        let rows_after_second: usize =
            wb.sheets().iter().map(|s| s.rows.len()).sum();
        assert_eq!(rows_after_first, rows_after_second);
    }

    #[test]
    fn store_known_ref_not_recommitted() {
        let mut wb = summary_workbook(&["Archery Club"]);
        let config = ReconConfig::default();
        let known: HashSet<String> = ["AB1234".to_string()].into();
        let out = merge_transactions(
            &mut wb,
            &[tx("AB1234", "2025-07-15", 10000, 0, Some("Archery Club"))],
            &config,
            &known,
            date("2025-08-01"),
        )
        .unwrap();

        // The sheet row is written (workbook self-heals) but the entry is
        // not handed back for persistence.
        assert_eq!(out.processed, 1);
        assert_eq!(out.duplicate_in_store, 1);
        assert!(out.new_entries.is_empty());
    }

    #[test]
    fn ambiguous_match_warns_and_routes_to_review() {
        let mut wb = summary_workbook(&["Alpha Club", "Gamma Club"]);
        let out = run_merge(
            &mut wb,
            &[tx("AB1234", "2025-07-15", 10000, 0, Some("Alpha Club and Gamma Club event"))],
        );
        assert_eq!(out.needs_review, 1);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("Alpha Club"));
        assert!(out.warnings[0].contains("Gamma Club"));
    }

    #[test]
    fn summary_recalculated_for_fiscal_year_only() {
        let mut wb = summary_workbook(&["Archery Club"]);
        // June 30 belongs to the prior fiscal year; July 1 to the current.
        let txns = vec![
            tx("A1", "2025-06-30", 5000, 0, Some("Archery Club")),
            tx("A2", "2025-07-01", 10000, 250, Some("Archery Club")),
        ];
        run_merge(&mut wb, &txns);

        let summary = wb.sheet("Summary").unwrap();
        let layout = locate_summary(summary, &ReconConfig::default().summary).unwrap();
        let club_row = layout.header_row + 1;
        assert_eq!(summary.cell(club_row, layout.contribution).as_cents(), Some(10000));
        assert_eq!(summary.cell(club_row, layout.charges).as_cents(), Some(250));
        assert_eq!(summary.cell(club_row, layout.remaining).as_cents(), Some(9750));
    }

    #[test]
    fn remaining_includes_rollover_and_expenses() {
        let mut wb = summary_workbook(&["Archery Club"]);
        {
            let summary = wb.sheet_mut("Summary").unwrap();
            summary.rows[2][1] = Cell::Money(20000); // rollover
            summary.rows[2][4] = Cell::Money(3000); // expenses, read as-is
        }
        run_merge(&mut wb, &[tx("A1", "2025-07-15", 10000, 500, Some("Archery Club"))]);

        let summary = wb.sheet("Summary").unwrap();
        // 200.00 + 100.00 - 5.00 - 30.00
        assert_eq!(summary.cell(2, 5).as_cents(), Some(26500));
        // Grand total mirrors the single club row.
        assert_eq!(summary.cell(3, 5).as_cents(), Some(26500));
    }

    #[test]
    fn summary_individual_rebuilt_sorted() {
        let mut wb = summary_workbook(&["Archery Club", "Chess Club"]);
        let txns = vec![
            tx("B1", "2025-07-20", 5000, 0, Some("Chess Club")),
            tx("A1", "2025-07-10", 10000, 0, Some("Archery Club")),
            tx("A2", "2025-07-20", 2000, 0, Some("Archery Club")),
        ];
        run_merge(&mut wb, &txns);

        let individual = wb.sheet("Summary Individual").unwrap();
        assert_eq!(individual.data_row_count(), 3);
        // Sorted by date, then club name on the tie.
        assert_eq!(individual.cell(1, 2).display(), "A1");
        assert_eq!(individual.cell(2, 2).display(), "A2");
        assert_eq!(individual.cell(3, 2).display(), "B1");

        // Rebuild is stable across reruns.
        run_merge(&mut wb, &txns);
        assert_eq!(wb.sheet("Summary Individual").unwrap().data_row_count(), 3);
    }

    #[test]
    fn sheets_ordered_deterministically() {
        let mut wb = summary_workbook(&["Zebra Club", "Archery Club"]);
        run_merge(&mut wb, &[]);
        assert_eq!(
            wb.sheet_names(),
            vec!["Summary", "Summary Individual", "Needs Review", "Archery Club", "Zebra Club"]
        );
        assert!(wb.sheets().iter().all(|s| !s.col_widths.is_empty() || s.rows.is_empty()));
    }
}
