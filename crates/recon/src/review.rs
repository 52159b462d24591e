//! Review workflow: scoped replays of the merger for one entry at a time.
//!
//! Both operations take the current workbook by reference and return a
//! new one (clone-mutate-return), so any failure leaves the caller's
//! workbook untouched and the five-step replay is atomic from the
//! caller's perspective. The store-side mutation (status, club
//! assignment, commit) stays with the caller, which applies it only
//! after the workbook replay succeeds.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::merge::{
    club_universe, finalize, locate_summary, rebuild_summary_individual, recalculate_summary,
    CLUB_SHEET_HEADERS, NEEDS_REVIEW_HEADERS,
};
use crate::model::{EntryStatus, ReconciledEntry};
use crate::refs::normalize_ref;
use crate::workbook::{safe_sheet_name, Cell, Workbook};

/// Reassign a needs-review entry to a club: the Needs-Review row is
/// removed, the club sheet gains the entry (created if absent), Summary
/// Individual is rebuilt and the Summary recomputed.
pub fn apply_review(
    workbook: &Workbook,
    entry: &ReconciledEntry,
    club: &str,
    config: &ReconConfig,
    today: NaiveDate,
) -> Result<Workbook, ReconError> {
    let club_sheets = known_club_sheets(workbook, config, club)?;
    let mut updated = workbook.clone();

    remove_review_row(&mut updated, config, &entry.normalized_ref);

    let sheet_name = club_sheets
        .get(club)
        .cloned()
        .unwrap_or_else(|| safe_sheet_name(club));
    let sheet = updated.ensure_sheet(&sheet_name, &CLUB_SHEET_HEADERS);
    let ref_col = sheet.find_column(0, "Journal Ref").unwrap_or(1);
    let already_present = sheet
        .rows
        .iter()
        .skip(1)
        .any(|row| row.get(ref_col).is_some_and(|c| normalize_ref(&c.display()) == entry.normalized_ref));
    if !already_present {
        sheet.append_row(entry_row(entry));
    }

    rebuild_summary_individual(&mut updated, config, &club_sheets);
    recalculate_summary(&mut updated, config, today)?;
    finalize(&mut updated, config);
    Ok(updated)
}

// ---------------------------------------------------------------------------
// Manual entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualEntryKind {
    Contribution,
    Expense,
    /// Money returned to the fund; recorded as a negative fee.
    Refund,
}

impl ManualEntryKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "contribution" => Some(Self::Contribution),
            "expense" => Some(Self::Expense),
            "refund" => Some(Self::Refund),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Contribution => "Contribution",
            Self::Expense => "Expense",
            Self::Refund => "Refund",
        }
    }
}

/// A hand-keyed transaction applied outside a reconciliation run.
#[derive(Debug, Clone)]
pub struct ManualEntry {
    pub kind: ManualEntryKind,
    pub date: NaiveDate,
    pub journal_ref: String,
    pub description: String,
    pub amount_cents: i64,
    pub club: String,
}

/// Apply a manual entry through the same scoped replay as a review
/// assignment. Returns the updated workbook and the entry to commit.
/// The caller is expected to have rejected references already in the
/// store; references already on the club sheet are rejected here.
pub fn apply_manual_entry(
    workbook: &Workbook,
    manual: &ManualEntry,
    config: &ReconConfig,
    today: NaiveDate,
) -> Result<(Workbook, ReconciledEntry), ReconError> {
    let club_sheets = known_club_sheets(workbook, config, &manual.club)?;
    let normalized = normalize_ref(&manual.journal_ref);

    let (contribution_cents, fee_cents) = match manual.kind {
        ManualEntryKind::Contribution => (manual.amount_cents.abs(), 0),
        ManualEntryKind::Expense => (0, manual.amount_cents.abs()),
        ManualEntryKind::Refund => (0, -manual.amount_cents.abs()),
    };

    let mut updated = workbook.clone();
    let sheet_name = club_sheets
        .get(&manual.club)
        .cloned()
        .unwrap_or_else(|| safe_sheet_name(&manual.club));
    let sheet = updated.ensure_sheet(&sheet_name, &CLUB_SHEET_HEADERS);
    let ref_col = sheet.find_column(0, "Journal Ref").unwrap_or(1);
    if sheet
        .rows
        .iter()
        .skip(1)
        .any(|row| row.get(ref_col).is_some_and(|c| normalize_ref(&c.display()) == normalized))
    {
        return Err(ReconError::DuplicateRef { reference: manual.journal_ref.clone() });
    }

    sheet.append_row(vec![
        Cell::Date(manual.date),
        Cell::text(manual.journal_ref.clone()),
        Cell::text(manual.kind.label()),
        Cell::text(manual.description.clone()),
        Cell::Money(contribution_cents),
        Cell::Money(fee_cents),
        Cell::Money(contribution_cents - fee_cents),
    ]);

    rebuild_summary_individual(&mut updated, config, &club_sheets);
    recalculate_summary(&mut updated, config, today)?;
    finalize(&mut updated, config);

    let entry = ReconciledEntry {
        journal_ref: manual.journal_ref.clone(),
        normalized_ref: normalized,
        date: manual.date,
        description: manual.description.clone(),
        designation: None,
        gross_cents: contribution_cents,
        fees_cents: fee_cents,
        net_cents: contribution_cents - fee_cents,
        assigned_club: Some(manual.club.clone()),
        status: EntryStatus::Reconciled,
    };
    Ok((updated, entry))
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// Club-name → sheet-name map from the Summary sheet, after verifying the
/// requested club is part of the universe.
fn known_club_sheets(
    workbook: &Workbook,
    config: &ReconConfig,
    club: &str,
) -> Result<BTreeMap<String, String>, ReconError> {
    let summary = workbook
        .sheet(&config.summary.sheet)
        .ok_or_else(|| ReconError::MissingSheet {
            role: "summary".into(),
            sheet: config.summary.sheet.clone(),
        })?;
    let layout = locate_summary(summary, &config.summary)?;
    let clubs = club_universe(summary, &layout);
    if !clubs.iter().any(|c| c == club) {
        return Err(ReconError::ClubNotFound { club: club.to_string() });
    }
    Ok(clubs
        .into_iter()
        .map(|c| {
            let sheet = safe_sheet_name(&c);
            (c, sheet)
        })
        .collect())
}

fn remove_review_row(workbook: &mut Workbook, config: &ReconConfig, normalized_ref: &str) {
    let sheet = workbook.ensure_sheet(&config.sheets.needs_review, &NEEDS_REVIEW_HEADERS);
    let ref_col = sheet.find_column(0, "Journal Ref").unwrap_or(1);
    // Row 0 is the header; everything below is fair game.
    let mut idx = 1;
    while idx < sheet.rows.len() {
        let matches = sheet.rows[idx]
            .get(ref_col)
            .is_some_and(|c| normalize_ref(&c.display()) == normalized_ref);
        if matches {
            sheet.rows.remove(idx);
        } else {
            idx += 1;
        }
    }
}

fn entry_row(entry: &ReconciledEntry) -> Vec<Cell> {
    vec![
        Cell::Date(entry.date),
        Cell::text(entry.journal_ref.clone()),
        Cell::text(entry.kind_label()),
        Cell::text(entry.description.clone()),
        Cell::Money(entry.gross_cents),
        Cell::Money(entry.fees_cents),
        Cell::Money(entry.net_cents),
    ]
}
