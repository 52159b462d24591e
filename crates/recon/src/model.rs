use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workbook::Workbook;

// ---------------------------------------------------------------------------
// Ledger lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Contribution,
    Fee,
}

impl std::fmt::Display for LineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contribution => write!(f, "contribution"),
            Self::Fee => write!(f, "fee"),
        }
    }
}

/// A single classified line from the ledger export. Ephemeral: consumed
/// into an `AggregatedTransaction` within the same run.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionLine {
    pub kind: LineKind,
    pub amount_cents: i64,
    pub raw_description: String,
    pub date: NaiveDate,
}

/// A transaction line paired with the journal reference extracted from its
/// description; the aggregator groups on the normalized form of the ref.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerLine {
    pub raw_ref: String,
    pub line: TransactionLine,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// One logical transaction per distinct normalized reference per run.
#[derive(Debug, Clone)]
pub struct AggregatedTransaction {
    pub normalized_ref: String,
    pub raw_ref: String,
    pub date: NaiveDate,
    pub contribution_cents: i64,
    pub fee_cents: i64,
    pub primary_description: String,
    pub designation: Option<String>,
    pub lines: Vec<TransactionLine>,
}

impl AggregatedTransaction {
    /// Net is always derived, never stored independently.
    pub fn net_cents(&self) -> i64 {
        self.contribution_cents - self.fee_cents
    }

    /// Display label used in the workbook's "Type" column.
    pub fn kind_label(&self) -> &'static str {
        if self.contribution_cents > 0 {
            "Contribution"
        } else {
            "Fee/Expense"
        }
    }
}

// ---------------------------------------------------------------------------
// Date window
// ---------------------------------------------------------------------------

/// Inclusive date range derived from the donor report; ledger rows outside
/// it are excluded from reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min <= date && date <= self.max
    }
}

// ---------------------------------------------------------------------------
// Persisted projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    NeedsReview,
    Reconciled,
    Ignored,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeedsReview => "needs_review",
            Self::Reconciled => "reconciled",
            Self::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "needs_review" => Some(Self::NeedsReview),
            "reconciled" => Some(Self::Reconciled),
            "ignored" => Some(Self::Ignored),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The store-side projection of a reconciled (or review-pending)
/// transaction. Gross and fee totals are kept un-netted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledEntry {
    pub journal_ref: String,
    pub normalized_ref: String,
    pub date: NaiveDate,
    pub description: String,
    pub designation: Option<String>,
    pub gross_cents: i64,
    pub fees_cents: i64,
    pub net_cents: i64,
    pub assigned_club: Option<String>,
    pub status: EntryStatus,
}

impl ReconciledEntry {
    pub fn from_transaction(tx: &AggregatedTransaction, club: Option<&str>) -> Self {
        Self {
            journal_ref: tx.raw_ref.clone(),
            normalized_ref: tx.normalized_ref.clone(),
            date: tx.date,
            description: tx.primary_description.clone(),
            designation: tx.designation.clone(),
            gross_cents: tx.contribution_cents,
            fees_cents: tx.fee_cents,
            net_cents: tx.net_cents(),
            assigned_club: club.map(str::to_string),
            status: match club {
                Some(_) => EntryStatus::Reconciled,
                None => EntryStatus::NeedsReview,
            },
        }
    }

    pub fn kind_label(&self) -> &'static str {
        if self.gross_cents > 0 {
            "Contribution"
        } else {
            "Fee/Expense"
        }
    }
}

// ---------------------------------------------------------------------------
// Run results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub needs_review: usize,
    pub duplicate_in_sheet: usize,
    pub duplicate_in_store: usize,
    pub skipped_out_of_range: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct RunOutput {
    pub workbook: Workbook,
    pub summary: RunSummary,
    /// Entries the caller should commit to the persistence gateway.
    pub new_entries: Vec<ReconciledEntry>,
}
