use serde::Deserialize;

use crate::error::ReconError;
use crate::model::LineKind;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine configuration. Every field has a default matching the upstream
/// foundation exports, so a run with no config file works against the
/// standard report layouts.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReconConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub donor: DonorConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub sheets: SheetNames,
    #[serde(default)]
    pub fiscal: FiscalConfig,
}

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if !(1..=12).contains(&self.fiscal.start_month) {
            return Err(ReconError::ConfigValidation(format!(
                "fiscal.start_month must be 1-12, got {}",
                self.fiscal.start_month
            )));
        }
        if self.ledger.sections.is_empty() {
            return Err(ReconError::ConfigValidation(
                "ledger.sections must list at least one section".into(),
            ));
        }
        if self.summary.header_scan_rows == 0 {
            return Err(ReconError::ConfigValidation(
                "summary.header_scan_rows must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ledger export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Sheet-name fragments tried first when picking the target sheet.
    #[serde(default = "default_sheet_hints")]
    pub sheet_hints: Vec<String>,
    /// Exact fallback sheet name tried after the hints.
    #[serde(default = "default_sheet_fallback")]
    pub sheet_fallback: Option<String>,
    #[serde(default)]
    pub columns: LedgerColumns,
    /// Recognized accounting sections; banners naming anything else
    /// deactivate extraction until the next recognized banner.
    #[serde(default = "default_sections")]
    pub sections: Vec<SectionRule>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            sheet_hints: default_sheet_hints(),
            sheet_fallback: default_sheet_fallback(),
            columns: LedgerColumns::default(),
            sections: default_sections(),
        }
    }
}

fn default_sheet_hints() -> Vec<String> {
    vec!["activity".into(), "ledger".into()]
}

fn default_sheet_fallback() -> Option<String> {
    Some("4100-774390".into())
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerColumns {
    #[serde(default = "default_ledger_date")]
    pub date: String,
    #[serde(default = "default_ledger_description")]
    pub description: String,
    #[serde(default = "default_ledger_debit")]
    pub debit: String,
    #[serde(default = "default_ledger_credit")]
    pub credit: String,
    /// Optional column consulted when the description yields no reference.
    #[serde(default = "default_ledger_transaction_number")]
    pub transaction_number: Option<String>,
}

impl Default for LedgerColumns {
    fn default() -> Self {
        Self {
            date: default_ledger_date(),
            description: default_ledger_description(),
            debit: default_ledger_debit(),
            credit: default_ledger_credit(),
            transaction_number: default_ledger_transaction_number(),
        }
    }
}

fn default_ledger_date() -> String {
    "Post Date".into()
}
fn default_ledger_description() -> String {
    "Invoice Description / Journal Ref".into()
}
fn default_ledger_debit() -> String {
    "Debit".into()
}
fn default_ledger_credit() -> String {
    "Credit".into()
}
fn default_ledger_transaction_number() -> Option<String> {
    Some("Transaction#".into())
}

/// Maps a banner's section name (lower-cased) to the line kind extracted
/// within that section.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionRule {
    pub name: String,
    pub kind: LineKind,
}

fn default_sections() -> Vec<SectionRule> {
    let rule = |name: &str, kind| SectionRule { name: name.into(), kind };
    vec![
        rule("contributions - cash", LineKind::Contribution),
        rule("contributions - non cash", LineKind::Contribution),
        rule("services - bank/credit card fees", LineKind::Fee),
        rule("services - cc platform processing fees", LineKind::Fee),
        rule("transfer out - administrative gift fee", LineKind::Fee),
    ]
}

// ---------------------------------------------------------------------------
// Donor export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DonorConfig {
    #[serde(default = "default_donor_sheet")]
    pub sheet: String,
    /// Leading rows above the data block.
    #[serde(default = "default_donor_skip_rows")]
    pub skip_rows: usize,
    /// Zero-based positional columns.
    #[serde(default = "default_donor_reference_col")]
    pub reference_col: usize,
    #[serde(default = "default_donor_date_col")]
    pub date_col: usize,
    #[serde(default = "default_donor_designation_col")]
    pub designation_col: usize,
}

impl Default for DonorConfig {
    fn default() -> Self {
        Self {
            sheet: default_donor_sheet(),
            skip_rows: default_donor_skip_rows(),
            reference_col: default_donor_reference_col(),
            date_col: default_donor_date_col(),
            designation_col: default_donor_designation_col(),
        }
    }
}

fn default_donor_sheet() -> String {
    "College or Unit Acknowledgement".into()
}
fn default_donor_skip_rows() -> usize {
    7
}
fn default_donor_reference_col() -> usize {
    1
}
fn default_donor_date_col() -> usize {
    5
}
fn default_donor_designation_col() -> usize {
    8
}

// ---------------------------------------------------------------------------
// Summary workbook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_summary_sheet")]
    pub sheet: String,
    /// How many leading rows to scan for the header row.
    #[serde(default = "default_header_scan_rows")]
    pub header_scan_rows: usize,
    #[serde(default)]
    pub columns: SummaryColumns,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            sheet: default_summary_sheet(),
            header_scan_rows: default_header_scan_rows(),
            columns: SummaryColumns::default(),
        }
    }
}

fn default_summary_sheet() -> String {
    "Summary".into()
}
fn default_header_scan_rows() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryColumns {
    #[serde(default = "default_col_club")]
    pub club: String,
    #[serde(default = "default_col_rollover")]
    pub rollover: String,
    #[serde(default = "default_col_contribution")]
    pub contribution: String,
    #[serde(default = "default_col_charges")]
    pub charges: String,
    #[serde(default = "default_col_expenses")]
    pub expenses: String,
    #[serde(default = "default_col_remaining")]
    pub remaining: String,
}

impl Default for SummaryColumns {
    fn default() -> Self {
        Self {
            club: default_col_club(),
            rollover: default_col_rollover(),
            contribution: default_col_contribution(),
            charges: default_col_charges(),
            expenses: default_col_expenses(),
            remaining: default_col_remaining(),
        }
    }
}

fn default_col_club() -> String {
    "Sports Clubs".into()
}
fn default_col_rollover() -> String {
    "Rollover".into()
}
fn default_col_contribution() -> String {
    "Sum of Contribution".into()
}
fn default_col_charges() -> String {
    "Sum of Chgs/offset".into()
}
fn default_col_expenses() -> String {
    "Sum of Expenses".into()
}
fn default_col_remaining() -> String {
    "Sum of Remaining".into()
}

// ---------------------------------------------------------------------------
// Structural sheet names + fiscal year
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SheetNames {
    #[serde(default = "default_needs_review")]
    pub needs_review: String,
    #[serde(default = "default_summary_individual")]
    pub summary_individual: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            needs_review: default_needs_review(),
            summary_individual: default_summary_individual(),
        }
    }
}

fn default_needs_review() -> String {
    "Needs Review".into()
}
fn default_summary_individual() -> String {
    "Summary Individual".into()
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FiscalConfig {
    /// First month of the fiscal year (7 = July).
    #[serde(default = "default_fiscal_start_month")]
    pub start_month: u32,
}

impl Default for FiscalConfig {
    fn default() -> Self {
        Self { start_month: default_fiscal_start_month() }
    }
}

fn default_fiscal_start_month() -> u32 {
    7
}
