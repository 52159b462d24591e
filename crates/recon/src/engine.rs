//! Pipeline orchestration: resolver and extractor over their inputs, the
//! aggregator over both, then the merger against the summary workbook.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::aggregate::aggregate_lines;
use crate::config::ReconConfig;
use crate::donor::resolve_designations;
use crate::error::ReconError;
use crate::extract::extract_lines;
use crate::merge::merge_transactions;
use crate::model::{RunOutput, RunSummary};
use crate::workbook::{Sheet, Workbook};

/// Pre-loaded inputs for one reconciliation run. Sheet selection and file
/// I/O happen upstream; the engine only sees grids.
pub struct RunInput {
    /// The ledger export's activity sheet.
    pub ledger: Sheet,
    /// The donor export's acknowledgement sheet.
    pub donor: Sheet,
    /// The persisted summary workbook, mutated in place and returned.
    pub workbook: Workbook,
}

/// Run the full pipeline. `known_refs` is the persistence gateway's
/// committed-reference set; `today` anchors the fiscal-year window.
///
/// Structural failures on any input return `Err` and produce no
/// artifact. Row-level problems degrade into `summary.warnings`.
pub fn run(
    config: &ReconConfig,
    input: RunInput,
    known_refs: &HashSet<String>,
    today: NaiveDate,
) -> Result<RunOutput, ReconError> {
    let RunInput { ledger, donor, mut workbook } = input;

    let donor_index = resolve_designations(&donor, &config.donor);
    let extracted = extract_lines(&ledger, &config.ledger, donor_index.window.as_ref())?;
    let transactions = aggregate_lines(&extracted.lines, &donor_index);

    let merged = merge_transactions(&mut workbook, &transactions, config, known_refs, today)?;

    let mut warnings = donor_index.warnings;
    warnings.extend(extracted.warnings);
    warnings.extend(merged.warnings);

    Ok(RunOutput {
        workbook,
        summary: RunSummary {
            processed: merged.processed,
            needs_review: merged.needs_review,
            duplicate_in_sheet: merged.duplicate_in_sheet,
            duplicate_in_store: merged.duplicate_in_store,
            skipped_out_of_range: extracted.skipped_out_of_range,
            errors: merged.errors,
            warnings,
        },
        new_entries: merged.new_entries,
    })
}
