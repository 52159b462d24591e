//! Designation resolver: builds the journal-reference → designation map
//! and the valid transaction date window from the donor export.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::DonorConfig;
use crate::model::DateWindow;
use crate::refs::normalize_ref;
use crate::workbook::{Cell, Sheet};

pub struct DonorIndex {
    /// normalized journal reference -> designation text. First occurrence
    /// wins on duplicate references.
    pub designations: HashMap<String, String>,
    /// `[min, max]` of valid donor dates; `None` when the export had no
    /// parseable dates (date filtering is then skipped).
    pub window: Option<DateWindow>,
    pub warnings: Vec<String>,
}

impl DonorIndex {
    pub fn designation_for(&self, normalized_ref: &str) -> Option<&str> {
        self.designations.get(normalized_ref).map(String::as_str)
    }
}

/// Read the donor sheet's fixed positional columns. Row-level problems
/// degrade to warnings; rows missing any of the three values are ignored
/// like the upstream export's padding rows.
pub fn resolve_designations(sheet: &Sheet, config: &DonorConfig) -> DonorIndex {
    let mut index = DonorIndex {
        designations: HashMap::new(),
        window: None,
        warnings: Vec::new(),
    };
    let mut min_date: Option<NaiveDate> = None;
    let mut max_date: Option<NaiveDate> = None;

    for (idx, row) in sheet.rows.iter().enumerate().skip(config.skip_rows) {
        let ref_cell = row.get(config.reference_col).cloned().unwrap_or(Cell::Empty);
        let date_cell = row.get(config.date_col).cloned().unwrap_or(Cell::Empty);
        let designation_cell = row
            .get(config.designation_col)
            .cloned()
            .unwrap_or(Cell::Empty);

        if ref_cell.is_empty() || date_cell.is_empty() || designation_cell.is_empty() {
            continue;
        }

        let raw_ref = ref_cell.display();
        let normalized = normalize_ref(&raw_ref);
        if !normalized.is_empty() {
            index
                .designations
                .entry(normalized)
                .or_insert_with(|| designation_cell.display().trim().to_string());
        }

        match date_cell.as_date() {
            Some(date) => {
                min_date = Some(min_date.map_or(date, |d| d.min(date)));
                max_date = Some(max_date.map_or(date, |d| d.max(date)));
            }
            None => index.warnings.push(format!(
                "donor row {}: unparseable date '{}' for reference {}",
                idx + 1,
                date_cell.display(),
                raw_ref.trim()
            )),
        }
    }

    if let (Some(min), Some(max)) = (min_date, max_date) {
        index.window = Some(DateWindow { min, max });
    }
    index
}
