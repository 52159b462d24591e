//! Transaction aggregator: groups date-filtered ledger lines by their
//! normalized journal reference into one logical transaction each.

use std::collections::BTreeMap;

use crate::donor::DonorIndex;
use crate::model::{AggregatedTransaction, LedgerLine, LineKind, TransactionLine};
use crate::refs::normalize_ref;

/// Boilerplate lead-ins stripped from contribution descriptions.
const CONTRIBUTION_PREFIXES: [&str; 4] =
    ["cash contributions", "cash contribution", "gift received", "donation"];

/// Known fee categories and their display labels.
const FEE_LABELS: [(&str, &str); 3] = [
    ("ADMINISTRATIVE GIFT FEE", "Foundation Gift Fee"),
    ("CC PLATFORM PROCESSING FEES", "Credit Card Platform Fee"),
    ("BANK/CREDIT CARD FEES", "Bank/Credit Card Fee"),
];

/// Group lines by normalized reference. Contribution and fee sums stay
/// independent; the first-seen line fixes the transaction's date and the
/// displayed (raw) reference. Output is ordered by normalized reference.
pub fn aggregate_lines(lines: &[LedgerLine], donor: &DonorIndex) -> Vec<AggregatedTransaction> {
    struct Group {
        raw_ref: String,
        date: chrono::NaiveDate,
        lines: Vec<TransactionLine>,
    }

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for ledger_line in lines {
        let normalized = normalize_ref(&ledger_line.raw_ref);
        groups
            .entry(normalized)
            .or_insert_with(|| Group {
                raw_ref: ledger_line.raw_ref.clone(),
                date: ledger_line.line.date,
                lines: Vec::new(),
            })
            .lines
            .push(ledger_line.line.clone());
    }

    groups
        .into_iter()
        .map(|(normalized_ref, group)| {
            let contribution_cents: i64 = group
                .lines
                .iter()
                .filter(|l| l.kind == LineKind::Contribution)
                .map(|l| l.amount_cents)
                .sum();
            let fee_cents: i64 = group
                .lines
                .iter()
                .filter(|l| l.kind == LineKind::Fee)
                .map(|l| l.amount_cents)
                .sum();
            let primary_description = primary_description(&group.lines, &group.raw_ref);
            let designation = donor.designation_for(&normalized_ref).map(str::to_string);

            AggregatedTransaction {
                normalized_ref,
                raw_ref: group.raw_ref,
                date: group.date,
                contribution_cents,
                fee_cents,
                primary_description,
                designation,
                lines: group.lines,
            }
        })
        .collect()
}

/// Display description by priority: cleaned contribution text, canonical
/// fee label, raw line text, placeholder.
fn primary_description(lines: &[TransactionLine], raw_ref: &str) -> String {
    if let Some(contrib) = lines.iter().find(|l| l.kind == LineKind::Contribution) {
        let without_ref = strip_ref_token(&contrib.raw_description, raw_ref);
        let cleaned = strip_contribution_prefix(&without_ref);
        return if cleaned.is_empty() {
            "[Donor Name Not Parsed]".to_string()
        } else {
            cleaned
        };
    }

    if let Some(fee) = lines.iter().find(|l| l.kind == LineKind::Fee) {
        let upper = fee.raw_description.to_uppercase();
        for (needle, label) in FEE_LABELS {
            if upper.contains(needle) {
                return label.to_string();
            }
        }
        return format!("[Fee] {}", fee.raw_description);
    }

    match lines.first() {
        Some(line) => line.raw_description.clone(),
        None => "[Description N/A]".to_string(),
    }
}

/// Remove the journal reference token (and its `/` or `-` separator) from
/// a description.
fn strip_ref_token(description: &str, raw_ref: &str) -> String {
    if raw_ref.is_empty() {
        return description.trim().to_string();
    }
    let mut result = description.to_string();
    for pattern in [format!("/{raw_ref}"), format!("-{raw_ref}"), raw_ref.to_string()] {
        if result.contains(&pattern) {
            result = result.replace(&pattern, "");
            break;
        }
    }
    result.trim_matches([' ', '/']).trim().to_string()
}

/// Drop a leading boilerplate phrase plus its `-`/`from` separator.
fn strip_contribution_prefix(description: &str) -> String {
    let trimmed = description.trim();
    let lowered = trimmed.to_lowercase();
    for prefix in CONTRIBUTION_PREFIXES {
        if lowered.starts_with(prefix) {
            let rest = trimmed.get(prefix.len()..).unwrap_or("").trim_start();
            let rest = rest
                .strip_prefix('-')
                .map(str::trim_start)
                .or_else(|| {
                    rest.to_lowercase()
                        .starts_with("from ")
                        .then(|| rest.get(5..).unwrap_or("").trim_start())
                })
                .unwrap_or(rest);
            return rest.trim().to_string();
        }
    }
    trimmed.to_string()
}
