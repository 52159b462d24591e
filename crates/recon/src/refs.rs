//! Journal-reference normalization.
//!
//! Every place a reference is compared — aggregation, sheet dedupe scans,
//! the store's known-reference set — goes through `normalize_ref` so that
//! `0001234`, `1234` and `1234 ` all collapse to the same key.

/// Canonical string form of a journal reference.
///
/// Numeric references drop leading zeros (parsed as an integer and
/// re-rendered); everything else is trimmed and upper-cased.
pub fn normalize_ref(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<i128>() {
        Ok(n) => n.to_string(),
        Err(_) => trimmed.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_drops_leading_zeros() {
        assert_eq!(normalize_ref("0001234"), "1234");
        assert_eq!(normalize_ref(" 42 "), "42");
    }

    #[test]
    fn alphanumeric_uppercased() {
        assert_eq!(normalize_ref("ab1234"), "AB1234");
        assert_eq!(normalize_ref("  jrn-77 "), "JRN-77");
    }

    #[test]
    fn idempotent() {
        for raw in ["0001234", "ab1234", " Mixed-Case 9 ", "42", ""] {
            let once = normalize_ref(raw);
            assert_eq!(normalize_ref(&once), once);
        }
    }
}
