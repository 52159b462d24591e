//! Fiscal-year boundaries. The year starts on the first day of a
//! configured month (July by default) and runs twelve months.

use chrono::NaiveDate;

/// First day of the fiscal year containing `today`. If `today`'s month is
/// at or past the start month the year began this calendar year,
/// otherwise last year.
pub fn fiscal_year_start(today: NaiveDate, start_month: u32) -> NaiveDate {
    use chrono::Datelike;
    let year = if today.month() >= start_month {
        today.year()
    } else {
        today.year() - 1
    };
    // start_month is validated to 1-12 by config; fall back to July 1 on
    // an impossible date rather than panicking mid-run.
    NaiveDate::from_ymd_opt(year, start_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 7, 1).expect("july 1 is valid"))
}

/// Two-digit fiscal-year label, e.g. FY26 for the year starting July 2025.
pub fn fiscal_year_label(today: NaiveDate, start_month: u32) -> String {
    use chrono::Datelike;
    let start = fiscal_year_start(today, start_month);
    let ending_year = if start_month == 1 { start.year() } else { start.year() + 1 };
    format!("FY{:02}", ending_year % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn month_at_or_past_start_begins_this_year() {
        assert_eq!(fiscal_year_start(date("2025-07-01"), 7), date("2025-07-01"));
        assert_eq!(fiscal_year_start(date("2025-12-31"), 7), date("2025-07-01"));
    }

    #[test]
    fn month_before_start_begins_last_year() {
        assert_eq!(fiscal_year_start(date("2025-06-30"), 7), date("2024-07-01"));
        assert_eq!(fiscal_year_start(date("2026-01-15"), 7), date("2025-07-01"));
    }

    #[test]
    fn june_30_and_july_1_straddle_the_boundary() {
        let start = fiscal_year_start(date("2025-08-10"), 7);
        assert!(date("2025-06-30") < start);
        assert!(date("2025-07-01") >= start);
    }

    #[test]
    fn calendar_year_start_month() {
        assert_eq!(fiscal_year_start(date("2025-03-01"), 1), date("2025-01-01"));
        assert_eq!(fiscal_year_label(date("2025-03-01"), 1), "FY25");
    }

    #[test]
    fn label_names_ending_year() {
        assert_eq!(fiscal_year_label(date("2025-08-10"), 7), "FY26");
        assert_eq!(fiscal_year_label(date("2025-06-30"), 7), "FY25");
    }
}
