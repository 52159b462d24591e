//! Integer-cents amounts and tolerant parsing of spreadsheet money text.

/// Parse an amount string into cents.
///
/// Tolerates `$`, thousands separators, surrounding whitespace (including
/// non-breaking spaces) and accountant-style parenthesized negatives.
/// Returns `None` for anything that is not a plain decimal number after
/// cleanup; callers treat that as zero for row-level degradation.
pub fn parse_cents(raw: &str) -> Option<i64> {
    let mut s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = &s[1..s.len() - 1];
    }

    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '\u{a0}'))
        .collect();
    let mut cleaned = cleaned.as_str();
    if let Some(rest) = cleaned.strip_prefix('-') {
        negative = !negative;
        cleaned = rest;
    }

    let (dollars, frac) = match cleaned.split_once('.') {
        Some((d, f)) => (d, f),
        None => (cleaned, ""),
    };
    if dollars.is_empty() && frac.is_empty() {
        return None;
    }
    if !dollars.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let dollars: i64 = if dollars.is_empty() {
        0
    } else {
        dollars.parse().ok()?
    };

    // Two decimal places, rounding half-up on the third digit.
    let mut frac_cents: i64 = 0;
    let digits: Vec<u32> = frac.chars().filter_map(|c| c.to_digit(10)).collect();
    if !digits.is_empty() {
        frac_cents = (digits.first().copied().unwrap_or(0) * 10
            + digits.get(1).copied().unwrap_or(0)) as i64;
        if digits.get(2).copied().unwrap_or(0) >= 5 {
            frac_cents += 1;
        }
    }

    let cents = dollars.checked_mul(100)?.checked_add(frac_cents)?;
    Some(if negative { -cents } else { cents })
}

/// Parse as `parse_cents` but force the result positive.
pub fn parse_cents_positive(raw: &str) -> Option<i64> {
    parse_cents(raw).map(i64::abs)
}

/// Cents to the floating-point dollar value written into spreadsheets.
pub fn cents_to_f64(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Dollar value read from a spreadsheet cell back to cents.
pub fn f64_to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Display form with thousands separators, e.g. `$1,234.56` / `-$0.45`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = abs / 100;
    let frac = abs % 100;

    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{sign}${grouped}.{frac:02}")
}
