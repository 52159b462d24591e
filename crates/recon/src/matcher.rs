//! Club matcher: resolves free-form designation text to a known club.
//!
//! Pure function over `(text, candidates)` with no pipeline coupling, so
//! the strategy can be swapped without touching extraction or merging.

/// Outcome of matching one designation against the club universe.
/// `Ambiguous` carries the tied candidates so callers can log them for
/// audit; the pipeline routes it the same as `NoMatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    NoMatch,
    Matched(String),
    Ambiguous(Vec<String>),
}

impl MatchOutcome {
    pub fn club(&self) -> Option<&str> {
        match self {
            Self::Matched(club) => Some(club),
            _ => None,
        }
    }
}

/// Matching-normal form: lowercase, apostrophe/quote variants stripped,
/// punctuation to spaces, whitespace collapsed.
pub fn normalize_for_match(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' | '\u{2018}' | '\u{2019}' | '"' | '\u{201c}' | '\u{201d}' | '`' => {}
            c if c.is_alphanumeric() => out.extend(c.to_lowercase()),
            _ => out.push(' '),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whole-word substring test on matching-normal strings.
fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let at = start + pos;
        let end = at + needle.len();
        let left_ok = at == 0 || haystack.as_bytes()[at - 1] == b' ';
        let right_ok = end == haystack.len() || haystack.as_bytes()[end] == b' ';
        if left_ok && right_ok {
            return true;
        }
        start = at + 1;
        if start >= haystack.len() {
            break;
        }
    }
    false
}

/// Resolve `designation` against `club_names`.
///
/// Candidacy: a club's normalized name occurs as a whole-word substring of
/// the normalized designation. One candidate wins outright; among several
/// the strictly longest normalized name wins; a length tie resolves only
/// when exactly one tied name equals the whole designation.
pub fn match_club(designation: &str, club_names: &[String]) -> MatchOutcome {
    let text = normalize_for_match(designation);
    if text.is_empty() {
        return MatchOutcome::NoMatch;
    }

    let mut candidates: Vec<(&String, String)> = Vec::new();
    for name in club_names {
        let normalized = normalize_for_match(name);
        if contains_whole_word(&text, &normalized) {
            candidates.push((name, normalized));
        }
    }

    match candidates.len() {
        0 => MatchOutcome::NoMatch,
        1 => MatchOutcome::Matched(candidates[0].0.clone()),
        _ => {
            let longest = candidates.iter().map(|(_, n)| n.len()).max().unwrap_or(0);
            candidates.retain(|(_, n)| n.len() == longest);
            if candidates.len() == 1 {
                return MatchOutcome::Matched(candidates[0].0.clone());
            }
            let mut exact = candidates.iter().filter(|(_, n)| *n == text);
            match (exact.next(), exact.next()) {
                (Some((name, _)), None) => MatchOutcome::Matched((*name).clone()),
                _ => MatchOutcome::Ambiguous(
                    candidates.into_iter().map(|(name, _)| name.clone()).collect(),
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clubs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalization_strips_quotes_and_punctuation() {
        assert_eq!(normalize_for_match("Men's  Rugby-Club!"), "mens rugby club");
        assert_eq!(normalize_for_match("\u{2018}Quoted\u{2019} + more"), "quoted more");
        assert_eq!(normalize_for_match("   "), "");
    }

    #[test]
    fn exact_name_resolves() {
        let outcome = match_club("Archery Club", &clubs(&["Archery Club", "Chess Club"]));
        assert_eq!(outcome, MatchOutcome::Matched("Archery Club".into()));
    }

    #[test]
    fn whole_word_substring_resolves() {
        let outcome = match_club(
            "Gift in support of the Archery Club fund",
            &clubs(&["Archery Club", "Chess Club"]),
        );
        assert_eq!(outcome, MatchOutcome::Matched("Archery Club".into()));
    }

    #[test]
    fn partial_word_is_not_a_candidate() {
        // "Archer" must not match inside "Archery".
        let outcome = match_club("Archery trip", &clubs(&["Archer"]));
        assert_eq!(outcome, MatchOutcome::NoMatch);
    }

    #[test]
    fn longest_candidate_wins() {
        let outcome = match_club(
            "Donation to Rugby Club Women",
            &clubs(&["Rugby Club", "Rugby Club Women"]),
        );
        assert_eq!(outcome, MatchOutcome::Matched("Rugby Club Women".into()));
    }

    #[test]
    fn length_tie_breaks_on_exact_equality() {
        let outcome = match_club("Alpha Club", &clubs(&["Alpha Club", "Gamma Club"]));
        assert_eq!(outcome, MatchOutcome::Matched("Alpha Club".into()));
    }

    #[test]
    fn unresolvable_tie_is_ambiguous_with_candidates() {
        // Both names substring-match and tie on length; neither equals the
        // full designation.
        let outcome = match_club(
            "Alpha Club and Gamma Club joint event",
            &clubs(&["Alpha Club", "Gamma Club"]),
        );
        match outcome {
            MatchOutcome::Ambiguous(candidates) => {
                assert_eq!(candidates, vec!["Alpha Club".to_string(), "Gamma Club".to_string()]);
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn empty_or_unmatched_text_no_match() {
        assert_eq!(match_club("", &clubs(&["Archery Club"])), MatchOutcome::NoMatch);
        assert_eq!(
            match_club("Unknown Team Xyz", &clubs(&["Archery Club"])),
            MatchOutcome::NoMatch
        );
    }

    #[test]
    fn case_and_punctuation_insensitive() {
        let outcome = match_club("MEN'S rugby-club", &clubs(&["Mens Rugby Club"]));
        assert_eq!(outcome, MatchOutcome::Matched("Mens Rugby Club".into()));
    }
}
