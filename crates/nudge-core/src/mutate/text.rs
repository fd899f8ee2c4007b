//! Plain-text substitution and date stamping.

use std::sync::LazyLock;

use regex::Regex;

static DATE_STAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("static regex must compile")
});

/// Replace every occurrence of `base` with `next`.
///
/// Exact, case-sensitive substring replacement: `1.0.0` inside `11.0.0` is
/// replaced too. Narrow it with extra rules when that matters.
pub fn replace_version(old: &str, base: &str, next: &str) -> String {
    old.replace(base, next)
}

/// Replace every `YYYY-MM-DD` stamp that is not part of a longer digit run.
pub fn stamp_date(content: &str, date: &str) -> String {
    let bytes = content.as_bytes();
    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    let mut pos = 0;

    while let Some(m) = DATE_STAMP.find_at(content, pos) {
        let digit_before = m.start() > 0 && bytes[m.start() - 1].is_ascii_digit();
        let digit_after = bytes.get(m.end()).is_some_and(u8::is_ascii_digit);
        if digit_before || digit_after {
            // A bounded stamp may start inside this match.
            pos = m.start() + 1;
            continue;
        }
        out.push_str(&content[last..m.start()]);
        out.push_str(date);
        last = m.end();
        pos = m.end();
    }

    out.push_str(&content[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_every_occurrence() {
        assert_eq!(
            replace_version("1.0.0 and 1.0.0", "1.0.0", "1.0.1"),
            "1.0.1 and 1.0.1"
        );
    }

    #[test]
    fn substring_match_is_raw() {
        assert_eq!(replace_version("11.0.0", "1.0.0", "1.0.1"), "11.0.1");
    }

    #[test]
    fn stamps_bounded_dates() {
        assert_eq!(
            stamp_date("(1999-01-01) 2000-12-31", "2026-10-18"),
            "(2026-10-18) 2026-10-18"
        );
        assert_eq!(stamp_date("1999-01-01", "2026-10-18"), "2026-10-18");
    }

    #[test]
    fn skips_dates_inside_digit_runs() {
        assert_eq!(stamp_date("12024-01-01", "2026-10-18"), "12024-01-01");
        assert_eq!(stamp_date("2024-01-011", "2026-10-18"), "2024-01-011");
        assert_eq!(stamp_date("x2024-01-01x", "2026-10-18"), "x2026-10-18x");
    }

    #[test]
    fn finds_date_overlapping_a_skipped_run() {
        assert_eq!(
            stamp_date("0000-00-0000-00-00", "2026-10-18"),
            "0000-00-2026-10-18"
        );
    }

    #[test]
    fn no_dates_is_identity() {
        assert_eq!(stamp_date("v1.0.0\n", "2026-10-18"), "v1.0.0\n");
    }
}
