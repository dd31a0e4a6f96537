//! Relative-date support for condition expressions.
//!
//! Conditions can compare a date field against "today shifted by N
//! units" (`date_for_comparison`), which is how "more than N days
//! before/after today" conditions are expressed. All dates are ISO 8601
//! calendar dates (YYYY-MM-DD); comparisons parse through `time::Date`.

use formwalk_definition::DateUnit;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime};

const ISO_DATE: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Parse an ISO calendar date. Returns None for anything that is not a
/// real date (2024-13-99 fails here, not downstream).
pub fn parse_iso_date(s: &str) -> Option<Date> {
    if !has_iso_shape(s) {
        return None;
    }
    Date::parse(s, ISO_DATE).ok()
}

/// Format a date back to ISO YYYY-MM-DD.
pub fn format_iso(date: Date) -> String {
    date.format(ISO_DATE)
        .unwrap_or_else(|_| date.to_string())
}

/// Whether a string is a real ISO calendar date.
pub fn is_iso_date(s: &str) -> bool {
    parse_iso_date(s).is_some()
}

/// Cheap shape check: 4 digits, dash, 2 digits, dash, 2 digits.
fn has_iso_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[0..4].iter().all(|b| b.is_ascii_digit())
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(|b| b.is_ascii_digit())
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(|b| b.is_ascii_digit())
}

/// Today's UTC date shifted by `offset` units, for relative-date
/// comparison operands.
pub fn date_for_comparison(offset: i64, unit: DateUnit) -> Date {
    shift(OffsetDateTime::now_utc().date(), offset, unit)
}

/// Shift a date by a signed number of units. Month and year shifts clamp
/// the day to the target month's length (Jan 31 + 1 month = Feb 28/29).
pub fn shift(date: Date, offset: i64, unit: DateUnit) -> Date {
    match unit {
        DateUnit::Days => date
            .checked_add(Duration::days(offset))
            .unwrap_or(date),
        DateUnit::Weeks => date
            .checked_add(Duration::weeks(offset))
            .unwrap_or(date),
        DateUnit::Months => add_months(date, offset),
        DateUnit::Years => add_months(date, offset * 12),
    }
}

fn add_months(date: Date, months: i64) -> Date {
    let zero_based = date.year() as i64 * 12 + (date.month() as u8 as i64 - 1) + months;
    let year = zero_based.div_euclid(12) as i32;
    let month = match Month::try_from((zero_based.rem_euclid(12) + 1) as u8) {
        Ok(m) => m,
        Err(_) => return date,
    };
    let day = date.day().min(time::util::days_in_year_month(year, month));
    Date::from_calendar_date(year, month, day).unwrap_or(date)
}

/// Human-readable rendering ("29 February 2024") used when validation
/// messages embed a date.
pub fn humanize(date: Date) -> String {
    format!("{} {} {}", date.day(), date.month(), date.year())
}

/// Replace every ISO date substring in a message with its human-readable
/// form. Non-date text passes through untouched.
pub fn humanize_dates_in(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < bytes.len() {
        if i + 10 <= bytes.len() && bytes[i].is_ascii_digit() {
            // get() guards the char boundary at i + 10
            if let Some(date) = text.get(i..i + 10).and_then(parse_iso_date) {
                out.push_str(&humanize(date));
                i += 10;
                continue;
            }
        }
        // Advance one full UTF-8 character
        let ch_len = text[i..].chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        out.push_str(&text[i..i + ch_len]);
        i += ch_len;
    }
    out
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parse_rejects_impossible_dates() {
        assert!(parse_iso_date("2024-02-29").is_some());
        assert!(parse_iso_date("2023-02-29").is_none());
        assert!(parse_iso_date("2024-13-01").is_none());
        assert!(parse_iso_date("not-a-date").is_none());
    }

    #[test]
    fn shift_days_and_weeks() {
        let d = date!(2024 - 03 - 10);
        assert_eq!(shift(d, 5, DateUnit::Days), date!(2024 - 03 - 15));
        assert_eq!(shift(d, -2, DateUnit::Weeks), date!(2024 - 02 - 25));
    }

    #[test]
    fn shift_months_clamps_day() {
        assert_eq!(
            shift(date!(2024 - 01 - 31), 1, DateUnit::Months),
            date!(2024 - 02 - 29)
        );
        assert_eq!(
            shift(date!(2023 - 01 - 31), 1, DateUnit::Months),
            date!(2023 - 02 - 28)
        );
    }

    #[test]
    fn shift_years_through_leap_day() {
        assert_eq!(
            shift(date!(2024 - 02 - 29), -1, DateUnit::Years),
            date!(2023 - 02 - 28)
        );
        assert_eq!(
            shift(date!(2024 - 06 - 15), -18, DateUnit::Years),
            date!(2006 - 06 - 15)
        );
    }

    #[test]
    fn shift_across_year_boundary() {
        assert_eq!(
            shift(date!(2024 - 11 - 30), 3, DateUnit::Months),
            date!(2025 - 02 - 28)
        );
        assert_eq!(
            shift(date!(2024 - 02 - 15), -3, DateUnit::Months),
            date!(2023 - 11 - 15)
        );
    }

    #[test]
    fn humanize_messages() {
        assert_eq!(
            humanize_dates_in("Date must be on or before 2024-02-29"),
            "Date must be on or before 29 February 2024"
        );
        assert_eq!(
            humanize_dates_in("no dates here"),
            "no dates here"
        );
        // Date-shaped but impossible -- left alone
        assert_eq!(
            humanize_dates_in("got 2024-13-99 instead"),
            "got 2024-13-99 instead"
        );
    }

    #[test]
    fn roundtrip_iso_format() {
        let d = date!(2026 - 08 - 01);
        assert_eq!(format_iso(d), "2026-08-01");
        assert_eq!(parse_iso_date(&format_iso(d)), Some(d));
    }
}
