//! Calendar math for birthdays.
//!
//! Pure date arithmetic: projecting a birth date onto its next occurrence,
//! leap-day substitution, age and countdown helpers, and the western zodiac
//! lookup. Everything here takes an explicit `today` so the functions stay
//! deterministic and trivially testable.

use chrono::{Datelike, NaiveDate};

/// Check if a year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// The nearest occurrence of the birthday on or after `today`.
///
/// Feb-29 birthdays fall on Feb-28 in non-leap target years; the
/// substitution is recomputed per projection year, since this year and next
/// year differ in leap-ness.
pub fn next_occurrence(birth_date: NaiveDate, today: NaiveDate) -> NaiveDate {
    let this_year = project_onto_year(birth_date, today.year());
    if this_year < today {
        project_onto_year(birth_date, today.year() + 1)
    } else {
        this_year
    }
}

fn project_onto_year(birth_date: NaiveDate, year: i32) -> NaiveDate {
    let day = if birth_date.month() == 2 && birth_date.day() == 29 && !is_leap_year(year) {
        28
    } else {
        birth_date.day()
    };

    // birth_date is a real calendar date and the leap-day substitution above
    // removes the only projection that could fail, so the fallback is
    // unreachable.
    NaiveDate::from_ymd_opt(year, birth_date.month(), day).unwrap_or(birth_date)
}

/// Whether the birthday falls on `today`, comparing month and day only.
pub fn is_birthday_today(birth_date: NaiveDate, today: NaiveDate) -> bool {
    birth_date.month() == today.month() && birth_date.day() == today.day()
}

/// Age the member turns on the given occurrence of their birthday.
pub fn age_turning(birth_date: NaiveDate, occurrence: NaiveDate) -> i32 {
    occurrence.year() - birth_date.year()
}

/// Days from `today` until the next occurrence of the birthday (0 = today).
pub fn days_until_birthday(birth_date: NaiveDate, today: NaiveDate) -> i64 {
    (next_occurrence(birth_date, today) - today).num_days()
}

/// A western zodiac sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZodiacSign {
    pub name: &'static str,
    pub symbol: &'static str,
}

/// Sign table as (name, symbol, start month-day, end month-day).
/// Capricorn spans the year boundary and is handled separately.
const ZODIAC_SIGNS: &[(&str, &str, (u32, u32), (u32, u32))] = &[
    ("Aquarius", "\u{2652}", (1, 20), (2, 18)),
    ("Pisces", "\u{2653}", (2, 19), (3, 20)),
    ("Aries", "\u{2648}", (3, 21), (4, 19)),
    ("Taurus", "\u{2649}", (4, 20), (5, 20)),
    ("Gemini", "\u{264A}", (5, 21), (6, 20)),
    ("Cancer", "\u{264B}", (6, 21), (7, 22)),
    ("Leo", "\u{264C}", (7, 23), (8, 22)),
    ("Virgo", "\u{264D}", (8, 23), (9, 22)),
    ("Libra", "\u{264E}", (9, 23), (10, 22)),
    ("Scorpio", "\u{264F}", (10, 23), (11, 21)),
    ("Sagittarius", "\u{2650}", (11, 22), (12, 21)),
];

/// The zodiac sign a date falls under.
pub fn zodiac_sign(date: NaiveDate) -> ZodiacSign {
    let month_day = (date.month(), date.day());

    for &(name, symbol, start, end) in ZODIAC_SIGNS {
        if month_day >= start && month_day <= end {
            return ZodiacSign { name, symbol };
        }
    }

    // Dec 22 .. Jan 19 wraps the year boundary.
    ZodiacSign {
        name: "Capricorn",
        symbol: "\u{2651}",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_is_leap_year() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2025));
    }

    #[test]
    fn test_next_occurrence_later_this_year() {
        assert_eq!(
            next_occurrence(date(1990, 6, 20), date(2025, 6, 15)),
            date(2025, 6, 20)
        );
    }

    #[test]
    fn test_next_occurrence_today_counts() {
        assert_eq!(
            next_occurrence(date(1990, 6, 15), date(2025, 6, 15)),
            date(2025, 6, 15)
        );
    }

    #[test]
    fn test_next_occurrence_rolls_to_next_year() {
        assert_eq!(
            next_occurrence(date(1990, 6, 10), date(2025, 6, 15)),
            date(2026, 6, 10)
        );
    }

    #[test]
    fn test_leap_birthday_in_non_leap_year() {
        // 2025 and 2026 are not leap years; Feb-29 celebrates on Feb-28.
        assert_eq!(
            next_occurrence(date(2000, 2, 29), date(2025, 3, 1)),
            date(2026, 2, 28)
        );
        assert_eq!(
            next_occurrence(date(2000, 2, 29), date(2025, 1, 10)),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn test_leap_birthday_in_leap_year() {
        assert_eq!(
            next_occurrence(date(2000, 2, 29), date(2024, 1, 10)),
            date(2024, 2, 29)
        );
        // After Feb-29 of a leap year the projection lands on next year's
        // Feb-28, since 2025 is not a leap year.
        assert_eq!(
            next_occurrence(date(2000, 2, 29), date(2024, 3, 1)),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn test_is_birthday_today_ignores_year() {
        assert!(is_birthday_today(date(1990, 6, 15), date(2025, 6, 15)));
        assert!(!is_birthday_today(date(1990, 6, 16), date(2025, 6, 15)));
    }

    #[test]
    fn test_age_turning() {
        assert_eq!(age_turning(date(1990, 6, 15), date(2025, 6, 15)), 35);
        assert_eq!(age_turning(date(1990, 6, 10), date(2026, 6, 10)), 36);
    }

    #[test]
    fn test_days_until_birthday() {
        assert_eq!(days_until_birthday(date(1990, 6, 15), date(2025, 6, 15)), 0);
        assert_eq!(days_until_birthday(date(1990, 6, 20), date(2025, 6, 15)), 5);
        assert_eq!(
            days_until_birthday(date(1990, 6, 10), date(2025, 6, 15)),
            360
        );
    }

    #[test]
    fn test_zodiac_signs() {
        assert_eq!(zodiac_sign(date(1990, 3, 15)).name, "Pisces");
        assert_eq!(zodiac_sign(date(1990, 8, 1)).name, "Leo");
        // Capricorn spans the year boundary.
        assert_eq!(zodiac_sign(date(1990, 12, 25)).name, "Capricorn");
        assert_eq!(zodiac_sign(date(1990, 1, 10)).name, "Capricorn");
        assert_eq!(zodiac_sign(date(1990, 1, 20)).name, "Aquarius");
    }
}
