//! Calendar matching for announcements
//!
//! Pure date math over the stored birthday table: who matches today,
//! who falls inside a window, and whose birthday comes next. Nothing
//! here touches Discord or the clock, which keeps it all testable with
//! pinned dates.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Windows project onto both boundary years
//! - 1.0.0: Today/window/next matching

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use super::date::BirthdayDate;

/// How far ahead `next_occurrence` searches. Eight years is enough to
/// find the next Feb 29 from any starting point.
const NEXT_SEARCH_YEARS: i32 = 8;

/// A birthday landing inside a queried window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHit {
    pub subject_id: u64,
    pub date: BirthdayDate,
    pub occurs_on: NaiveDate,
}

/// Records whose month and day equal `today`. Feb 29 birthdays match
/// only when today is Feb 29.
pub fn match_today(
    records: &BTreeMap<u64, BirthdayDate>,
    today: NaiveDate,
) -> Vec<(u64, BirthdayDate)> {
    records
        .iter()
        .filter(|(_, date)| date.month == today.month() && date.day == today.day())
        .map(|(id, date)| (*id, *date))
        .collect()
}

/// Earliest occurrence of a month/day inside `[start, end]`, trying the
/// year of each boundary. A window that crosses New Year needs both:
/// Dec 28 through Jan 4 holds a Jan 2 birthday only in the later year.
pub fn occurrence_in_window(
    month: u32,
    day: u32,
    start: NaiveDate,
    end: NaiveDate,
) -> Option<NaiveDate> {
    for year in start.year()..=end.year() {
        if let Some(occurrence) = NaiveDate::from_ymd_opt(year, month, day) {
            if occurrence >= start && occurrence <= end {
                return Some(occurrence);
            }
        }
    }
    None
}

/// Records with an occurrence inside the inclusive window, ordered by
/// occurrence date and then subject id.
pub fn match_window(
    records: &BTreeMap<u64, BirthdayDate>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<WindowHit> {
    let mut hits: Vec<WindowHit> = records
        .iter()
        .filter_map(|(id, date)| {
            occurrence_in_window(date.month, date.day, start, end).map(|occurs_on| WindowHit {
                subject_id: *id,
                date: *date,
                occurs_on,
            })
        })
        .collect();
    hits.sort_by_key(|hit| (hit.occurs_on, hit.subject_id));
    hits
}

/// The record whose next occurrence on or after `today` comes soonest.
/// Ties break on subject id.
pub fn next_occurrence(
    records: &BTreeMap<u64, BirthdayDate>,
    today: NaiveDate,
) -> Option<(u64, NaiveDate)> {
    records
        .iter()
        .filter_map(|(id, date)| {
            (today.year()..=today.year() + NEXT_SEARCH_YEARS)
                .filter_map(|year| date.on_year(year))
                .find(|occurrence| *occurrence >= today)
                .map(|occurrence| (occurrence, *id))
        })
        .min()
        .map(|(occurrence, id)| (id, occurrence))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32, day: u32, year: Option<i32>) -> BirthdayDate {
        BirthdayDate::new(month, day, year).unwrap()
    }

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn sample_records() -> BTreeMap<u64, BirthdayDate> {
        let mut records = BTreeMap::new();
        records.insert(100, date(6, 15, Some(1990)));
        records.insert(200, date(6, 15, None));
        records.insert(300, date(1, 2, Some(1985)));
        records.insert(400, date(12, 30, None));
        records
    }

    #[test]
    fn test_match_today_finds_both_members() {
        let hits = match_today(&sample_records(), day(2026, 6, 15));
        let ids: Vec<u64> = hits.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![100, 200]);
    }

    #[test]
    fn test_match_today_empty_on_quiet_day() {
        assert!(match_today(&sample_records(), day(2026, 3, 3)).is_empty());
    }

    #[test]
    fn test_match_today_feb_29_only_on_leap_day() {
        let mut records = BTreeMap::new();
        records.insert(1, date(2, 29, None));
        assert_eq!(match_today(&records, day(2024, 2, 29)).len(), 1);
        assert!(match_today(&records, day(2023, 2, 28)).is_empty());
        assert!(match_today(&records, day(2023, 3, 1)).is_empty());
    }

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let records = sample_records();
        let hits = match_window(&records, day(2026, 6, 15), day(2026, 6, 15));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].occurs_on, day(2026, 6, 15));
    }

    #[test]
    fn test_window_across_new_year_sees_both_sides() {
        let hits = match_window(&sample_records(), day(2026, 12, 28), day(2027, 1, 4));
        let ids: Vec<u64> = hits.iter().map(|hit| hit.subject_id).collect();
        // Dec 30 sorts before Jan 2 even though its subject id is larger.
        assert_eq!(ids, vec![400, 300]);
        assert_eq!(hits[0].occurs_on, day(2026, 12, 30));
        assert_eq!(hits[1].occurs_on, day(2027, 1, 2));
    }

    #[test]
    fn test_window_excludes_outside_dates() {
        let hits = match_window(&sample_records(), day(2026, 6, 16), day(2026, 6, 22));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_window_feb_29_skipped_on_common_years() {
        let mut records = BTreeMap::new();
        records.insert(1, date(2, 29, Some(2000)));
        assert!(match_window(&records, day(2023, 2, 22), day(2023, 3, 1)).is_empty());
        let hits = match_window(&records, day(2024, 2, 22), day(2024, 3, 1));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].occurs_on, day(2024, 2, 29));
    }

    #[test]
    fn test_next_occurrence_today_counts() {
        let next = next_occurrence(&sample_records(), day(2026, 6, 15));
        assert_eq!(next, Some((100, day(2026, 6, 15))));
    }

    #[test]
    fn test_next_occurrence_rolls_into_next_year() {
        let mut records = BTreeMap::new();
        records.insert(300, date(1, 2, Some(1985)));
        let next = next_occurrence(&records, day(2026, 6, 16));
        assert_eq!(next, Some((300, day(2027, 1, 2))));
    }

    #[test]
    fn test_next_occurrence_feb_29_waits_for_leap_year() {
        let mut records = BTreeMap::new();
        records.insert(7, date(2, 29, None));
        let next = next_occurrence(&records, day(2025, 3, 1));
        assert_eq!(next, Some((7, day(2028, 2, 29))));
    }

    #[test]
    fn test_next_occurrence_empty_table() {
        assert_eq!(next_occurrence(&BTreeMap::new(), day(2026, 1, 1)), None);
    }
}
