//! Next-fire instant computation
//!
//! Turns a recurrence rule (daily, weekly on Monday, monthly on the
//! 1st) plus the configured local time and timezone into the next UTC
//! instant strictly after "now". All three rules share the same local
//! time resolution, so DST handling is identical across them: a local
//! time swallowed by a spring-forward gap shifts forward to the first
//! valid minute, and a repeated fall-back time takes its earliest
//! mapping.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.2.0: Monthly always lands in the month after now's
//! - 1.1.0: Strictly-after semantics for all rules, monthly included
//! - 1.0.0: Daily and weekly rules

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use super::error::{BirthdayError, Result};

/// Upper bound on the minute-by-minute scan across a DST gap. Real
/// gaps are an hour; Lord Howe Island uses thirty minutes.
const GAP_SCAN_MINUTES: i64 = 24 * 60;

/// Candidates to try before giving up. Two is enough for every rule;
/// the third absorbs a gap-shifted candidate landing in the past.
const CANDIDATE_ATTEMPTS: usize = 3;

/// Resolves a local wall-clock time in `tz` to a UTC instant.
///
/// Nonexistent times (spring-forward gap) step forward one minute at a
/// time until the zone resolves them. Ambiguous times (fall-back fold)
/// take the earliest of the two instants.
pub fn resolve_local(date: NaiveDate, hour: u32, minute: u32, tz: Tz) -> Result<DateTime<Utc>> {
    let mut naive = date.and_hms_opt(hour, minute, 0).ok_or_else(|| {
        BirthdayError::Scheduling(format!("{hour:02}:{minute:02} is not a wall-clock time"))
    })?;

    for _ in 0..GAP_SCAN_MINUTES {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(resolved) => return Ok(resolved.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => naive += Duration::minutes(1),
        }
    }

    Err(BirthdayError::Scheduling(format!(
        "no valid instant near {date} {hour:02}:{minute:02} in {tz}"
    )))
}

/// Next occurrence of `hour:minute` in `tz`, strictly after `now`.
pub fn next_daily(now: DateTime<Utc>, hour: u32, minute: u32, tz: Tz) -> Result<DateTime<Utc>> {
    let mut date = now.with_timezone(&tz).date_naive();
    for _ in 0..CANDIDATE_ATTEMPTS {
        let candidate = resolve_local(date, hour, minute, tz)?;
        if candidate > now {
            return Ok(candidate);
        }
        date += Duration::days(1);
    }
    Err(exhausted("daily", now, tz))
}

/// Next Monday at `hour:minute` in `tz`, strictly after `now`. A
/// Monday whose time already passed rolls to the following week.
pub fn next_weekly(now: DateTime<Utc>, hour: u32, minute: u32, tz: Tz) -> Result<DateTime<Utc>> {
    let today = now.with_timezone(&tz).date_naive();
    let days_ahead = (7 - today.weekday().num_days_from_monday()) % 7;
    let mut date = today + Duration::days(i64::from(days_ahead));
    for _ in 0..CANDIDATE_ATTEMPTS {
        let candidate = resolve_local(date, hour, minute, tz)?;
        if candidate > now {
            return Ok(candidate);
        }
        date += Duration::days(7);
    }
    Err(exhausted("weekly", now, tz))
}

/// First-of-month at `hour:minute` in `tz`, in the month after `now`'s.
/// The current month never counts, even on the 1st before the
/// announcement time.
pub fn next_monthly(now: DateTime<Utc>, hour: u32, minute: u32, tz: Tz) -> Result<DateTime<Utc>> {
    let today = now.with_timezone(&tz).date_naive();
    let date = first_of_next_month(today.year(), today.month())?;
    resolve_local(date, hour, minute, tz)
}

fn first_of_next_month(year: i32, month: u32) -> Result<NaiveDate> {
    let (year, month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| BirthdayError::Scheduling(format!("no first day in {year}-{month:02}")))
}

fn exhausted(rule: &str, now: DateTime<Utc>, tz: Tz) -> BirthdayError {
    BirthdayError::Scheduling(format!("no {rule} instant after {now} in {tz}"))
}
