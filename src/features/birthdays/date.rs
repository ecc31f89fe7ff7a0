//! Birthday date parsing and formatting
//!
//! Accepts the date shapes people actually type: ISO (`1987-09-06`),
//! slash and dash forms (`9/6/1987`, `9-6-77`), and month names with
//! optional ordinal suffixes (`sept 6th 1987`, `June 15`). A date may
//! omit the year entirely; the wire format stores `0000` for it.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Ordinal suffixes (1st, 2nd, 3rd, 4th) in month-name forms
//! - 1.1.0: Two-digit years with a 1969 pivot
//! - 1.0.0: ISO, slash, and month-name parsing

use chrono::NaiveDate;

use super::error::{BirthdayError, Result};

/// Year placeholder written to disk when the member gave no birth year.
const YEAR_UNKNOWN: &str = "0000";

/// Leap year used to validate month/day pairs that carry no year, so
/// `feb 29` stays accepted.
const VALIDATION_YEAR: i32 = 2000;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar birthday. The year is optional; members who only share
/// month and day get no age lines in announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthdayDate {
    pub month: u32,
    pub day: u32,
    pub year: Option<i32>,
}

impl BirthdayDate {
    pub fn new(month: u32, day: u32, year: Option<i32>) -> Result<Self> {
        let check_year = year.unwrap_or(VALIDATION_YEAR);
        if NaiveDate::from_ymd_opt(check_year, month, day).is_none() {
            return Err(BirthdayError::InvalidDate(format!(
                "{check_year:04}-{month:02}-{day:02} is not a real date"
            )));
        }
        Ok(Self { month, day, year })
    }

    /// Parses a member-typed date. Empty input and unrecognized shapes
    /// report the raw input back in the error.
    pub fn parse(input: &str) -> Result<Self> {
        let cleaned = input.replace(',', " ");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err(BirthdayError::InvalidDate("empty date".into()));
        }

        if cleaned.contains('/') {
            return parse_separated(cleaned, '/');
        }
        if cleaned.contains('-') && !cleaned.contains(char::is_alphabetic) {
            return parse_separated(cleaned, '-');
        }
        parse_month_name_form(cleaned)
    }

    /// Parses the stored `YYYY-MM-DD` form, mapping the `0000` year
    /// back to "unknown".
    pub fn from_wire(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split('-').collect();
        if parts.len() != 3 {
            return Err(BirthdayError::InvalidDate(raw.to_string()));
        }
        let year = if parts[0] == YEAR_UNKNOWN {
            None
        } else {
            Some(parse_number(parts[0], raw)? as i32)
        };
        let month = parse_number(parts[1], raw)?;
        let day = parse_number(parts[2], raw)?;
        Self::new(month, day, year)
    }

    pub fn to_wire(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}",
            self.year.unwrap_or(0),
            self.month,
            self.day
        )
    }

    /// `September 6` style, used in announcement lines.
    pub fn month_day_display(&self) -> String {
        format!("{} {}", month_name(self.month), self.day)
    }

    /// Projects the birthday onto a specific year. `None` when the day
    /// does not exist there (Feb 29 on common years).
    pub fn on_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }

    /// Age the member turns on the occurrence in `year`, when the birth
    /// year is known.
    pub fn age_on(&self, year: i32) -> Option<i32> {
        self.year.map(|birth| year - birth)
    }
}

/// `January` for 1 through `December` for 12.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("Unknown")
}

fn parse_number(token: &str, context: &str) -> Result<u32> {
    token
        .trim()
        .parse::<u32>()
        .map_err(|_| BirthdayError::InvalidDate(context.to_string()))
}

/// Two-digit years pivot at 69: `77` is 1977, `24` is 2024.
fn expand_year(raw: u32, digits: usize) -> i32 {
    if digits <= 2 {
        if raw >= 69 {
            1900 + raw as i32
        } else {
            2000 + raw as i32
        }
    } else {
        raw as i32
    }
}

/// Slash and dash forms. Three segments starting with a long token are
/// year-first (`1987-09-06`); otherwise month-first (`9/6/77`). Two
/// segments are month/day with no year.
fn parse_separated(input: &str, sep: char) -> Result<BirthdayDate> {
    let parts: Vec<&str> = input.split(sep).map(str::trim).collect();
    match parts.len() {
        2 => {
            let month = parse_number(parts[0], input)?;
            let day = parse_number(parts[1], input)?;
            BirthdayDate::new(month, day, None)
        }
        3 => {
            if parts[0].len() >= 3 {
                let year = parse_number(parts[0], input)? as i32;
                let month = parse_number(parts[1], input)?;
                let day = parse_number(parts[2], input)?;
                BirthdayDate::new(month, day, Some(year))
            } else {
                let month = parse_number(parts[0], input)?;
                let day = parse_number(parts[1], input)?;
                let raw_year = parse_number(parts[2], input)?;
                let year = expand_year(raw_year, parts[2].len());
                BirthdayDate::new(month, day, Some(year))
            }
        }
        _ => Err(BirthdayError::InvalidDate(input.to_string())),
    }
}

/// `sept 6th 1987`, `June 15`, `15 june`. The month is found by name
/// prefix (3 letters minimum), a 4-digit token is the year, and the
/// remaining small number is the day.
fn parse_month_name_form(input: &str) -> Result<BirthdayDate> {
    let mut month: Option<u32> = None;
    let mut day: Option<u32> = None;
    let mut year: Option<i32> = None;

    for token in input.split_whitespace() {
        if token.chars().all(|c| c.is_ascii_alphabetic()) {
            match month_from_name(token) {
                Some(m) if month.is_none() => month = Some(m),
                _ => return Err(BirthdayError::InvalidDate(input.to_string())),
            }
            continue;
        }

        let digits = strip_ordinal_suffix(token);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(BirthdayError::InvalidDate(input.to_string()));
        }
        let value = parse_number(digits, input)?;
        if digits.len() == 4 {
            if year.is_some() {
                return Err(BirthdayError::InvalidDate(input.to_string()));
            }
            year = Some(value as i32);
        } else {
            if day.is_some() {
                return Err(BirthdayError::InvalidDate(input.to_string()));
            }
            day = Some(value);
        }
    }

    match (month, day) {
        (Some(month), Some(day)) => BirthdayDate::new(month, day, year),
        _ => Err(BirthdayError::InvalidDate(input.to_string())),
    }
}

fn month_from_name(token: &str) -> Option<u32> {
    if token.len() < 3 {
        return None;
    }
    let lower = token.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|name| name.to_ascii_lowercase().starts_with(&lower))
        .map(|idx| idx as u32 + 1)
}

/// `6th` becomes `6`. Only strips when the prefix is purely numeric.
fn strip_ordinal_suffix(token: &str) -> &str {
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(prefix) = token
            .to_ascii_lowercase()
            .strip_suffix(suffix)
            .map(|p| &token[..p.len()])
        {
            if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) {
                return prefix;
            }
        }
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso() {
        let date = BirthdayDate::parse("1987-09-06").unwrap();
        assert_eq!(date.month, 9);
        assert_eq!(date.day, 6);
        assert_eq!(date.year, Some(1987));
    }

    #[test]
    fn test_parse_slash_full_year() {
        let date = BirthdayDate::parse("9/6/1987").unwrap();
        assert_eq!((date.month, date.day, date.year), (9, 6, Some(1987)));
    }

    #[test]
    fn test_parse_two_digit_year_pivot() {
        assert_eq!(BirthdayDate::parse("9/6/77").unwrap().year, Some(1977));
        assert_eq!(BirthdayDate::parse("1/2/24").unwrap().year, Some(2024));
        assert_eq!(BirthdayDate::parse("1/2/69").unwrap().year, Some(1969));
        assert_eq!(BirthdayDate::parse("1/2/68").unwrap().year, Some(2068));
    }

    #[test]
    fn test_parse_dash_month_first() {
        let date = BirthdayDate::parse("9-6-77").unwrap();
        assert_eq!((date.month, date.day, date.year), (9, 6, Some(1977)));
    }

    #[test]
    fn test_parse_month_day_without_year() {
        let date = BirthdayDate::parse("6/15").unwrap();
        assert_eq!((date.month, date.day, date.year), (6, 15, None));
    }

    #[test]
    fn test_parse_month_name_with_comma() {
        let date = BirthdayDate::parse("September 6, 1987").unwrap();
        assert_eq!((date.month, date.day, date.year), (9, 6, Some(1987)));
    }

    #[test]
    fn test_parse_abbreviated_month_and_ordinal() {
        let date = BirthdayDate::parse("sept 6th 1987").unwrap();
        assert_eq!((date.month, date.day, date.year), (9, 6, Some(1987)));
    }

    #[test]
    fn test_parse_month_name_no_year() {
        let date = BirthdayDate::parse("june 15").unwrap();
        assert_eq!((date.month, date.day, date.year), (6, 15, None));
    }

    #[test]
    fn test_parse_day_before_month() {
        let date = BirthdayDate::parse("15 june").unwrap();
        assert_eq!((date.month, date.day, date.year), (6, 15, None));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(BirthdayDate::parse("soon").is_err());
        assert!(BirthdayDate::parse("").is_err());
        assert!(BirthdayDate::parse("13/1/2020").is_err());
        assert!(BirthdayDate::parse("june").is_err());
    }

    #[test]
    fn test_feb_29_needs_leap_year() {
        assert!(BirthdayDate::parse("February 29, 2023").is_err());
        assert!(BirthdayDate::parse("February 29, 2024").is_ok());
        // No year: validated against a leap year, so it stays legal.
        assert!(BirthdayDate::parse("feb 29").is_ok());
    }

    #[test]
    fn test_wire_round_trip_with_year() {
        let date = BirthdayDate::parse("sept 6th 1987").unwrap();
        assert_eq!(date.to_wire(), "1987-09-06");
        assert_eq!(BirthdayDate::from_wire("1987-09-06").unwrap(), date);
    }

    #[test]
    fn test_wire_year_sentinel() {
        let date = BirthdayDate::parse("june 15").unwrap();
        assert_eq!(date.to_wire(), "0000-06-15");
        let back = BirthdayDate::from_wire("0000-06-15").unwrap();
        assert_eq!(back.year, None);
    }

    #[test]
    fn test_from_wire_rejects_malformed() {
        assert!(BirthdayDate::from_wire("1987-09").is_err());
        assert!(BirthdayDate::from_wire("1987/09/06").is_err());
        assert!(BirthdayDate::from_wire("1987-13-06").is_err());
    }

    #[test]
    fn test_month_day_display() {
        let date = BirthdayDate::parse("9/6/1987").unwrap();
        assert_eq!(date.month_day_display(), "September 6");
    }

    #[test]
    fn test_on_year_feb_29() {
        let date = BirthdayDate::new(2, 29, None).unwrap();
        assert!(date.on_year(2023).is_none());
        assert_eq!(
            date.on_year(2024),
            Some(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
    }

    #[test]
    fn test_age_on() {
        let known = BirthdayDate::parse("1987-09-06").unwrap();
        assert_eq!(known.age_on(2026), Some(39));
        let unknown = BirthdayDate::parse("june 15").unwrap();
        assert_eq!(unknown.age_on(2026), None);
    }
}
