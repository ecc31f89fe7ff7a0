//! Birthday records and announcement settings
//!
//! Two JSON files under the data directory, both written through on
//! every mutation:
//!
//! - `birthdays.json`: subject id to `YYYY-MM-DD`, with `0000` as the
//!   year when the member gave none
//! - `settings.json`: `{ "time": "08:00", "channel": null, "timezone": "UTC" }`
//!
//! Reads come from memory; a failed disk write surfaces as an error
//! while the in-memory mutation stays applied, so a retry can succeed
//! without re-entering the date.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Skip unreadable record entries instead of refusing to boot
//! - 1.1.0: Settings file alongside the birthday table
//! - 1.0.0: JSON-backed birthday table

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono_tz::Tz;
use log::{info, warn};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::date::BirthdayDate;
use super::error::{BirthdayError, Result};

pub const BIRTHDAYS_FILE: &str = "birthdays.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// When and where announcements go out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementSettings {
    pub hour: u32,
    pub minute: u32,
    /// Announcements are skipped entirely while unset.
    pub channel_id: Option<u64>,
    pub timezone: Tz,
}

impl Default for AnnouncementSettings {
    fn default() -> Self {
        Self {
            hour: 8,
            minute: 0,
            channel_id: None,
            timezone: Tz::UTC,
        }
    }
}

impl AnnouncementSettings {
    /// `08:00` style, used in replies and in the settings file.
    pub fn time_display(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsFile {
    time: String,
    channel: Option<String>,
    timezone: String,
}

struct StoreState {
    records: BTreeMap<u64, BirthdayDate>,
    settings: AnnouncementSettings,
}

/// In-memory birthday table with write-through JSON persistence.
pub struct BirthdayStore {
    data_dir: PathBuf,
    state: Mutex<StoreState>,
}

impl BirthdayStore {
    /// Loads both files from `data_dir`. Missing files mean a fresh
    /// install and produce defaults; files that exist but hold broken
    /// JSON are an error.
    pub fn load(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();

        let raw_records: BTreeMap<String, String> =
            read_optional(&data_dir.join(BIRTHDAYS_FILE))?.unwrap_or_default();
        let records = records_from_wire(raw_records);

        let settings = match read_optional::<SettingsFile>(&data_dir.join(SETTINGS_FILE))? {
            Some(file) => settings_from_file(file),
            None => AnnouncementSettings::default(),
        };

        info!(
            "loaded {} birthdays from {}",
            records.len(),
            data_dir.display()
        );

        Ok(Self {
            data_dir,
            state: Mutex::new(StoreState { records, settings }),
        })
    }

    pub fn set_birthday(&self, subject_id: u64, date: BirthdayDate) -> Result<()> {
        let mut state = self.state();
        state.records.insert(subject_id, date);
        self.persist_records(&state.records)
    }

    pub fn birthday_of(&self, subject_id: u64) -> Option<BirthdayDate> {
        self.state().records.get(&subject_id).copied()
    }

    /// Removes a saved birthday. `Ok(false)` when none was saved.
    pub fn remove_birthday(&self, subject_id: u64) -> Result<bool> {
        let mut state = self.state();
        if state.records.remove(&subject_id).is_none() {
            return Ok(false);
        }
        self.persist_records(&state.records)?;
        Ok(true)
    }

    pub fn all_birthdays(&self) -> BTreeMap<u64, BirthdayDate> {
        self.state().records.clone()
    }

    pub fn settings_snapshot(&self) -> AnnouncementSettings {
        self.state().settings.clone()
    }

    /// Parses and stores a new announcement time. Returns the parsed
    /// hour and minute for the confirmation reply.
    pub fn set_time(&self, input: &str) -> Result<(u32, u32)> {
        let (hour, minute) = parse_announcement_time(input)?;
        let mut state = self.state();
        state.settings.hour = hour;
        state.settings.minute = minute;
        self.persist_settings(&state.settings)?;
        Ok((hour, minute))
    }

    pub fn set_channel(&self, channel_id: u64) -> Result<()> {
        let mut state = self.state();
        state.settings.channel_id = Some(channel_id);
        self.persist_settings(&state.settings)
    }

    /// Validates and stores a timezone name. A name chrono-tz does not
    /// know leaves the previous zone in place.
    pub fn set_timezone(&self, input: &str) -> Result<Tz> {
        let timezone: Tz = input
            .trim()
            .parse()
            .map_err(|_| BirthdayError::UnknownTimezone(input.trim().to_string()))?;
        let mut state = self.state();
        state.settings.timezone = timezone;
        self.persist_settings(&state.settings)?;
        Ok(timezone)
    }

    // A poisoned lock still holds consistent data: mutations complete
    // before persistence runs, so the inner state is safe to reuse.
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist_records(&self, records: &BTreeMap<u64, BirthdayDate>) -> Result<()> {
        let wire: BTreeMap<String, String> = records
            .iter()
            .map(|(id, date)| (id.to_string(), date.to_wire()))
            .collect();
        write_pretty(&self.data_dir.join(BIRTHDAYS_FILE), &wire)
    }

    fn persist_settings(&self, settings: &AnnouncementSettings) -> Result<()> {
        let file = SettingsFile {
            time: settings.time_display(),
            channel: settings.channel_id.map(|id| id.to_string()),
            timezone: settings.timezone.name().to_string(),
        };
        write_pretty(&self.data_dir.join(SETTINGS_FILE), &file)
    }
}

/// Parses `10:30am`, `22:45`, `7 pm` into 24-hour `(hour, minute)`.
pub fn parse_announcement_time(input: &str) -> Result<(u32, u32)> {
    let trimmed = input.trim();
    let invalid = || BirthdayError::InvalidTime(trimmed.to_string());

    let pattern =
        Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?\s*(am|pm)?$").map_err(|_| invalid())?;
    let captures = pattern.captures(trimmed).ok_or_else(invalid)?;

    let mut hour: u32 = captures
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(invalid)?;
    let minute: u32 = match captures.get(2) {
        Some(m) => m.as_str().parse().map_err(|_| invalid())?,
        None => 0,
    };

    if let Some(meridiem) = captures.get(3) {
        let meridiem = meridiem.as_str().to_ascii_lowercase();
        if meridiem == "pm" && hour < 12 {
            hour += 12;
        } else if meridiem == "am" && hour == 12 {
            hour = 0;
        }
    }

    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

fn records_from_wire(raw: BTreeMap<String, String>) -> BTreeMap<u64, BirthdayDate> {
    let mut records = BTreeMap::new();
    for (key, value) in raw {
        let subject_id: u64 = match key.parse() {
            Ok(id) => id,
            Err(_) => {
                warn!("skipping birthday entry with bad subject id {key:?}");
                continue;
            }
        };
        match BirthdayDate::from_wire(&value) {
            Ok(date) => {
                records.insert(subject_id, date);
            }
            Err(err) => warn!("skipping birthday entry for {subject_id}: {err}"),
        }
    }
    records
}

fn settings_from_file(file: SettingsFile) -> AnnouncementSettings {
    let mut settings = AnnouncementSettings::default();

    match parse_announcement_time(&file.time) {
        Ok((hour, minute)) => {
            settings.hour = hour;
            settings.minute = minute;
        }
        Err(_) => warn!(
            "unreadable announcement time {:?}, using {}",
            file.time,
            settings.time_display()
        ),
    }

    if let Some(raw) = file.channel {
        match raw.parse() {
            Ok(id) => settings.channel_id = Some(id),
            Err(_) => warn!("unreadable announcement channel {raw:?}, leaving unset"),
        }
    }

    match file.timezone.parse() {
        Ok(timezone) => settings.timezone = timezone,
        Err(_) => warn!("unreadable timezone {:?}, using UTC", file.timezone),
    }

    settings
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
