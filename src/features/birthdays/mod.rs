//! # Birthdays Feature
//!
//! Saved birthdays, join anniversaries, and the scheduled announcements
//! built from them.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod announcer;
pub mod date;
pub mod error;
pub mod matcher;
pub mod recurrence;
pub mod scheduler;
pub mod store;
pub mod timer;

pub use announcer::{
    BirthdayAnnouncer, DiscordDirectory, DiscordNotifier, MemberDirectory, MemberRecord, Notifier,
};
pub use date::BirthdayDate;
pub use error::{BirthdayError, Result};
pub use scheduler::{BirthdayScheduler, FireHandler, TaskKind, TaskOverview, TaskState};
pub use store::{AnnouncementSettings, BirthdayStore};
pub use timer::{TimerArmer, TimerHandle};
