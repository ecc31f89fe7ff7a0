//! # Feature Modules
//!
//! Each feature lives in its own module with its own version and
//! changelog. Everything a feature exposes to the rest of the bot is
//! re-exported here.

pub mod birthdays;
pub mod rate_limiting;
pub mod reactions;

// Birthdays
pub use birthdays::{
    AnnouncementSettings, BirthdayAnnouncer, BirthdayDate, BirthdayScheduler, BirthdayStore,
    DiscordDirectory, DiscordNotifier, TaskKind,
};

// Rate limiting
pub use rate_limiting::RateLimiter;

// Reactions
pub use reactions::react_if_celebration;
