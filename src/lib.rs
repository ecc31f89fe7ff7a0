// Core layer - shared types and configuration
pub mod core;

// Features layer - all feature modules
pub mod features;

// Application layer
pub mod commands;

// Re-export core config
pub use self::core::Config;

// Re-export feature items
pub use features::{
    // Birthdays
    AnnouncementSettings, BirthdayAnnouncer, BirthdayDate, BirthdayScheduler, BirthdayStore,
    DiscordDirectory, DiscordNotifier, TaskKind,
    // Rate limiting
    RateLimiter,
    // Reactions
    react_if_celebration,
};
