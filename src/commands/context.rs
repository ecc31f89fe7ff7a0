//! Shared context for command handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation with store and scheduler

use crate::features::birthdays::{BirthdayScheduler, BirthdayStore};
use std::sync::Arc;

/// Shared context for all command handlers
///
/// Contains the core services needed by command handlers:
/// - BirthdayStore for birthday records and announcement settings
/// - BirthdayScheduler for rearming after settings change and forced runs
#[derive(Clone)]
pub struct CommandContext {
    pub store: Arc<BirthdayStore>,
    pub scheduler: BirthdayScheduler,
}

impl CommandContext {
    /// Create a new CommandContext with the given services
    pub fn new(store: Arc<BirthdayStore>, scheduler: BirthdayScheduler) -> Self {
        Self { store, scheduler }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_context_clone() {
        // CommandContext should be Clone for sharing across handlers
        fn assert_clone<T: Clone>() {}
        assert_clone::<CommandContext>();
    }
}
