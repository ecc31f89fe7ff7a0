//! Command handler trait
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation for handler dispatch

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;

use super::context::CommandContext;

/// Trait for slash command handlers
///
/// Each handler owns one or more related commands and receives the
/// shared [`CommandContext`] plus the serenity context for the
/// interaction.
///
/// # Example
///
/// ```ignore
/// pub struct BirthdayHandler;
///
/// #[async_trait]
/// impl SlashCommandHandler for BirthdayHandler {
///     fn command_names(&self) -> &'static [&'static str] {
///         &["birthday", "mybirthday"]
///     }
///
///     async fn handle(
///         &self,
///         ctx: Arc<CommandContext>,
///         serenity_ctx: &Context,
///         command: &ApplicationCommandInteraction,
///     ) -> Result<()> {
///         // Match on command.data.name and respond
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait SlashCommandHandler: Send + Sync {
    /// The command names this handler responds to
    fn command_names(&self) -> &'static [&'static str];

    /// Handle an invocation of one of this handler's commands
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that the trait stays object safe; handlers are
    // stored as Arc<dyn SlashCommandHandler> in the registry.
    fn _assert_object_safe(_: &dyn SlashCommandHandler) {}

    #[test]
    fn test_trait_is_object_safe() {
        // The function above fails to compile if object safety breaks.
    }
}
