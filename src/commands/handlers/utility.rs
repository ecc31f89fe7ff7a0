//! Utility command handlers
//!
//! Handles: birthday_help
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::handlers::respond;

const HELP_TEXT: &str = "🎉 **Birthday Bot Commands**
for setting and managing birthdays on this server

👤 **user commands**:
`/birthday <date>` — save your birthday (formats like sept 6, 1987, 09/06/77, or 2000-01-01)
`/mybirthday` — view your saved birthday
`/deletebirthday` — remove your saved birthday
`/birthdays` — list all saved birthdays
`/nextbirthday` — see whose birthday is next
`/anniversary` — show your server join anniversary
`/server_anniversary` — show the server’s creation date and age

⚙️ **admin commands**:
`/birthday_config time <10:45am>` — set daily announcement time
`/birthday_config channel <#channel>` — set announcement channel
`/birthday_config timezone <Region/City>` — set timezone
`/birthday_config show` — show settings and the next scheduled runs
`/birthday_force day|week|month` — run today, weekly, or monthly birthday preview

🕐 bot automatically posts:
– daily birthdays at configured time
– weekly preview every monday
– monthly preview on the 1st";

/// Handler for the help command
pub struct UtilityHandler;

#[async_trait]
impl SlashCommandHandler for UtilityHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["birthday_help"]
    }

    async fn handle(
        &self,
        _ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match command.data.name.as_str() {
            "birthday_help" => respond(serenity_ctx, command, HELP_TEXT).await,
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::response::MESSAGE_LIMIT;

    #[test]
    fn test_help_text_fits_one_message() {
        assert!(HELP_TEXT.len() <= MESSAGE_LIMIT);
    }

    #[test]
    fn test_help_text_covers_every_command() {
        for name in [
            "/birthday ",
            "/mybirthday",
            "/deletebirthday",
            "/birthdays",
            "/nextbirthday",
            "/anniversary",
            "/server_anniversary",
            "/birthday_config",
            "/birthday_force",
        ] {
            assert!(HELP_TEXT.contains(name), "help text missing {name}");
        }
    }
}
