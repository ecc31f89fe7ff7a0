//! Anniversary command handlers
//!
//! Handles: anniversary, server_anniversary
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::handlers::respond;
use crate::features::birthdays::date::month_name;

/// Handler for join and server anniversary commands
pub struct AnniversaryHandler;

#[async_trait]
impl SlashCommandHandler for AnniversaryHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["anniversary", "server_anniversary"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match command.data.name.as_str() {
            "anniversary" => self.handle_member(&ctx, serenity_ctx, command).await,
            "server_anniversary" => self.handle_server(&ctx, serenity_ctx, command).await,
            _ => Ok(()),
        }
    }
}

impl AnniversaryHandler {
    /// Handle /anniversary command
    async fn handle_member(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let guild_id = match command.guild_id {
            Some(id) => id,
            None => return respond(serenity_ctx, command, "can’t get guild info.").await,
        };

        let member = match serenity_ctx
            .http
            .get_member(guild_id.0, command.user.id.0)
            .await
        {
            Ok(member) => member,
            Err(_) => {
                return respond(serenity_ctx, command, "could not find you in the server.").await
            }
        };

        let timezone = ctx.store.settings_snapshot().timezone;
        let joined = member
            .joined_at
            .and_then(|at| DateTime::from_timestamp(at.unix_timestamp(), 0))
            .map(|at| at.with_timezone(&timezone));
        let joined = match joined {
            Some(at) => at,
            None => {
                return respond(serenity_ctx, command, "could not find you in the server.").await
            }
        };

        let years = Utc::now().with_timezone(&timezone).year() - joined.year();
        let content = format!(
            "👋 you joined this server on {} ({years} years ago)",
            long_date(joined.date_naive())
        );
        respond(serenity_ctx, command, &content).await
    }

    /// Handle /server_anniversary command
    async fn handle_server(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let guild_id = match command.guild_id {
            Some(id) => id,
            None => return respond(serenity_ctx, command, "can’t get guild info.").await,
        };

        let timezone = ctx.store.settings_snapshot().timezone;
        // Guild ids are snowflakes, so the creation instant comes for free.
        let created = DateTime::from_timestamp(guild_id.created_at().unix_timestamp(), 0)
            .map(|at| at.with_timezone(&timezone));
        let created = match created {
            Some(at) => at,
            None => return respond(serenity_ctx, command, "can’t get guild info.").await,
        };

        let years = Utc::now().with_timezone(&timezone).year() - created.year();
        let content = format!(
            "🎂 this server was created on {} ({years} years ago)",
            long_date(created.date_naive())
        );
        respond(serenity_ctx, command, &content).await
    }
}

/// `September 6, 2021` style.
fn long_date(date: NaiveDate) -> String {
    format!(
        "{} {}, {}",
        month_name(date.month()),
        date.day(),
        date.year()
    )
}
