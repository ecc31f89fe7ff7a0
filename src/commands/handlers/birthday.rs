//! Birthday CRUD command handlers
//!
//! Handles: birthday, mybirthday, deletebirthday, birthdays, nextbirthday
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;
use uuid::Uuid;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::handlers::{respond, respond_silent};
use crate::commands::slash::get_string_option;
use crate::core::response::{paginate_lines, LIST_PAGE_LIMIT};
use crate::features::birthdays::{matcher, BirthdayDate};

const DATE_FORMAT_HINT: &str =
    "please use a format like `YYYY-MM-DD`, `MM/DD/YYYY`, `sept 6th 1987`, or `9-6-77`";

/// Handler for birthday record commands
pub struct BirthdayHandler;

#[async_trait]
impl SlashCommandHandler for BirthdayHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &[
            "birthday",
            "mybirthday",
            "deletebirthday",
            "birthdays",
            "nextbirthday",
        ]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let request_id = Uuid::new_v4();
        match command.data.name.as_str() {
            "birthday" => self.handle_set(&ctx, serenity_ctx, command, request_id).await,
            "mybirthday" => self.handle_show(&ctx, serenity_ctx, command).await,
            "deletebirthday" => {
                self.handle_delete(&ctx, serenity_ctx, command, request_id).await
            }
            "birthdays" => self.handle_list(&ctx, serenity_ctx, command).await,
            "nextbirthday" => self.handle_next(&ctx, serenity_ctx, command).await,
            _ => Ok(()),
        }
    }
}

impl BirthdayHandler {
    /// Handle /birthday command
    async fn handle_set(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        request_id: Uuid,
    ) -> Result<()> {
        let input = get_string_option(&command.data.options, "date")
            .ok_or_else(|| anyhow::anyhow!("Missing date parameter"))?;

        let date = match BirthdayDate::parse(&input) {
            Ok(date) => date,
            Err(err) => {
                info!("[{request_id}] Rejected birthday input {input:?}: {err}");
                return respond(serenity_ctx, command, DATE_FORMAT_HINT).await;
            }
        };

        let wire = date.to_wire();
        ctx.store.set_birthday(command.user.id.0, date)?;
        info!("[{request_id}] Saved birthday {wire} for user {}", command.user.id);

        respond(
            serenity_ctx,
            command,
            &format!("got it! your birthday is set to {wire}"),
        )
        .await
    }

    /// Handle /mybirthday command
    async fn handle_show(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let content = match ctx.store.birthday_of(command.user.id.0) {
            Some(date) => format!("your birthday is saved as {}", date.to_wire()),
            None => {
                "i don’t have your birthday yet. try `/birthday September 6, 1977`".to_string()
            }
        };
        respond(serenity_ctx, command, &content).await
    }

    /// Handle /deletebirthday command
    async fn handle_delete(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        request_id: Uuid,
    ) -> Result<()> {
        let content = if ctx.store.remove_birthday(command.user.id.0)? {
            info!("[{request_id}] Removed birthday for user {}", command.user.id);
            "your birthday has been removed."
        } else {
            "you don’t have a birthday saved."
        };
        respond(serenity_ctx, command, content).await
    }

    /// Handle /birthdays command
    async fn handle_list(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let records = ctx.store.all_birthdays();
        if records.is_empty() {
            return respond(serenity_ctx, command, "no birthdays saved yet.").await;
        }

        let lines: Vec<String> = records
            .iter()
            .map(|(subject_id, date)| format!("<@{subject_id}> — {}", date.to_wire()))
            .collect();

        let mut pages = paginate_lines("🎂 saved birthdays:", &lines, LIST_PAGE_LIMIT).into_iter();
        if let Some(first) = pages.next() {
            respond_silent(serenity_ctx, command, &first).await?;
        }
        for page in pages {
            command
                .create_followup_message(&serenity_ctx.http, |message| {
                    message
                        .content(&page)
                        .allowed_mentions(|mentions| mentions.empty_parse())
                })
                .await?;
        }
        Ok(())
    }

    /// Handle /nextbirthday command
    async fn handle_next(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let records = ctx.store.all_birthdays();
        let timezone = ctx.store.settings_snapshot().timezone;
        let today = Utc::now().with_timezone(&timezone).date_naive();

        let content = match matcher::next_occurrence(&records, today) {
            Some((subject_id, occurrence)) => format!(
                "the next birthday is <@{subject_id}> on {}",
                occurrence.format("%Y-%m-%d")
            ),
            None => "no birthdays saved yet.".to_string(),
        };
        respond_silent(serenity_ctx, command, &content).await
    }
}
