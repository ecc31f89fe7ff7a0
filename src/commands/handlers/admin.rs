//! Admin command handlers
//!
//! Handles: birthday_config, birthday_force
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.1.0: Timers re-arm on any settings write that reached memory
//! - 1.0.0: Initial implementation

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;
use std::sync::Arc;
use uuid::Uuid;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::handlers::respond;
use crate::commands::slash::{get_channel_option, get_string_option};
use crate::features::birthdays::{BirthdayError, TaskKind};

const TIME_FORMAT_HINT: &str = "please provide time like `10:30am`, `22:45`, or `7 pm`";
const TIMEZONE_HINT: &str = "invalid timezone. try something like `America/Chicago` or `UTC`";

/// Handler for announcement configuration commands
pub struct AdminHandler;

#[async_trait]
impl SlashCommandHandler for AdminHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["birthday_config", "birthday_force"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let request_id = Uuid::new_v4();
        match command.data.name.as_str() {
            "birthday_config" => {
                self.handle_config(&ctx, serenity_ctx, command, request_id).await
            }
            "birthday_force" => self.handle_force(&ctx, serenity_ctx, command, request_id).await,
            _ => Ok(()),
        }
    }
}

impl AdminHandler {
    /// Require the Manage Server permission, replying when it is absent
    async fn require_admin(
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<bool> {
        let authorized = command
            .member
            .as_ref()
            .and_then(|member| member.permissions)
            .map_or(false, |permissions| permissions.manage_guild());
        if !authorized {
            respond(
                serenity_ctx,
                command,
                "you need the Manage Server permission to do that.",
            )
            .await?;
        }
        Ok(authorized)
    }

    /// Handle /birthday_config command
    async fn handle_config(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        request_id: Uuid,
    ) -> Result<()> {
        if !Self::require_admin(serenity_ctx, command).await? {
            return Ok(());
        }

        let setting = get_string_option(&command.data.options, "setting")
            .ok_or_else(|| anyhow::anyhow!("Missing setting parameter"))?;
        let value = get_string_option(&command.data.options, "value");

        let response_message = match setting.as_str() {
            "time" => match value {
                None => TIME_FORMAT_HINT.to_string(),
                Some(raw) => match reconfigure_after(ctx, ctx.store.set_time(&raw)).await {
                    Ok((hour, minute)) => {
                        info!("[{request_id}] Announcement time set to {hour:02}:{minute:02}");
                        format!("birthday announcements will now run at {hour:02}:{minute:02}")
                    }
                    Err(err) if err.is_validation() => TIME_FORMAT_HINT.to_string(),
                    Err(err) => return Err(err.into()),
                },
            },
            "channel" => match get_channel_option(&command.data.options, "channel") {
                None => "please tag a channel like `#birthdays`".to_string(),
                Some(channel_id) => {
                    reconfigure_after(ctx, ctx.store.set_channel(channel_id)).await?;
                    info!("[{request_id}] Announcement channel set to {channel_id}");
                    format!("birthday announcements will now post in <#{channel_id}>")
                }
            },
            "timezone" => match value {
                None => TIMEZONE_HINT.to_string(),
                Some(raw) => match reconfigure_after(ctx, ctx.store.set_timezone(&raw)).await {
                    Ok(timezone) => {
                        info!("[{request_id}] Timezone set to {timezone}");
                        format!("timezone set to {timezone}")
                    }
                    Err(err) if err.is_validation() => TIMEZONE_HINT.to_string(),
                    Err(err) => return Err(err.into()),
                },
            },
            "show" => {
                let settings = ctx.store.settings_snapshot();
                let channel_line = match settings.channel_id {
                    Some(id) => format!("<#{id}>"),
                    None => "not set".to_string(),
                };
                let mut lines = vec![
                    "🎂 birthday announcement settings".to_string(),
                    format!("time: {}", settings.time_display()),
                    format!("channel: {channel_line}"),
                    format!("timezone: {}", settings.timezone),
                ];
                for task in ctx.scheduler.overview().await {
                    let schedule = match task.next_fire {
                        Some(at) => format!("next {}", at.format("%Y-%m-%d %H:%M UTC")),
                        None => "nothing scheduled".to_string(),
                    };
                    lines.push(format!("{}: {}, {schedule}", task.kind, task.state));
                }
                lines.join("\n")
            }
            _ => format!("Unknown setting: {setting}"),
        };

        respond(serenity_ctx, command, &response_message).await
    }

    /// Handle /birthday_force command
    async fn handle_force(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        request_id: Uuid,
    ) -> Result<()> {
        if !Self::require_admin(serenity_ctx, command).await? {
            return Ok(());
        }

        let raw = get_string_option(&command.data.options, "kind")
            .ok_or_else(|| anyhow::anyhow!("Missing kind parameter"))?;
        let kind: TaskKind = match raw.parse() {
            Ok(kind) => kind,
            Err(_) => {
                return respond(serenity_ctx, command, "pick one of `day`, `week`, or `month`.")
                    .await
            }
        };

        // Announcements can outlast the 3 second interaction deadline,
        // so defer and edit in the outcome.
        command
            .create_interaction_response(&serenity_ctx.http, |response| {
                response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
            })
            .await?;

        info!("[{request_id}] Forced {kind} announcement");
        let content = match ctx.scheduler.force_fire(kind).await {
            Ok(()) => format!("ran the {kind} announcement."),
            Err(err) => {
                error!("[{request_id}] Forced {kind} announcement failed: {err}");
                format!("couldn’t run the {kind} announcement: {err}")
            }
        };
        command
            .edit_original_interaction_response(&serenity_ctx.http, |response| {
                response.content(content)
            })
            .await?;
        Ok(())
    }
}

/// Re-arms the scheduler after a settings write that committed in
/// memory. A failed disk write still commits, so only a validation
/// failure skips the rearm.
async fn reconfigure_after<T>(
    ctx: &CommandContext,
    outcome: Result<T, BirthdayError>,
) -> Result<T, BirthdayError> {
    let committed = match &outcome {
        Ok(_) => true,
        Err(err) => !err.is_validation(),
    };
    if committed {
        ctx.scheduler.reconfigure().await;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use std::fs;

    use crate::features::birthdays::store::SETTINGS_FILE;
    use crate::features::birthdays::{
        AnnouncementSettings, BirthdayScheduler, BirthdayStore, FireHandler, TaskState,
    };

    struct QuietHandler;

    #[async_trait]
    impl FireHandler for QuietHandler {
        async fn on_fire(
            &self,
            _kind: TaskKind,
            _settings: AnnouncementSettings,
        ) -> Result<(), BirthdayError> {
            Ok(())
        }
    }

    fn context_in(dir: &tempfile::TempDir) -> CommandContext {
        let store = Arc::new(BirthdayStore::load(dir.path()).unwrap());
        let scheduler = BirthdayScheduler::new(Arc::clone(&store), Arc::new(QuietHandler));
        CommandContext::new(store, scheduler)
    }

    #[tokio::test]
    async fn test_validation_failure_leaves_timers_alone() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(&dir);

        let err = reconfigure_after(&ctx, ctx.store.set_time("half past nine"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        for task in ctx.scheduler.overview().await {
            assert_eq!(task.state, TaskState::Unarmed);
        }
    }

    #[tokio::test]
    async fn test_failed_settings_write_still_rearms_timers() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(&dir);
        // A directory squatting on the settings path makes every write
        // fail while the new value stays live in memory.
        fs::create_dir(dir.path().join(SETTINGS_FILE)).unwrap();

        let err = reconfigure_after(&ctx, ctx.store.set_time("21:00"))
            .await
            .unwrap_err();
        assert!(!err.is_validation());

        let overview = ctx.scheduler.overview().await;
        assert!(overview.iter().all(|task| task.state == TaskState::Armed));
        let daily = overview[0].next_fire.expect("daily task is armed");
        assert_eq!((daily.hour(), daily.minute()), (21, 0));
    }
}
