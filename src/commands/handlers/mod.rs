//! Per-command handler implementations
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.0.0: Birthday, anniversary, admin, and utility handlers

pub mod admin;
pub mod anniversary;
pub mod birthday;
pub mod utility;

use std::sync::Arc;

use anyhow::Result;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;

use super::handler::SlashCommandHandler;

/// Create all registered command handlers
///
/// Returns a vector of handlers ready to be registered with CommandRegistry.
pub fn create_all_handlers() -> Vec<Arc<dyn SlashCommandHandler>> {
    vec![
        Arc::new(birthday::BirthdayHandler),
        Arc::new(anniversary::AnniversaryHandler),
        Arc::new(admin::AdminHandler),
        Arc::new(utility::UtilityHandler),
    ]
}

/// Reply to an interaction with plain message content
pub async fn respond(
    serenity_ctx: &Context,
    command: &ApplicationCommandInteraction,
    content: &str,
) -> Result<()> {
    command
        .create_interaction_response(&serenity_ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content))
        })
        .await?;
    Ok(())
}

/// Reply without pinging anyone the content mentions
pub async fn respond_silent(
    serenity_ctx: &Context,
    command: &ApplicationCommandInteraction,
    content: &str,
) -> Result<()> {
    command
        .create_interaction_response(&serenity_ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| {
                    message
                        .content(content)
                        .allowed_mentions(|mentions| mentions.empty_parse())
                })
        })
        .await?;
    Ok(())
}
