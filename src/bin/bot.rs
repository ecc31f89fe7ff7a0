use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::{Interaction, InteractionResponseType};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::Guild;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;

use jubilee::commands::handlers::create_all_handlers;
use jubilee::commands::{
    register_global_commands, register_guild_commands, CommandContext, CommandRegistry,
};
use jubilee::core::Config;
use jubilee::features::birthdays::{
    BirthdayAnnouncer, BirthdayScheduler, BirthdayStore, DiscordDirectory, DiscordNotifier,
};
use jubilee::features::{react_if_celebration, RateLimiter};

struct Handler {
    registry: CommandRegistry,
    context: Arc<CommandContext>,
    directory: Arc<DiscordDirectory>,
    rate_limiter: RateLimiter,
    guild_id: Option<GuildId>,
}

impl Handler {
    fn new(
        registry: CommandRegistry,
        context: Arc<CommandContext>,
        directory: Arc<DiscordDirectory>,
        guild_id: Option<GuildId>,
    ) -> Self {
        Handler {
            registry,
            context,
            directory,
            rate_limiter: RateLimiter::default(),
            guild_id,
        }
    }

    /// Reply to an interaction whose handler failed. Tries the edit path
    /// first so deferred commands get their placeholder replaced.
    async fn send_error_reply(
        ctx: &Context,
        command: &ApplicationCommandInteraction,
        content: &str,
    ) {
        if command
            .edit_original_interaction_response(&ctx.http, |response| response.content(content))
            .await
            .is_err()
        {
            let _ = command
                .create_interaction_response(&ctx.http, |response| {
                    response
                        .kind(InteractionResponseType::ChannelMessageWithSource)
                        .interaction_response_data(|message| message.content(content))
                })
                .await;
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        react_if_celebration(&ctx, &msg).await;
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        // Announcements serve one guild: the configured one, or the
        // first the gateway shows us.
        let pinned = self
            .guild_id
            .map(|guild_id| guild_id.0)
            .or_else(|| ready.guilds.first().map(|guild| guild.id.0));
        match pinned {
            Some(guild_id) => {
                self.directory.pin_guild(guild_id);
                info!("📌 Serving guild {guild_id}");
            }
            None => warn!("No guild visible yet; announcements wait for one"),
        }

        // Register slash commands - use guild commands for development (instant), global for production
        if let Some(guild_id) = self.guild_id {
            info!("🔧 Development mode: Registering commands for guild {guild_id}");
            if let Err(e) = register_guild_commands(&ctx, guild_id).await {
                error!("❌ Failed to register guild slash commands: {e}");
            } else {
                info!("✅ Successfully registered slash commands for guild {guild_id} (instant update)");
            }
        } else {
            info!("🌍 Production mode: Registering commands globally");
            if let Err(e) = register_global_commands(&ctx).await {
                error!("❌ Failed to register global slash commands: {e}");
            } else {
                info!("✅ Successfully registered slash commands globally (may take up to 1 hour to propagate)");
            }
        }

        self.context.scheduler.start().await;
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: bool) {
        if self.directory.guild().is_none() {
            self.directory.pin_guild(guild.id.0);
            info!("📌 Serving guild {} ({})", guild.id, guild.name);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                if !self.rate_limiter.check(command.user.id.0) {
                    let _ = command
                        .create_interaction_response(&ctx.http, |response| {
                            response
                                .kind(InteractionResponseType::ChannelMessageWithSource)
                                .interaction_response_data(|message| {
                                    message.content(
                                        "you’re sending commands too quickly. give it a moment.",
                                    )
                                })
                        })
                        .await;
                    return;
                }

                let handler = match self.registry.get(&command.data.name) {
                    Some(handler) => handler,
                    None => {
                        warn!("No handler registered for command '{}'", command.data.name);
                        return;
                    }
                };

                if let Err(e) = handler.handle(self.context.clone(), &ctx, &command).await {
                    error!(
                        "Error handling slash command '{}': {}",
                        command.data.name, e
                    );
                    Self::send_error_reply(
                        &ctx,
                        &command,
                        "sorry, something went wrong running that command. please try again.",
                    )
                    .await;
                }
            }
            Interaction::Ping(_) => {
                info!("Ping interaction received - Discord health check");
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Jubilee birthday bot...");

    // REST handle for announcement delivery, shared with the gateway-free
    // scheduler path.
    let http = Arc::new(Http::new(&config.discord_token));

    let store = Arc::new(BirthdayStore::load(&config.data_dir)?);
    let directory = Arc::new(DiscordDirectory::new(http.clone()));
    let notifier = Arc::new(DiscordNotifier::new(http));
    let announcer = Arc::new(BirthdayAnnouncer::new(
        store.clone(),
        notifier,
        directory.clone(),
    ));
    let scheduler = BirthdayScheduler::new(store.clone(), announcer);
    let context = Arc::new(CommandContext::new(store, scheduler));

    let mut registry = CommandRegistry::new();
    for handler in create_all_handlers() {
        registry.register(handler);
    }
    info!("Registered {} command names", registry.len());

    let guild_id = config.guild_id.map(GuildId);
    let handler = Handler::new(registry, context, directory, guild_id);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::MESSAGE_CONTENT;

    // Build the Discord client with proper gateway configuration
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            error!("This could indicate:");
            error!("  - Invalid bot token format");
            error!("  - Network issues reaching Discord API");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        error!("This could be due to:");
        error!("  - Invalid bot token");
        error!("  - Network connectivity issues");
        error!("  - Missing required permissions");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
