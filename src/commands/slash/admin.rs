//! Admin slash commands: /birthday_config, /birthday_force

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::permissions::Permissions;

/// Creates admin commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_birthday_config_command(),
        create_birthday_force_command(),
    ]
}

/// Creates the birthday_config command (admin) - announcement settings
fn create_birthday_config_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("birthday_config")
        .description("Configure birthday announcements (Admin)")
        .default_member_permissions(Permissions::MANAGE_GUILD)
        .create_option(|option| {
            option
                .name("setting")
                .description("The setting to change")
                .kind(CommandOptionType::String)
                .required(true)
                .add_string_choice("time - when announcements run", "time")
                .add_string_choice("channel - where announcements post", "channel")
                .add_string_choice("timezone - IANA zone for scheduling", "timezone")
                .add_string_choice("show - current configuration", "show")
        })
        .create_option(|option| {
            option
                .name("value")
                .description("The value to set (time like `10:30am`, or a timezone)")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("channel")
                .description("Target channel for the channel setting")
                .kind(CommandOptionType::Channel)
                .required(false)
        })
        .to_owned()
}

/// Creates the birthday_force command (admin) - run an announcement now
fn create_birthday_force_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("birthday_force")
        .description("Run a birthday announcement immediately (Admin)")
        .default_member_permissions(Permissions::MANAGE_GUILD)
        .create_option(|option| {
            option
                .name("kind")
                .description("Which announcement to run")
                .kind(CommandOptionType::String)
                .required(true)
                .add_string_choice("day - today's birthdays", "day")
                .add_string_choice("week - upcoming week digest", "week")
                .add_string_choice("month - monthly digest", "month")
        })
        .to_owned()
}
