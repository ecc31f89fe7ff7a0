//! Utility slash commands: /birthday_help

use serenity::builder::CreateApplicationCommand;

/// Creates utility commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![create_birthday_help_command()]
}

/// Creates the birthday_help command - command overview
fn create_birthday_help_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("birthday_help")
        .description("Show what the birthday bot can do")
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_utility_commands() {
        let commands = create_commands();
        assert_eq!(commands.len(), 1);

        let name = commands[0].0.get("name").unwrap().as_str().unwrap();
        assert_eq!(name, "birthday_help");
    }
}
