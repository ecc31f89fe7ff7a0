//! Anniversary slash commands: /anniversary, /server_anniversary

use serenity::builder::CreateApplicationCommand;

/// Creates anniversary commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_anniversary_command(),
        create_server_anniversary_command(),
    ]
}

/// Creates the anniversary command - show your server join anniversary
fn create_anniversary_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("anniversary")
        .description("Show when you joined this server")
        .to_owned()
}

/// Creates the server_anniversary command - show the server's creation anniversary
fn create_server_anniversary_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("server_anniversary")
        .description("Show when this server was created")
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_anniversary_commands() {
        let commands = create_commands();
        assert_eq!(commands.len(), 2);

        let names: Vec<&str> = commands
            .iter()
            .map(|cmd| cmd.0.get("name").unwrap().as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["anniversary", "server_anniversary"]);
    }
}
