//! Birthday slash commands: /birthday, /mybirthday, /deletebirthday, /birthdays, /nextbirthday

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

/// Creates birthday CRUD commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_birthday_command(),
        create_mybirthday_command(),
        create_deletebirthday_command(),
        create_birthdays_command(),
        create_nextbirthday_command(),
    ]
}

/// Creates the birthday command - save your birthday
fn create_birthday_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("birthday")
        .description("Save your birthday")
        .create_option(|option| {
            option
                .name("date")
                .description("Your birthday, e.g. 1990-09-06, 9/6/1990, or sept 6th 1990")
                .kind(CommandOptionType::String)
                .required(true)
                .min_length(3)
                .max_length(40)
        })
        .to_owned()
}

/// Creates the mybirthday command - show your saved birthday
fn create_mybirthday_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("mybirthday")
        .description("Show the birthday you have saved")
        .to_owned()
}

/// Creates the deletebirthday command - remove your saved birthday
fn create_deletebirthday_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("deletebirthday")
        .description("Remove your saved birthday")
        .to_owned()
}

/// Creates the birthdays command - list all saved birthdays
fn create_birthdays_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("birthdays")
        .description("List all saved birthdays")
        .to_owned()
}

/// Creates the nextbirthday command - show the next upcoming birthday
fn create_nextbirthday_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("nextbirthday")
        .description("Show whose birthday comes up next")
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_birthday_commands() {
        let commands = create_commands();
        assert_eq!(commands.len(), 5);

        let names: Vec<&str> = commands
            .iter()
            .map(|cmd| cmd.0.get("name").unwrap().as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "birthday",
                "mybirthday",
                "deletebirthday",
                "birthdays",
                "nextbirthday"
            ]
        );
    }

    #[test]
    fn test_birthday_command_requires_date() {
        let command = create_birthday_command();
        let options = command.0.get("options").unwrap().as_array().unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].get("name").unwrap().as_str().unwrap(), "date");
        assert!(options[0].get("required").unwrap().as_bool().unwrap());
    }
}
