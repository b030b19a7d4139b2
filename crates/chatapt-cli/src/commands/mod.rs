//! Slash commands for interactive mode

mod template;

pub use template::{TemplateCommand, list_templates};

use chatapt_core::MessageId;

/// Result of executing a slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Delete every persisted message
    Clear,
    /// Delete one persisted message
    Delete(MessageId),
    /// Show the template list
    ShowTemplates,
    /// Send this template
    SendTemplate(String),
    /// Show a message to the user (not sent to the model)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command; `None` if `input` is not a command
pub fn execute_command(input: &str, templates: &[String]) -> Option<CommandResult> {
    let rest = input.trim().strip_prefix('/')?;

    let (command, args) = rest.split_once(' ').unwrap_or((rest, ""));
    let command = command.to_lowercase();
    let args = args.trim();

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "delete" | "d" => match args.parse::<MessageId>() {
            Ok(id) => CommandResult::Delete(id),
            Err(_) => CommandResult::Message("Usage: /delete <id>".to_string()),
        },

        "templates" => CommandResult::ShowTemplates,

        "template" | "t" => TemplateCommand::execute(args, templates),

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?          Show this help message
  /templates             List the prompt templates
  /template, /t <n>      Send template number n
  /delete, /d <id>       Delete the message with this id
  /clear, /c             Delete all saved messages
  /quit, /exit, /q       Exit chatapt

/clear removes the saved transcript only; the model keeps
the recent context until you restart."#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> Vec<String> {
        vec!["Halo".into(), "Apa kabar?".into()]
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(execute_command("Halo", &templates()), None);
    }

    #[test]
    fn test_basic_commands() {
        let t = templates();
        assert_eq!(execute_command("/clear", &t), Some(CommandResult::Clear));
        assert_eq!(execute_command(" /Q ", &t), Some(CommandResult::Exit));
        assert_eq!(
            execute_command("/templates", &t),
            Some(CommandResult::ShowTemplates)
        );
        assert!(matches!(
            execute_command("/help", &t),
            Some(CommandResult::Message(_))
        ));
    }

    #[test]
    fn test_delete_parses_id() {
        let t = templates();
        assert_eq!(
            execute_command("/delete 12", &t),
            Some(CommandResult::Delete(12))
        );
        assert_eq!(
            execute_command("/delete twelve", &t),
            Some(CommandResult::Message("Usage: /delete <id>".into()))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            execute_command("/model gemini", &templates()),
            Some(CommandResult::Unknown("model".into()))
        );
    }
}
