//! /template command - pick a prompt template by number

use super::CommandResult;

pub struct TemplateCommand;

impl TemplateCommand {
    /// `args` is the 1-based template number
    pub fn execute(args: &str, templates: &[String]) -> CommandResult {
        if templates.is_empty() {
            return CommandResult::Message("No templates configured".to_string());
        }
        if args.is_empty() {
            return CommandResult::Message(list_templates(templates));
        }

        match args.parse::<usize>() {
            Ok(n) if (1..=templates.len()).contains(&n) => {
                CommandResult::SendTemplate(templates[n - 1].clone())
            }
            _ => CommandResult::Message(format!(
                "No template '{}'. Choose 1-{}.",
                args,
                templates.len()
            )),
        }
    }
}

/// Numbered template list
pub fn list_templates(templates: &[String]) -> String {
    if templates.is_empty() {
        return "No templates configured".to_string();
    }

    let mut output = String::from("Templates:\n");
    for (i, template) in templates.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, template));
    }
    output.push_str("Send one with /template <n>");
    output
}
