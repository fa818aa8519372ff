use crate::render::DisplayDocument;

use super::BotIdentity;

pub const REFLECT_HELP: &str =
    "Uses reflection to return the documentation of a given class, method or property.";

/// A command the bot answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHelp {
    pub name: &'static str,
    pub help: &'static str,
}

pub const COMMANDS: &[CommandHelp] = &[CommandHelp {
    name: "reflect",
    help: REFLECT_HELP,
}];

/// One field per command, labeled the way users invoke it.
#[must_use]
pub fn help_document(title: &str, identity: &BotIdentity) -> DisplayDocument {
    let mut document = DisplayDocument::new(title, "");
    for command in COMMANDS {
        document.push_field(format!("@{} {}", identity.username, command.name), command.help);
    }
    document
}
