//! Special commands parser for interactive chat mode
//!
//! This module parses and handles special commands that can be entered during
//! interactive chat sessions. Special commands allow users to:
//! - Start a fresh chat
//! - List and resume saved chats
//! - View current session status
//! - Display help information
//! - Exit the session
//!
//! Commands are prefixed with `/` and are case-insensitive.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands modify the session state or provide information,
/// rather than being sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a fresh chat
    ///
    /// Allocates a new chat id. Nothing is saved until the first message
    /// is sent; an abandoned new chat leaves no trace.
    NewChat,

    /// List saved chats
    ///
    /// Shows every chat registered in the catalog with its id and title.
    ListChats,

    /// Resume a saved chat
    ///
    /// Loads the chat's transcript and history from storage and replays
    /// the transcript. Ids not present in the catalog are resumed with a
    /// warning.
    SwitchChat(String),

    /// Display current session status
    ///
    /// Shows the lifecycle phase, active chat, provider and model, and
    /// saved-chat count.
    ShowStatus,

    /// Display help information
    ///
    /// Shows all available special commands and their usage.
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command - regular chat input
    None,
}

/// Parse user input for special commands
///
/// # Arguments
///
/// * `input` - Raw line entered by the user
///
/// # Returns
///
/// The parsed command, [`SpecialCommand::None`] for ordinary messages, or
/// a [`CommandError`] for malformed slash commands.
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // If input doesn't start with "/", it's not a command (except exit/quit)
    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    match lower.as_str() {
        // Chat management
        "/new" => Ok(SpecialCommand::NewChat),
        "/chats" => Ok(SpecialCommand::ListChats),

        // Handle /switch with and without an argument; the id is taken from
        // the original input so its case survives
        "/switch" => Err(CommandError::MissingArgument {
            command: "/switch".to_string(),
            usage: "/switch <chat_id>".to_string(),
        }),
        input if input.starts_with("/switch ") => {
            let arg = trimmed["/switch ".len()..].trim();
            Ok(SpecialCommand::SwitchChat(arg.to_string()))
        }

        // Handle arguments given to commands that take none
        input if input.starts_with("/new ") => {
            let arg = trimmed["/new ".len()..].trim();
            Err(CommandError::UnsupportedArgument {
                command: "/new".to_string(),
                arg: arg.to_string(),
            })
        }
        input if input.starts_with("/chats ") => {
            let arg = trimmed["/chats ".len()..].trim();
            Err(CommandError::UnsupportedArgument {
                command: "/chats".to_string(),
                arg: arg.to_string(),
            })
        }

        // Status and help
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),

        // Session control
        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help information for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

CHAT MANAGEMENT:
  /new            - Start a fresh chat (saved once you send a message)
  /chats          - List saved chats
  /switch <id>    - Resume a saved chat by its id

SESSION INFORMATION:
  /status         - Show phase, active chat, provider, and model
  /help           - Show this help message
  /?              - Same as /help

SESSION CONTROL:
  exit            - Exit interactive mode
  quit            - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to the model
  - A new chat gets its title from the first five words of your first message
"#
    );
}
