//! Command-line interface definition for XZchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat and saved-chat history.

use clap::{Parser, Subcommand};

/// XZchat - Gemini chat CLI
///
/// Chat with Google Gemini from the terminal with streamed replies and
/// flat-file conversation history.
#[derive(Parser, Debug, Clone)]
#[command(name = "xzchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for XZchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start interactive chat mode
    Chat {
        /// Resume a saved chat by id (see `xzchat history list`)
        #[arg(short, long)]
        resume: Option<String>,

        /// Override the configured model for this session
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Inspect saved chats
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// History subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List all saved chats
    List,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            command: Commands::Chat {
                resume: None,
                model: None,
            },
        }
    }
}
