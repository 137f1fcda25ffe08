/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`    — Interactive chat mode
- `history` — Saved chat listing
- `special_commands` — Slash-command parsing for chat sessions

These handlers are intentionally small and use the library components:
the catalog, sessions, providers, and storage.
*/

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::Result;
use crate::lifecycle::{SessionPhase, SessionState};
use crate::providers::{create_provider, Provider};
use crate::session::{ChatSession, TurnRole, ASSISTANT_ICON, NEW_CHAT_TITLE};
use crate::storage::FileStore;

// Special commands parser for chat session control
pub mod special_commands;

// Saved chat listing command
pub mod history;

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Builds the store, catalog, and provider, then runs a readline-based
    //! loop that streams each prompt to the provider and persists the
    //! conversation after every completed exchange.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::io::Write;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `resume` - Optional id of a saved chat to resume; a fresh chat
    ///   starts otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use xzchat::commands::chat;
    /// use xzchat::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default(), None).await?;
    /// ```
    pub async fn run_chat(config: Config, resume: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let store = match &config.storage.data_dir {
            Some(dir) => FileStore::new_with_path(dir)?,
            None => FileStore::new()?,
        };

        let mut catalog = Catalog::load(&store)?;

        // Create provider
        let provider = create_provider(&config.provider.provider_type, &config.provider)?;

        // Select the starting conversation
        let mut state = SessionState::new();
        match resume {
            Some(id) => {
                let title = catalog_title(&catalog, &id);
                state.resume(&store, &id, title)?;
            }
            None => state.start_new(),
        }

        // Create readline instance
        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(provider.as_ref(), &state, catalog.len());

        if state.phase() == SessionPhase::ResumedChat {
            if let Some(session) = state.session() {
                print_transcript(session);
            }
        }

        loop {
            let prompt = state.format_colored_prompt();
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    // Check for special commands first
                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::NewChat) => {
                            state.start_new();
                            println!("Started a new chat\n");
                            continue;
                        }
                        Ok(SpecialCommand::ListChats) => {
                            print_chat_list(&catalog);
                            continue;
                        }
                        Ok(SpecialCommand::SwitchChat(id)) => {
                            let title = catalog_title(&catalog, &id);
                            match state.resume(&store, &id, title) {
                                Ok(()) => {
                                    if let Some(session) = state.session() {
                                        print_transcript(session);
                                    }
                                }
                                Err(e) => {
                                    eprintln!("{}\n", format!("Error: {}", e).red());
                                }
                            }
                            continue;
                        }
                        Ok(SpecialCommand::ShowStatus) => {
                            print_status_display(&state, provider.as_ref(), catalog.len());
                            continue;
                        }
                        Ok(SpecialCommand::Help) => {
                            print_help();
                            continue;
                        }
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::None) => {
                            // Regular chat message
                        }
                        Err(e) => {
                            println!("{}\n", e.to_string().yellow());
                            continue;
                        }
                    }

                    // Add to history
                    rl.add_history_entry(trimmed)?;

                    // Sending with nothing selected starts a fresh chat
                    state.ensure_selected();
                    if let Some(session) = state.session_mut() {
                        print!("\n{} ", ASSISTANT_ICON);
                        let _ = std::io::stdout().flush();

                        let outcome = session
                            .send_message(
                                trimmed,
                                &mut catalog,
                                provider.as_ref(),
                                &store,
                                |fragment| {
                                    print!("{}", fragment);
                                    let _ = std::io::stdout().flush();
                                },
                            )
                            .await;

                        match outcome {
                            Ok(_) => {
                                println!("\n");
                            }
                            Err(e) => {
                                eprintln!("\n{}\n", format!("Error: {}", e).red());
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Title to resume a chat under, warning when the id is not cataloged
    ///
    /// An uncataloged id still resumes (its blobs degrade to empty); the
    /// first message then registers it with a freshly derived title.
    fn catalog_title(catalog: &Catalog, id: &str) -> String {
        match catalog.title_of(id) {
            Some(title) => title.to_string(),
            None => {
                println!(
                    "{}",
                    format!("Chat {} is not in the catalog; resuming it anyway", id).yellow()
                );
                NEW_CHAT_TITLE.to_string()
            }
        }
    }

    /// Display welcome banner at the start of interactive chat mode
    ///
    /// Shows a formatted banner with the application name, the provider
    /// and model, the starting conversation, and basic instructions.
    fn print_welcome_banner(provider: &dyn Provider, state: &SessionState, saved_chats: usize) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║          XZchat Interactive Chat Mode - Welcome!             ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!(
            "Provider: {} (model {})",
            provider.name().bold(),
            provider.model()
        );
        println!(
            "Chat:     {} ({})",
            state.phase().colored_tag(),
            state.phase().description()
        );
        println!("Saved chats: {}\n", saved_chats);
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    /// Replay a restored transcript to the terminal
    ///
    /// Uses the icon persisted on each turn so replays render the same as
    /// the live exchange did.
    fn print_transcript(session: &ChatSession) {
        for turn in &session.transcript {
            match turn.role {
                TurnRole::User => {
                    println!("\n{} {}", "you:".cyan().bold(), turn.content);
                }
                TurnRole::Assistant => {
                    let icon = turn.icon.as_deref().unwrap_or(ASSISTANT_ICON);
                    println!("\n{} {}", icon, turn.content);
                }
            }
        }
        println!();
    }

    /// List saved chats inside the REPL
    fn print_chat_list(catalog: &Catalog) {
        if catalog.is_empty() {
            println!("{}\n", "No saved chats yet.".yellow());
            return;
        }

        println!("\nSaved chats:");
        for (id, title) in catalog.entries() {
            println!("  {}  {}", id.cyan(), title);
        }
        println!("\nUse {} to resume one.\n", "/switch <chat_id>".cyan());
    }

    /// Display detailed status information about the current session
    ///
    /// Shows the lifecycle phase, active chat, provider and model, and
    /// catalog size. This is called when the user types '/status'.
    fn print_status_display(state: &SessionState, provider: &dyn Provider, saved_chats: usize) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     XZchat Session Status                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!(
            "Phase:        {} ({})",
            state.phase().colored_tag(),
            state.phase().description()
        );
        if let Some(session) = state.session() {
            println!("Chat Title:   {}", session.title);
            println!("Chat ID:      {}", session.id);
            println!("Turns:        {} messages", session.transcript.len());
        }
        println!(
            "Provider:     {} (model {})",
            provider.name(),
            provider.model()
        );
        println!("Saved Chats:  {}", saved_chats);
        println!("Prompt:       {}", state.format_prompt());
        println!();
    }

}
