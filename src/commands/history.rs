use crate::catalog::Catalog;
use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::Result;
use crate::session::{ChatSession, Turn};
use crate::storage::{FileStore, Store};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub fn handle_history(command: HistoryCommand, config: &Config) -> Result<()> {
    let store = match &config.storage.data_dir {
        Some(dir) => FileStore::new_with_path(dir)?,
        None => FileStore::new()?,
    };

    match command {
        HistoryCommand::List => {
            let catalog = Catalog::load(&store)?;

            if catalog.is_empty() {
                println!("{}", "No saved chats found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Turns".bold()
            ]);

            for (id, title) in catalog.entries() {
                let title = if title.chars().count() > 40 {
                    let truncated: String = title.chars().take(37).collect();
                    format!("{}...", truncated)
                } else {
                    title.to_string()
                };

                table.add_row(prettytable::row![
                    id.cyan(),
                    title,
                    turn_count(&store, id)
                ]);
            }

            println!("\nSaved Chats:");
            table.printstd();
            println!();
            println!(
                "Use {} to resume a chat.",
                "xzchat chat --resume <ID>".cyan()
            );
            println!();
        }
    }

    Ok(())
}

/// Count the persisted turns of a chat, or "-" when the blob is unreadable
fn turn_count(store: &dyn Store, id: &str) -> String {
    match store.get(&ChatSession::transcript_key(id)) {
        Ok(Some(bytes)) => match serde_json::from_slice::<Vec<Turn>>(&bytes) {
            Ok(turns) => turns.len().to_string(),
            Err(e) => {
                tracing::warn!("Unreadable transcript for chat {}: {}", id, e);
                "-".to_string()
            }
        },
        Ok(None) => "0".to_string(),
        Err(e) => {
            tracing::warn!("Failed to read transcript for chat {}: {}", id, e);
            "-".to_string()
        }
    }
}
