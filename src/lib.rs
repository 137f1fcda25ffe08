//! XZchat - Gemini chat CLI library
//!
//! This library provides the core functionality for XZchat, including the
//! chat catalog, session management, streamed Gemini replies, flat-file
//! storage, and configuration.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `catalog`: Saved-chat catalog mapping chat ids to display titles
//! - `session`: Chat sessions, transcripts, and the message exchange flow
//! - `lifecycle`: Session selection states and prompt formatting
//! - `providers`: Model provider abstraction and the Gemini implementation
//! - `storage`: Flat-file blob storage for catalogs and session logs
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use xzchat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     // Chat usage would go here
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod providers;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use catalog::Catalog;
pub use config::Config;
pub use error::{Result, XzchatError};
pub use lifecycle::{SessionPhase, SessionState};
pub use providers::{create_provider, Provider};
pub use session::{ChatSession, Turn, TurnRole};
pub use storage::{FileStore, Store};
