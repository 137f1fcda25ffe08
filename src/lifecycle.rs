//! Session lifecycle state for interactive chats
//!
//! The REPL is always in one of three phases: nothing selected yet, a
//! fresh chat that has never touched storage, or a chat resumed from
//! storage. The phase drives the prompt and the status display. Switching
//! away from an unsaved new chat drops it without a trace, because nothing
//! was ever written for it.

use crate::error::Result;
use crate::session::ChatSession;
use crate::storage::Store;
use colored::Colorize;

/// Phase of the session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Process started, no conversation selected
    NoChatSelected,
    /// Fresh conversation, nothing persisted yet
    NewChat,
    /// Conversation restored from storage
    ResumedChat,
}

impl SessionPhase {
    /// Get a human-readable description of the phase
    pub fn description(&self) -> &'static str {
        match self {
            SessionPhase::NoChatSelected => "No conversation selected",
            SessionPhase::NewChat => "Fresh conversation, not yet saved",
            SessionPhase::ResumedChat => "Conversation restored from disk",
        }
    }

    /// Get the colored tag used in prompts and status lines
    pub fn colored_tag(&self) -> String {
        match self {
            SessionPhase::NoChatSelected => format!("[{}]", self).dimmed().to_string(),
            SessionPhase::NewChat => format!("[{}]", self).green().to_string(),
            SessionPhase::ResumedChat => format!("[{}]", self).cyan().to_string(),
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::NoChatSelected => write!(f, "NONE"),
            SessionPhase::NewChat => write!(f, "NEW"),
            SessionPhase::ResumedChat => write!(f, "RESUMED"),
        }
    }
}

/// Current conversation selection, owning the active session if any
pub enum SessionState {
    /// Nothing selected
    NoChatSelected,
    /// A fresh chat (id allocated, nothing persisted)
    NewChat(ChatSession),
    /// A chat loaded from storage
    ResumedChat(ChatSession),
}

impl SessionState {
    /// Create the initial state with nothing selected
    pub fn new() -> Self {
        SessionState::NoChatSelected
    }

    /// Get the current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::NoChatSelected => SessionPhase::NoChatSelected,
            SessionState::NewChat(_) => SessionPhase::NewChat,
            SessionState::ResumedChat(_) => SessionPhase::ResumedChat,
        }
    }

    /// Borrow the active session, if any
    pub fn session(&self) -> Option<&ChatSession> {
        match self {
            SessionState::NoChatSelected => None,
            SessionState::NewChat(session) | SessionState::ResumedChat(session) => Some(session),
        }
    }

    /// Mutably borrow the active session, if any
    pub fn session_mut(&mut self) -> Option<&mut ChatSession> {
        match self {
            SessionState::NoChatSelected => None,
            SessionState::NewChat(session) | SessionState::ResumedChat(session) => Some(session),
        }
    }

    /// Switch to a fresh chat, dropping whatever was selected
    pub fn start_new(&mut self) {
        *self = SessionState::NewChat(ChatSession::new_chat());
    }

    /// Switch to a past chat loaded from storage
    ///
    /// Missing session blobs degrade to empty logs; an undecodable blob is
    /// an error and leaves the current selection untouched.
    pub fn resume(
        &mut self,
        store: &dyn Store,
        id: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<()> {
        let session = ChatSession::resume(store, id, title)?;
        *self = SessionState::ResumedChat(session);
        Ok(())
    }

    /// Make sure something is selected, defaulting to a fresh chat
    pub fn ensure_selected(&mut self) {
        if matches!(self, SessionState::NoChatSelected) {
            self.start_new();
        }
    }

    /// Format the REPL prompt for the current selection
    pub fn format_prompt(&self) -> String {
        match self.session() {
            Some(session) => format!("[{}] {} >> ", self.phase(), session.title),
            None => format!("[{}] >> ", self.phase()),
        }
    }

    /// Format the REPL prompt with the phase tag colored
    pub fn format_colored_prompt(&self) -> String {
        match self.session() {
            Some(session) => format!(
                "{} {} >> ",
                self.phase().colored_tag(),
                session.title.bold()
            ),
            None => format!("{} >> ", self.phase().colored_tag()),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
