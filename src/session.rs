//! Chat session state and the exchange flow
//!
//! A session holds the two parallel logs of one conversation: the display
//! transcript (role-tagged turns, with an icon on assistant turns) and the
//! provider's opaque history. Both are rewritten to storage together after
//! every successful exchange; nothing is written before the first message.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::providers::{Provider, ProviderHistory};
use crate::storage::Store;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

/// Title shown before the first message names a chat
pub const NEW_CHAT_TITLE: &str = "New Chat";

/// Icon shown next to assistant turns
pub const ASSISTANT_ICON: &str = "✨";

/// Number of leading prompt tokens used for a derived chat title
const TITLE_TOKEN_LIMIT: usize = 5;

/// Role of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The human side of the conversation
    User,
    /// The model side of the conversation
    Assistant,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One display message in a chat transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn
    pub role: TurnRole,
    /// The message text
    pub content: String,
    /// Display icon, carried so replayed transcripts render identically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Turn {
    /// Creates a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            icon: None,
        }
    }

    /// Creates an assistant turn carrying the display icon
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            icon: Some(ASSISTANT_ICON.to_string()),
        }
    }
}

/// Derive a chat title from the first prompt
///
/// Takes the first five whitespace-separated tokens joined by single
/// spaces; shorter prompts keep every token.
pub fn derive_title(prompt: &str) -> String {
    prompt
        .split_whitespace()
        .take(TITLE_TOKEN_LIMIT)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate a fresh chat id from the wall clock
///
/// Unix seconds with a six-digit microsecond fraction. Generated ids sort
/// chronologically; everywhere past this function they are opaque strings.
pub fn new_chat_id() -> String {
    let micros = chrono::Utc::now().timestamp_micros();
    format!("{}.{:06}", micros / 1_000_000, micros % 1_000_000)
}

/// One conversation's in-memory state
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    /// Opaque chat identifier
    pub id: String,
    /// Human-readable label; the sentinel until the first message
    pub title: String,
    /// Display transcript
    pub transcript: Vec<Turn>,
    /// Provider-native history
    pub history: ProviderHistory,
}

impl ChatSession {
    /// Start a brand-new chat
    ///
    /// The id comes from the wall clock and the title is the sentinel.
    /// Nothing is written to storage; an abandoned new chat leaves no
    /// trace.
    pub fn new_chat() -> Self {
        let session = Self::with_id(new_chat_id(), NEW_CHAT_TITLE);
        tracing::debug!("Started new chat {}", session.id);
        session
    }

    /// Build a session with an explicit id and title and empty logs
    pub fn with_id(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            transcript: Vec::new(),
            history: ProviderHistory::default(),
        }
    }

    /// Blob key for the display transcript of chat `id`
    pub fn transcript_key(id: &str) -> String {
        format!("{}-transcript", id)
    }

    /// Blob key for the provider history of chat `id`
    pub fn history_key(id: &str) -> String {
        format!("{}-history", id)
    }

    /// Load the session logs for `id` from storage
    ///
    /// Each log independently degrades to its empty value when its blob is
    /// missing; an undecodable blob is an error. Resuming never writes.
    pub fn resume(
        store: &dyn Store,
        id: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();

        let transcript: Vec<Turn> = match store.get(&Self::transcript_key(&id))? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Vec::new(),
        };

        let history: ProviderHistory = match store.get(&Self::history_key(&id))? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => ProviderHistory::default(),
        };

        tracing::debug!("Resumed chat {} with {} turns", id, transcript.len());

        Ok(Self {
            id,
            title: title.into(),
            transcript,
            history,
        })
    }

    /// Rewrite both session blobs
    pub fn persist(&self, store: &dyn Store) -> Result<()> {
        let transcript = serde_json::to_vec(&self.transcript)?;
        store.put(&Self::transcript_key(&self.id), &transcript)?;

        let history = serde_json::to_vec(&self.history)?;
        store.put(&Self::history_key(&self.id), &history)?;

        tracing::debug!(
            "Persisted chat {} ({} turns)",
            self.id,
            self.transcript.len()
        );
        Ok(())
    }

    /// Run one full exchange with the provider
    ///
    /// In order: register the chat in the catalog on its first message
    /// (deriving the title from the prompt), append the user turn, stream
    /// the reply while reporting each fragment to `on_fragment`, append the
    /// assistant turn, replace the opaque history with the provider's
    /// post-exchange value, and rewrite both logs.
    ///
    /// On a provider failure the user turn stays in the in-memory
    /// transcript, nothing is written to storage, and the error propagates.
    ///
    /// # Returns
    ///
    /// The complete accumulated reply text.
    pub async fn send_message<F>(
        &mut self,
        prompt: &str,
        catalog: &mut Catalog,
        provider: &dyn Provider,
        store: &dyn Store,
        mut on_fragment: F,
    ) -> Result<String>
    where
        F: FnMut(&str),
    {
        if !catalog.contains(&self.id) {
            self.title = derive_title(prompt);
            catalog.register_if_absent(store, &self.id, &self.title)?;
        }

        self.transcript.push(Turn::user(prompt));

        let mut fragments = provider.stream_message(prompt, &self.history).await?;
        let mut response = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            on_fragment(&fragment);
            response.push_str(&fragment);
        }

        self.transcript.push(Turn::assistant(response.clone()));
        self.history = provider.history_after(&self.history, prompt, &response)?;
        self.persist(store)?;

        tracing::info!(
            "Completed exchange in chat {} ({} chars streamed)",
            self.id,
            response.len()
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XzchatError;
    use crate::providers::FragmentStream;
    use crate::storage::FileStore;
    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    #[derive(Clone)]
    enum ScriptItem {
        Text(&'static str),
        Fail(&'static str),
    }

    struct ScriptedProvider {
        script: Vec<ScriptItem>,
        fail_on_connect: bool,
    }

    impl ScriptedProvider {
        fn replying(fragments: &[&'static str]) -> Self {
            Self {
                script: fragments.iter().copied().map(ScriptItem::Text).collect(),
                fail_on_connect: false,
            }
        }

        fn refusing_connections() -> Self {
            Self {
                script: Vec::new(),
                fail_on_connect: true,
            }
        }

        fn failing_mid_stream() -> Self {
            Self {
                script: vec![ScriptItem::Text("partial"), ScriptItem::Fail("cut off")],
                fail_on_connect: false,
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        async fn stream_message(
            &self,
            _prompt: &str,
            _history: &ProviderHistory,
        ) -> Result<FragmentStream> {
            if self.fail_on_connect {
                return Err(XzchatError::Provider("connection refused".to_string()).into());
            }

            let items: Vec<Result<String>> = self
                .script
                .iter()
                .map(|item| match item {
                    ScriptItem::Text(text) => Ok((*text).to_string()),
                    ScriptItem::Fail(msg) => {
                        Err(XzchatError::Provider((*msg).to_string()).into())
                    }
                })
                .collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }

        fn history_after(
            &self,
            history: &ProviderHistory,
            prompt: &str,
            response: &str,
        ) -> Result<ProviderHistory> {
            let mut items = history.raw().as_array().cloned().unwrap_or_default();
            items.push(json!({ "role": "user", "text": prompt }));
            items.push(json!({ "role": "model", "text": response }));
            Ok(ProviderHistory::from_raw(serde_json::Value::Array(items)))
        }
    }

    fn temp_store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new_with_path(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_derive_title_takes_first_five_tokens() {
        assert_eq!(
            derive_title("Hello there, how are you today?"),
            "Hello there, how are you"
        );
    }

    #[test]
    fn test_derive_title_keeps_short_prompts_whole() {
        assert_eq!(derive_title("Quick question"), "Quick question");
        assert_eq!(derive_title("Hi"), "Hi");
    }

    #[test]
    fn test_derive_title_collapses_whitespace_runs() {
        assert_eq!(
            derive_title("  spaced   out\tprompt\nwith breaks here"),
            "spaced out prompt with breaks"
        );
    }

    #[test]
    fn test_derive_title_of_empty_prompt_is_empty() {
        assert_eq!(derive_title(""), "");
        assert_eq!(derive_title("   "), "");
    }

    #[test]
    fn test_user_turn_has_no_icon() {
        let turn = Turn::user("hello");
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.content, "hello");
        assert!(turn.icon.is_none());
    }

    #[test]
    fn test_assistant_turn_carries_icon() {
        let turn = Turn::assistant("hi!");
        assert_eq!(turn.role, TurnRole::Assistant);
        assert_eq!(turn.icon.as_deref(), Some(ASSISTANT_ICON));
    }

    #[test]
    fn test_turn_serialization_shape() {
        let user = serde_json::to_value(Turn::user("q")).unwrap();
        assert_eq!(user, json!({ "role": "user", "content": "q" }));

        let assistant = serde_json::to_value(Turn::assistant("a")).unwrap();
        assert_eq!(
            assistant,
            json!({ "role": "assistant", "content": "a", "icon": "✨" })
        );
    }

    #[test]
    fn test_turn_round_trips_without_icon_field() {
        let decoded: Turn = serde_json::from_str(r#"{"role":"user","content":"q"}"#).unwrap();
        assert_eq!(decoded, Turn::user("q"));
    }

    #[test]
    fn test_turn_role_display() {
        assert_eq!(TurnRole::User.to_string(), "user");
        assert_eq!(TurnRole::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_new_chat_id_format() {
        let id = new_chat_id();
        let (seconds, fraction) = id.split_once('.').unwrap();
        assert!(seconds.parse::<i64>().is_ok());
        assert_eq!(fraction.len(), 6);
        assert!(fraction.parse::<u32>().is_ok());
    }

    #[test]
    fn test_new_chat_starts_blank() {
        let session = ChatSession::new_chat();
        assert_eq!(session.title, NEW_CHAT_TITLE);
        assert!(session.transcript.is_empty());
        assert!(session.history.is_empty());
    }

    #[test]
    fn test_blob_keys() {
        assert_eq!(
            ChatSession::transcript_key("1700000000.0"),
            "1700000000.0-transcript"
        );
        assert_eq!(
            ChatSession::history_key("1700000000.0"),
            "1700000000.0-history"
        );
    }

    #[test]
    fn test_resume_missing_blobs_degrades_to_empty() {
        let (_dir, store) = temp_store();
        let session = ChatSession::resume(&store, "1700000000.0", "Lost chat").unwrap();
        assert_eq!(session.id, "1700000000.0");
        assert_eq!(session.title, "Lost chat");
        assert!(session.transcript.is_empty());
        assert!(session.history.is_empty());
    }

    #[test]
    fn test_resume_never_writes() {
        let (_dir, store) = temp_store();
        ChatSession::resume(&store, "1700000000.0", "Lost chat").unwrap();
        assert!(store
            .get(&ChatSession::transcript_key("1700000000.0"))
            .unwrap()
            .is_none());
        assert!(store
            .get(&ChatSession::history_key("1700000000.0"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_persist_then_resume_round_trips() {
        let (_dir, store) = temp_store();
        let mut session = ChatSession::with_id("1700000000.0", "Round trip");
        session.transcript.push(Turn::user("Hi"));
        session.transcript.push(Turn::assistant("Hello!"));
        session.history = ProviderHistory::from_raw(json!([{ "role": "user", "text": "Hi" }]));
        session.persist(&store).unwrap();

        let restored = ChatSession::resume(&store, "1700000000.0", "Round trip").unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn test_resume_rejects_undecodable_transcript() {
        let (_dir, store) = temp_store();
        store
            .put(&ChatSession::transcript_key("1700000000.0"), b"garbage")
            .unwrap();
        assert!(ChatSession::resume(&store, "1700000000.0", "Broken").is_err());
    }

    #[tokio::test]
    async fn test_send_message_first_exchange() {
        let (_dir, store) = temp_store();
        let mut catalog = Catalog::default();
        let provider = ScriptedProvider::replying(&["Hello", " there!"]);
        let mut session = ChatSession::with_id("1700000000.0", NEW_CHAT_TITLE);

        let mut seen = Vec::new();
        let response = session
            .send_message(
                "Hello there, how are you today?",
                &mut catalog,
                &provider,
                &store,
                |fragment| seen.push(fragment.to_string()),
            )
            .await
            .unwrap();

        assert_eq!(response, "Hello there!");
        assert_eq!(seen, vec!["Hello", " there!"]);

        // Title derived from the first five prompt tokens and registered
        assert_eq!(session.title, "Hello there, how are you");
        assert_eq!(
            catalog.title_of("1700000000.0"),
            Some("Hello there, how are you")
        );

        // Both turns recorded, assistant turn carries the icon
        assert_eq!(session.transcript.len(), 2);
        assert_eq!(session.transcript[0], Turn::user("Hello there, how are you today?"));
        assert_eq!(session.transcript[1].role, TurnRole::Assistant);
        assert_eq!(session.transcript[1].icon.as_deref(), Some(ASSISTANT_ICON));

        // History replaced with the provider's post-exchange value
        assert_eq!(session.history.raw().as_array().unwrap().len(), 2);

        // Both logs persisted
        let restored = ChatSession::resume(&store, "1700000000.0", session.title.clone()).unwrap();
        assert_eq!(restored, session);
    }

    #[tokio::test]
    async fn test_send_message_keeps_title_after_first_exchange() {
        let (_dir, store) = temp_store();
        let mut catalog = Catalog::default();
        let provider = ScriptedProvider::replying(&["ok"]);
        let mut session = ChatSession::with_id("1700000000.0", NEW_CHAT_TITLE);

        session
            .send_message("First message", &mut catalog, &provider, &store, |_| {})
            .await
            .unwrap();
        let catalog_blob = store.get(crate::catalog::CATALOG_KEY).unwrap().unwrap();

        session
            .send_message(
                "Second message with a different opening",
                &mut catalog,
                &provider,
                &store,
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(session.title, "First message");
        assert_eq!(catalog.title_of("1700000000.0"), Some("First message"));
        // The catalog blob was not rewritten for the second message
        assert_eq!(
            store.get(crate::catalog::CATALOG_KEY).unwrap().unwrap(),
            catalog_blob
        );
        assert_eq!(session.transcript.len(), 4);
        assert_eq!(session.history.raw().as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_send_message_connect_failure_persists_nothing() {
        let (_dir, store) = temp_store();
        let mut catalog = Catalog::default();
        let provider = ScriptedProvider::refusing_connections();
        let mut session = ChatSession::with_id("1700000000.0", NEW_CHAT_TITLE);

        let result = session
            .send_message("Hello out there", &mut catalog, &provider, &store, |_| {})
            .await;

        assert!(result.is_err());
        // The user turn stays in memory, pending the next attempt
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.transcript[0], Turn::user("Hello out there"));
        // Neither session blob was written
        assert!(store
            .get(&ChatSession::transcript_key("1700000000.0"))
            .unwrap()
            .is_none());
        assert!(store
            .get(&ChatSession::history_key("1700000000.0"))
            .unwrap()
            .is_none());
        // The catalog entry was registered before the send and survives
        assert_eq!(catalog.title_of("1700000000.0"), Some("Hello out there"));
    }

    #[tokio::test]
    async fn test_send_message_mid_stream_failure_persists_nothing() {
        let (_dir, store) = temp_store();
        let mut catalog = Catalog::default();
        let provider = ScriptedProvider::failing_mid_stream();
        let mut session = ChatSession::with_id("1700000000.0", NEW_CHAT_TITLE);

        let mut seen = Vec::new();
        let result = session
            .send_message("Hello", &mut catalog, &provider, &store, |fragment| {
                seen.push(fragment.to_string())
            })
            .await;

        assert!(result.is_err());
        // The partial fragment reached the progress callback before the cut
        assert_eq!(seen, vec!["partial"]);
        assert_eq!(session.transcript.len(), 1);
        assert!(store
            .get(&ChatSession::transcript_key("1700000000.0"))
            .unwrap()
            .is_none());
        assert!(session.history.is_empty());
    }

    #[tokio::test]
    async fn test_send_message_resumed_chat_skips_registration() {
        let (_dir, store) = temp_store();
        let mut catalog = Catalog::default();
        catalog
            .register_if_absent(&store, "1700000000.0", "Existing title")
            .unwrap();
        let provider = ScriptedProvider::replying(&["more"]);
        let mut session = ChatSession::resume(&store, "1700000000.0", "Existing title").unwrap();

        session
            .send_message("Totally new opening words", &mut catalog, &provider, &store, |_| {})
            .await
            .unwrap();

        assert_eq!(session.title, "Existing title");
        assert_eq!(catalog.title_of("1700000000.0"), Some("Existing title"));
    }
}
