//! Base provider trait and common types for XZchat
//!
//! This module defines the Provider trait that all chat providers must
//! implement, along with the opaque history wrapper and the fragment
//! stream type used for streaming replies.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Stream of reply text fragments in arrival order
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Provider-native conversation history
///
/// Carried as raw JSON and stored wholesale. The rest of the application
/// never inspects or edits the value; only the provider that produced it
/// understands its layout. A brand-new chat starts from
/// [`ProviderHistory::default`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ProviderHistory(serde_json::Value);

impl ProviderHistory {
    /// Wraps a provider-encoded value
    pub fn from_raw(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Returns the raw provider-encoded value
    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }

    /// Returns true when the history holds no exchanges yet
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Array(items) => items.is_empty(),
            serde_json::Value::Null => true,
            _ => false,
        }
    }
}

impl Default for ProviderHistory {
    fn default() -> Self {
        Self(serde_json::Value::Array(Vec::new()))
    }
}

/// Trait for streaming chat providers
///
/// Providers own both the transport and the history encoding: callers hand
/// the opaque history back on every exchange and store whatever
/// [`Provider::history_after`] returns, replacing the previous value.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the model requests are sent to
    fn model(&self) -> &str;

    /// Begin a streaming exchange
    ///
    /// # Arguments
    ///
    /// * `prompt` - The new user message
    /// * `history` - Provider-native history from previous exchanges
    ///
    /// # Returns
    ///
    /// A stream of reply text fragments. Transport setup failures and
    /// rejected requests error from this call; failures mid-reply surface
    /// as error items in the stream.
    async fn stream_message(
        &self,
        prompt: &str,
        history: &ProviderHistory,
    ) -> Result<FragmentStream>;

    /// Provider-native history resulting from appending this exchange
    ///
    /// # Arguments
    ///
    /// * `history` - The history the exchange started from
    /// * `prompt` - The user message sent
    /// * `response` - The complete accumulated reply
    ///
    /// # Returns
    ///
    /// The new history value the caller stores wholesale.
    fn history_after(
        &self,
        history: &ProviderHistory,
        prompt: &str,
        response: &str,
    ) -> Result<ProviderHistory>;
}
