//! Chat catalog: the index of saved conversations
//!
//! The catalog maps chat ids to their titles and lives in a single blob
//! under the well-known key `past_chats_list`. It is loaded once at startup
//! and rewritten in full whenever a new chat is registered; entries are
//! never retitled or removed.

use crate::error::Result;
use crate::storage::Store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Blob key holding the catalog
pub const CATALOG_KEY: &str = "past_chats_list";

/// Index of saved chats, keyed by chat id
///
/// Ids are wall-clock stamps, so map ordering doubles as chronological
/// ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, String>,
}

impl Catalog {
    /// Load the catalog from storage
    ///
    /// A store with no catalog blob yields an empty catalog; nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error when the blob exists but cannot be decoded.
    pub fn load(store: &dyn Store) -> Result<Self> {
        match store.get(CATALOG_KEY)? {
            Some(bytes) => {
                let catalog: Catalog = serde_json::from_slice(&bytes)?;
                tracing::debug!("Loaded catalog with {} saved chats", catalog.len());
                Ok(catalog)
            }
            None => Ok(Self::default()),
        }
    }

    /// Register a chat under `id` unless it is already present
    ///
    /// The first registration wins; later calls with the same id leave the
    /// stored title untouched and write nothing.
    ///
    /// # Returns
    ///
    /// `true` when the entry was inserted and the catalog persisted,
    /// `false` when the id was already registered.
    pub fn register_if_absent(&mut self, store: &dyn Store, id: &str, title: &str) -> Result<bool> {
        if self.entries.contains_key(id) {
            return Ok(false);
        }

        self.entries.insert(id.to_string(), title.to_string());
        self.persist(store)?;
        tracing::info!("Registered chat {} as '{}'", id, title);
        Ok(true)
    }

    /// Write the full catalog blob (complete rewrite, never a patch)
    pub fn persist(&self, store: &dyn Store) -> Result<()> {
        let bytes = serde_json::to_vec(self)?;
        store.put(CATALOG_KEY, &bytes)
    }

    /// Whether `id` has a catalog entry
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Title registered for `id`, if any
    pub fn title_of(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Iterate over `(id, title)` pairs in id order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(id, title)| (id.as_str(), title.as_str()))
    }

    /// Number of saved chats
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
