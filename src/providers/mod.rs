//! Provider module for XZchat
//!
//! This module contains the streaming chat provider abstraction, the
//! Gemini implementation, and the factory that constructs a provider from
//! configuration.

pub mod base;
pub mod gemini;

pub use base::{FragmentStream, Provider, ProviderHistory};
pub use gemini::GeminiProvider;

use crate::error::Result;

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `provider_type` - Type of provider (only "gemini" is supported)
/// * `config` - Provider configuration
///
/// # Returns
///
/// Returns a boxed provider instance
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
pub fn create_provider(
    provider_type: &str,
    config: &crate::config::ProviderConfig,
) -> Result<Box<dyn Provider>> {
    match provider_type {
        "gemini" => Ok(Box::new(gemini::GeminiProvider::new(
            config.gemini.clone(),
        )?)),
        _ => Err(crate::error::XzchatError::Provider(format!(
            "Unknown provider type: {}",
            provider_type
        ))
        .into()),
    }
}
