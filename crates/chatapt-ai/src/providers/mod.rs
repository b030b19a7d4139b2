//! Generation endpoint implementations

pub mod gemini;

use crate::{Completion, Error, GenerationOptions, HistoryTurn, Result};
use async_trait::async_trait;

/// Trait for anything that can turn a history into a completion
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a completion for the given history
    async fn generate(
        &self,
        history: &[HistoryTurn],
        options: &GenerationOptions,
    ) -> Result<Completion>;
}

/// Get an API key from the provided value or the first set environment variable
pub fn get_api_key(provided: Option<&str>, env_vars: &[&str]) -> Result<String> {
    if let Some(key) = provided.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }

    env_vars
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .ok_or(Error::InvalidApiKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_api_key_prefers_provided() {
        let key = get_api_key(Some("abc"), &["CHATAPT_TEST_UNSET_VAR"]).unwrap();
        assert_eq!(key, "abc");
    }

    #[test]
    fn test_get_api_key_blank_provided_falls_through() {
        let err = get_api_key(Some("   "), &["CHATAPT_TEST_UNSET_VAR"]).unwrap_err();
        assert!(matches!(err, Error::InvalidApiKey));
    }
}
