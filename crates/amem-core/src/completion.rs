//! Completion provider abstraction.
//!
//! Every analysis prompt asks for a JSON object. Callers never see provider
//! errors: [`complete_json`] logs them and returns `"{}"`, which parses to an
//! empty map and leads to the same defaults as an unusable answer.

use tracing::warn;

use crate::errors::AmemError;

/// Trait for chat completion providers.
pub trait CompletionProvider: Send + Sync {
    /// Provider or model name, for logs and errors.
    fn name(&self) -> &str;

    /// Send one prompt and return the raw reply text.
    ///
    /// `system_role` replaces the provider's default system prompt when
    /// given. `structured` asks for a JSON object reply where supported.
    fn complete(
        &self,
        prompt: &str,
        system_role: Option<&str>,
        structured: bool,
    ) -> Result<String, AmemError>;
}

/// Ask for a JSON object reply, or `"{}"` when the provider fails.
pub(crate) fn complete_json(
    provider: &dyn CompletionProvider,
    prompt: &str,
    system_role: &str,
    step: &str,
) -> String {
    match provider.complete(prompt, Some(system_role), true) {
        Ok(reply) => reply,
        Err(e) => {
            warn!("{} completion via {} failed: {}", step, provider.name(), e);
            "{}".to_string()
        }
    }
}
