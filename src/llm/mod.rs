//! LLM collaborator contract: `generate`/`generate_with_history`,
//! with a `[Error` sentinel prefix signalling failure to the caller.

#[cfg(feature = "llm")]
pub mod openai;

use crate::error::{LlmError, Result};

/// The sentinel prefix a failing [`LlmClient`] implementation must return
/// instead of propagating a `Result::Err`. Kept as a string protocol (rather
/// than folded into `Result`) because the surrounding synthesis pipeline
/// already treats a returned string as the unit of work; callers translate
/// it back into a typed error at the query-engine boundary.
pub const ERROR_SENTINEL: &str = "[Error";

/// A single turn in a chat history passed to [`LlmClient::generate_with_history`].
#[derive(Debug, Clone)]
pub struct Message {
    /// `"user"` or `"assistant"`.
    pub role: &'static str,
    /// Turn content.
    pub content: String,
}

impl Message {
    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant",
            content: content.into(),
        }
    }
}

/// Text-generation collaborator.
pub trait LlmClient: Send + Sync {
    /// Generates a completion for a single prompt.
    fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> String;

    /// Generates a completion given prior chat history.
    fn generate_with_history(&self, messages: &[Message], system_prompt: Option<&str>) -> String;
}

/// Translates a raw [`LlmClient`] response into a typed error if it carries
/// the `[Error` sentinel prefix.
///
/// # Errors
///
/// Returns [`LlmError::Unavailable`] if `response` starts with
/// [`ERROR_SENTINEL`].
pub fn check_response(response: String) -> Result<String> {
    if response.starts_with(ERROR_SENTINEL) {
        return Err(LlmError::Unavailable(response).into());
    }
    Ok(response)
}

/// Offline test double: never calls out, always echoes a deterministic
/// canned response derived from the prompt.
pub struct EchoLlm;

impl LlmClient for EchoLlm {
    fn generate(&self, prompt: &str, _system_prompt: Option<&str>) -> String {
        format!("echo: {prompt}")
    }

    fn generate_with_history(&self, messages: &[Message], _system_prompt: Option<&str>) -> String {
        let last = messages.last().map_or("", |m| m.content.as_str());
        format!("echo: {last}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_llm_reflects_prompt() {
        let llm = EchoLlm;
        assert_eq!(llm.generate("hola", None), "echo: hola");
    }

    #[test]
    fn check_response_detects_sentinel() {
        let err = check_response("[Error] timeout".to_string()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ExternalUnavailable);
    }

    #[test]
    fn check_response_passes_through_normal_text() {
        assert_eq!(check_response("ok".to_string()).unwrap(), "ok");
    }
}
