//! `async-openai`-backed [`LlmClient`] (feature `llm`). Calls are dispatched
//! on a dedicated current-thread `tokio` runtime and driven synchronously
//! via `block_on` so the synchronous `LlmClient` trait stays the only
//! surface callers depend on, regardless of whether the `llm` feature is on.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use tokio::runtime::Runtime;

use super::{LlmClient, Message, ERROR_SENTINEL};

/// Chat-completion client backed by the OpenAI API (or a compatible
/// endpoint, via `OPENAI_API_BASE`).
pub struct OpenAiLlm {
    client: Client<OpenAIConfig>,
    model: String,
    runtime: Runtime,
}

impl OpenAiLlm {
    /// Builds a client from the `OPENAI_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the `tokio` runtime cannot be created.
    pub fn new(model: impl Into<String>) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            client: Client::new(),
            model: model.into(),
            runtime,
        })
    }

    fn complete(&self, messages: Vec<ChatCompletionRequestMessage>) -> String {
        self.runtime.block_on(async {
            let request = match CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .messages(messages)
                .build()
            {
                Ok(request) => request,
                Err(e) => return format!("{ERROR_SENTINEL}: building request: {e}"),
            };

            match self.client.chat().create(request).await {
                Ok(response) => response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .unwrap_or_default(),
                Err(e) => format!("{ERROR_SENTINEL}: {e}"),
            }
        })
    }
}

impl LlmClient for OpenAiLlm {
    fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> String {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            if let Ok(msg) = ChatCompletionRequestSystemMessageArgs::default().content(system).build() {
                messages.push(msg.into());
            }
        }
        match ChatCompletionRequestUserMessageArgs::default().content(prompt).build() {
            Ok(msg) => messages.push(msg.into()),
            Err(e) => return format!("{ERROR_SENTINEL}: building user message: {e}"),
        }
        self.complete(messages)
    }

    fn generate_with_history(&self, history: &[Message], system_prompt: Option<&str>) -> String {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            if let Ok(msg) = ChatCompletionRequestSystemMessageArgs::default().content(system).build() {
                messages.push(msg.into());
            }
        }
        for turn in history {
            let built = if turn.role == "assistant" {
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.clone())
                    .build()
                    .map(Into::into)
            } else {
                ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.content.clone())
                    .build()
                    .map(Into::into)
            };
            match built {
                Ok(msg) => messages.push(msg),
                Err(e) => return format!("{ERROR_SENTINEL}: building history message: {e}"),
            }
        }
        self.complete(messages)
    }
}
