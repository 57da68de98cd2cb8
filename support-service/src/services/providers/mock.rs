//! Mock completion provider for testing.

use super::{CompletionProvider, ProviderError, ProviderResponse};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

/// Reply the default mock returns regardless of prompt.
pub const DEFAULT_MOCK_REPLY: &str =
    "Thanks for reaching out! A support specialist will review your request.";

/// What the mock should do on each `complete` call.
enum MockBehavior {
    /// Succeed with this text.
    Reply(String),
    /// Succeed with a payload that has no usable text field.
    MissingText,
    /// Fail with a transport error.
    NetworkFailure,
}

/// Mock completion provider. Captures prompts for assertions.
pub struct MockCompletionProvider {
    behavior: MockBehavior,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockCompletionProvider {
    fn default() -> Self {
        Self::with_reply(DEFAULT_MOCK_REPLY)
    }
}

impl MockCompletionProvider {
    pub fn with_reply(text: &str) -> Self {
        Self {
            behavior: MockBehavior::Reply(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds, but the payload lacks the expected text field.
    pub fn without_text() -> Self {
        Self {
            behavior: MockBehavior::MissingText,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with a transport error.
    pub fn failing() -> Self {
        Self {
            behavior: MockBehavior::NetworkFailure,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<ProviderResponse, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        match &self.behavior {
            MockBehavior::Reply(text) => Ok(ProviderResponse {
                text: Some(text.clone()),
                raw: json!({
                    "candidates": [
                        { "content": { "parts": [ { "text": text } ] } }
                    ]
                }),
            }),
            MockBehavior::MissingText => Ok(ProviderResponse {
                text: None,
                raw: json!({ "candidates": [] }),
            }),
            MockBehavior::NetworkFailure => Err(ProviderError::NetworkError(
                "mock network failure".to_string(),
            )),
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::NetworkFailure => Err(ProviderError::NetworkError(
                "mock network failure".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
