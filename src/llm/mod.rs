//! Completion stream abstraction layer.
//!
//! This module provides:
//! - [`CompletionClient`] trait for swappable streaming providers
//! - [`ProviderRegistry`] for dynamic provider creation
//! - Concrete implementation: Gemini (API key, SSE streaming)
//!
//! # Adding a New Provider
//!
//! 1. Create a new file (e.g., `openai.rs`)
//! 2. Implement `CompletionClient` trait
//! 3. Add to `ProviderRegistry::create()`
//! 4. Add config fields in `config.rs`

mod message;
mod types;

pub mod gemini;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Error;
use crate::Result;

pub use gemini::GeminiClient;
pub use message::{Message, Role};
pub use types::*;

/// Lazy, finite sequence of text fragments from one completion request.
pub type CompletionStream = BoxStream<'static, Result<String>>;

/// Sampling options passed through to the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 8192,
        }
    }
}

impl CompletionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// Streaming completion client trait.
///
/// Implementations must end the returned stream once `cancel` fires; whatever
/// was yielded before that point is the partial result.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Start a completion and return its fragments as they arrive.
    async fn stream(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
        cancel: &CancellationToken,
    ) -> Result<CompletionStream>;

    /// Get the model this client talks to.
    fn default_model(&self) -> &str;
}

#[async_trait]
impl CompletionClient for Box<dyn CompletionClient> {
    async fn stream(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
        cancel: &CancellationToken,
    ) -> Result<CompletionStream> {
        (**self).stream(messages, options, cancel).await
    }

    fn default_model(&self) -> &str {
        (**self).default_model()
    }
}

/// Provider registry — creates completion clients dynamically.
///
/// # Example
///
/// ```ignore
/// let client = ProviderRegistry::create(&config)?;
/// let fragments = client.stream(&messages, &options, &cancel).await?;
/// ```
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create a completion client from configuration.
    ///
    /// Supported providers:
    /// - `"gemini"`: Gemini API with API key authentication
    pub fn create(config: &Config) -> Result<Box<dyn CompletionClient>> {
        match config.provider.as_str() {
            "gemini" => {
                let api_key = config.resolved_api_key();
                if api_key.is_empty() {
                    return Err(Error::Config(
                        "Gemini API key is not set. \
                         Run 'apicenter-chat onboard' or set GEMINI_API_KEY."
                            .to_string(),
                    ));
                }
                Ok(Box::new(GeminiClient::new(&api_key, &config.model)))
            }
            other => Err(Error::Config(format!(
                "Unknown provider: {other} (available: {})",
                Self::available().join(", ")
            ))),
        }
    }

    /// List available provider names.
    pub fn available() -> &'static [&'static str] {
        &["gemini"]
    }
}

/// Fake completion client for testing.
///
/// Replays a fixed script of fragments (or errors) and records every message
/// list it was called with.
#[cfg(test)]
pub struct FakeCompletionClient {
    script: Vec<std::result::Result<String, String>>,
    open_error: Option<String>,
    calls: std::sync::Mutex<Vec<Vec<Message>>>,
}

#[cfg(test)]
impl FakeCompletionClient {
    /// Create with predefined fragments.
    pub fn new(fragments: Vec<&str>) -> Self {
        Self::scripted(fragments.into_iter().map(|f| Ok(f.to_string())).collect())
    }

    /// Create with fragments and mid-stream errors in a fixed order.
    pub fn scripted(script: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            script,
            open_error: None,
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create a client whose requests fail before any fragment is produced.
    pub fn failing(message: &str) -> Self {
        Self {
            script: Vec::new(),
            open_error: Some(message.to_string()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Message lists received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl CompletionClient for FakeCompletionClient {
    async fn stream(
        &self,
        messages: &[Message],
        _options: &CompletionOptions,
        cancel: &CancellationToken,
    ) -> Result<CompletionStream> {
        use futures_util::StreamExt;

        self.calls.lock().unwrap().push(messages.to_vec());

        if let Some(ref message) = self.open_error {
            return Err(Error::Completion(message.clone()));
        }

        let items: Vec<Result<String>> = self
            .script
            .iter()
            .map(|item| item.clone().map_err(Error::Completion))
            .collect();

        Ok(futures_util::stream::iter(items)
            .take_until(cancel.clone().cancelled_owned())
            .boxed())
    }

    fn default_model(&self) -> &str {
        "fake-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_fake_client_replays_fragments() {
        let client = FakeCompletionClient::new(vec!["Hello", ", world"]);
        let cancel = CancellationToken::new();

        let stream = client
            .stream(&[Message::user("hi")], &CompletionOptions::default(), &cancel)
            .await
            .unwrap();
        let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;

        assert_eq!(fragments, vec!["Hello", ", world"]);
        assert_eq!(client.call_count(), 1);
        assert_eq!(client.calls()[0][0].content, "hi");
    }

    #[tokio::test]
    async fn test_fake_client_stops_when_cancelled() {
        let client = FakeCompletionClient::new(vec!["a", "b"]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stream = client
            .stream(&[], &CompletionOptions::default(), &cancel)
            .await
            .unwrap();
        let fragments: Vec<Result<String>> = stream.collect().await;

        assert!(fragments.is_empty());
    }

    #[test]
    fn test_registry_rejects_unknown_provider() {
        let config = Config {
            provider: "nope".to_string(),
            ..Config::default()
        };
        let err = ProviderRegistry::create(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown provider: nope"));
        assert!(err.to_string().contains("available: gemini"));
    }

    #[test]
    fn test_registry_creates_gemini_with_key() {
        let config = Config {
            gemini_api_key: "k".to_string(),
            ..Config::default()
        };
        let client = ProviderRegistry::create(&config).unwrap();
        assert_eq!(client.default_model(), config.model);
    }
}
