//! Gemini streaming client (API key authentication).

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::{future, stream, StreamExt};
use reqwest::Client;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Error;
use crate::Result;

use super::{CompletionClient, CompletionOptions, CompletionStream, GeminiChunk, Message, Role};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client using API key authentication.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client with API key.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: Client::new(),
        }
    }

    fn build_url(&self) -> String {
        format!(
            "{}/{}:streamGenerateContent?alt=sse&key={}",
            GEMINI_API_URL, self.model, self.api_key
        )
    }

    fn build_request(&self, messages: &[Message], options: &CompletionOptions) -> Value {
        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| json!({ "role": "user", "parts": [{ "text": m.content }] }))
            .collect();

        let mut request = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_output_tokens
            }
        });

        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        if !system.is_empty() {
            request["systemInstruction"] = json!({
                "parts": [{ "text": system.join("\n\n") }]
            });
        }

        request
    }
}

/// Decode one SSE `data:` payload into its text, skipping chunks without any.
///
/// An error object in the payload fails the stream.
fn parse_chunk(data: &str) -> Result<Option<String>> {
    let chunk: GeminiChunk = serde_json::from_str(data)?;

    if let Some(error) = chunk.error {
        return Err(Error::Completion(format!(
            "Gemini API error {}: {}",
            error.code, error.message
        )));
    }

    Ok(chunk.text())
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn stream(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
        cancel: &CancellationToken,
    ) -> Result<CompletionStream> {
        let request = self.build_request(messages, options);
        debug!("Requesting completion from {} ({} messages)", self.model, messages.len());

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Completion cancelled before response");
                return Ok(stream::empty::<Result<String>>().boxed());
            }
            response = self.client.post(self.build_url()).json(&request).send() => response?,
        };

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(Error::Completion(format!("Gemini API error: {error_text}")));
        }

        let fragments = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) => parse_chunk(&event.data).transpose(),
                    Err(e) => Some(Err(Error::Completion(e.to_string()))),
                })
            })
            .take_until(cancel.clone().cancelled_owned());

        Ok(fragments.boxed())
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}
