//! HTTP client for HuggingFace-style text-generation inference endpoints.

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use super::GenerationModel;
use crate::types::RagError;

/// Sampling parameters sent with every generation request.
#[derive(Clone, Debug, Serialize)]
pub struct GenerationParameters {
    pub max_new_tokens: u32,
    pub top_k: u32,
    pub top_p: f32,
    pub typical_p: f32,
    pub temperature: f32,
    pub repetition_penalty: f32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            top_k: 10,
            top_p: 0.95,
            typical_p: 0.95,
            temperature: 0.01,
            repetition_penalty: 1.03,
        }
    }
}

/// Async client for a text-generation inference endpoint.
///
/// Supports both a single completed response and server-sent-event
/// streaming (`data:` lines carrying one token per event). Endpoint and
/// credential problems fail at construction.
#[derive(Clone, Debug)]
pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: Url,
    parameters: GenerationParameters,
}

impl HttpGenerator {
    /// Builds a new generation client.
    pub fn new(endpoint: Url, api_key: &str) -> Result<Self, RagError> {
        if api_key.trim().is_empty() {
            return Err(RagError::Config(
                "generation service API key is required".to_string(),
            ));
        }

        let auth = format!("Bearer {}", api_key.trim());
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| {
                RagError::Config("generation service API key is not a valid header value".to_string())
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| {
                RagError::Config(format!("failed to build generation HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            parameters: GenerationParameters::default(),
        })
    }

    /// Overrides the default sampling parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: GenerationParameters) -> Self {
        self.parameters = parameters;
        self
    }

    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, RagError> {
        let request = GenerateRequest {
            inputs: prompt,
            parameters: &self.parameters,
            stream,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| RagError::Generation(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::Generation(format!(
                "generation endpoint returned {status}: {body}"
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerationModel for HttpGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let response = self.send(prompt, false).await?;
        let payload: CompletionPayload = response
            .json()
            .await
            .map_err(|err| RagError::Generation(format!("failed to parse generation response: {err}")))?;
        payload.into_text()
    }

    async fn stream(
        &self,
        prompt: &str,
    ) -> Result<BoxStream<'static, Result<String, RagError>>, RagError> {
        let response = self.send(prompt, true).await?;
        let mut bytes = response.bytes_stream();

        let fragments = async_stream::stream! {
            // Bytes are buffered until a full line is available, so a
            // multi-byte character split across network chunks is never
            // decoded in halves.
            let mut buffer: Vec<u8> = Vec::new();
            while let Some(next) = bytes.next().await {
                let chunk = match next {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        yield Err(RagError::Generation(err.to_string()));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|byte| *byte == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&raw);
                    match parse_sse_line(line.trim()) {
                        Ok(Some(text)) => yield Ok(text),
                        Ok(None) => {}
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }
        };
        Ok(fragments.boxed())
    }
}

/// Extracts the token text from one SSE line, if it carries any.
fn parse_sse_line(line: &str) -> Result<Option<String>, RagError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }
    let event: StreamEvent = serde_json::from_str(data)
        .map_err(|err| RagError::Generation(format!("malformed stream event: {err}")))?;
    Ok(event.token.map(|token| token.text))
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParameters,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    generated_text: String,
}

/// Inference endpoints answer non-streaming requests either with a bare
/// object or a one-element array, depending on the deployment.
#[derive(Deserialize)]
#[serde(untagged)]
enum CompletionPayload {
    Many(Vec<GenerateResponse>),
    One(GenerateResponse),
}

impl CompletionPayload {
    fn into_text(self) -> Result<String, RagError> {
        match self {
            CompletionPayload::One(response) => Ok(response.generated_text),
            CompletionPayload::Many(responses) => responses
                .into_iter()
                .next()
                .map(|response| response.generated_text)
                .ok_or_else(|| {
                    RagError::Generation("generation endpoint returned no candidates".to_string())
                }),
        }
    }
}

#[derive(Deserialize)]
struct StreamEvent {
    #[serde(default)]
    token: Option<StreamToken>,
}

#[derive(Deserialize)]
struct StreamToken {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_requires_api_key() {
        let endpoint = Url::parse("https://llm.example.com/generate").unwrap();
        let err = HttpGenerator::new(endpoint, "").unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn sse_token_lines_yield_text() {
        let text = parse_sse_line(r#"data:{"token":{"text":"Hello"}}"#).unwrap();
        assert_eq!(text.as_deref(), Some("Hello"));
    }

    #[test]
    fn non_data_and_done_lines_are_skipped() {
        assert!(parse_sse_line("").unwrap().is_none());
        assert!(parse_sse_line(": keep-alive").unwrap().is_none());
        assert!(parse_sse_line("data: [DONE]").unwrap().is_none());
    }

    #[test]
    fn malformed_events_are_stream_errors() {
        let err = parse_sse_line("data:{not json").unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
    }

    #[test]
    fn final_events_without_tokens_are_skipped() {
        let text = parse_sse_line(r#"data:{"generated_text":"full answer"}"#).unwrap();
        assert!(text.is_none());
    }
}
