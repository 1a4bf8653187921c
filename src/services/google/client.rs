// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Streaming client for the Gemini `streamGenerateContent` endpoint.
//!
//! [`GeminiClient`] is the seam between the LLM service and the network. The
//! service only ever sees a stream of decoded [`GenerateContentResponse`]
//! chunks, so tests can script a conversation without an HTTP server.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use tracing::{debug, error, trace, warn};

use crate::services::google::error::GoogleError;
use crate::services::google::types::{GenerateContentRequest, GenerateContentResponse};
use crate::services::shared::sse::{SseEvent, SseParser};

/// A stream of response chunks. A transport failure ends the stream with an `Err`.
pub type GenerateContentStream = BoxStream<'static, Result<GenerateContentResponse, GoogleError>>;

/// Anything that can stream Gemini responses.
#[async_trait]
pub trait GeminiClient: Send + Sync + fmt::Debug {
    /// Open a streaming generation call for `model`.
    async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentStream, GoogleError>;
}

/// Connection settings for [`GeminiHttpClient`].
#[derive(Clone)]
pub struct GoogleClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Whole-request timeout, streaming included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl GoogleClientConfig {
    /// Default base URL for the Gemini API.
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

// The API key never reaches logs.
impl fmt::Debug for GoogleClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// [`GeminiClient`] over HTTPS with server-sent events.
pub struct GeminiHttpClient {
    config: GoogleClientConfig,
    client: reqwest::Client,
}

impl GeminiHttpClient {
    pub fn new(config: GoogleClientConfig) -> Result<Self, GoogleError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GoogleClientConfig {
        &self.config
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }
}

impl fmt::Debug for GeminiHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiHttpClient")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl GeminiClient for GeminiHttpClient {
    async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentStream, GoogleError> {
        let url = self.url(model);
        debug!(model, contents = request.contents.len(), "Opening Gemini stream");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Gemini API returned an error");
            return Err(GoogleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(GoogleError::from))
            .boxed();
        Ok(decode_sse_stream(bytes))
    }
}

/// Decode one SSE `data:` payload. Undecodable chunks are skipped.
fn decode_event(event: SseEvent) -> Option<GenerateContentResponse> {
    if event.data.is_empty() {
        return None;
    }
    match serde_json::from_str(&event.data) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            warn!(error = %e, data = %event.data, "Failed to parse Gemini SSE chunk JSON");
            None
        }
    }
}

struct DecodeState {
    bytes: BoxStream<'static, Result<Vec<u8>, GoogleError>>,
    parser: SseParser,
    pending: VecDeque<GenerateContentResponse>,
    /// Trailing bytes of a UTF-8 sequence split across network chunks.
    carry: Vec<u8>,
    finished: bool,
}

impl DecodeState {
    fn push_text(&mut self, text: &str) {
        for event in self.parser.feed(text) {
            self.pending.extend(decode_event(event));
        }
    }

    fn push_bytes(&mut self, chunk: Vec<u8>) {
        self.carry.extend_from_slice(&chunk);
        let valid_up_to = match std::str::from_utf8(&self.carry) {
            Ok(_) => self.carry.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                warn!(error = %e, "Received non-UTF-8 data in SSE stream, skipping chunk");
                self.carry.clear();
                return;
            }
        };
        let rest = self.carry.split_off(valid_up_to);
        let complete = std::mem::replace(&mut self.carry, rest);
        // `complete` is valid UTF-8 by construction.
        let text = String::from_utf8_lossy(&complete).into_owned();
        self.push_text(&text);
    }

    fn finish(&mut self) {
        self.finished = true;
        if !self.carry.is_empty() {
            warn!(bytes = self.carry.len(), "SSE stream ended inside a UTF-8 sequence");
            self.carry.clear();
        }
        if let Some(event) = self.parser.finish() {
            self.pending.extend(decode_event(event));
        }
    }
}

/// Turn a raw byte stream carrying SSE into decoded response chunks.
pub fn decode_sse_stream(
    bytes: BoxStream<'static, Result<Vec<u8>, GoogleError>>,
) -> GenerateContentStream {
    let state = DecodeState {
        bytes,
        parser: SseParser::new(),
        pending: VecDeque::new(),
        carry: Vec::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.pending.pop_front() {
                return Some((Ok(chunk), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(bytes)) => {
                    trace!(len = bytes.len(), "SSE bytes");
                    state.push_bytes(bytes);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state.pending.clear();
                    return Some((Err(e), state));
                }
                None => state.finish(),
            }
        }
    })
    .boxed()
}
