// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Google Gemini LLM service.
//!
//! [`GoogleLLMService`] consumes [`LLMContextFrame`]s, translates the shared
//! [`GoogleLLMContext`] into a `streamGenerateContent` request and streams the
//! answer back as frames:
//!
//! - [`LLMFullResponseStartFrame`] first,
//! - one [`LLMTextFrame`] per non-empty text delta,
//! - a [`FunctionCallsStartedFrame`] for every chunk that carries function
//!   calls (the calls run elsewhere; streaming continues),
//! - a [`MetricsFrame`] with the token usage and an [`LLMFullResponseEndFrame`]
//!   last, even when the request or the stream failed.
//!
//! Failures are logged and reported upstream as non-fatal [`ErrorFrame`]s.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::frames::{
    ErrorFrame, FrameEnum, FunctionCallFromLLM, FunctionCallsStartedFrame,
    LLMFullResponseEndFrame, LLMFullResponseStartFrame, LLMTextFrame, MetricsFrame,
};
use crate::metrics::{
    LLMTokenUsage, LLMUsageAccumulator, LLMUsageMetricsData, MetricsData, TTFBMetricsData,
};
use crate::processors::aggregators::llm_message::{JsonMap, Part};
use crate::processors::{FrameDirection, Processor, ProcessorContext};
use crate::services::google::aggregators::GoogleContextAggregatorPair;
use crate::services::google::client::{GeminiClient, GeminiHttpClient, GoogleClientConfig};
use crate::services::google::context::{GoogleLLMContext, SharedGoogleContext, UpgradeToGoogle};
use crate::services::google::error::GoogleError;
use crate::services::google::translator::{convert_tools, GeminiTranslator};
use crate::services::google::types::{
    GeminiCandidate, GeminiContent, GeminiGenerationConfig, GeminiPart, GenerateContentRequest,
};
use crate::services::shared::translator::VendorTranslator;
use crate::services::AIService;
use crate::utils::base_object::{default_name, obj_id};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Generation parameters. Unset values are left to the model's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleLLMParams {
    /// Maximum output tokens. Must be at least 1.
    pub max_tokens: u32,
    /// Sampling temperature in `0.0..=2.0`.
    pub temperature: Option<f64>,
    pub top_k: Option<u32>,
    /// Nucleus sampling mass in `0.0..=1.0`.
    pub top_p: Option<f64>,
    /// Additional vendor settings, kept alongside the known ones.
    pub extra: JsonMap,
}

impl Default for GoogleLLMParams {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: None,
            top_k: None,
            top_p: None,
            extra: JsonMap::new(),
        }
    }
}

impl GoogleLLMParams {
    pub fn validate(&self) -> Result<(), GoogleError> {
        if self.max_tokens == 0 {
            return Err(GoogleError::InvalidParams {
                name: "max_tokens",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(GoogleError::InvalidParams {
                    name: "temperature",
                    reason: format!("{t} is outside 0.0..=2.0"),
                });
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(GoogleError::InvalidParams {
                    name: "top_p",
                    reason: format!("{p} is outside 0.0..=1.0"),
                });
            }
        }
        Ok(())
    }

    /// Apply a runtime settings update.
    ///
    /// Unknown keys are logged and ignored. The update is all or nothing:
    /// on error `self` is unchanged.
    pub fn apply_settings(&mut self, settings: &HashMap<String, Value>) -> Result<(), GoogleError> {
        let mut updated = self.clone();
        for (key, value) in settings {
            match key.as_str() {
                "max_tokens" => {
                    updated.max_tokens = value
                        .as_u64()
                        .and_then(|v| u32::try_from(v).ok())
                        .ok_or_else(|| invalid("max_tokens", value))?;
                }
                "temperature" => updated.temperature = optional_f64("temperature", value)?,
                "top_p" => updated.top_p = optional_f64("top_p", value)?,
                "top_k" => {
                    updated.top_k = match value {
                        Value::Null => None,
                        v => Some(
                            v.as_u64()
                                .and_then(|v| u32::try_from(v).ok())
                                .ok_or_else(|| invalid("top_k", v))?,
                        ),
                    };
                }
                "extra" => match value {
                    Value::Object(map) => updated.extra = map.clone(),
                    Value::Null => updated.extra.clear(),
                    other => return Err(invalid("extra", other)),
                },
                unknown => warn!(key = unknown, "Unknown LLM setting, ignoring"),
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn generation_config(&self) -> GeminiGenerationConfig {
        GeminiGenerationConfig {
            max_output_tokens: Some(self.max_tokens),
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
        }
    }
}

fn invalid(name: &'static str, value: &Value) -> GoogleError {
    GoogleError::InvalidParams {
        name,
        reason: format!("unexpected value {value}"),
    }
}

fn optional_f64(name: &'static str, value: &Value) -> Result<Option<f64>, GoogleError> {
    match value {
        Value::Null => Ok(None),
        v => v.as_f64().map(Some).ok_or_else(|| invalid(name, v)),
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Streaming Gemini LLM service.
///
/// ```no_run
/// use pipecat_google::services::google::{GoogleClientConfig, GoogleLLMService};
///
/// let service = GoogleLLMService::new(GoogleClientConfig::new("api-key"), "gemini-2.0-flash")
///     .unwrap()
///     .with_system_instruction("You are a helpful assistant.");
/// ```
pub struct GoogleLLMService {
    id: u64,
    name: String,
    model: String,
    client: Arc<dyn GeminiClient>,
    params: GoogleLLMParams,
    /// Instruction used when a context carries none.
    default_system_instruction: Option<String>,
    system_instruction: Option<String>,
}

impl GoogleLLMService {
    /// Default model used when none is specified.
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";

    /// Create a service talking to the Gemini REST API.
    ///
    /// An empty `model` selects [`Self::DEFAULT_MODEL`].
    pub fn new(config: GoogleClientConfig, model: impl Into<String>) -> Result<Self, GoogleError> {
        let client = GeminiHttpClient::new(config)?;
        Ok(Self::with_client(Arc::new(client), model))
    }

    /// Create a service on top of any [`GeminiClient`].
    pub fn with_client(client: Arc<dyn GeminiClient>, model: impl Into<String>) -> Self {
        let model = model.into();
        let model = if model.is_empty() {
            Self::DEFAULT_MODEL.to_string()
        } else {
            model
        };
        Self {
            id: obj_id(),
            name: default_name("GoogleLLMService"),
            model,
            client,
            params: GoogleLLMParams::default(),
            default_system_instruction: None,
            system_instruction: None,
        }
    }

    /// Builder method: set generation parameters.
    pub fn with_params(mut self, params: GoogleLLMParams) -> Result<Self, GoogleError> {
        params.validate()?;
        self.params = params;
        Ok(self)
    }

    /// Builder method: set the system instruction used for contexts that
    /// carry none of their own.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        let instruction = instruction.into();
        self.default_system_instruction = Some(instruction.clone());
        self.system_instruction = Some(instruction);
        self
    }

    pub fn params(&self) -> &GoogleLLMParams {
        &self.params
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    /// Build the user/assistant aggregators for `context`.
    pub fn create_context_aggregator(context: impl UpgradeToGoogle) -> GoogleContextAggregatorPair {
        GoogleContextAggregatorPair::new(context)
    }

    /// Apply a runtime settings update, rejecting invalid ones.
    pub fn update_settings(&mut self, settings: &HashMap<String, Value>) -> Result<(), GoogleError> {
        self.params.apply_settings(settings)?;
        debug!(params = ?self.params, "{}: updated settings", self.name);
        Ok(())
    }

    /// Translate the current context into a request body.
    ///
    /// The context lock is released before the request is sent.
    pub async fn build_request(&mut self, context: &SharedGoogleContext) -> GenerateContentRequest {
        let (contents, system_message, tools) = {
            let context = context.lock().await;
            debug!(
                messages = ?context.get_messages_for_logging(),
                "{}: generating chat", self.name
            );
            (
                GeminiTranslator.to_vendor_all(context.messages()),
                context.system_message().map(str::to_string),
                context.tools().map(convert_tools),
            )
        };

        let system_instruction = system_message.or_else(|| self.default_system_instruction.clone());
        if self.system_instruction != system_instruction {
            debug!(system_instruction = ?system_instruction, "System instruction changed");
            self.system_instruction = system_instruction;
        }

        let generation_config = self.params.generation_config();
        GenerateContentRequest {
            contents,
            system_instruction: self.system_instruction.as_ref().map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(text.clone())],
            }),
            generation_config: (!generation_config.is_empty()).then_some(generation_config),
            tools: tools.filter(|t| !t.is_empty()),
        }
    }

    /// Run the model on `context` and stream the answer.
    async fn process_context(&mut self, context: SharedGoogleContext, ctx: &ProcessorContext) {
        ctx.send_downstream(FrameEnum::LLMFullResponseStart(LLMFullResponseStartFrame::new()));

        let mut usage = LLMUsageAccumulator::new();
        if let Err(e) = self.stream_response(&context, &mut usage, ctx).await {
            error!(error = %e, "{}: Gemini request failed", self.name);
            ctx.send_upstream(FrameEnum::Error(ErrorFrame::non_fatal(e.to_string())));
        }

        self.report_usage(usage.into_usage(), ctx);
        ctx.send_downstream(FrameEnum::LLMFullResponseEnd(LLMFullResponseEndFrame::new()));
    }

    async fn stream_response(
        &mut self,
        context: &SharedGoogleContext,
        usage: &mut LLMUsageAccumulator,
        ctx: &ProcessorContext,
    ) -> Result<(), GoogleError> {
        let request = self.build_request(context).await;

        debug!(
            model = %self.model,
            contents = request.contents.len(),
            "Starting Gemini streaming content generation"
        );

        let started = Instant::now();
        let mut stream = self.client.stream_generate_content(&self.model, &request).await?;
        let mut first_chunk = true;

        loop {
            let next = tokio::select! {
                biased;
                _ = ctx.interruption_token().cancelled() => {
                    debug!("{}: interrupted, dropping the rest of the stream", self.name);
                    break;
                }
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk?;

            if first_chunk {
                first_chunk = false;
                self.report_ttfb(started.elapsed().as_secs_f64(), ctx);
            }

            if let Some(meta) = &chunk.usage_metadata {
                usage.record(
                    meta.prompt_token_count,
                    meta.candidates_token_count,
                    meta.total_token_count,
                    meta.cached_content_token_count,
                );
            }

            for candidate in &chunk.candidates {
                self.handle_candidate(candidate, ctx);
            }

            // Let cancellation land between chunks.
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    fn handle_candidate(&self, candidate: &GeminiCandidate, ctx: &ProcessorContext) {
        if candidate.is_safety_refusal() {
            warn!(
                finish_reason = ?candidate.finish_reason,
                "LLM refused to generate content for safety reasons"
            );
        }

        let Some(content) = &candidate.content else {
            return;
        };
        let message = GeminiTranslator.from_vendor(content);

        let mut function_calls = Vec::new();
        for part in message.parts {
            match part {
                Part::Text(text) if !text.is_empty() => {
                    ctx.send_downstream(FrameEnum::LLMText(LLMTextFrame::new(text)));
                }
                Part::FunctionCall { name, args } => function_calls.push(FunctionCallFromLLM {
                    function_name: name,
                    tool_call_id: format!("call_{}", obj_id()),
                    arguments: Value::Object(args),
                }),
                _ => {}
            }
        }

        if !function_calls.is_empty() {
            debug!(count = function_calls.len(), "Emitting FunctionCallsStartedFrame");
            ctx.send_downstream(FrameEnum::FunctionCallsStarted(FunctionCallsStartedFrame::new(
                function_calls,
            )));
        }
    }

    fn report_ttfb(&self, seconds: f64, ctx: &ProcessorContext) {
        debug!(ttfb = seconds, "{}: first chunk", self.name);
        ctx.send_downstream(FrameEnum::Metrics(MetricsFrame::new(vec![MetricsData::Ttfb(
            TTFBMetricsData {
                processor: self.name.clone(),
                model: Some(self.model.clone()),
                value: seconds,
            },
        )])));
    }

    fn report_usage(&self, usage: LLMTokenUsage, ctx: &ProcessorContext) {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "{}: token usage", self.name
        );
        ctx.send_downstream(FrameEnum::Metrics(MetricsFrame::new(vec![MetricsData::LLMUsage(
            LLMUsageMetricsData {
                processor: self.name.clone(),
                model: Some(self.model.clone()),
                value: usage,
            },
        )])));
    }
}

impl fmt::Debug for GoogleLLMService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleLLMService")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("model", &self.model)
            .field("params", &self.params)
            .finish()
    }
}

impl fmt::Display for GoogleLLMService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[async_trait]
impl Processor for GoogleLLMService {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> u64 {
        self.id
    }

    async fn process(&mut self, frame: FrameEnum, direction: FrameDirection, ctx: &ProcessorContext) {
        match frame {
            FrameEnum::LLMContext(f) => self.process_context(f.context, ctx).await,
            FrameEnum::LLMMessages(f) => {
                let context = GoogleLLMContext::from_standard_messages(&f.messages).into_shared();
                self.process_context(context, ctx).await;
            }
            FrameEnum::LLMUpdateSettings(f) => {
                if let Err(e) = self.update_settings(&f.settings) {
                    warn!(error = %e, "{}: rejected settings update", self.name);
                }
            }
            other => ctx.send(other, direction),
        }
    }
}

impl AIService for GoogleLLMService {
    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }

    fn can_generate_metrics(&self) -> bool {
        true
    }
}
