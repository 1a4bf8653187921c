// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! User and assistant context aggregators for Gemini.
//!
//! The two aggregators share one [`GoogleLLMContext`]. The user side turns
//! transcription fragments into user turns; the assistant side turns streamed
//! model output, tool results and image attachments into model turns. Each
//! commit ends with an [`LLMContextFrame`] pushed downstream so the LLM
//! service sees the new history.
//!
//! When the assistant side decides the model should run again (a tool
//! result with nothing else in flight, or a fresh image), it sends an
//! [`LLMRunFrame`] upstream; the user aggregator answers with a context frame
//! of its own. This keeps the model invocation on the user side of the
//! pipeline, where every other invocation starts.

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::frames::{
    FrameEnum, FunctionCallResultFrame, LLMContextFrame, LLMRunFrame, UserImageRawFrame,
};
use crate::processors::aggregators::llm_message::{
    arguments_object, response_object, Message, Part, Role,
};
use crate::processors::{FrameDirection, Processor, ProcessorContext};
use crate::services::google::context::{GoogleLLMContext, SharedGoogleContext, UpgradeToGoogle};
use crate::services::google::error::GoogleError;
use crate::utils::base_object::obj_id;

fn push_context_frame(context: &SharedGoogleContext, ctx: &ProcessorContext) {
    ctx.send_downstream(FrameEnum::LLMContext(LLMContextFrame::new(context.clone())));
}

// ---------------------------------------------------------------------------
// User aggregator
// ---------------------------------------------------------------------------

/// Collects user speech into user turns.
pub struct GoogleUserContextAggregator {
    id: u64,
    context: SharedGoogleContext,
    aggregation: String,
    user_speaking: bool,
}

impl GoogleUserContextAggregator {
    pub fn new(context: SharedGoogleContext) -> Self {
        Self {
            id: obj_id(),
            context,
            aggregation: String::new(),
            user_speaking: false,
        }
    }

    pub fn context(&self) -> &SharedGoogleContext {
        &self.context
    }

    /// Text received since the last commit.
    pub fn aggregation(&self) -> &str {
        &self.aggregation
    }

    fn reset(&mut self) {
        self.aggregation.clear();
        self.user_speaking = false;
    }

    /// Commit the buffered user text as a user turn.
    ///
    /// The buffer is taken before the context is touched, so a transcription
    /// that arrives while the turn is being committed starts a new buffer
    /// instead of being dropped or committed twice.
    async fn push_aggregation(&mut self, ctx: &ProcessorContext) {
        if self.aggregation.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.aggregation);
        {
            let mut context = self.context.lock().await;
            context.add_message(Message::user_text(text));
        }
        push_context_frame(&self.context, ctx);
        self.reset();
    }
}

impl fmt::Debug for GoogleUserContextAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleUserContextAggregator")
            .field("id", &self.id)
            .field("user_speaking", &self.user_speaking)
            .field("aggregation_len", &self.aggregation.len())
            .finish()
    }
}

impl fmt::Display for GoogleUserContextAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[async_trait]
impl Processor for GoogleUserContextAggregator {
    fn name(&self) -> &str {
        "GoogleUserContextAggregator"
    }

    fn id(&self) -> u64 {
        self.id
    }

    async fn process(&mut self, frame: FrameEnum, direction: FrameDirection, ctx: &ProcessorContext) {
        match frame {
            FrameEnum::UserStartedSpeaking(f) => {
                self.user_speaking = true;
                ctx.send(FrameEnum::UserStartedSpeaking(f), direction);
            }
            FrameEnum::UserStoppedSpeaking(f) => {
                self.push_aggregation(ctx).await;
                ctx.send(FrameEnum::UserStoppedSpeaking(f), direction);
            }
            FrameEnum::Transcription(t) => {
                self.aggregation.push_str(&t.text);
            }
            FrameEnum::LLMRun(_) => {
                push_context_frame(&self.context, ctx);
            }
            FrameEnum::LLMMessagesAppend(f) => {
                self.context.lock().await.add_standard_messages(&f.messages);
                if f.run_llm {
                    push_context_frame(&self.context, ctx);
                }
            }
            FrameEnum::LLMMessagesUpdate(f) => {
                self.context.lock().await.set_messages(&f.messages);
                if f.run_llm {
                    push_context_frame(&self.context, ctx);
                }
            }
            FrameEnum::LLMSetTools(f) => {
                self.context.lock().await.set_tools(f.tools);
            }
            FrameEnum::Interruption(f) => {
                self.user_speaking = false;
                ctx.send(FrameEnum::Interruption(f), direction);
            }
            other => ctx.send(other, direction),
        }
    }
}

// ---------------------------------------------------------------------------
// Assistant aggregator
// ---------------------------------------------------------------------------

/// A finished tool call waiting to be committed.
#[derive(Debug, Clone)]
struct PendingFunctionResult {
    name: String,
    arguments: serde_json::Value,
    result: serde_json::Value,
}

/// Collects model output, tool results and images into the shared context.
pub struct GoogleAssistantContextAggregator {
    id: u64,
    context: SharedGoogleContext,
    aggregation: String,
    /// Nesting depth of response start/end frames.
    response_depth: u32,
    function_calls_in_progress: usize,
    pending_function_result: Option<PendingFunctionResult>,
    pending_image: Option<UserImageRawFrame>,
}

impl GoogleAssistantContextAggregator {
    pub fn new(context: SharedGoogleContext) -> Self {
        Self {
            id: obj_id(),
            context,
            aggregation: String::new(),
            response_depth: 0,
            function_calls_in_progress: 0,
            pending_function_result: None,
            pending_image: None,
        }
    }

    pub fn context(&self) -> &SharedGoogleContext {
        &self.context
    }

    /// Model text received since the last commit.
    pub fn aggregation(&self) -> &str {
        &self.aggregation
    }

    /// Number of dispatched tool calls whose results have not arrived.
    pub fn function_calls_in_progress(&self) -> usize {
        self.function_calls_in_progress
    }

    fn reset(&mut self) {
        self.aggregation.clear();
        self.pending_function_result = None;
        self.pending_image = None;
    }

    fn set_pending_function_result(&mut self, frame: FunctionCallResultFrame) {
        if let Some(previous) = &self.pending_function_result {
            warn!(
                previous = %previous.name,
                function = %frame.function_name,
                "Replacing uncommitted function call result"
            );
        }
        self.pending_function_result = Some(PendingFunctionResult {
            name: frame.function_name,
            arguments: frame.arguments,
            result: frame.result,
        });
    }

    /// Build the turns for one commit and whether the model should run again.
    ///
    /// Nothing is written to the context here, so a failure leaves it
    /// untouched.
    fn build_turns(
        &self,
        text: String,
        function_result: Option<PendingFunctionResult>,
        image: Option<UserImageRawFrame>,
    ) -> Result<(Vec<Message>, bool), GoogleError> {
        let mut turns = Vec::new();
        let mut run_llm = false;

        if let Some(result) = function_result {
            let args = arguments_object(&result.name, result.arguments)?;
            turns.push(Message::new(
                Role::Model,
                vec![Part::FunctionCall {
                    name: result.name.clone(),
                    args,
                }],
            ));
            turns.push(Message::new(
                Role::User,
                vec![Part::FunctionResponse {
                    name: result.name,
                    response: response_object(result.result),
                }],
            ));
            run_llm = self.function_calls_in_progress == 0;
        } else if !text.is_empty() {
            turns.push(Message::model_text(text));
        }

        if let Some(frame) = image {
            turns.push(GoogleLLMContext::image_message(
                frame.image.format.as_deref(),
                frame.image.size,
                &frame.image.image,
                frame.text.as_deref(),
            )?);
            run_llm = true;
        }

        Ok((turns, run_llm))
    }

    /// Commit whatever has been collected.
    ///
    /// Failures are logged and the turn is discarded; they never reach the
    /// caller.
    async fn push_aggregation(&mut self, ctx: &ProcessorContext) {
        if self.aggregation.is_empty()
            && self.pending_function_result.is_none()
            && self.pending_image.is_none()
        {
            return;
        }

        let text = std::mem::take(&mut self.aggregation);
        let function_result = self.pending_function_result.take();
        let image = self.pending_image.take();
        self.reset();

        let (turns, run_llm) = match self.build_turns(text, function_result, image) {
            Ok(built) => built,
            Err(e) => {
                error!(error = %e, "{}: discarding assistant turn", self.name());
                return;
            }
        };

        if !turns.is_empty() {
            self.context.lock().await.add_messages(turns);
        }
        if run_llm {
            ctx.send_upstream(FrameEnum::LLMRun(LLMRunFrame::new()));
        }
        push_context_frame(&self.context, ctx);
        debug!(run_llm, "{}: pushed assistant aggregation", self.name());
    }
}

impl fmt::Debug for GoogleAssistantContextAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleAssistantContextAggregator")
            .field("id", &self.id)
            .field("response_depth", &self.response_depth)
            .field("aggregation_len", &self.aggregation.len())
            .field("function_calls_in_progress", &self.function_calls_in_progress)
            .finish()
    }
}

impl fmt::Display for GoogleAssistantContextAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[async_trait]
impl Processor for GoogleAssistantContextAggregator {
    fn name(&self) -> &str {
        "GoogleAssistantContextAggregator"
    }

    fn id(&self) -> u64 {
        self.id
    }

    async fn process(&mut self, frame: FrameEnum, direction: FrameDirection, ctx: &ProcessorContext) {
        match frame {
            FrameEnum::LLMFullResponseStart(_) => {
                self.response_depth += 1;
            }
            FrameEnum::LLMFullResponseEnd(_) => {
                self.response_depth = self.response_depth.saturating_sub(1);
                if self.response_depth == 0 {
                    self.push_aggregation(ctx).await;
                }
            }
            FrameEnum::Text(t) => {
                if self.response_depth > 0 && t.append_to_context {
                    self.aggregation.push_str(&t.text);
                }
                ctx.send(FrameEnum::Text(t), direction);
            }
            FrameEnum::LLMText(t) => {
                if self.response_depth > 0 && t.append_to_context {
                    self.aggregation.push_str(&t.text);
                }
                ctx.send(FrameEnum::LLMText(t), direction);
            }
            FrameEnum::FunctionCallInProgress(f) => {
                debug!(function = %f.function_name, tool_call_id = %f.tool_call_id, "Function call in progress");
                self.function_calls_in_progress += 1;
            }
            FrameEnum::FunctionCallResult(f) => {
                debug!(function = %f.function_name, tool_call_id = %f.tool_call_id, "Function call result");
                self.function_calls_in_progress = self.function_calls_in_progress.saturating_sub(1);
                if !f.result.is_null() {
                    self.set_pending_function_result(f);
                }
                self.push_aggregation(ctx).await;
            }
            FrameEnum::UserImageRaw(f) => {
                if f.append_to_context {
                    self.pending_image = Some(f);
                    self.push_aggregation(ctx).await;
                } else {
                    ctx.send(FrameEnum::UserImageRaw(f), direction);
                }
            }
            FrameEnum::Interruption(f) => {
                self.push_aggregation(ctx).await;
                self.response_depth = 0;
                self.reset();
                ctx.send(FrameEnum::Interruption(f), direction);
            }
            other => ctx.send(other, direction),
        }
    }
}

// ---------------------------------------------------------------------------
// Pair
// ---------------------------------------------------------------------------

/// User and assistant aggregators sharing one context.
///
/// Place the user aggregator after speech-to-text and before the LLM service,
/// and the assistant aggregator after the LLM service.
pub struct GoogleContextAggregatorPair {
    user: GoogleUserContextAggregator,
    assistant: GoogleAssistantContextAggregator,
}

impl GoogleContextAggregatorPair {
    pub fn new(context: impl UpgradeToGoogle) -> Self {
        let context = context.upgrade_to_google().into_shared();
        Self {
            user: GoogleUserContextAggregator::new(context.clone()),
            assistant: GoogleAssistantContextAggregator::new(context),
        }
    }

    pub fn user(&mut self) -> &mut GoogleUserContextAggregator {
        &mut self.user
    }

    pub fn assistant(&mut self) -> &mut GoogleAssistantContextAggregator {
        &mut self.assistant
    }

    pub fn context(&self) -> &SharedGoogleContext {
        self.user.context()
    }

    /// Split into the two aggregators.
    pub fn into_parts(self) -> (GoogleUserContextAggregator, GoogleAssistantContextAggregator) {
        (self.user, self.assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{
        FunctionCallInProgressFrame, ImageRawData, InterruptionFrame, LLMFullResponseEndFrame,
        LLMFullResponseStartFrame, LLMMessagesAppendFrame, LLMMessagesUpdateFrame,
        LLMSetToolsFrame, LLMTextFrame, TextFrame, TranscriptionFrame, UserStartedSpeakingFrame,
        UserStoppedSpeakingFrame,
    };
    use crate::processors::aggregators::llm_context::{LLMContext, StandardMessage};
    use serde_json::json;
    use tokio::sync::mpsc;

    struct Harness {
        ctx: ProcessorContext,
        down: mpsc::UnboundedReceiver<FrameEnum>,
        up: mpsc::UnboundedReceiver<FrameEnum>,
    }

    impl Harness {
        fn new() -> Self {
            let (tx, down) = mpsc::unbounded_channel();
            let (utx, up) = mpsc::unbounded_channel();
            Self {
                ctx: ProcessorContext::for_test(tx, utx),
                down,
                up,
            }
        }

        fn drain_down(&mut self) -> Vec<FrameEnum> {
            std::iter::from_fn(|| self.down.try_recv().ok()).collect()
        }

        fn drain_up(&mut self) -> Vec<FrameEnum> {
            std::iter::from_fn(|| self.up.try_recv().ok()).collect()
        }
    }

    fn count_context_frames(frames: &[FrameEnum]) -> usize {
        frames
            .iter()
            .filter(|f| matches!(f, FrameEnum::LLMContext(_)))
            .count()
    }

    fn transcription(text: &str) -> FrameEnum {
        TranscriptionFrame::new(text, "user-1", "2026-01-01T00:00:00Z").into()
    }

    async fn send(p: &mut impl Processor, h: &Harness, frame: impl Into<FrameEnum>) {
        p.process(frame.into(), FrameDirection::Downstream, &h.ctx).await;
    }

    #[tokio::test]
    async fn test_user_turn_is_committed_on_stop() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        let user = pair.user();

        send(user, &h, UserStartedSpeakingFrame::new()).await;
        send(user, &h, transcription("Hello ")).await;
        send(user, &h, transcription("world")).await;
        assert_eq!(user.aggregation(), "Hello world");
        send(user, &h, UserStoppedSpeakingFrame::new()).await;

        assert_eq!(user.aggregation(), "");
        let frames = h.drain_down();
        assert_eq!(count_context_frames(&frames), 1);
        assert!(matches!(frames.last(), Some(FrameEnum::UserStoppedSpeaking(_))));

        let context = pair.context().lock().await;
        assert_eq!(context.messages(), &[Message::user_text("Hello world")]);
    }

    #[tokio::test]
    async fn test_user_stop_without_text_is_noop() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        send(pair.user(), &h, UserStoppedSpeakingFrame::new()).await;

        assert_eq!(count_context_frames(&h.drain_down()), 0);
        assert!(pair.context().lock().await.messages().is_empty());
    }

    #[tokio::test]
    async fn test_user_run_request_pushes_context() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        pair.user()
            .process(LLMRunFrame::new().into(), FrameDirection::Upstream, &h.ctx)
            .await;
        assert_eq!(count_context_frames(&h.drain_down()), 1);
        assert!(h.drain_up().is_empty());
    }

    #[tokio::test]
    async fn test_user_append_and_update_messages() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();

        let mut append = LLMMessagesAppendFrame::new(vec![
            StandardMessage::system("Be brief."),
            StandardMessage::user("hi"),
        ]);
        append.run_llm = true;
        send(pair.user(), &h, append).await;
        assert_eq!(count_context_frames(&h.drain_down()), 1);
        {
            let context = pair.context().lock().await;
            assert_eq!(context.system_message(), Some("Be brief."));
            assert_eq!(context.messages().len(), 1);
        }

        send(
            pair.user(),
            &h,
            LLMMessagesUpdateFrame::new(vec![StandardMessage::assistant("fresh")]),
        )
        .await;
        assert_eq!(count_context_frames(&h.drain_down()), 0);
        let context = pair.context().lock().await;
        assert_eq!(context.system_message(), None);
        assert_eq!(context.messages(), &[Message::model_text("fresh")]);
    }

    #[tokio::test]
    async fn test_user_set_tools() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let h = Harness::new();
        send(pair.user(), &h, LLMSetToolsFrame::new(vec![json!({"name": "end_call"})])).await;
        assert_eq!(pair.context().lock().await.tools().map(|t| t.len()), Some(1));
        send(pair.user(), &h, LLMSetToolsFrame::new(Vec::new())).await;
        assert!(pair.context().lock().await.tools().is_none());
    }

    #[tokio::test]
    async fn test_assistant_commits_streamed_text() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        let assistant = pair.assistant();

        send(assistant, &h, LLMFullResponseStartFrame::new()).await;
        send(assistant, &h, LLMTextFrame::new("I am ")).await;
        send(assistant, &h, TextFrame::new("helpful.")).await;
        send(assistant, &h, LLMFullResponseEndFrame::new()).await;

        let frames = h.drain_down();
        assert_eq!(count_context_frames(&frames), 1);
        assert_eq!(
            frames.iter().filter(|f| matches!(f, FrameEnum::LLMText(_) | FrameEnum::Text(_))).count(),
            2
        );
        assert!(h.drain_up().is_empty());
        assert_eq!(
            pair.context().lock().await.messages(),
            &[Message::model_text("I am helpful.")]
        );
    }

    #[tokio::test]
    async fn test_assistant_ignores_text_outside_response() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        send(pair.assistant(), &h, TextFrame::new("stray")).await;
        send(pair.assistant(), &h, LLMFullResponseEndFrame::new()).await;

        assert_eq!(pair.assistant().aggregation(), "");
        assert_eq!(count_context_frames(&h.drain_down()), 0);
    }

    #[tokio::test]
    async fn test_function_result_commits_call_and_response() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        let assistant = pair.assistant();

        send(
            assistant,
            &h,
            FunctionCallInProgressFrame::new("get_weather", "call_1", json!({"location": "Paris"})),
        )
        .await;
        assert_eq!(assistant.function_calls_in_progress(), 1);
        send(
            assistant,
            &h,
            FunctionCallResultFrame::new(
                "get_weather",
                "call_1",
                json!({"location": "Paris"}),
                json!("sunny"),
            ),
        )
        .await;
        assert_eq!(assistant.function_calls_in_progress(), 0);

        assert_eq!(count_context_frames(&h.drain_down()), 1);
        let up = h.drain_up();
        assert_eq!(up.len(), 1);
        assert!(matches!(up[0], FrameEnum::LLMRun(_)));

        let context = pair.context().lock().await;
        let messages = context.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::Model);
        assert!(matches!(&messages[0].parts[0], Part::FunctionCall { name, args } if name == "get_weather" && args["location"] == "Paris"));
        assert!(matches!(&messages[1].parts[0], Part::FunctionResponse { response, .. } if response["response"] == "sunny"));
    }

    #[tokio::test]
    async fn test_run_waits_for_last_parallel_call() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        let assistant = pair.assistant();

        for id in ["call_1", "call_2"] {
            send(assistant, &h, FunctionCallInProgressFrame::new("lookup", id, json!({}))).await;
        }
        send(
            assistant,
            &h,
            FunctionCallResultFrame::new("lookup", "call_1", json!({}), json!({"n": 1})),
        )
        .await;
        assert!(h.drain_up().is_empty());

        send(
            assistant,
            &h,
            FunctionCallResultFrame::new("lookup", "call_2", json!({}), json!({"n": 2})),
        )
        .await;
        let up = h.drain_up();
        assert!(matches!(up.as_slice(), [FrameEnum::LLMRun(_)]));
        assert_eq!(count_context_frames(&h.drain_down()), 2);
        assert_eq!(pair.context().lock().await.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_null_result_commits_nothing() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        send(
            pair.assistant(),
            &h,
            FunctionCallResultFrame::new("hang_up", "call_9", json!({}), serde_json::Value::Null),
        )
        .await;
        assert!(h.drain_down().is_empty());
        assert!(h.drain_up().is_empty());
        assert!(pair.context().lock().await.messages().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_arguments_discard_turn() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        send(
            pair.assistant(),
            &h,
            FunctionCallResultFrame::new("f", "call_1", json!([1, 2, 3]), json!("ok")),
        )
        .await;
        assert!(h.drain_down().is_empty());
        assert!(h.drain_up().is_empty());
        assert!(pair.context().lock().await.messages().is_empty());
    }

    #[tokio::test]
    async fn test_image_triggers_run_even_with_calls_in_flight() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        let assistant = pair.assistant();

        send(assistant, &h, FunctionCallInProgressFrame::new("f", "call_1", json!({}))).await;
        let image = ImageRawData {
            image: vec![0u8; 2 * 2 * 3],
            size: (2, 2),
            format: Some("RGB".to_string()),
        };
        send(assistant, &h, UserImageRawFrame::new(image, "user-1").with_text("What is this?")).await;

        assert!(matches!(h.drain_up().as_slice(), [FrameEnum::LLMRun(_)]));
        assert_eq!(count_context_frames(&h.drain_down()), 1);
        let context = pair.context().lock().await;
        let message = &context.messages()[0];
        assert_eq!(message.role, Role::User);
        assert_eq!(message.parts[0], Part::text("What is this?"));
        assert!(matches!(&message.parts[1], Part::InlineBlob { mime_type, .. } if mime_type == "image/jpeg"));
    }

    #[tokio::test]
    async fn test_bad_image_is_discarded() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        let image = ImageRawData {
            image: vec![0u8; 3],
            size: (64, 64),
            format: None,
        };
        send(pair.assistant(), &h, UserImageRawFrame::new(image, "user-1")).await;

        assert!(h.drain_up().is_empty());
        assert!(h.drain_down().is_empty());
        assert!(pair.context().lock().await.messages().is_empty());
    }

    #[tokio::test]
    async fn test_interruption_flushes_partial_response() {
        let mut pair = GoogleContextAggregatorPair::new(GoogleLLMContext::new());
        let mut h = Harness::new();
        let assistant = pair.assistant();

        send(assistant, &h, LLMFullResponseStartFrame::new()).await;
        send(assistant, &h, LLMTextFrame::new("I was say")).await;
        send(assistant, &h, InterruptionFrame::new()).await;
        // A late end frame must not commit anything else.
        send(assistant, &h, LLMFullResponseEndFrame::new()).await;

        let frames = h.drain_down();
        assert_eq!(count_context_frames(&frames), 1);
        assert!(frames.iter().any(|f| matches!(f, FrameEnum::Interruption(_))));
        assert_eq!(
            pair.context().lock().await.messages(),
            &[Message::model_text("I was say")]
        );
    }

    #[tokio::test]
    async fn test_pair_from_generic_context_shares_state() {
        let generic = LLMContext::with_messages(vec![StandardMessage::system("sys")]);
        let pair = GoogleContextAggregatorPair::new(generic);
        let (user, assistant) = pair.into_parts();
        assert!(std::sync::Arc::ptr_eq(user.context(), assistant.context()));
        assert_eq!(user.context().lock().await.system_message(), Some("sys"));
    }
}
