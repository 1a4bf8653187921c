// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! End-to-end tests for the Gemini context pipeline.
//!
//! The user aggregator, the LLM service and the assistant aggregator are
//! wired by hand; the service talks to a scripted in-memory client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use pipecat_google::frames::*;
use pipecat_google::prelude::*;
use pipecat_google::services::google::client::GenerateContentStream;
use pipecat_google::services::google::types::GenerateContentRequest;

/// Route service logs to the test output. Set `RUST_LOG=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Serves one scripted response per call and records the requests.
#[derive(Debug, Default)]
struct ScriptedGemini {
    responses: Mutex<VecDeque<Vec<Value>>>,
    requests: Mutex<Vec<Value>>,
}

impl ScriptedGemini {
    fn new(responses: Vec<Vec<Value>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::default(),
        })
    }

    fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeminiClient for ScriptedGemini {
    async fn stream_generate_content(
        &self,
        _model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentStream, GoogleError> {
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(request).unwrap());
        let chunks = self.responses.lock().unwrap().pop_front().unwrap_or_default();
        let items: Vec<Result<_, GoogleError>> = chunks
            .into_iter()
            .map(|c| serde_json::from_value(c).map_err(GoogleError::from))
            .collect();
        Ok(stream::iter(items).boxed())
    }
}

/// One processor with its own output channels.
struct Stage<P> {
    processor: P,
    ctx: ProcessorContext,
    down: mpsc::UnboundedReceiver<FrameEnum>,
    up: mpsc::UnboundedReceiver<FrameEnum>,
}

impl<P: Processor> Stage<P> {
    fn new(processor: P) -> Self {
        let (tx, down) = mpsc::unbounded_channel();
        let (utx, up) = mpsc::unbounded_channel();
        Self {
            processor,
            ctx: ProcessorContext::new(tx, utx, CancellationToken::new()),
            down,
            up,
        }
    }

    /// Process one frame and return what came out (downstream, upstream).
    async fn push(
        &mut self,
        frame: impl Into<FrameEnum>,
        direction: FrameDirection,
    ) -> (Vec<FrameEnum>, Vec<FrameEnum>) {
        self.processor.process(frame.into(), direction, &self.ctx).await;
        let down = std::iter::from_fn(|| self.down.try_recv().ok()).collect();
        let up = std::iter::from_fn(|| self.up.try_recv().ok()).collect();
        (down, up)
    }
}

fn names(frames: &[FrameEnum]) -> Vec<&'static str> {
    frames.iter().map(FrameEnum::name).collect()
}

fn text_chunk(text: &str) -> Value {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
}

fn transcription(text: &str) -> TranscriptionFrame {
    TranscriptionFrame::new(text, "user-1", "2026-01-01T00:00:00Z")
}

/// Send `frames` from the LLM service through the assistant aggregator.
async fn feed_assistant(
    assistant: &mut Stage<GoogleAssistantContextAggregator>,
    frames: Vec<FrameEnum>,
) -> (Vec<FrameEnum>, Vec<FrameEnum>) {
    let mut down = Vec::new();
    let mut up = Vec::new();
    for frame in frames {
        let (d, u) = assistant.push(frame, FrameDirection::Downstream).await;
        down.extend(d);
        up.extend(u);
    }
    (down, up)
}

#[tokio::test]
async fn test_spoken_turn_round_trip() {
    init_tracing();
    let client = ScriptedGemini::new(vec![vec![text_chunk("Hel"), text_chunk("lo")]]);
    let context = LLMContext::with_messages(vec![
        StandardMessage::system("Be terse"),
        StandardMessage::assistant("Hi! How can I help?"),
    ]);
    let (user, assistant) = GoogleLLMService::create_context_aggregator(context).into_parts();
    let shared = user.context().clone();

    let mut user = Stage::new(user);
    let mut llm = Stage::new(GoogleLLMService::with_client(client.clone(), "gemini-2.0-flash"));
    let mut assistant = Stage::new(assistant);

    user.push(UserStartedSpeakingFrame::new(), FrameDirection::Downstream).await;
    user.push(transcription("hi"), FrameDirection::Downstream).await;
    let (down, _) = user
        .push(UserStoppedSpeakingFrame::new(), FrameDirection::Downstream)
        .await;
    assert_eq!(names(&down), vec!["LLMContextFrame", "UserStoppedSpeakingFrame"]);

    let mut llm_out = Vec::new();
    for frame in down {
        let (d, _) = llm.push(frame, FrameDirection::Downstream).await;
        llm_out.extend(d);
    }
    let texts: Vec<String> = llm_out
        .iter()
        .filter_map(|f| match f {
            FrameEnum::LLMText(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["Hel", "lo"]);

    let (down, up) = feed_assistant(&mut assistant, llm_out).await;
    assert!(up.is_empty());
    assert_eq!(
        down.iter()
            .filter(|f| matches!(f, FrameEnum::LLMContext(_)))
            .count(),
        1
    );

    let context = shared.lock().await;
    assert_eq!(context.system_message(), Some("Be terse"));
    assert_eq!(
        context.messages(),
        &[
            Message::model_text("Hi! How can I help?"),
            Message::user_text("hi"),
            Message::model_text("Hello"),
        ]
    );

    let requests = client.requests();
    let request = &requests[0];
    assert_eq!(request["systemInstruction"]["parts"][0]["text"], "Be terse");
    assert_eq!(
        request["contents"],
        json!([
            {"role": "model", "parts": [{"text": "Hi! How can I help?"}]},
            {"role": "user", "parts": [{"text": "hi"}]}
        ])
    );
}

#[tokio::test]
async fn test_function_call_round_trip() {
    init_tracing();
    let client = ScriptedGemini::new(vec![
        vec![json!({
            "candidates": [{"content": {"role": "model", "parts": [
                {"functionCall": {"name": "get_weather", "args": {"location": "Paris"}}}
            ]}}]
        })],
        vec![text_chunk("It is sunny in Paris.")],
    ]);
    let mut context = GoogleLLMContext::from_standard_messages(&[StandardMessage::user(
        "Weather in Paris?",
    )]);
    context.set_tools(vec![json!({
        "type": "function",
        "function": {
            "name": "get_weather",
            "description": "Get the weather",
            "parameters": {"type": "object", "properties": {"location": {"type": "string"}}}
        }
    })]);
    let (user, assistant) = GoogleLLMService::create_context_aggregator(context).into_parts();
    let shared = user.context().clone();

    let mut user = Stage::new(user);
    let mut llm = Stage::new(GoogleLLMService::with_client(client.clone(), "gemini-2.0-flash"));
    let mut assistant = Stage::new(assistant);

    // First model call asks for a tool.
    let (down, _) = user.push(LLMRunFrame::new(), FrameDirection::Upstream).await;
    let (llm_out, _) = llm.push(down.into_iter().next().unwrap(), FrameDirection::Downstream).await;
    let call = llm_out
        .iter()
        .find_map(|f| match f {
            FrameEnum::FunctionCallsStarted(f) => Some(f.function_calls[0].clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(call.function_name, "get_weather");
    let (_, up) = feed_assistant(&mut assistant, llm_out).await;
    assert!(up.is_empty());

    // The tool runs and reports back.
    assistant
        .push(
            FunctionCallInProgressFrame::new(&call.function_name, &call.tool_call_id, call.arguments.clone()),
            FrameDirection::Downstream,
        )
        .await;
    let (down, up) = assistant
        .push(
            FunctionCallResultFrame::new(
                &call.function_name,
                &call.tool_call_id,
                call.arguments.clone(),
                json!({"conditions": "sunny"}),
            ),
            FrameDirection::Downstream,
        )
        .await;
    assert_eq!(names(&down), vec!["LLMContextFrame"]);
    assert_eq!(names(&up), vec!["LLMRunFrame"]);

    // The run request travels upstream to the user aggregator.
    let (down, _) = user
        .push(up.into_iter().next().unwrap(), FrameDirection::Upstream)
        .await;
    let (llm_out, _) = llm.push(down.into_iter().next().unwrap(), FrameDirection::Downstream).await;
    feed_assistant(&mut assistant, llm_out).await;

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0]["tools"][0]["functionDeclarations"][0]["name"],
        "get_weather"
    );
    assert_eq!(
        requests[1]["contents"],
        json!([
            {"role": "user", "parts": [{"text": "Weather in Paris?"}]},
            {"role": "model", "parts": [{"functionCall": {"name": "get_weather", "args": {"location": "Paris"}}}]},
            {"role": "user", "parts": [{"functionResponse": {"name": "get_weather", "response": {"conditions": "sunny"}}}]}
        ])
    );

    let context = shared.lock().await;
    assert_eq!(context.messages().len(), 4);
    assert_eq!(context.messages()[3], Message::model_text("It is sunny in Paris."));
}

#[tokio::test]
async fn test_standard_history_survives_translation() {
    init_tracing();
    let history = vec![
        StandardMessage::user("What's the weather?"),
        serde_json::from_value::<StandardMessage>(json!({
            "role": "assistant",
            "tool_calls": [{
                "id": "get_weather",
                "type": "function",
                "function": {"name": "get_weather", "arguments": "{\"location\":\"Paris\"}"}
            }]
        }))
        .unwrap(),
        StandardMessage::tool("get_weather", "{\"temperature\":72}"),
        StandardMessage::assistant("It is 72 degrees."),
    ];

    let mut context = GoogleLLMContext::new();
    context.set_messages(&history);
    assert!(context.messages().iter().all(|m| !m.parts.is_empty()));

    let round_tripped = GoogleLLMContext::from_standard_messages(&context.to_standard_messages());
    assert_eq!(round_tripped.messages(), context.messages());
}

#[tokio::test]
async fn test_system_only_context_becomes_user_turn() {
    init_tracing();
    let context = GoogleLLMContext::from_standard_messages(&[StandardMessage::system("Say hello.")]);
    assert_eq!(context.system_message(), Some("Say hello."));
    assert_eq!(context.messages(), &[Message::user_text("Say hello.")]);
}

#[tokio::test]
async fn test_vendor_failure_keeps_pipeline_alive() {
    init_tracing();
    #[derive(Debug)]
    struct Unreachable;

    #[async_trait]
    impl GeminiClient for Unreachable {
        async fn stream_generate_content(
            &self,
            _model: &str,
            _request: &GenerateContentRequest,
        ) -> Result<GenerateContentStream, GoogleError> {
            Err(GoogleError::Api {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    let (user, assistant) =
        GoogleLLMService::create_context_aggregator(GoogleLLMContext::new()).into_parts();
    let shared = user.context().clone();
    let mut user = Stage::new(user);
    let mut llm = Stage::new(GoogleLLMService::with_client(Arc::new(Unreachable), ""));
    let mut assistant = Stage::new(assistant);

    user.push(transcription("hello?"), FrameDirection::Downstream).await;
    let (down, _) = user
        .push(UserStoppedSpeakingFrame::new(), FrameDirection::Downstream)
        .await;
    let (llm_out, llm_up) = llm
        .push(down.into_iter().next().unwrap(), FrameDirection::Downstream)
        .await;

    assert_eq!(
        names(&llm_out),
        vec!["LLMFullResponseStartFrame", "MetricsFrame", "LLMFullResponseEndFrame"]
    );
    assert!(matches!(llm_up.as_slice(), [FrameEnum::Error(e)] if e.error.contains("503")));

    let (down, up) = feed_assistant(&mut assistant, llm_out).await;
    assert_eq!(names(&down), vec!["MetricsFrame"]);
    assert!(up.is_empty());
    assert_eq!(shared.lock().await.messages(), &[Message::user_text("hello?")]);
}
