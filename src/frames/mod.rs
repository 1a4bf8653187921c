// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Frame definitions for the Gemini conversation pipeline.
//!
//! Every event that crosses a processor boundary is one of the structs below,
//! wrapped in [`FrameEnum`]. Frames flow **downstream** (from the transport
//! towards the LLM and on to the output) or **upstream** (errors and requests
//! aimed at earlier processors).
//!
//! # Frame categories
//!
//! - **System**: high priority, never discarded by an interruption.
//! - **Data**: ordered content, discarded by an interruption.
//! - **Control**: ordered signals such as response boundaries.

pub mod frame_enum;
pub use frame_enum::FrameEnum;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::processors::aggregators::llm_context::StandardMessage;
use crate::services::google::context::SharedGoogleContext;
use crate::utils::base_object::obj_id;

/// Format a presentation timestamp (nanoseconds) to a human-readable string.
pub fn format_pts(pts: Option<u64>) -> String {
    match pts {
        Some(ns) => format!("{}.{:09}", ns / 1_000_000_000, ns % 1_000_000_000),
        None => "None".to_string(),
    }
}

/// Categorizes a frame into one of the primary processing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    /// High-priority frame, not affected by interruptions.
    System,
    /// Ordered content, cancelled by interruptions.
    Data,
    /// Ordered control signal, cancelled by interruptions.
    Control,
}

// ---------------------------------------------------------------------------
// Embedded payloads
// ---------------------------------------------------------------------------

/// Raw PCM audio carried by audio frames (16-bit signed little-endian).
#[derive(Debug, Clone)]
pub struct AudioRawData {
    pub audio: Vec<u8>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub num_channels: u16,
}

impl AudioRawData {
    pub fn new(audio: Vec<u8>, sample_rate: u32, num_channels: u16) -> Self {
        Self {
            audio,
            sample_rate,
            num_channels,
        }
    }
}

/// Raw, uncompressed image pixels.
#[derive(Debug, Clone)]
pub struct ImageRawData {
    /// Pixel bytes, row-major.
    pub image: Vec<u8>,
    /// Dimensions as (width, height).
    pub size: (u32, u32),
    /// Pixel layout: `"RGB"`, `"RGBA"` or `"L"`. `None` means RGB.
    pub format: Option<String>,
}

/// A function call requested by the model.
#[derive(Debug, Clone)]
pub struct FunctionCallFromLLM {
    /// Name of the function to call.
    pub function_name: String,
    /// Identifier the executor echoes back in its result.
    pub tool_call_id: String,
    /// Arguments as a JSON object.
    pub arguments: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Common fields
// ---------------------------------------------------------------------------

/// Fields shared by every frame struct.
#[derive(Debug, Clone)]
pub struct FrameFields {
    pub id: u64,
    pub pts: Option<u64>,
}

impl FrameFields {
    /// Create fields carrying a fresh unique ID.
    pub fn new() -> Self {
        Self {
            id: obj_id(),
            pts: None,
        }
    }
}

impl Default for FrameFields {
    fn default() -> Self {
        Self::new()
    }
}

/// Display implementation showing just the frame name.
macro_rules! impl_frame_display_simple {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", stringify!($name))
            }
        }
    };
}

/// Declares a frame struct with only `fields`, plus `new()`/`Default`.
macro_rules! declare_simple_frame {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $name {
            pub fields: FrameFields,
        }
        impl $name {
            pub fn new() -> Self {
                Self { fields: FrameFields::new() }
            }
        }
        impl_frame_display_simple!($name);
    };
}

// =========================================================================
// SYSTEM FRAMES
// =========================================================================

/// Error notification, usually pushed upstream.
#[derive(Debug)]
pub struct ErrorFrame {
    pub fields: FrameFields,
    /// Description of the error.
    pub error: String,
    /// Whether the error requires shutting the pipeline down.
    pub fatal: bool,
}

impl ErrorFrame {
    pub fn new(error: impl Into<String>, fatal: bool) -> Self {
        Self {
            fields: FrameFields::new(),
            error: error.into(),
            fatal,
        }
    }

    /// Convenience constructor for non-fatal errors.
    pub fn non_fatal(error: impl Into<String>) -> Self {
        Self::new(error, false)
    }
}

impl fmt::Display for ErrorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorFrame(error: {}, fatal: {})", self.error, self.fatal)
    }
}

declare_simple_frame!(
    /// The user barged in: in-flight output should stop.
    InterruptionFrame
);

declare_simple_frame!(
    /// User turn started.
    UserStartedSpeakingFrame
);

declare_simple_frame!(
    /// User turn ended; the user aggregator flushes on this.
    UserStoppedSpeakingFrame
);

/// Metrics computed by a processor.
#[derive(Debug)]
pub struct MetricsFrame {
    pub fields: FrameFields,
    pub data: Vec<crate::metrics::MetricsData>,
}

impl MetricsFrame {
    pub fn new(data: Vec<crate::metrics::MetricsData>) -> Self {
        Self {
            fields: FrameFields::new(),
            data,
        }
    }
}

impl_frame_display_simple!(MetricsFrame);

/// Function calls the model asked for, handed to the tool executor.
#[derive(Debug)]
pub struct FunctionCallsStartedFrame {
    pub fields: FrameFields,
    pub function_calls: Vec<FunctionCallFromLLM>,
}

impl FunctionCallsStartedFrame {
    pub fn new(function_calls: Vec<FunctionCallFromLLM>) -> Self {
        Self {
            fields: FrameFields::new(),
            function_calls,
        }
    }
}

impl fmt::Display for FunctionCallsStartedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .function_calls
            .iter()
            .map(|c| c.function_name.as_str())
            .collect();
        write!(f, "FunctionCallsStartedFrame(calls: {:?})", names)
    }
}

/// An image from a user that should be attached to the conversation.
#[derive(Debug, Clone)]
pub struct UserImageRawFrame {
    pub fields: FrameFields,
    pub image: ImageRawData,
    /// Identifier of the user the image belongs to.
    pub user_id: String,
    /// Optional caption sent alongside the image.
    pub text: Option<String>,
    /// Whether the image should be added to the conversation context.
    pub append_to_context: bool,
}

impl UserImageRawFrame {
    pub fn new(image: ImageRawData, user_id: impl Into<String>) -> Self {
        Self {
            fields: FrameFields::new(),
            image,
            user_id: user_id.into(),
            text: None,
            append_to_context: true,
        }
    }

    /// Attach a caption to the image.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl fmt::Display for UserImageRawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UserImageRawFrame(user: {}, size: {}x{}, format: {:?})",
            self.user_id, self.image.size.0, self.image.size.1, self.image.format
        )
    }
}

// =========================================================================
// DATA FRAMES
// =========================================================================

/// Assistant text flowing through the pipeline.
#[derive(Debug, Clone)]
pub struct TextFrame {
    pub fields: FrameFields,
    pub text: String,
    /// Whether this text should be appended to the LLM context.
    pub append_to_context: bool,
}

impl TextFrame {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            fields: FrameFields::new(),
            text: text.into(),
            append_to_context: true,
        }
    }
}

impl From<&str> for TextFrame {
    fn from(text: &str) -> Self {
        TextFrame::new(text)
    }
}

impl fmt::Display for TextFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TextFrame(pts: {}, text: [{}])",
            format_pts(self.fields.pts),
            self.text
        )
    }
}

/// A text delta streamed by the LLM service.
#[derive(Debug, Clone)]
pub struct LLMTextFrame {
    pub fields: FrameFields,
    pub text: String,
    /// Whether this text should be appended to the LLM context.
    pub append_to_context: bool,
}

impl LLMTextFrame {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            fields: FrameFields::new(),
            text: text.into(),
            append_to_context: true,
        }
    }
}

impl fmt::Display for LLMTextFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLMTextFrame(pts: {}, text: [{}])",
            format_pts(self.fields.pts),
            self.text
        )
    }
}

/// A fragment of transcribed user speech.
#[derive(Debug, Clone)]
pub struct TranscriptionFrame {
    pub fields: FrameFields,
    pub text: String,
    /// Identifier for the user who spoke.
    pub user_id: String,
    /// When the transcription occurred.
    pub timestamp: String,
    pub language: Option<String>,
}

impl TranscriptionFrame {
    pub fn new(
        text: impl Into<String>,
        user_id: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            fields: FrameFields::new(),
            text: text.into(),
            user_id: user_id.into(),
            timestamp: timestamp.into(),
            language: None,
        }
    }
}

impl fmt::Display for TranscriptionFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TranscriptionFrame(user: {}, text: [{}], language: {:?}, timestamp: {})",
            self.user_id, self.text, self.language, self.timestamp
        )
    }
}

/// Outcome of a tool invocation, delivered to the assistant aggregator.
#[derive(Debug, Clone)]
pub struct FunctionCallResultFrame {
    pub fields: FrameFields,
    pub function_name: String,
    pub tool_call_id: String,
    /// Arguments the function was called with (a JSON object).
    pub arguments: serde_json::Value,
    /// What the function returned. `Null` means there is nothing to record.
    pub result: serde_json::Value,
}

impl FunctionCallResultFrame {
    pub fn new(
        function_name: impl Into<String>,
        tool_call_id: impl Into<String>,
        arguments: serde_json::Value,
        result: serde_json::Value,
    ) -> Self {
        Self {
            fields: FrameFields::new(),
            function_name: function_name.into(),
            tool_call_id: tool_call_id.into(),
            arguments,
            result,
        }
    }
}

impl fmt::Display for FunctionCallResultFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FunctionCallResultFrame(function: {}, tool_call_id: {})",
            self.function_name, self.tool_call_id
        )
    }
}

/// A one-shot conversation in standard message shape, run as-is.
#[derive(Debug)]
pub struct LLMMessagesFrame {
    pub fields: FrameFields,
    pub messages: Vec<StandardMessage>,
}

impl LLMMessagesFrame {
    pub fn new(messages: Vec<StandardMessage>) -> Self {
        Self {
            fields: FrameFields::new(),
            messages,
        }
    }
}

impl_frame_display_simple!(LLMMessagesFrame);

/// Standard-shape messages to append to the shared context.
#[derive(Debug)]
pub struct LLMMessagesAppendFrame {
    pub fields: FrameFields,
    pub messages: Vec<StandardMessage>,
    /// Whether the update should trigger an LLM run.
    pub run_llm: bool,
}

impl LLMMessagesAppendFrame {
    pub fn new(messages: Vec<StandardMessage>) -> Self {
        Self {
            fields: FrameFields::new(),
            messages,
            run_llm: false,
        }
    }
}

impl_frame_display_simple!(LLMMessagesAppendFrame);

/// Standard-shape messages replacing the shared context.
#[derive(Debug)]
pub struct LLMMessagesUpdateFrame {
    pub fields: FrameFields,
    pub messages: Vec<StandardMessage>,
    /// Whether the update should trigger an LLM run.
    pub run_llm: bool,
}

impl LLMMessagesUpdateFrame {
    pub fn new(messages: Vec<StandardMessage>) -> Self {
        Self {
            fields: FrameFields::new(),
            messages,
            run_llm: false,
        }
    }
}

impl_frame_display_simple!(LLMMessagesUpdateFrame);

/// Tool definitions for function calling. An empty list clears them.
#[derive(Debug)]
pub struct LLMSetToolsFrame {
    pub fields: FrameFields,
    pub tools: Vec<serde_json::Value>,
}

impl LLMSetToolsFrame {
    pub fn new(tools: Vec<serde_json::Value>) -> Self {
        Self {
            fields: FrameFields::new(),
            tools,
        }
    }
}

impl_frame_display_simple!(LLMSetToolsFrame);

declare_simple_frame!(
    /// Ask the user aggregator to run the LLM on the current context.
    LLMRunFrame
);

/// The shared context changed and should be sent to the model.
#[derive(Debug, Clone)]
pub struct LLMContextFrame {
    pub fields: FrameFields,
    pub context: SharedGoogleContext,
}

impl LLMContextFrame {
    pub fn new(context: SharedGoogleContext) -> Self {
        Self {
            fields: FrameFields::new(),
            context,
        }
    }
}

impl_frame_display_simple!(LLMContextFrame);

// =========================================================================
// CONTROL FRAMES
// =========================================================================

declare_simple_frame!(
    /// Start of an LLM response.
    LLMFullResponseStartFrame
);

declare_simple_frame!(
    /// End of an LLM response. Always emitted, even after a failure.
    LLMFullResponseEndFrame
);

declare_simple_frame!(
    /// Graceful end of the pipeline.
    EndFrame
);

/// Runtime update of LLM generation settings.
#[derive(Debug)]
pub struct LLMUpdateSettingsFrame {
    pub fields: FrameFields,
    pub settings: HashMap<String, serde_json::Value>,
}

impl LLMUpdateSettingsFrame {
    pub fn new(settings: HashMap<String, serde_json::Value>) -> Self {
        Self {
            fields: FrameFields::new(),
            settings,
        }
    }
}

impl_frame_display_simple!(LLMUpdateSettingsFrame);

/// A tool invocation has been dispatched and its result is pending.
#[derive(Debug, Clone)]
pub struct FunctionCallInProgressFrame {
    pub fields: FrameFields,
    pub function_name: String,
    pub tool_call_id: String,
    pub arguments: serde_json::Value,
}

impl FunctionCallInProgressFrame {
    pub fn new(
        function_name: impl Into<String>,
        tool_call_id: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            fields: FrameFields::new(),
            function_name: function_name.into(),
            tool_call_id: tool_call_id.into(),
            arguments,
        }
    }
}

impl_frame_display_simple!(FunctionCallInProgressFrame);
