// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Common re-exports.
//!
//! ```
//! use pipecat_google::prelude::*;
//! ```

pub use std::sync::Arc;

pub use crate::frames::{
    EndFrame, ErrorFrame, FrameEnum, FrameKind, FunctionCallInProgressFrame,
    FunctionCallResultFrame, FunctionCallsStartedFrame, InterruptionFrame, LLMContextFrame,
    LLMFullResponseEndFrame, LLMFullResponseStartFrame, LLMMessagesAppendFrame,
    LLMMessagesFrame, LLMMessagesUpdateFrame, LLMRunFrame, LLMSetToolsFrame, LLMTextFrame,
    LLMUpdateSettingsFrame, MetricsFrame, TextFrame, TranscriptionFrame, UserImageRawFrame,
    UserStartedSpeakingFrame, UserStoppedSpeakingFrame,
};

pub use crate::metrics::{LLMTokenUsage, MetricsData};
pub use crate::processors::aggregators::llm_context::{LLMContext, StandardMessage};
pub use crate::processors::aggregators::llm_message::{Message, Part, Role};
pub use crate::processors::{FrameDirection, Processor, ProcessorContext};
pub use crate::services::google::{
    GeminiClient, GeminiHttpClient, GoogleAssistantContextAggregator, GoogleClientConfig,
    GoogleContextAggregatorPair, GoogleError, GoogleLLMContext, GoogleLLMParams,
    GoogleLLMService, GoogleUserContextAggregator, SharedGoogleContext, UpgradeToGoogle,
};
pub use crate::services::AIService;
