// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Frame enum: a concrete enum over every frame type this crate handles.
//!
//! Processors pattern-match on [`FrameEnum`] instead of downcasting. The
//! variant table below is the single source for the accessor methods and
//! the `From` conversions.

use std::fmt;

use super::*;

macro_rules! frame_enum {
    ($($(#[$meta:meta])* $variant:ident($frame:ident) => $kind:ident,)*) => {
        /// Concrete enum of all frame types in the pipeline.
        #[derive(Debug)]
        pub enum FrameEnum {
            $($(#[$meta])* $variant($frame),)*
        }

        impl FrameEnum {
            /// Access the common frame fields.
            pub fn fields(&self) -> &FrameFields {
                match self {
                    $(Self::$variant(f) => &f.fields,)*
                }
            }

            /// Mutable access to the common frame fields.
            pub fn fields_mut(&mut self) -> &mut FrameFields {
                match self {
                    $(Self::$variant(f) => &mut f.fields,)*
                }
            }

            /// Name of the wrapped frame type.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($frame),)*
                }
            }

            /// Processing category of the wrapped frame.
            pub fn kind(&self) -> FrameKind {
                match self {
                    $(Self::$variant(_) => FrameKind::$kind,)*
                }
            }
        }

        impl fmt::Display for FrameEnum {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant(frame) => fmt::Display::fmt(frame, f),)*
                }
            }
        }

        $(
            impl From<$frame> for FrameEnum {
                fn from(f: $frame) -> Self {
                    FrameEnum::$variant(f)
                }
            }
        )*
    };
}

frame_enum! {
    /// Error notification.
    Error(ErrorFrame) => System,
    /// The user interrupted the bot.
    Interruption(InterruptionFrame) => System,
    /// User turn started.
    UserStartedSpeaking(UserStartedSpeakingFrame) => System,
    /// User turn ended.
    UserStoppedSpeaking(UserStoppedSpeakingFrame) => System,
    /// Computed metrics.
    Metrics(MetricsFrame) => System,
    /// Function calls requested by the model.
    FunctionCallsStarted(FunctionCallsStartedFrame) => System,
    /// Image attachment from the user.
    UserImageRaw(UserImageRawFrame) => System,

    /// Assistant text.
    Text(TextFrame) => Data,
    /// Streamed LLM text delta.
    LLMText(LLMTextFrame) => Data,
    /// User speech transcription fragment.
    Transcription(TranscriptionFrame) => Data,
    /// Result of a tool invocation.
    FunctionCallResult(FunctionCallResultFrame) => Data,
    /// One-shot standard message list.
    LLMMessages(LLMMessagesFrame) => Data,
    /// Messages appended to the shared context.
    LLMMessagesAppend(LLMMessagesAppendFrame) => Data,
    /// Messages replacing the shared context.
    LLMMessagesUpdate(LLMMessagesUpdateFrame) => Data,
    /// Tool definitions.
    LLMSetTools(LLMSetToolsFrame) => Data,
    /// Request to run the LLM on the current context.
    LLMRun(LLMRunFrame) => Data,
    /// The shared context changed.
    LLMContext(LLMContextFrame) => Data,

    /// Start of an LLM response.
    LLMFullResponseStart(LLMFullResponseStartFrame) => Control,
    /// End of an LLM response.
    LLMFullResponseEnd(LLMFullResponseEndFrame) => Control,
    /// Generation settings update.
    LLMUpdateSettings(LLMUpdateSettingsFrame) => Control,
    /// A tool invocation is pending.
    FunctionCallInProgress(FunctionCallInProgressFrame) => Control,
    /// Graceful end of the pipeline.
    End(EndFrame) => Control,
}

impl FrameEnum {
    /// Unique identifier of the wrapped frame.
    pub fn id(&self) -> u64 {
        self.fields().id
    }

    pub fn is_system_frame(&self) -> bool {
        self.kind() == FrameKind::System
    }

    pub fn is_data_frame(&self) -> bool {
        self.kind() == FrameKind::Data
    }

    pub fn is_control_frame(&self) -> bool {
        self.kind() == FrameKind::Control
    }
}
