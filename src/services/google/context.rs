// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Conversation context held in canonical form for Gemini.
//!
//! [`GoogleLLMContext`] keeps the turn history as canonical [`Message`]s and
//! the system instruction separately, since Gemini sends it outside the turn
//! list. Standard-shape histories are restructured on the way in; attached
//! media (camera frames, audio clips) are encoded into inline blobs.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::frames::AudioRawData;
use crate::processors::aggregators::llm_context::{LLMContext, StandardMessage};
use crate::processors::aggregators::llm_message::{
    from_standard, from_standard_all, to_standard, FromStandard, Message, Part, Role,
};
use crate::services::google::error::GoogleError;
use crate::services::google::translator::GeminiTranslator;
use crate::services::shared::translator::VendorTranslator;
use crate::services::shared::wav::encode_pcm16_wav;

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// A context shared by the user and assistant aggregators of one pipeline.
pub type SharedGoogleContext = Arc<Mutex<GoogleLLMContext>>;

/// Conversation state for Gemini requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoogleLLMContext {
    messages: Vec<Message>,
    system_message: Option<String>,
    tools: Option<Vec<Value>>,
}

impl GoogleLLMContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a standard-shape history.
    pub fn from_standard_messages(messages: &[StandardMessage]) -> Self {
        let mut context = Self::new();
        context.set_messages(messages);
        context
    }

    /// Wrap the context for sharing between aggregators.
    pub fn into_shared(self) -> SharedGoogleContext {
        Arc::new(Mutex::new(self))
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system_message(&self) -> Option<&str> {
        self.system_message.as_deref()
    }

    pub fn set_system_message(&mut self, system_message: Option<String>) {
        self.system_message = system_message;
    }

    pub fn tools(&self) -> Option<&[Value]> {
        self.tools.as_deref()
    }

    /// Replace the tool definitions. An empty list clears them.
    pub fn set_tools(&mut self, tools: Vec<Value>) {
        self.tools = if tools.is_empty() { None } else { Some(tools) };
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn add_messages(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// Append a batch of standard-shape messages.
    ///
    /// Tool results in the batch are named after the matching assistant
    /// tool call in the same batch.
    pub fn add_standard_messages(&mut self, messages: &[StandardMessage]) {
        for translated in from_standard_all(messages) {
            self.add_translated(translated);
        }
    }

    /// Append one standard-shape message.
    ///
    /// A system message replaces the system instruction instead of adding a
    /// turn; a message left with no parts after translation is skipped.
    pub fn add_standard_message(&mut self, message: &StandardMessage) {
        self.add_translated(from_standard(message));
    }

    fn add_translated(&mut self, translated: FromStandard) {
        match translated {
            FromStandard::System(system) => self.system_message = non_empty(system),
            FromStandard::Message(message) if !message.parts.is_empty() => {
                self.messages.push(message)
            }
            FromStandard::Message(_) => {
                tracing::debug!("Skipping standard message with no translatable content")
            }
        }
    }

    /// Replace the whole history with a standard-shape one.
    ///
    /// The system instruction is taken from the system entries (the last one
    /// wins, an empty one clears it), turns without parts are pruned, and if
    /// only a system entry remains it is repeated as a user turn so the model
    /// has something to answer.
    pub fn set_messages(&mut self, messages: &[StandardMessage]) {
        self.system_message = None;
        self.messages.clear();
        for translated in from_standard_all(messages) {
            match translated {
                FromStandard::System(system) => self.system_message = non_empty(system),
                FromStandard::Message(message) => self.messages.push(message),
            }
        }
        self.messages.retain(|message| !message.parts.is_empty());
        if self.messages.is_empty() {
            if let Some(system) = &self.system_message {
                self.messages.push(Message::user_text(system.clone()));
            }
        }
    }

    /// The history in standard shape. The system instruction is not included.
    pub fn to_standard_messages(&self) -> Vec<StandardMessage> {
        self.messages
            .iter()
            .map(to_standard)
            .filter(|m| m.content.is_some() || m.tool_calls.is_some())
            .collect()
    }

    /// Encode a raw camera frame as a JPEG user turn, optionally captioned.
    pub fn image_message(
        format: Option<&str>,
        size: (u32, u32),
        image: &[u8],
        text: Option<&str>,
    ) -> Result<Message, GoogleError> {
        let jpeg = encode_jpeg(format, size, image)?;
        let mut parts = Vec::with_capacity(2);
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            parts.push(Part::text(text));
        }
        parts.push(Part::InlineBlob {
            mime_type: "image/jpeg".to_string(),
            data: jpeg,
        });
        Ok(Message::new(Role::User, parts))
    }

    /// Append a raw camera frame as a JPEG user turn.
    pub fn add_image_frame_message(
        &mut self,
        format: Option<&str>,
        size: (u32, u32),
        image: &[u8],
        text: Option<&str>,
    ) -> Result<(), GoogleError> {
        let message = Self::image_message(format, size, image, text)?;
        self.messages.push(message);
        Ok(())
    }

    /// Append audio chunks as one WAV user turn.
    ///
    /// The sample rate and channel count of the first chunk describe the
    /// whole clip. Does nothing when `audio` is empty.
    pub fn add_audio_frames_message(&mut self, audio: &[AudioRawData], text: Option<&str>) {
        let Some(first) = audio.first() else {
            return;
        };
        let pcm: Vec<u8> = audio.iter().flat_map(|a| a.audio.iter().copied()).collect();
        let mut parts = Vec::with_capacity(2);
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            parts.push(Part::text(text));
        }
        parts.push(Part::InlineBlob {
            mime_type: "audio/wav".to_string(),
            data: encode_pcm16_wav(&pcm, first.sample_rate, first.num_channels),
        });
        self.messages.push(Message::new(Role::User, parts));
    }

    /// The history as Gemini JSON with inline payloads replaced by `"..."`.
    pub fn get_messages_for_logging(&self) -> Vec<Value> {
        self.messages
            .iter()
            .map(|message| {
                let mut content = GeminiTranslator.to_vendor(message);
                for part in &mut content.parts {
                    if let Some(blob) = part.inline_data.as_mut() {
                        blob.data = "...".to_string();
                    }
                }
                serde_json::to_value(&content).unwrap_or(Value::Null)
            })
            .collect()
    }
}

fn encode_jpeg(format: Option<&str>, size: (u32, u32), pixels: &[u8]) -> Result<Vec<u8>, GoogleError> {
    let (width, height) = size;
    let format = format.unwrap_or("RGB");
    let invalid = || GoogleError::InvalidImage {
        format: format.to_string(),
        width,
        height,
        len: pixels.len(),
    };
    let image = match format {
        "RGB" => DynamicImage::ImageRgb8(
            RgbImage::from_raw(width, height, pixels.to_vec()).ok_or_else(invalid)?,
        ),
        "RGBA" => DynamicImage::ImageRgba8(
            RgbaImage::from_raw(width, height, pixels.to_vec()).ok_or_else(invalid)?,
        ),
        "L" => DynamicImage::ImageLuma8(
            GrayImage::from_raw(width, height, pixels.to_vec()).ok_or_else(invalid)?,
        ),
        other => return Err(GoogleError::UnsupportedImageFormat(other.to_string())),
    };

    // JPEG has no alpha channel.
    let mut jpeg = Cursor::new(Vec::new());
    image.to_rgb8().write_to(&mut jpeg, ImageFormat::Jpeg)?;
    Ok(jpeg.into_inner())
}

/// Conversion into a Gemini context.
pub trait UpgradeToGoogle {
    fn upgrade_to_google(self) -> GoogleLLMContext;
}

impl UpgradeToGoogle for GoogleLLMContext {
    fn upgrade_to_google(self) -> GoogleLLMContext {
        self
    }
}

impl UpgradeToGoogle for LLMContext {
    fn upgrade_to_google(self) -> GoogleLLMContext {
        let (messages, tools) = self.into_parts();
        let mut context = GoogleLLMContext::from_standard_messages(&messages);
        if let Some(tools) = tools {
            context.set_tools(tools);
        }
        context
    }
}
