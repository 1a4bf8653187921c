// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Canonical conversation messages and their mapping to the standard shape.
//!
//! A [`Message`] is one conversation turn: a [`Role`] and an ordered list of
//! [`Part`]s. This is the form the context aggregators store and the form a
//! vendor translator consumes. [`from_standard`] and [`to_standard`] map it
//! to and from [`StandardMessage`].
//!
//! Mapping rules:
//!
//! - `system` messages do not become turns; their text is returned as
//!   [`FromStandard::System`] for the caller to keep as the system message.
//! - `assistant` maps to [`Role::Model`]. Tool calls become
//!   [`Part::FunctionCall`] with their JSON arguments parsed.
//! - `tool` results become a [`Part::FunctionResponse`] attributed to the
//!   model. Non-object result JSON is wrapped as `{"response": ...}` and
//!   unwrapped again on the way back.
//! - `data:` image URIs are decoded into [`Part::InlineBlob`].
//!
//! Going back, the function name doubles as the tool-call id, so a
//! standard-shape history survives a round trip even though the canonical
//! form keeps no ids.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::processors::aggregators::llm_context::{
    ContentItem, ImageUrl, StandardContent, StandardMessage, StandardRole, ToolCall,
    ToolCallFunction,
};
use crate::utils::helpers::{decode_base64, to_data_uri};

/// JSON object used for function arguments and responses.
pub type JsonMap = serde_json::Map<String, Value>;

/// Function name used when a tool result does not say which call it answers.
pub const DEFAULT_TOOL_RESULT_NAME: &str = "tool_call_result";

/// A standard-shape item that has no canonical counterpart.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("tool call arguments for `{name}` are not a JSON object: {reason}")]
    InvalidArguments { name: String, reason: String },

    #[error("image url is not a base64 data URI")]
    InvalidDataUri,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unsupported content item")]
    UnsupportedContent,
}

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Model,
    Tool,
}

/// One piece of a turn's content.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Inline binary media, such as a JPEG frame or a WAV clip.
    InlineBlob { mime_type: String, data: Vec<u8> },
    FunctionCall { name: String, args: JsonMap },
    FunctionResponse { name: String, response: JsonMap },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }
}

/// A conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    /// A user turn with a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    /// A model turn with a single text part.
    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Result of translating one standard message.
#[derive(Debug, Clone, PartialEq)]
pub enum FromStandard {
    /// A system instruction; it belongs beside the turns, not among them.
    System(String),
    Message(Message),
}

/// Translate a standard message into canonical form.
///
/// Items that cannot be represented are logged and dropped; the rest of the
/// message is kept. The resulting message may therefore have no parts.
pub fn from_standard(message: &StandardMessage) -> FromStandard {
    translate_standard(message, &HashMap::new())
}

/// Translate a standard-shape history in order.
///
/// A tool result without a `name` takes the function name of the earlier
/// assistant tool call with the same id, else the id itself.
pub fn from_standard_all(messages: &[StandardMessage]) -> Vec<FromStandard> {
    let mut call_names = HashMap::new();
    messages
        .iter()
        .map(|message| {
            for call in message.tool_calls.iter().flatten() {
                call_names.insert(call.id.clone(), call.function.name.clone());
            }
            translate_standard(message, &call_names)
        })
        .collect()
}

fn translate_standard(message: &StandardMessage, call_names: &HashMap<String, String>) -> FromStandard {
    match message.role {
        StandardRole::System => FromStandard::System(system_text(message.content.as_ref())),
        StandardRole::Tool => FromStandard::Message(tool_result_message(message, call_names)),
        StandardRole::User | StandardRole::Assistant => {
            let role = if message.role == StandardRole::Assistant {
                Role::Model
            } else {
                Role::User
            };
            let mut parts = Vec::new();
            if let Some(content) = &message.content {
                parts.extend(content_parts(content));
            }
            for call in message.tool_calls.iter().flatten() {
                match function_call_part(call) {
                    Ok(part) => parts.push(part),
                    Err(e) => warn!(error = %e, "Dropping tool call"),
                }
            }
            FromStandard::Message(Message::new(role, parts))
        }
    }
}

/// Translate a canonical message into the standard shape.
///
/// A single text part becomes string content; anything else becomes list
/// content. Empty content is omitted.
pub fn to_standard(message: &Message) -> StandardMessage {
    let mut role = match message.role {
        Role::User => StandardRole::User,
        Role::Model => StandardRole::Assistant,
        Role::Tool => StandardRole::Tool,
    };
    let mut items = Vec::new();
    let mut tool_calls = Vec::new();
    let mut tool_call_id = None;

    for part in &message.parts {
        match part {
            Part::Text(text) => items.push(ContentItem::Text { text: text.clone() }),
            Part::InlineBlob { mime_type, data } => items.push(ContentItem::ImageUrl {
                image_url: ImageUrl {
                    url: to_data_uri(mime_type, data),
                },
            }),
            Part::FunctionCall { name, args } => tool_calls.push(ToolCall {
                id: name.clone(),
                call_type: "function".to_string(),
                function: ToolCallFunction {
                    name: name.clone(),
                    arguments: Value::Object(args.clone()).to_string(),
                },
            }),
            Part::FunctionResponse { name, response } => {
                role = StandardRole::Tool;
                tool_call_id = Some(name.clone());
                items.push(ContentItem::Text {
                    text: response_text(response),
                });
            }
        }
    }

    let content = match items.len() {
        0 => None,
        1 => match items.pop() {
            Some(ContentItem::Text { text }) => Some(StandardContent::Text(text)),
            Some(item) => Some(StandardContent::Parts(vec![item])),
            None => None,
        },
        _ => Some(StandardContent::Parts(items)),
    };

    StandardMessage {
        role,
        content,
        name: None,
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
        tool_call_id,
    }
}

/// Wrap an arbitrary function result as a response object.
///
/// Objects pass through; strings and other values become `{"response": v}`.
pub fn response_object(result: Value) -> JsonMap {
    match result {
        Value::Object(map) => map,
        other => {
            let mut map = JsonMap::new();
            map.insert("response".to_string(), other);
            map
        }
    }
}

/// Undo [`response_object`]: a lone `{"response": v}` wrapper around a
/// non-object gives back `v` (strings raw, other values as JSON text).
fn response_text(response: &JsonMap) -> String {
    match response.get("response") {
        Some(Value::String(text)) if response.len() == 1 => text.clone(),
        Some(value) if response.len() == 1 && !value.is_object() => value.to_string(),
        _ => Value::Object(response.clone()).to_string(),
    }
}

/// Interpret function arguments as an object. `null` means no arguments.
pub fn arguments_object(name: &str, arguments: Value) -> Result<JsonMap, TranslationError> {
    match arguments {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(JsonMap::new()),
        other => Err(TranslationError::InvalidArguments {
            name: name.to_string(),
            reason: format!("got {}", json_kind(&other)),
        }),
    }
}

/// Split a `data:<mime>;base64,<payload>` URI into its MIME type and bytes.
pub fn parse_data_uri(url: &str) -> Result<(String, Vec<u8>), TranslationError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or(TranslationError::InvalidDataUri)?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or(TranslationError::InvalidDataUri)?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or(TranslationError::InvalidDataUri)?;
    let mime_type = if mime_type.is_empty() {
        "application/octet-stream"
    } else {
        mime_type
    };
    Ok((mime_type.to_string(), decode_base64(payload)?))
}

fn system_text(content: Option<&StandardContent>) -> String {
    match content {
        None => String::new(),
        Some(StandardContent::Text(text)) => text.clone(),
        Some(StandardContent::Parts(items)) => items
            .iter()
            .filter_map(|item| match item {
                ContentItem::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn content_parts(content: &StandardContent) -> Vec<Part> {
    match content {
        StandardContent::Text(text) => vec![Part::Text(text.clone())],
        StandardContent::Parts(items) => items
            .iter()
            .filter_map(|item| match content_item_part(item) {
                Ok(part) => Some(part),
                Err(e) => {
                    warn!(error = %e, "Dropping content item");
                    None
                }
            })
            .collect(),
    }
}

fn content_item_part(item: &ContentItem) -> Result<Part, TranslationError> {
    match item {
        ContentItem::Text { text } => Ok(Part::Text(text.clone())),
        ContentItem::ImageUrl { image_url } => {
            let (mime_type, data) = parse_data_uri(&image_url.url)?;
            Ok(Part::InlineBlob { mime_type, data })
        }
        ContentItem::Unsupported => Err(TranslationError::UnsupportedContent),
    }
}

fn function_call_part(call: &ToolCall) -> Result<Part, TranslationError> {
    let name = call.function.name.clone();
    let arguments = if call.function.arguments.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&call.function.arguments).map_err(|e| {
            TranslationError::InvalidArguments {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?
    };
    let args = arguments_object(&name, arguments)?;
    Ok(Part::FunctionCall { name, args })
}

fn tool_result_message(message: &StandardMessage, call_names: &HashMap<String, String>) -> Message {
    let name = message
        .name
        .clone()
        .or_else(|| {
            message
                .tool_call_id
                .as_ref()
                .map(|id| call_names.get(id).cloned().unwrap_or_else(|| id.clone()))
        })
        .unwrap_or_else(|| DEFAULT_TOOL_RESULT_NAME.to_string());
    let raw = system_text(message.content.as_ref());
    let result = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
    Message::new(
        Role::Model,
        vec![Part::FunctionResponse {
            name,
            response: response_object(result),
        }],
    )
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
