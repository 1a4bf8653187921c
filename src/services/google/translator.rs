// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Canonical turns to Gemini `Content` and back.

use serde_json::Value;
use tracing::{debug, warn};

use crate::processors::aggregators::llm_message::{
    arguments_object, response_object, Message, Part, Role,
};
use crate::services::google::types::{
    GeminiBlob, GeminiContent, GeminiFunctionCall, GeminiFunctionResponse, GeminiPart, GeminiTool,
};
use crate::services::shared::translator::VendorTranslator;
use crate::utils::helpers::{decode_base64, encode_base64};

/// Translator for the Gemini REST API.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiTranslator;

impl GeminiTranslator {
    /// Wire role for a canonical turn.
    ///
    /// Gemini only accepts function responses inside `user` turns, so a model
    /// turn made solely of function responses is sent as `user`.
    fn wire_role(message: &Message) -> &'static str {
        let only_responses = !message.parts.is_empty()
            && message
                .parts
                .iter()
                .all(|part| matches!(part, Part::FunctionResponse { .. }));
        match message.role {
            Role::Model if only_responses => "user",
            Role::Model => "model",
            Role::User | Role::Tool => "user",
        }
    }

    fn part_to_vendor(part: &Part) -> GeminiPart {
        match part {
            Part::Text(text) => GeminiPart::text(text.clone()),
            Part::InlineBlob { mime_type, data } => GeminiPart {
                inline_data: Some(GeminiBlob {
                    mime_type: mime_type.clone(),
                    data: encode_base64(data),
                }),
                ..GeminiPart::default()
            },
            Part::FunctionCall { name, args } => GeminiPart {
                function_call: Some(GeminiFunctionCall {
                    name: name.clone(),
                    args: Value::Object(args.clone()),
                }),
                ..GeminiPart::default()
            },
            Part::FunctionResponse { name, response } => GeminiPart {
                function_response: Some(GeminiFunctionResponse {
                    name: name.clone(),
                    response: Value::Object(response.clone()),
                }),
                ..GeminiPart::default()
            },
        }
    }

    fn parts_from_vendor(part: &GeminiPart) -> Vec<Part> {
        let mut parts = Vec::new();
        if let Some(text) = &part.text {
            parts.push(Part::Text(text.clone()));
        }
        if let Some(blob) = &part.inline_data {
            match decode_base64(&blob.data) {
                Ok(data) => parts.push(Part::InlineBlob {
                    mime_type: blob.mime_type.clone(),
                    data,
                }),
                Err(e) => warn!(error = %e, mime_type = %blob.mime_type, "Dropping undecodable inline data"),
            }
        }
        if let Some(call) = &part.function_call {
            match arguments_object(&call.name, call.args.clone()) {
                Ok(args) => parts.push(Part::FunctionCall {
                    name: call.name.clone(),
                    args,
                }),
                Err(e) => warn!(error = %e, "Dropping function call"),
            }
        }
        if let Some(response) = &part.function_response {
            parts.push(Part::FunctionResponse {
                name: response.name.clone(),
                response: response_object(response.response.clone()),
            });
        }
        if parts.is_empty() {
            debug!("Ignoring Gemini part with no supported fields");
        }
        parts
    }
}

impl VendorTranslator for GeminiTranslator {
    type VendorMessage = GeminiContent;

    fn to_vendor(&self, message: &Message) -> GeminiContent {
        GeminiContent {
            role: Some(Self::wire_role(message).to_string()),
            parts: message.parts.iter().map(Self::part_to_vendor).collect(),
        }
    }

    fn from_vendor(&self, content: &GeminiContent) -> Message {
        let role = match content.role.as_deref() {
            None | Some("model") => Role::Model,
            Some("user") => Role::User,
            Some("function" | "tool") => Role::Tool,
            Some(other) => {
                warn!(role = other, "Unknown Gemini role, treating as user");
                Role::User
            }
        };
        Message::new(
            role,
            content.parts.iter().flat_map(Self::parts_from_vendor).collect(),
        )
    }
}

/// Convert standard tool definitions into one Gemini `functionDeclarations` tool.
///
/// Accepts `{"type": "function", "function": {...}}` entries and bare
/// declarations (`{"name": ..., "parameters": ...}`). Entries that already
/// carry `functionDeclarations` are merged in.
pub fn convert_tools(tools: &[Value]) -> Vec<GeminiTool> {
    let mut declarations = Vec::new();
    for tool in tools {
        if let Some(function) = tool.get("function") {
            let mut decl = serde_json::Map::new();
            for key in ["name", "description", "parameters"] {
                if let Some(value) = function.get(key) {
                    decl.insert(key.to_string(), value.clone());
                }
            }
            declarations.push(Value::Object(decl));
        } else if let Some(existing) = tool.get("functionDeclarations").and_then(Value::as_array) {
            declarations.extend(existing.iter().cloned());
        } else if tool.get("name").is_some() {
            declarations.push(tool.clone());
        } else {
            warn!(tool = %tool, "Ignoring unrecognized tool definition");
        }
    }

    if declarations.is_empty() {
        Vec::new()
    } else {
        vec![GeminiTool {
            function_declarations: declarations,
        }]
    }
}
