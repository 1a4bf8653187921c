// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Vendor-neutral conversation context in the standard chat message shape.
//!
//! [`StandardMessage`] is the OpenAI-style wire shape the rest of a pipeline
//! speaks (`{"role": ..., "content": ...}`), and [`LLMContext`] is a plain
//! list of them plus tool definitions. A vendor service upgrades an
//! `LLMContext` into its own context type before use.

use serde::{Deserialize, Serialize};

/// Role of a standard chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Message content: either a bare string or a list of typed items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StandardContent {
    Text(String),
    Parts(Vec<ContentItem>),
}

/// One item of list-form content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    /// Any item type this crate does not understand.
    #[serde(other)]
    Unsupported,
}

/// Image reference; only `data:` URIs carry inline bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_tool_call_type")]
    pub call_type: String,
    pub function: ToolCallFunction,
}

fn default_tool_call_type() -> String {
    "function".to_string()
}

/// Function name and its JSON-encoded arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// Arguments as a JSON document in a string.
    pub arguments: String,
}

/// A message in the standard chat shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardMessage {
    pub role: StandardRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<StandardContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl StandardMessage {
    /// A message with string content.
    pub fn text(role: StandardRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(StandardContent::Text(content.into())),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(StandardRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(StandardRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(StandardRole::Assistant, content)
    }

    /// A tool result answering `tool_call_id`.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::text(StandardRole::Tool, content)
        }
    }
}

/// Conversation state in standard message shape.
///
/// # Example
///
/// ```
/// use pipecat_google::processors::aggregators::llm_context::{LLMContext, StandardMessage};
///
/// let mut context = LLMContext::new();
/// context.add_message(StandardMessage::system("You are a helpful assistant."));
/// context.add_message(StandardMessage::user("Hello!"));
/// assert_eq!(context.messages().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LLMContext {
    messages: Vec<StandardMessage>,
    tools: Option<Vec<serde_json::Value>>,
}

impl LLMContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<StandardMessage>) -> Self {
        Self {
            messages,
            tools: None,
        }
    }

    /// Attach tool definitions. An empty list means no tools.
    pub fn with_tools(mut self, tools: Vec<serde_json::Value>) -> Self {
        self.set_tools(tools);
        self
    }

    pub fn messages(&self) -> &[StandardMessage] {
        &self.messages
    }

    pub fn tools(&self) -> Option<&[serde_json::Value]> {
        self.tools.as_deref()
    }

    pub fn add_message(&mut self, message: StandardMessage) {
        self.messages.push(message);
    }

    pub fn set_messages(&mut self, messages: Vec<StandardMessage>) {
        self.messages = messages;
    }

    pub fn set_tools(&mut self, tools: Vec<serde_json::Value>) {
        self.tools = if tools.is_empty() { None } else { Some(tools) };
    }

    /// Split into messages and tools.
    pub fn into_parts(self) -> (Vec<StandardMessage>, Option<Vec<serde_json::Value>>) {
        (self.messages, self.tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_content_deserializes() {
        let msg: StandardMessage =
            serde_json::from_value(json!({"role": "user", "content": "hi"})).unwrap();
        assert_eq!(msg, StandardMessage::user("hi"));
    }

    #[test]
    fn test_list_content_deserializes() {
        let msg: StandardMessage = serde_json::from_value(json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "look"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
            ]
        }))
        .unwrap();
        let Some(StandardContent::Parts(items)) = msg.content else {
            panic!("expected list content");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[1], ContentItem::ImageUrl { image_url } if image_url.url.starts_with("data:")));
    }

    #[test]
    fn test_unknown_content_item_type_is_tolerated() {
        let msg: StandardMessage = serde_json::from_value(json!({
            "role": "user",
            "content": [{"type": "input_audio", "input_audio": {"data": "AAAA"}}]
        }))
        .unwrap();
        assert_eq!(
            msg.content,
            Some(StandardContent::Parts(vec![ContentItem::Unsupported]))
        );
    }

    #[test]
    fn test_tool_call_serialization_shape() {
        let msg = StandardMessage {
            role: StandardRole::Assistant,
            content: None,
            name: None,
            tool_calls: Some(vec![ToolCall {
                id: "get_weather".to_string(),
                call_type: "function".to_string(),
                function: ToolCallFunction {
                    name: "get_weather".to_string(),
                    arguments: "{\"location\":\"London\"}".to_string(),
                },
            }]),
            tool_call_id: None,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert!(value.get("content").is_none());
        assert_eq!(value["tool_calls"][0]["type"], "function");
        assert_eq!(value["tool_calls"][0]["function"]["name"], "get_weather");
    }

    #[test]
    fn test_tool_message_constructor() {
        let msg = StandardMessage::tool("call_1", "{\"ok\":true}");
        assert_eq!(msg.role, StandardRole::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_context_empty_tools_clear() {
        let mut context = LLMContext::new().with_tools(vec![json!({"name": "f"})]);
        assert_eq!(context.tools().map(|t| t.len()), Some(1));
        context.set_tools(Vec::new());
        assert!(context.tools().is_none());
    }
}
