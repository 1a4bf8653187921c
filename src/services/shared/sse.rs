// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Server-Sent Events (SSE) stream parser.
//!
//! Collects `data:` lines into events, dispatching an event at each blank
//! line. Input may be split anywhere across [`SseParser::feed`] calls.

/// One dispatched SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if the block had one.
    pub event: Option<String>,
    /// The `data:` lines of the block joined with `\n`.
    pub data: String,
}

/// Incremental SSE parser.
///
/// # Example
///
/// ```
/// use pipecat_google::services::shared::sse::SseParser;
///
/// let mut parser = SseParser::new();
/// assert!(parser.feed("data: {\"text\":").is_empty());
/// let events = parser.feed("\"hello\"}\r\n\r\n");
/// assert_eq!(events[0].data, "{\"text\":\"hello\"}");
/// ```
#[derive(Debug, Default)]
pub struct SseParser {
    line_buffer: String,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a text chunk and return the events it completed.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.line_buffer.push_str(chunk);
        let mut events = Vec::new();

        while let Some(newline) = self.line_buffer.find('\n') {
            let line: String = self.line_buffer.drain(..=newline).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                events.extend(self.dispatch());
                continue;
            }
            // Comment.
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "data" => self.data.push(value.to_string()),
                "event" => self.event = Some(value.to_string()),
                _ => {}
            }
        }

        events
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let mut events = if self.line_buffer.is_empty() {
            Vec::new()
        } else {
            self.feed("\n")
        };
        events.extend(self.dispatch());
        events.pop()
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent { event, data })
    }
}
