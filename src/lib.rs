// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Google Gemini support for Pipecat pipelines.
//!
//! The crate keeps a conversation in a vendor-neutral [`Message`] model,
//! aggregates user speech and streamed model output into it, and translates
//! it to and from the Gemini `generateContent` API.
//!
//! A typical pipeline places the three processors like this:
//!
//! ```text
//! transcription -> GoogleUserContextAggregator -> GoogleLLMService
//!               -> (output) -> GoogleAssistantContextAggregator
//! ```
//!
//! [`Message`]: processors::aggregators::llm_message::Message

pub mod frames;
pub mod metrics;
pub mod prelude;
pub mod processors;
pub mod services;
pub mod utils;
