// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Google Gemini integration.
//!
//! - [`context`]: the Gemini conversation context and its restructuring rules.
//! - [`aggregators`]: user and assistant aggregators that write to it.
//! - [`translator`]: canonical turns to Gemini `Content` and back.
//! - [`llm`]: the streaming LLM service.
//! - [`client`]: the HTTP/SSE transport behind the service.

pub mod aggregators;
pub mod client;
pub mod context;
pub mod error;
pub mod llm;
pub mod translator;
pub mod types;

pub use aggregators::{
    GoogleAssistantContextAggregator, GoogleContextAggregatorPair, GoogleUserContextAggregator,
};
pub use client::{GeminiClient, GeminiHttpClient, GoogleClientConfig};
pub use context::{GoogleLLMContext, SharedGoogleContext, UpgradeToGoogle};
pub use error::GoogleError;
pub use llm::{GoogleLLMParams, GoogleLLMService};
pub use translator::GeminiTranslator;
