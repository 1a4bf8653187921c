// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Conversation state shared by context aggregators.
//!
//! [`llm_context`] holds the standard (OpenAI-shape) message model,
//! [`llm_message`] the canonical turn model vendors translate from.

pub mod llm_context;
pub mod llm_message;
