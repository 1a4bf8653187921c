//
// Copyright (c) 2024-2026, Daily
//
// SPDX-License-Identifier: BSD 2-Clause License
//

//! Metrics data models reported by the LLM service.
//!
//! The service only computes the numbers; whoever consumes the
//! [`MetricsFrame`](crate::frames::MetricsFrame) decides where they go.

use serde::{Deserialize, Serialize};

/// One metrics payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricsData {
    /// Time until the first streamed chunk arrived.
    Ttfb(TTFBMetricsData),
    /// Token usage of one model invocation.
    LLMUsage(LLMUsageMetricsData),
}

/// Time To First Byte (TTFB) metrics data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TTFBMetricsData {
    /// Name of the processor generating the metrics.
    pub processor: String,
    /// Optional model name associated with the metrics.
    pub model: Option<String>,
    /// TTFB measurement in seconds.
    pub value: f64,
}

/// Token usage statistics for LLM operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LLMTokenUsage {
    /// Number of tokens in the input prompt.
    pub prompt_tokens: u64,
    /// Number of tokens in the generated completion.
    pub completion_tokens: u64,
    /// Total number of tokens used.
    pub total_tokens: u64,
    /// Number of prompt tokens served from the vendor's context cache.
    pub cache_read_input_tokens: u64,
}

/// LLM token usage metrics data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMUsageMetricsData {
    /// Name of the processor generating the metrics.
    pub processor: String,
    /// Optional model name associated with the metrics.
    pub model: Option<String>,
    /// Token usage statistics for the LLM operation.
    pub value: LLMTokenUsage,
}

/// Sums token usage across the chunks of one streamed response.
///
/// Vendors report running totals on every chunk, so each reading only
/// contributes what it adds over the previous reading of the same counter.
/// Counters missing from a chunk are left untouched.
#[derive(Debug, Clone, Default)]
pub struct LLMUsageAccumulator {
    usage: LLMTokenUsage,
    last: LLMTokenUsage,
}

impl LLMUsageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one chunk's counters.
    pub fn record(
        &mut self,
        prompt_tokens: Option<u64>,
        completion_tokens: Option<u64>,
        total_tokens: Option<u64>,
        cache_read_input_tokens: Option<u64>,
    ) {
        fn fold(sum: &mut u64, last: &mut u64, reading: Option<u64>) {
            if let Some(reading) = reading {
                *sum += reading.saturating_sub(*last);
                *last = reading;
            }
        }

        fold(
            &mut self.usage.prompt_tokens,
            &mut self.last.prompt_tokens,
            prompt_tokens,
        );
        fold(
            &mut self.usage.completion_tokens,
            &mut self.last.completion_tokens,
            completion_tokens,
        );
        fold(
            &mut self.usage.total_tokens,
            &mut self.last.total_tokens,
            total_tokens,
        );
        fold(
            &mut self.usage.cache_read_input_tokens,
            &mut self.last.cache_read_input_tokens,
            cache_read_input_tokens,
        );
    }

    /// Usage accumulated so far.
    pub fn usage(&self) -> &LLMTokenUsage {
        &self.usage
    }

    /// Consume the accumulator, returning the final usage.
    pub fn into_usage(self) -> LLMTokenUsage {
        self.usage
    }
}
