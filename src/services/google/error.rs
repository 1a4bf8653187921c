// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Error type for the Gemini integration.

use thiserror::Error;

use crate::processors::aggregators::llm_message::TranslationError;

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("image buffer of {len} bytes does not match a {width}x{height} {format} image")]
    InvalidImage {
        format: String,
        width: u32,
        height: u32,
        len: usize,
    },

    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("stream interrupted: {0}")]
    Stream(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParams { name: &'static str, reason: String },
}
