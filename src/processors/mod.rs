// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Frame processing infrastructure.
//!
//! A processor receives one [`FrameEnum`](crate::frames::FrameEnum) at a time
//! together with the direction it travelled in, and emits zero or more frames
//! through its [`ProcessorContext`]. The context aggregators and the Gemini
//! LLM service are all processors.

pub mod aggregators;
pub mod processor;

pub use processor::{Processor, ProcessorContext};

/// Direction of frame flow in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameDirection {
    /// Frames flowing from input to output.
    Downstream,
    /// Frames flowing back from output to input.
    Upstream,
}
