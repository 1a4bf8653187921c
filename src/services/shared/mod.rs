// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Shared utilities for AI service implementations.

pub mod sse;
pub mod translator;
pub mod wav;
