// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Small helpers shared across the crate.

pub mod base_object;
pub mod helpers;
