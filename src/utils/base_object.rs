// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! Process-wide identifiers for frames, processors and function calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

static OBJECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

static OBJ_COUNTS: OnceLock<Mutex<HashMap<String, u64>>> = OnceLock::new();

/// Generate a globally unique, monotonically increasing identifier.
pub fn obj_id() -> u64 {
    OBJECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Return the per-type instance count for `type_name`, then increment it.
///
/// Used to build default names such as `GoogleLLMService#0`.
pub fn obj_count(type_name: &str) -> u64 {
    let mut counts = OBJ_COUNTS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let entry = counts.entry(type_name.to_string()).or_insert(0);
    let count = *entry;
    *entry += 1;
    count
}

/// Default instance name: `TypeName#n`.
pub fn default_name(type_name: &str) -> String {
    format!("{}#{}", type_name, obj_count(type_name))
}
