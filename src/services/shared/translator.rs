// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! The seam between canonical turns and a vendor's wire messages.

use crate::processors::aggregators::llm_message::Message;

/// Maps canonical [`Message`]s to and from one vendor's message type.
///
/// Both directions are total: parts the other side cannot express are
/// logged and dropped rather than failing the whole message.
pub trait VendorTranslator: Send + Sync {
    /// The vendor's on-the-wire message type.
    type VendorMessage;

    fn to_vendor(&self, message: &Message) -> Self::VendorMessage;

    fn from_vendor(&self, message: &Self::VendorMessage) -> Message;

    /// Translate a whole history, preserving order.
    fn to_vendor_all(&self, messages: &[Message]) -> Vec<Self::VendorMessage> {
        messages.iter().map(|m| self.to_vendor(m)).collect()
    }
}
