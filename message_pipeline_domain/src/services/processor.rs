// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Message Processor Port
//!
//! The contract the host registers the interpreter under. The host hands
//! batches of messages to `process` from its worker threads; the processor
//! returns the surviving (possibly mutated) messages. Dropped messages do
//! not appear in the output.

use crate::entities::message::Message;

/// Static registration identity of a message processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorDescriptor {
    id: String,
    name: String,
}

impl ProcessorDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Batch message transform registered with the host.
///
/// The contract is total: for every input message some output is produced
/// (possibly the unmodified message), unless the message was dropped by a
/// rule. Implementations are invoked concurrently from multiple host
/// worker threads; each call runs to completion on its calling thread.
pub trait MessageProcessor: Send + Sync {
    /// The processor's registration identity.
    fn descriptor(&self) -> &ProcessorDescriptor;

    /// Processes a batch of messages to completion.
    fn process(&self, messages: Vec<Message>) -> Vec<Message>;
}
