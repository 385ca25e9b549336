// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Message Entity
//!
//! This module provides the message entity: the unit of data flowing through
//! the host and through the interpreter. A message has a stable identity,
//! a mutable bag of named fields, a set of stream memberships that drives
//! pipeline selection, and a drop flag.
//!
//! ## Entity Characteristics
//!
//! - **Identity**: a [`MessageId`] that persists through all mutations
//! - **Mutability**: rules mutate fields, streams, and the drop flag in
//!   place while the identity stays stable
//! - **Ownership**: messages are owned by the host; the interpreter shares
//!   them during one `process()` call through [`MessageRef`] handles
//!
//! ## Sharing Model
//!
//! During evaluation a message is referenced from several places at once:
//! the evaluation context, function arguments, and possibly `Message`-tagged
//! values produced by `clone_message`/`create_message`. [`MessageRef`]
//! (`Arc<parking_lot::Mutex<Message>>`) makes that sharing explicit; locks
//! are held only for single field accesses, never across rule evaluations.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::value_objects::ids::{MessageId, StreamId};
use crate::value_objects::value::RuleValue;

/// Shared handle to a live message.
pub type MessageRef = Arc<Mutex<Message>>;

/// The unit of data flowing through the interpreter.
#[derive(Debug, Clone)]
pub struct Message {
    id: MessageId,
    fields: HashMap<String, RuleValue>,
    streams: HashSet<StreamId>,
    filter_out: bool,
    journal_offset: Option<u64>,
    timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates an empty message with a fresh id and the current timestamp.
    pub fn new() -> Self {
        Self {
            id: MessageId::new(),
            fields: HashMap::new(),
            streams: HashSet::new(),
            filter_out: false,
            journal_offset: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a message with the given fields.
    pub fn with_fields(fields: HashMap<String, RuleValue>) -> Self {
        Self {
            fields,
            ..Self::new()
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the value of a field, or `Null` if absent.
    pub fn field(&self, name: &str) -> RuleValue {
        self.fields.get(name).cloned().unwrap_or(RuleValue::Null)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: RuleValue) {
        let _ = self.fields.insert(name.into(), value);
    }

    /// Removes a field, returning its previous value if it was present.
    pub fn remove_field(&mut self, name: &str) -> Option<RuleValue> {
        self.fields.remove(name)
    }

    pub fn fields(&self) -> &HashMap<String, RuleValue> {
        &self.fields
    }

    pub fn streams(&self) -> &HashSet<StreamId> {
        &self.streams
    }

    /// Adds the message to a stream. Returns `true` if the membership is new.
    pub fn add_stream(&mut self, stream: StreamId) -> bool {
        self.streams.insert(stream)
    }

    /// Removes the message from a stream. Returns `true` if it was a member.
    pub fn remove_stream(&mut self, stream: &StreamId) -> bool {
        self.streams.remove(stream)
    }

    /// The drop flag: when set at the end of a pass, the interpreter drops
    /// the message and commits its journal offset.
    pub fn filter_out(&self) -> bool {
        self.filter_out
    }

    pub fn set_filter_out(&mut self, filter_out: bool) {
        self.filter_out = filter_out;
    }

    pub fn journal_offset(&self) -> Option<u64> {
        self.journal_offset
    }

    pub fn set_journal_offset(&mut self, offset: u64) {
        self.journal_offset = Some(offset);
    }

    /// Wraps the message into a shared handle for evaluation.
    pub fn into_ref(self) -> MessageRef {
        Arc::new(Mutex::new(self))
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}
