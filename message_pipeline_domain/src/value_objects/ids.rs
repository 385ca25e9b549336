// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Typed Identifier Value Objects
//!
//! This module provides the strongly-typed identifiers used across the
//! pipeline interpreter: message ids, rule ids, pipeline ids, and stream
//! ids. Newtype wrappers keep the different identifier spaces from being
//! confused in function signatures and map keys.
//!
//! ## Overview
//!
//! - **MessageId**: ULID-based identity of a message flowing through the
//!   interpreter. ULIDs are lexicographically sortable, which keeps log
//!   output and blacklist dumps readable in arrival order.
//! - **RuleId** / **PipelineId**: opaque string identifiers assigned by the
//!   source-of-truth store; the interpreter never generates these.
//! - **StreamId**: logical routing channel. The reserved id `"default"`
//!   denotes messages with no explicit stream membership.
//!
//! All identifiers are immutable value objects: equality is attribute-based,
//! they hash and order consistently, and they serialize as plain strings.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use ulid::Ulid;

/// Identity of a message flowing through the interpreter.
///
/// Generated with a ULID so ids sort by creation time. The host may also
/// supply an existing id when handing messages to the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(Ulid);

impl MessageId {
    /// Generates a new unique message id.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parses a message id from its canonical string form.
    pub fn parse(s: &str) -> Result<Self, crate::PipelineError> {
        Ulid::from_string(s)
            .map(Self)
            .map_err(|e| crate::PipelineError::validation_error(format!("invalid message id '{}': {}", s, e)))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque rule identifier assigned by the source-of-truth store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque pipeline identifier assigned by the source-of-truth store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PipelineId(String);

impl PipelineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PipelineId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Logical routing channel identifier.
///
/// The reserved id [`StreamId::DEFAULT`] is used for messages that carry no
/// explicit stream membership when pipelines are selected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamId(String);

impl StreamId {
    /// The reserved stream id for messages with no stream membership.
    pub const DEFAULT: &'static str = "default";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the reserved default stream id.
    pub fn default_stream() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    /// Checks whether this is the reserved default stream.
    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StreamId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
