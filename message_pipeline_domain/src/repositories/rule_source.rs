// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Rule Source Repository Port
//!
//! Read-only access to the persistent source-of-truth for rule
//! definitions. The reload controller loads all sources on every reload;
//! the interpreter never patches the snapshot incrementally, so this port
//! needs nothing beyond `load_all`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::value_objects::ids::RuleId;
use crate::PipelineError;

/// A rule definition as stored: its id and unparsed source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSource {
    pub id: RuleId,
    pub source: String,
}

impl RuleSource {
    pub fn new(id: impl Into<RuleId>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
        }
    }
}

/// Source-of-truth store for rule definitions.
#[async_trait]
pub trait RuleSourceService: Send + Sync {
    /// Loads every rule definition.
    async fn load_all(&self) -> Result<Vec<RuleSource>, PipelineError>;
}
