// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Source Repository Port
//!
//! Read-only access to the persistent source-of-truth for pipeline
//! definitions, mirroring the rule source port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::value_objects::ids::PipelineId;
use crate::PipelineError;

/// A pipeline definition as stored: its id and unparsed source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSource {
    pub id: PipelineId,
    pub source: String,
}

impl PipelineSource {
    pub fn new(id: impl Into<PipelineId>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
        }
    }
}

/// Source-of-truth store for pipeline definitions.
#[async_trait]
pub trait PipelineSourceService: Send + Sync {
    /// Loads every pipeline definition.
    async fn load_all(&self) -> Result<Vec<PipelineSource>, PipelineError>;
}
