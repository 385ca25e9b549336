// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stream Assignment Repository Port
//!
//! Read-only access to the stream-to-pipelines assignment table. The
//! reload drops assignment entries whose pipeline id does not resolve
//! against the loaded pipeline set, so a stale assignment can never leak a
//! dangling reference into a snapshot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::value_objects::ids::{PipelineId, StreamId};
use crate::PipelineError;

/// Assignment of a set of pipelines to one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAssignment {
    pub stream_id: StreamId,
    pub pipeline_ids: Vec<PipelineId>,
}

impl StreamAssignment {
    pub fn new(stream_id: impl Into<StreamId>, pipeline_ids: Vec<PipelineId>) -> Self {
        Self {
            stream_id: stream_id.into(),
            pipeline_ids,
        }
    }
}

/// Source-of-truth store for stream assignments.
#[async_trait]
pub trait StreamAssignmentService: Send + Sync {
    /// Loads every stream assignment.
    async fn load_all(&self) -> Result<Vec<StreamAssignment>, PipelineError>;
}
