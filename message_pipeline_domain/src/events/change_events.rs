// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configuration Change Events
//!
//! Events the cluster event bus delivers when rules, pipelines, or stream
//! assignments change in the source-of-truth. The interpreter treats every
//! payload as a reload trigger only; the specific ids are informational
//! (logged) and never used to patch the snapshot incrementally.
//!
//! Each event carries a uuid identity and an occurrence timestamp so bus
//! deliveries can be correlated in logs across nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::ids::{PipelineId, RuleId, StreamId};

/// One or more rule definitions changed in the source-of-truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesChangedEvent {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub updated: Vec<RuleId>,
    pub deleted: Vec<RuleId>,
}

impl RulesChangedEvent {
    pub fn new(updated: Vec<RuleId>, deleted: Vec<RuleId>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            updated,
            deleted,
        }
    }
}

/// One or more pipeline definitions changed in the source-of-truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelinesChangedEvent {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub updated: Vec<PipelineId>,
    pub deleted: Vec<PipelineId>,
}

impl PipelinesChangedEvent {
    pub fn new(updated: Vec<PipelineId>, deleted: Vec<PipelineId>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            updated,
            deleted,
        }
    }
}

/// The pipeline assignment of one stream changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAssignmentChangedEvent {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub stream_id: StreamId,
    pub pipeline_ids: Vec<PipelineId>,
}

impl StreamAssignmentChangedEvent {
    pub fn new(stream_id: impl Into<StreamId>, pipeline_ids: Vec<PipelineId>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            stream_id: stream_id.into(),
            pipeline_ids,
        }
    }
}

/// Callback contract the event bus invokes on its own thread.
///
/// Handlers must be cheap and non-blocking: implementations schedule work
/// (a reload) rather than performing it inline.
pub trait PipelineChangeSubscriber: Send + Sync {
    fn on_rules_changed(&self, event: RulesChangedEvent);

    fn on_pipelines_changed(&self, event: PipelinesChangedEvent);

    fn on_assignments_changed(&self, event: StreamAssignmentChangedEvent);
}
