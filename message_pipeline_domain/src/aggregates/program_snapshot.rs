// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Program Snapshot Aggregate
//!
//! The program snapshot is the unit of hot-swap: the complete compiled
//! program (pipelines by id plus the stream-to-pipelines assignment
//! multimap) published as one immutable value.
//!
//! ## Consistency
//!
//! Fields within one snapshot are mutually consistent: every pipeline
//! referenced by the assignment map exists in `pipelines_by_id`, and every
//! rule reference in every stage has been resolved (to a real rule or an
//! always-false sentinel) before the snapshot is constructed. The reload
//! controller is the only producer.
//!
//! ## Lifecycle
//!
//! Snapshots are published atomically into the state store; a reader holds
//! its snapshot reference for the duration of one `process()` call, so an
//! old snapshot becomes unreachable once the last in-flight call drops it.
//! Nothing in a snapshot mutates after publication.
//!
//! Structural equality (`PartialEq`) is part of the contract: reloading
//! unchanged sources must produce an equal snapshot, which is what makes
//! reloads idempotent and testable. Assignment lists are normalized
//! (sorted by pipeline id, deduplicated) at construction so equality does
//! not depend on source iteration order.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::entities::pipeline::Pipeline;
use crate::value_objects::ids::{PipelineId, StreamId};

/// The complete compiled program, published as one immutable value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgramSnapshot {
    pipelines_by_id: HashMap<PipelineId, Arc<Pipeline>>,
    stream_assignments: HashMap<StreamId, Vec<Arc<Pipeline>>>,
}

impl ProgramSnapshot {
    /// Builds a snapshot, normalizing each stream's pipeline list (sorted
    /// by pipeline id, deduplicated).
    pub fn new(
        pipelines_by_id: HashMap<PipelineId, Arc<Pipeline>>,
        mut stream_assignments: HashMap<StreamId, Vec<Arc<Pipeline>>>,
    ) -> Self {
        for assigned in stream_assignments.values_mut() {
            assigned.sort_by(|a, b| a.id().cmp(b.id()));
            assigned.dedup_by(|a, b| a.id() == b.id());
        }
        Self {
            pipelines_by_id,
            stream_assignments,
        }
    }

    /// A snapshot with no pipelines: the state before the first reload.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn pipeline(&self, id: &PipelineId) -> Option<&Arc<Pipeline>> {
        self.pipelines_by_id.get(id)
    }

    /// Pipelines assigned to a stream; empty if the stream has none.
    pub fn pipelines_for_stream(&self, stream: &StreamId) -> &[Arc<Pipeline>] {
        self.stream_assignments.get(stream).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pipelines_by_id(&self) -> &HashMap<PipelineId, Arc<Pipeline>> {
        &self.pipelines_by_id
    }

    pub fn stream_assignments(&self) -> &HashMap<StreamId, Vec<Arc<Pipeline>>> {
        &self.stream_assignments
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines_by_id.len()
    }

    /// Number of distinct rule names resolved across all stages.
    pub fn rule_count(&self) -> usize {
        let mut names: HashSet<&str> = HashSet::new();
        for pipeline in self.pipelines_by_id.values() {
            for stage in pipeline.stages() {
                for rule in stage.rules() {
                    let _ = names.insert(rule.name());
                }
            }
        }
        names.len()
    }
}
