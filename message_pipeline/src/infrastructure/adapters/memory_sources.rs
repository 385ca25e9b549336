// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Source Adapters
//!
//! In-memory implementations of the source-of-truth ports and the journal.
//! Embedding hosts use these to drive the full reload path without the
//! external cluster services; the integration tests use them the same way.
//!
//! Each adapter holds its definitions behind a lock so test code can
//! replace them between reloads, which is exactly what a configuration
//! change looks like to the controller.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use message_pipeline_domain::repositories::pipeline_source::{PipelineSource, PipelineSourceService};
use message_pipeline_domain::repositories::rule_source::{RuleSource, RuleSourceService};
use message_pipeline_domain::repositories::stream_assignment::{StreamAssignment, StreamAssignmentService};
use message_pipeline_domain::services::journal::Journal;
use message_pipeline_domain::PipelineError;

/// In-memory rule definition store.
#[derive(Default)]
pub struct MemoryRuleSource {
    sources: RwLock<Vec<RuleSource>>,
}

impl MemoryRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sources(sources: Vec<RuleSource>) -> Self {
        Self {
            sources: RwLock::new(sources),
        }
    }

    /// Replaces the stored definitions (a configuration change).
    pub fn replace(&self, sources: Vec<RuleSource>) {
        *self.sources.write() = sources;
    }
}

#[async_trait]
impl RuleSourceService for MemoryRuleSource {
    async fn load_all(&self) -> Result<Vec<RuleSource>, PipelineError> {
        Ok(self.sources.read().clone())
    }
}

/// In-memory pipeline definition store.
#[derive(Default)]
pub struct MemoryPipelineSource {
    sources: RwLock<Vec<PipelineSource>>,
}

impl MemoryPipelineSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sources(sources: Vec<PipelineSource>) -> Self {
        Self {
            sources: RwLock::new(sources),
        }
    }

    pub fn replace(&self, sources: Vec<PipelineSource>) {
        *self.sources.write() = sources;
    }
}

#[async_trait]
impl PipelineSourceService for MemoryPipelineSource {
    async fn load_all(&self) -> Result<Vec<PipelineSource>, PipelineError> {
        Ok(self.sources.read().clone())
    }
}

/// In-memory stream assignment store.
#[derive(Default)]
pub struct MemoryStreamAssignments {
    assignments: RwLock<Vec<StreamAssignment>>,
}

impl MemoryStreamAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assignments(assignments: Vec<StreamAssignment>) -> Self {
        Self {
            assignments: RwLock::new(assignments),
        }
    }

    pub fn replace(&self, assignments: Vec<StreamAssignment>) {
        *self.assignments.write() = assignments;
    }
}

#[async_trait]
impl StreamAssignmentService for MemoryStreamAssignments {
    async fn load_all(&self) -> Result<Vec<StreamAssignment>, PipelineError> {
        Ok(self.assignments.read().clone())
    }
}

/// Journal adapter that records committed offsets for inspection.
#[derive(Default)]
pub struct RecordingJournal {
    offsets: Mutex<Vec<u64>>,
}

impl RecordingJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offsets committed so far, in commit order.
    pub fn committed(&self) -> Vec<u64> {
        self.offsets.lock().clone()
    }
}

impl Journal for RecordingJournal {
    fn mark_offset_committed(&self, offset: u64) {
        self.offsets.lock().push(offset);
    }
}
