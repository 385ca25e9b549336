// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline State Store
//!
//! The single hot-swappable cell holding the current program snapshot.
//!
//! ## Concurrency
//!
//! The cell is read-mostly: every `process()` call performs one load, the
//! reload controller performs one store per successful reload. Readers
//! clone the `Arc` under a short read lock and keep the snapshot for the
//! lifetime of their call; since snapshots are immutable after
//! publication, a reader can never observe a torn program: it works with
//! the pre-reload image or the post-reload image, end to end.

use parking_lot::RwLock;
use std::sync::Arc;

use message_pipeline_domain::aggregates::program_snapshot::ProgramSnapshot;

/// Hot-swappable holder of the current [`ProgramSnapshot`].
pub struct PipelineStateStore {
    current: RwLock<Arc<ProgramSnapshot>>,
}

impl PipelineStateStore {
    /// Creates a store holding the empty program (no pipelines).
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(ProgramSnapshot::empty())),
        }
    }

    /// Returns the current snapshot. The reference stays valid (and
    /// immutable) for as long as the caller holds it, regardless of later
    /// publications.
    pub fn snapshot(&self) -> Arc<ProgramSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Atomically replaces the current snapshot.
    pub fn publish(&self, snapshot: Arc<ProgramSnapshot>) {
        *self.current.write() = snapshot;
    }
}

impl Default for PipelineStateStore {
    fn default() -> Self {
        Self::new()
    }
}
