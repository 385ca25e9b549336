// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Process Event Bus Adapter
//!
//! A minimal stand-in for the cluster event bus: fans configuration change
//! events out to every registered [`PipelineChangeSubscriber`] on the
//! publishing thread. Subscribers are expected to be cheap and
//! non-blocking (the reload controller only schedules work), which is the
//! same contract the real bus imposes.

use parking_lot::RwLock;
use std::sync::Arc;

use message_pipeline_domain::events::change_events::{
    PipelineChangeSubscriber, PipelinesChangedEvent, RulesChangedEvent, StreamAssignmentChangedEvent,
};

/// Synchronous fan-out of change events to registered subscribers.
#[derive(Default)]
pub struct InProcessEventBus {
    subscribers: RwLock<Vec<Arc<dyn PipelineChangeSubscriber>>>,
}

impl InProcessEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Arc<dyn PipelineChangeSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    pub fn publish_rules_changed(&self, event: RulesChangedEvent) {
        for subscriber in self.subscribers.read().iter() {
            subscriber.on_rules_changed(event.clone());
        }
    }

    pub fn publish_pipelines_changed(&self, event: PipelinesChangedEvent) {
        for subscriber in self.subscribers.read().iter() {
            subscriber.on_pipelines_changed(event.clone());
        }
    }

    pub fn publish_assignments_changed(&self, event: StreamAssignmentChangedEvent) {
        for subscriber in self.subscribers.read().iter() {
            subscriber.on_assignments_changed(event.clone());
        }
    }
}
