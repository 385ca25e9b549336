// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Events
//!
//! Configuration change notifications delivered by the cluster event bus.

pub mod change_events;

pub use change_events::{
    PipelineChangeSubscriber, PipelinesChangedEvent, RulesChangedEvent, StreamAssignmentChangedEvent,
};
