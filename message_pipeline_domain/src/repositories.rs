// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Repository Ports
//!
//! Read-only contracts over the persistent source-of-truth for rule,
//! pipeline, and stream-assignment definitions. The reload controller is
//! their only consumer; each reload loads everything and rebuilds the
//! program snapshot from scratch.

pub mod pipeline_source;
pub mod rule_source;
pub mod stream_assignment;

pub use pipeline_source::{PipelineSource, PipelineSourceService};
pub use rule_source::{RuleSource, RuleSourceService};
pub use stream_assignment::{StreamAssignment, StreamAssignmentService};
