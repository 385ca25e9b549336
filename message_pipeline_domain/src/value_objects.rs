// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Value Objects
//!
//! Immutable, attribute-equal values: the rule value union and the typed
//! identifier newtypes.

pub mod ids;
pub mod value;

pub use ids::{MessageId, PipelineId, RuleId, StreamId};
pub use value::{RuleValue, TypeTag};
