// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Entities
//!
//! Objects with identity: messages, rules, pipelines and their stages, and
//! the per-(message, stage) evaluation context.

pub mod evaluation_context;
pub mod message;
pub mod pipeline;
pub mod rule;

pub use evaluation_context::EvaluationContext;
pub use message::{Message, MessageRef};
pub use pipeline::{Pipeline, Stage};
pub use rule::Rule;
