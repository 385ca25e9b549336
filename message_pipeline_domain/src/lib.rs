// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Message Pipeline Domain
//!
//! The domain layer of the message pipeline interpreter: the core business
//! logic of evaluating user-authored processing pipelines against inbound
//! messages. It is completely independent of external concerns: no
//! runtime, no logging framework, no storage technology.
//!
//! ## Domain Concepts
//!
//! ### Entities
//! Objects with identity that mutate while staying themselves:
//!
//! - `Message`: the unit of data flowing through the host; rules mutate its
//!   fields, stream memberships, and drop flag in place
//! - `Rule`: a named `when → then` pair of predicate and action statements
//! - `Pipeline` / `Stage`: an ordered sequence of rule sets keyed by
//!   ascending stage number, with a per-stage match-quorum policy
//! - `EvaluationContext`: the per-(message, stage) scratchpad rules
//!   evaluate against
//!
//! ### Value Objects
//! Immutable, attribute-equal values:
//!
//! - `RuleValue`: the tagged union every expression evaluates to
//! - `MessageId`, `RuleId`, `PipelineId`, `StreamId`: typed identifiers
//!
//! ### Aggregates
//! - `ProgramSnapshot`: the complete compiled program (pipelines plus
//!   stream assignments), published atomically as one immutable unit
//!
//! ### Domain Services
//! - `FunctionRegistry`: name → native callable dispatch for function-call
//!   AST nodes, with arity and type validation
//! - `StageIterator`: lock-step iteration over stage slices across a set of
//!   pipelines
//!
//! ### Ports
//! Contracts consumed from the host, implemented by infrastructure:
//!
//! - `MessageProcessor`: the batch transform the host registers
//! - `RuleLanguageParser`: source → AST (the surface syntax is external)
//! - `RuleSourceService` / `PipelineSourceService` /
//!   `StreamAssignmentService`: the persistent source-of-truth
//! - `PipelineChangeSubscriber`: the cluster event bus callback contract
//! - `Journal`: offset commits for dropped messages
//!
//! ## Error Handling
//!
//! The domain uses [`PipelineError`] exclusively. Parse and link failures
//! degrade to sentinels; evaluation failures are contained at the rule
//! boundary. No error aborts a batch.

pub mod aggregates;
pub mod ast;
pub mod entities;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;
pub mod value_objects;

// Re-export commonly used types for convenient access
// These exports provide a clean API surface for consumers of the domain layer
pub use aggregates::program_snapshot::ProgramSnapshot;
pub use entities::evaluation_context::EvaluationContext;
pub use entities::message::{Message, MessageRef};
pub use entities::pipeline::{Pipeline, Stage};
pub use entities::rule::Rule;
pub use error::{PipelineError, SourceParseError};
pub use value_objects::ids::{MessageId, PipelineId, RuleId, StreamId};
pub use value_objects::value::{RuleValue, TypeTag};
