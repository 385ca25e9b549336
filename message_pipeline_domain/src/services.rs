// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Services and Ports
//!
//! Stateless domain logic that does not belong to a single entity (function
//! dispatch, stage-slice iteration) and the service contracts consumed from
//! the host (processor registration, parser, journal).

pub mod function_registry;
pub mod journal;
pub mod processor;
pub mod rule_parser;
pub mod stage_iterator;

pub use function_registry::{
    FunctionDescriptor, FunctionRegistry, FunctionRegistryBuilder, ParameterDescriptor, ResolvedArgs, RuleFunction,
};
pub use journal::Journal;
pub use processor::{MessageProcessor, ProcessorDescriptor};
pub use rule_parser::RuleLanguageParser;
pub use stage_iterator::{StageIterator, StageSliceEntry};
