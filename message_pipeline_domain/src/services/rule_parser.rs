// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Rule Language Parser Port
//!
//! The interpreter is agnostic to the rule language's surface syntax: it
//! consumes the parser as a source → AST contract. The reload controller
//! calls this port for every rule and pipeline source and substitutes
//! sentinels ([`crate::entities::rule::Rule::always_false`],
//! [`crate::entities::pipeline::Pipeline::empty`]) when parsing fails.

use crate::entities::pipeline::Pipeline;
use crate::entities::rule::Rule;
use crate::error::SourceParseError;
use crate::value_objects::ids::{PipelineId, RuleId};

/// Source → AST contract implemented by the external rule-language parser.
pub trait RuleLanguageParser: Send + Sync {
    /// Parses a rule source into its AST.
    ///
    /// # Errors
    ///
    /// [`SourceParseError`] with the line/column of the first syntax error.
    fn parse_rule(&self, id: &RuleId, source: &str) -> Result<Rule, SourceParseError>;

    /// Parses a pipeline source into its (unlinked) AST.
    ///
    /// # Errors
    ///
    /// [`SourceParseError`] with the line/column of the first syntax error.
    fn parse_pipeline(&self, id: &PipelineId, source: &str) -> Result<Pipeline, SourceParseError>;
}
