// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the error system for the message pipeline domain.
//! It categorizes the failures the interpreter can encounter and keeps the
//! processing contract total: no error aborts a batch, every failure is
//! either contained at the rule boundary or degraded to a sentinel.
//!
//! ## Overview
//!
//! The error system organizes failures into logical categories:
//!
//! #### Parse Errors
//! - **RuleParse**: A rule source could not be parsed (degraded to an
//!   always-false sentinel rule)
//! - **PipelineParse**: A pipeline source could not be parsed (degraded to an
//!   empty sentinel pipeline)
//!
//! #### Link Errors
//! - **UnresolvedRule**: A stage references a rule name that is absent from
//!   the rule map (degraded to an always-false sentinel)
//!
//! #### Evaluation Errors
//! - **UnknownFunction**: A function-call node names a function that is not
//!   registered
//! - **ArityMismatch**: A function was invoked with the wrong number of
//!   arguments
//! - **TypeMismatch**: A required argument is absent or of an incompatible
//!   type
//! - **DivisionByZero**: Integral `/` or `%` with a zero divisor
//! - **EvaluationFailed**: Any other runtime failure inside an expression or
//!   statement
//!
//! #### Configuration and System Errors
//! - **InvalidConfiguration**: The program snapshot or processor
//!   configuration cannot be built
//! - **ValidationError**: Entity-level invariant violations (duplicate stage
//!   numbers, non-boolean rule predicates)
//! - **InternalError**: Unexpected system failures
//! - **MetricsError**: Metrics registration or collection failures
//!
//! ## Containment Strategy
//!
//! Evaluation errors are caught at the rule boundary by the interpreter: a
//! predicate failure demotes the rule to non-matching, a statement failure
//! aborts the remaining statements of that rule only. Parse and link errors
//! are absorbed during reload by substituting sentinels, so a broken source
//! never takes down the rest of the program.

use thiserror::Error;

/// Position-carrying parse failure reported by the rule-language parser.
///
/// The interpreter is agnostic to the surface syntax; this type is the only
/// thing it learns about a failed parse, and it is folded into
/// [`PipelineError::RuleParse`] / [`PipelineError::PipelineParse`] together
/// with the source id during reload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("parse error at {line}:{column}: {message}")]
pub struct SourceParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl SourceParseError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Domain-specific errors for the message pipeline interpreter.
///
/// Each variant carries a descriptive message. Evaluation-category variants
/// are contained at the rule boundary and logged with the rule name and
/// message id; they never propagate out of `process()`.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("Failed to parse rule: {0}")]
    RuleParse(String),

    #[error("Failed to parse pipeline: {0}")]
    PipelineParse(String),

    #[error("Unresolved rule {0}")]
    UnresolvedRule(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Arity mismatch: {0}")]
    ArityMismatch(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),
}

impl PipelineError {
    /// Creates a new rule parse error
    pub fn rule_parse(msg: impl Into<String>) -> Self {
        Self::RuleParse(msg.into())
    }

    /// Creates a new pipeline parse error
    pub fn pipeline_parse(msg: impl Into<String>) -> Self {
        Self::PipelineParse(msg.into())
    }

    /// Creates a new evaluation error
    pub fn evaluation_failed(msg: impl Into<String>) -> Self {
        Self::EvaluationFailed(msg.into())
    }

    /// Creates a new type mismatch error
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Creates a new configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a new validation error
    pub fn validation_error(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Creates a new internal error
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Creates a new metrics error
    pub fn metrics_error(msg: impl Into<String>) -> Self {
        Self::MetricsError(msg.into())
    }

    /// Checks if the error belongs to the evaluation category.
    ///
    /// Evaluation errors are contained at the rule boundary: the containing
    /// rule is demoted to non-matching (predicate) or its remaining
    /// statements are skipped (action), and processing of the message
    /// continues.
    pub fn is_evaluation_error(&self) -> bool {
        matches!(
            self,
            PipelineError::UnknownFunction(_)
                | PipelineError::ArityMismatch(_)
                | PipelineError::TypeMismatch(_)
                | PipelineError::DivisionByZero(_)
                | PipelineError::EvaluationFailed(_)
        )
    }

    /// Checks if the error belongs to the parse/link category.
    ///
    /// Parse and link errors are absorbed during reload by substituting
    /// sentinels; they never abort a reload.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            PipelineError::RuleParse(_) | PipelineError::PipelineParse(_) | PipelineError::UnresolvedRule(_)
        )
    }
}
