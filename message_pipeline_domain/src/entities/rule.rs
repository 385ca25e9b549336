// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Rule Entity
//!
//! A rule is a named `when → then` pair: a boolean predicate and an ordered
//! sequence of action statements, both expressed as AST nodes produced by
//! the external rule-language parser.
//!
//! ## Invariants
//!
//! - The `when` expression must not have a definitively non-boolean static
//!   type; expressions whose type resolves at runtime (`Unknown`) are
//!   admitted and simply do not match when they produce a non-boolean.
//! - Rule names are unique within the active program; uniqueness is an
//!   authoring-side concern enforced by the source-of-truth store, the
//!   engine logs and last-wins on collision during reload.
//!
//! ## Sentinel
//!
//! When a rule source fails to parse, or a stage references a rule name
//! that does not resolve, the reload substitutes [`Rule::always_false`]: a
//! rule whose predicate is constant `false` and whose action list is empty.
//! Sentinels keep the program total: a broken rule never matches, and the
//! rest of the program is unaffected.

use crate::ast::expression::Expression;
use crate::ast::statement::Statement;
use crate::value_objects::ids::RuleId;
use crate::value_objects::value::TypeTag;
use crate::PipelineError;

/// A named `when → then` pair of predicate and action statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    id: Option<RuleId>,
    name: String,
    when: Expression,
    then: Vec<Statement>,
}

impl Rule {
    /// Creates a rule, rejecting a predicate with a definitively
    /// non-boolean static type.
    pub fn new(
        id: Option<RuleId>,
        name: impl Into<String>,
        when: Expression,
        then: Vec<Statement>,
    ) -> Result<Self, PipelineError> {
        let name = name.into();
        match when.static_type() {
            TypeTag::Boolean | TypeTag::Unknown => Ok(Self { id, name, when, then }),
            other => Err(PipelineError::validation_error(format!(
                "rule '{}': when-predicate must be boolean, its static type is {}",
                name, other
            ))),
        }
    }

    /// Sentinel rule substituted for parse and link failures.
    ///
    /// Its predicate is constant `false` and its action list is empty, so
    /// it never matches and never acts; `reason` becomes the rule name for
    /// log attribution.
    pub fn always_false(reason: impl Into<String>) -> Self {
        Self {
            id: None,
            name: reason.into(),
            when: Expression::constant(false),
            then: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<&RuleId> {
        self.id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn when(&self) -> &Expression {
        &self.when
    }

    pub fn then(&self) -> &[Statement] {
        &self.then
    }
}
