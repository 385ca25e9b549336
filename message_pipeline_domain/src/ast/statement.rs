// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Statement AST
//!
//! Action statements of the rule language. A rule's `then` block is an
//! ordered sequence of statements evaluated for effect against the same
//! context the predicate was evaluated with. A statement failure aborts the
//! remaining statements of that rule only; the interpreter handles the
//! containment.

use crate::ast::expression::Expression;
use crate::entities::evaluation_context::EvaluationContext;
use crate::PipelineError;

/// An action statement of the rule language AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let name = expr`: binds a rule-local variable.
    Let { name: String, expr: Expression },
    /// A bare expression evaluated for effect, result discarded.
    Expression(Expression),
    /// A function call evaluated for effect. The expression is a
    /// [`Expression::FunctionCall`] by construction of the parser.
    FunctionCall(Expression),
}

impl Statement {
    /// Builds a `let` statement.
    pub fn let_var(name: impl Into<String>, expr: Expression) -> Self {
        Statement::Let {
            name: name.into(),
            expr,
        }
    }

    /// Builds a function-call statement with positional arguments.
    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Statement::FunctionCall(Expression::call(name, args))
    }

    /// Evaluates the statement for effect.
    pub fn evaluate(&self, ctx: &mut EvaluationContext) -> Result<(), PipelineError> {
        match self {
            Statement::Let { name, expr } => {
                let value = expr.evaluate(ctx)?;
                ctx.set_var(name.clone(), value);
                Ok(())
            }
            Statement::Expression(expr) | Statement::FunctionCall(expr) => {
                let _ = expr.evaluate(ctx)?;
                Ok(())
            }
        }
    }
}
