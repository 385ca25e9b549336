// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Expression AST
//!
//! This module provides the expression nodes of the rule language AST and
//! their evaluation semantics. Expressions are produced by the external
//! rule-language parser and evaluated by the interpreter against a
//! per-(message, stage) [`EvaluationContext`].
//!
//! ## Overview
//!
//! Evaluation is a single dispatch on the node tag: a tagged enum with an
//! `evaluate` method, not an inheritance hierarchy. Every node is immutable
//! after construction, which is what makes a published program snapshot
//! safely shareable across interpreter threads.
//!
//! The semantics follow the rule language contract:
//!
//! - **Arithmetic** stays integral when both operands are integral
//!   (two's-complement 64-bit wrap; division/remainder by zero fails), and
//!   promotes to IEEE-754 double when either side is floating. String `+`
//!   concatenates, coercing the other side through its canonical string
//!   form.
//! - **Comparisons** promote mixed numerics to double; `==` across
//!   unrelated tags is `false` without error; ordering is defined for
//!   numeric and string pairs and `false` otherwise.
//! - **Logical** operators short-circuit on truthiness and always produce a
//!   boolean.
//! - **Access** (`FieldAccess`, `Indexed`) resolves maps by string key,
//!   messages by field name, lists by integral index; `Null` targets and
//!   missing keys yield `Null` without error.
//! - **Function calls** resolve against the registry in the context;
//!   argument expressions are evaluated positionally first, then named.
//!
//! Every failure surfaces as a `PipelineError` and is contained at the rule
//! boundary by the interpreter; no expression failure escapes `process()`.

use std::collections::HashMap;

use crate::entities::evaluation_context::EvaluationContext;
use crate::value_objects::value::{RuleValue, TypeTag};
use crate::PipelineError;

/// Arithmetic operator of a [`Expression::Binary`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

/// Operator of a [`Expression::Unary`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
}

/// Operator of a [`Expression::Comparison`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Neq,
}

/// Short-circuiting logical connectives.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalExpression {
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
}

/// An expression node of the rule language AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Scalar literal (long, double, boolean, or string).
    Constant(RuleValue),
    /// Variable reference; absent bindings evaluate to `Null`.
    VarRef(String),
    /// `target.field` on maps and messages.
    FieldAccess {
        target: Box<Expression>,
        field: String,
    },
    /// `target[key]` on maps, lists, and messages.
    Indexed {
        target: Box<Expression>,
        key: Box<Expression>,
    },
    /// Call into the function registry with positional and named arguments.
    FunctionCall {
        name: String,
        args: Vec<Expression>,
        named_args: Vec<(String, Expression)>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Comparison {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Logical(LogicalExpression),
}

impl Expression {
    /// Builds a scalar constant node.
    pub fn constant(value: impl Into<RuleValue>) -> Self {
        Expression::Constant(value.into())
    }

    /// Builds a variable-reference node.
    pub fn var(name: impl Into<String>) -> Self {
        Expression::VarRef(name.into())
    }

    /// Builds a function-call node with positional arguments only.
    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.into(),
            args,
            named_args: Vec::new(),
        }
    }

    /// Evaluates the expression against a context, producing a value.
    pub fn evaluate(&self, ctx: &mut EvaluationContext) -> Result<RuleValue, PipelineError> {
        match self {
            Expression::Constant(value) => Ok(value.clone()),
            Expression::VarRef(name) => Ok(ctx.var(name)),
            Expression::FieldAccess { target, field } => {
                let target = target.evaluate(ctx)?;
                Ok(access_field(&target, field))
            }
            Expression::Indexed { target, key } => {
                let target = target.evaluate(ctx)?;
                let key = key.evaluate(ctx)?;
                Ok(access_indexed(&target, &key))
            }
            Expression::FunctionCall { name, args, named_args } => {
                let mut positional = Vec::with_capacity(args.len());
                for arg in args {
                    positional.push(arg.evaluate(ctx)?);
                }
                let mut named = HashMap::with_capacity(named_args.len());
                for (param, arg) in named_args {
                    let _ = named.insert(param.clone(), arg.evaluate(ctx)?);
                }
                let functions = ctx.functions();
                functions.invoke(name, positional, named, ctx)
            }
            Expression::Binary { op, left, right } => {
                let left = left.evaluate(ctx)?;
                let right = right.evaluate(ctx)?;
                apply_binary(*op, left, right)
            }
            Expression::Unary { op, operand } => {
                let operand = operand.evaluate(ctx)?;
                match op {
                    UnaryOp::Negate => match operand {
                        RuleValue::Long(v) => Ok(RuleValue::Long(v.wrapping_neg())),
                        RuleValue::Double(v) => Ok(RuleValue::Double(-v)),
                        other => Err(PipelineError::type_mismatch(format!(
                            "cannot negate a {}",
                            other.type_tag()
                        ))),
                    },
                }
            }
            Expression::Comparison { op, left, right } => {
                let left = left.evaluate(ctx)?;
                let right = right.evaluate(ctx)?;
                Ok(RuleValue::Boolean(compare(*op, &left, &right)))
            }
            Expression::Logical(logical) => match logical {
                LogicalExpression::And(left, right) => {
                    if !left.evaluate(ctx)?.is_truthy() {
                        return Ok(RuleValue::Boolean(false));
                    }
                    Ok(RuleValue::Boolean(right.evaluate(ctx)?.is_truthy()))
                }
                LogicalExpression::Or(left, right) => {
                    if left.evaluate(ctx)?.is_truthy() {
                        return Ok(RuleValue::Boolean(true));
                    }
                    Ok(RuleValue::Boolean(right.evaluate(ctx)?.is_truthy()))
                }
                LogicalExpression::Not(operand) => Ok(RuleValue::Boolean(!operand.evaluate(ctx)?.is_truthy())),
            },
        }
    }

    /// Static type of the expression, or `Unknown` when the result tag
    /// depends on runtime data.
    pub fn static_type(&self) -> TypeTag {
        match self {
            Expression::Constant(value) => value.type_tag(),
            Expression::VarRef(_) | Expression::FieldAccess { .. } | Expression::Indexed { .. } => TypeTag::Unknown,
            Expression::FunctionCall { .. } => TypeTag::Unknown,
            Expression::Binary { op, left, right } => {
                let (left, right) = (left.static_type(), right.static_type());
                match (op, left, right) {
                    (BinaryOp::Add, TypeTag::String, _) | (BinaryOp::Add, _, TypeTag::String) => TypeTag::String,
                    (_, TypeTag::Long, TypeTag::Long) => TypeTag::Long,
                    (_, TypeTag::Double, TypeTag::Long)
                    | (_, TypeTag::Long, TypeTag::Double)
                    | (_, TypeTag::Double, TypeTag::Double) => TypeTag::Double,
                    _ => TypeTag::Unknown,
                }
            }
            Expression::Unary { operand, .. } => match operand.static_type() {
                tag @ (TypeTag::Long | TypeTag::Double) => tag,
                _ => TypeTag::Unknown,
            },
            Expression::Comparison { .. } | Expression::Logical(_) => TypeTag::Boolean,
        }
    }
}

fn access_field(target: &RuleValue, field: &str) -> RuleValue {
    match target {
        RuleValue::Map(map) => map.get(field).cloned().unwrap_or(RuleValue::Null),
        RuleValue::Message(message) => message.lock().field(field),
        // Null and non-container targets resolve to Null without error
        _ => RuleValue::Null,
    }
}

fn access_indexed(target: &RuleValue, key: &RuleValue) -> RuleValue {
    match target {
        RuleValue::Map(map) => map.get(&key.to_string()).cloned().unwrap_or(RuleValue::Null),
        RuleValue::Message(message) => message.lock().field(&key.to_string()),
        RuleValue::List(items) => match key.as_long() {
            Some(index) if index >= 0 => items.get(index as usize).cloned().unwrap_or(RuleValue::Null),
            _ => RuleValue::Null,
        },
        _ => RuleValue::Null,
    }
}

fn apply_binary(op: BinaryOp, left: RuleValue, right: RuleValue) -> Result<RuleValue, PipelineError> {
    // String + anything concatenates, coercing through the canonical form
    if op == BinaryOp::Add {
        if let RuleValue::String(l) = &left {
            return Ok(RuleValue::String(format!("{}{}", l, right)));
        }
        if let RuleValue::String(r) = &right {
            return Ok(RuleValue::String(format!("{}{}", left, r)));
        }
    }

    match (&left, &right) {
        (RuleValue::Long(l), RuleValue::Long(r)) => integral_op(op, *l, *r),
        (l, r) if l.is_numeric() && r.is_numeric() => {
            // as_double cannot fail for numeric tags
            let l = l.as_double().unwrap_or(f64::NAN);
            let r = r.as_double().unwrap_or(f64::NAN);
            Ok(RuleValue::Double(floating_op(op, l, r)))
        }
        _ => Err(PipelineError::type_mismatch(format!(
            "cannot apply {:?} to {} and {}",
            op,
            left.type_tag(),
            right.type_tag()
        ))),
    }
}

fn integral_op(op: BinaryOp, left: i64, right: i64) -> Result<RuleValue, PipelineError> {
    let result = match op {
        BinaryOp::Add => left.wrapping_add(right),
        BinaryOp::Subtract => left.wrapping_sub(right),
        BinaryOp::Multiply => left.wrapping_mul(right),
        BinaryOp::Divide => {
            if right == 0 {
                return Err(PipelineError::DivisionByZero(format!("{} / 0", left)));
            }
            left.wrapping_div(right)
        }
        BinaryOp::Remainder => {
            if right == 0 {
                return Err(PipelineError::DivisionByZero(format!("{} % 0", left)));
            }
            left.wrapping_rem(right)
        }
    };
    Ok(RuleValue::Long(result))
}

fn floating_op(op: BinaryOp, left: f64, right: f64) -> f64 {
    match op {
        BinaryOp::Add => left + right,
        BinaryOp::Subtract => left - right,
        BinaryOp::Multiply => left * right,
        // IEEE-754 semantics: division by zero yields inf/NaN, no error
        BinaryOp::Divide => left / right,
        BinaryOp::Remainder => left % right,
    }
}

fn compare(op: ComparisonOp, left: &RuleValue, right: &RuleValue) -> bool {
    use std::cmp::Ordering;
    match op {
        ComparisonOp::Eq => left.loose_eq(right),
        ComparisonOp::Neq => !left.loose_eq(right),
        ComparisonOp::Lt => ordering(left, right).is_some_and(|o| o == Ordering::Less),
        ComparisonOp::Lte => ordering(left, right).is_some_and(|o| o != Ordering::Greater),
        ComparisonOp::Gt => ordering(left, right).is_some_and(|o| o == Ordering::Greater),
        ComparisonOp::Gte => ordering(left, right).is_some_and(|o| o != Ordering::Less),
    }
}

/// Ordering for comparable pairs: mixed numerics promote to double, strings
/// compare lexicographically. `None` for anything else (and for NaN), which
/// makes every ordering comparison false without error.
fn ordering(left: &RuleValue, right: &RuleValue) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (l, r) if l.is_numeric() && r.is_numeric() => l.as_double()?.partial_cmp(&r.as_double()?),
        (RuleValue::String(l), RuleValue::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::message::Message;
    use crate::services::function_registry::{
        FunctionDescriptor, FunctionRegistry, ResolvedArgs, RuleFunction,
    };
    use proptest::prelude::*;
    use std::sync::Arc;

    struct MarkFunction {
        descriptor: FunctionDescriptor,
    }

    impl RuleFunction for MarkFunction {
        fn descriptor(&self) -> &FunctionDescriptor {
            &self.descriptor
        }

        fn invoke(&self, _args: &ResolvedArgs, ctx: &mut EvaluationContext) -> Result<RuleValue, PipelineError> {
            ctx.message().lock().set_field("marked", RuleValue::Boolean(true));
            Ok(RuleValue::Boolean(true))
        }
    }

    fn context() -> EvaluationContext {
        let registry = FunctionRegistry::builder()
            .register(Arc::new(MarkFunction {
                descriptor: FunctionDescriptor::new("mark").mutating(),
            }))
            .build();
        EvaluationContext::new(Message::new().into_ref(), Arc::new(registry))
    }

    fn eval(expr: Expression) -> RuleValue {
        expr.evaluate(&mut context()).unwrap()
    }

    fn binary(op: BinaryOp, left: impl Into<RuleValue>, right: impl Into<RuleValue>) -> Expression {
        Expression::Binary {
            op,
            left: Box::new(Expression::constant(left)),
            right: Box::new(Expression::constant(right)),
        }
    }

    fn comparison(op: ComparisonOp, left: impl Into<RuleValue>, right: impl Into<RuleValue>) -> Expression {
        Expression::Comparison {
            op,
            left: Box::new(Expression::constant(left)),
            right: Box::new(Expression::constant(right)),
        }
    }

    #[test]
    fn test_integral_arithmetic_stays_integral() {
        assert_eq!(eval(binary(BinaryOp::Add, 2i64, 3i64)), RuleValue::Long(5));
        assert_eq!(eval(binary(BinaryOp::Divide, 7i64, 2i64)), RuleValue::Long(3));
        assert_eq!(eval(binary(BinaryOp::Remainder, 7i64, 2i64)), RuleValue::Long(1));
    }

    #[test]
    fn test_integral_overflow_wraps() {
        assert_eq!(
            eval(binary(BinaryOp::Add, i64::MAX, 1i64)),
            RuleValue::Long(i64::MIN)
        );
        assert_eq!(
            eval(binary(BinaryOp::Divide, i64::MIN, -1i64)),
            RuleValue::Long(i64::MIN)
        );
    }

    #[test]
    fn test_integral_division_by_zero_fails() {
        let err = binary(BinaryOp::Divide, 1i64, 0i64).evaluate(&mut context()).unwrap_err();
        assert!(matches!(err, PipelineError::DivisionByZero(_)));
        let err = binary(BinaryOp::Remainder, 1i64, 0i64).evaluate(&mut context()).unwrap_err();
        assert!(matches!(err, PipelineError::DivisionByZero(_)));
    }

    #[test]
    fn test_mixed_arithmetic_promotes_to_double() {
        assert_eq!(eval(binary(BinaryOp::Multiply, 2i64, 0.5f64)), RuleValue::Double(1.0));
        // floating division by zero is IEEE, not an error
        assert_eq!(eval(binary(BinaryOp::Divide, 1.0f64, 0.0f64)), RuleValue::Double(f64::INFINITY));
    }

    #[test]
    fn test_string_concatenation_coerces() {
        assert_eq!(eval(binary(BinaryOp::Add, "n=", 42i64)), RuleValue::from("n=42"));
        assert_eq!(eval(binary(BinaryOp::Add, 1i64, "st")), RuleValue::from("1st"));
    }

    #[test]
    fn test_non_numeric_arithmetic_fails() {
        let err = binary(BinaryOp::Subtract, true, false).evaluate(&mut context()).unwrap_err();
        assert!(matches!(err, PipelineError::TypeMismatch(_)));
    }

    #[test]
    fn test_comparison_promotes_mixed_numerics() {
        assert_eq!(eval(comparison(ComparisonOp::Lt, 1i64, 1.5f64)), RuleValue::Boolean(true));
        assert_eq!(eval(comparison(ComparisonOp::Eq, 2i64, 2.0f64)), RuleValue::Boolean(true));
        assert_eq!(eval(comparison(ComparisonOp::Neq, 2i64, 2.0f64)), RuleValue::Boolean(false));
    }

    #[test]
    fn test_equality_across_tags_is_false_without_error() {
        assert_eq!(eval(comparison(ComparisonOp::Eq, 1i64, "1")), RuleValue::Boolean(false));
        assert_eq!(eval(comparison(ComparisonOp::Neq, 1i64, "1")), RuleValue::Boolean(true));
    }

    #[test]
    fn test_string_ordering_is_lexicographic() {
        assert_eq!(eval(comparison(ComparisonOp::Lt, "abc", "abd")), RuleValue::Boolean(true));
        assert_eq!(eval(comparison(ComparisonOp::Gte, "b", "a")), RuleValue::Boolean(true));
    }

    #[test]
    fn test_ordering_across_tags_is_false() {
        assert_eq!(eval(comparison(ComparisonOp::Lt, 1i64, "2")), RuleValue::Boolean(false));
    }

    #[test]
    fn test_and_short_circuits() {
        let mut ctx = context();
        let expr = Expression::Logical(LogicalExpression::And(
            Box::new(Expression::constant(false)),
            Box::new(Expression::call("mark", vec![])),
        ));
        assert_eq!(expr.evaluate(&mut ctx).unwrap(), RuleValue::Boolean(false));
        // the right side never ran
        assert_eq!(ctx.message().lock().field("marked"), RuleValue::Null);
    }

    #[test]
    fn test_or_short_circuits() {
        let mut ctx = context();
        let expr = Expression::Logical(LogicalExpression::Or(
            Box::new(Expression::constant(true)),
            Box::new(Expression::call("mark", vec![])),
        ));
        assert_eq!(expr.evaluate(&mut ctx).unwrap(), RuleValue::Boolean(true));
        assert_eq!(ctx.message().lock().field("marked"), RuleValue::Null);
    }

    #[test]
    fn test_not_uses_truthiness() {
        let expr = Expression::Logical(LogicalExpression::Not(Box::new(Expression::constant(RuleValue::Null))));
        assert_eq!(eval(expr), RuleValue::Boolean(true));
        let expr = Expression::Logical(LogicalExpression::Not(Box::new(Expression::constant(0i64))));
        assert_eq!(eval(expr), RuleValue::Boolean(false));
    }

    #[test]
    fn test_field_access_on_message_and_null() {
        let mut ctx = context();
        ctx.message().lock().set_field("source", RuleValue::from("syslog"));
        ctx.set_var("msg", RuleValue::Message(Arc::clone(ctx.message())));

        let expr = Expression::FieldAccess {
            target: Box::new(Expression::var("msg")),
            field: "source".to_string(),
        };
        assert_eq!(expr.evaluate(&mut ctx).unwrap(), RuleValue::from("syslog"));

        // Null target yields Null without error
        let expr = Expression::FieldAccess {
            target: Box::new(Expression::var("absent")),
            field: "anything".to_string(),
        };
        assert_eq!(expr.evaluate(&mut ctx).unwrap(), RuleValue::Null);
    }

    #[test]
    fn test_indexed_access() {
        let mut ctx = context();
        ctx.set_var("xs", RuleValue::List(vec![RuleValue::Long(10), RuleValue::Long(20)]));

        let index = |key: Expression| Expression::Indexed {
            target: Box::new(Expression::var("xs")),
            key: Box::new(key),
        };
        assert_eq!(index(Expression::constant(1i64)).evaluate(&mut ctx).unwrap(), RuleValue::Long(20));
        assert_eq!(index(Expression::constant(5i64)).evaluate(&mut ctx).unwrap(), RuleValue::Null);
        assert_eq!(index(Expression::constant(-1i64)).evaluate(&mut ctx).unwrap(), RuleValue::Null);
    }

    #[test]
    fn test_var_ref_absent_is_null() {
        assert_eq!(eval(Expression::var("missing")), RuleValue::Null);
    }

    #[test]
    fn test_static_types() {
        assert_eq!(Expression::constant(1i64).static_type(), TypeTag::Long);
        assert_eq!(binary(BinaryOp::Add, 1i64, 2i64).static_type(), TypeTag::Long);
        assert_eq!(binary(BinaryOp::Add, 1i64, 2.0f64).static_type(), TypeTag::Double);
        assert_eq!(binary(BinaryOp::Add, "a", 2i64).static_type(), TypeTag::String);
        assert_eq!(comparison(ComparisonOp::Eq, 1i64, 2i64).static_type(), TypeTag::Boolean);
        assert_eq!(Expression::var("x").static_type(), TypeTag::Unknown);
    }

    proptest! {
        #[test]
        fn prop_integral_arithmetic_is_closed(a in any::<i64>(), b in any::<i64>()) {
            let result = eval(binary(BinaryOp::Add, a, b));
            prop_assert_eq!(result.type_tag(), TypeTag::Long);
            prop_assert_eq!(result, RuleValue::Long(a.wrapping_add(b)));
        }

        #[test]
        fn prop_mixed_arithmetic_is_floating(a in any::<i64>(), b in -1.0e12f64..1.0e12f64) {
            let result = eval(binary(BinaryOp::Add, a, b));
            prop_assert_eq!(result.type_tag(), TypeTag::Double);
        }

        #[test]
        fn prop_neq_is_negation_of_eq(a in any::<i64>(), b in any::<i64>()) {
            let eq = eval(comparison(ComparisonOp::Eq, a, b));
            let neq = eval(comparison(ComparisonOp::Neq, a, b));
            prop_assert_eq!(eq.as_bool().unwrap(), !neq.as_bool().unwrap());
        }
    }
}
