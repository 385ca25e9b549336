// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Function Registry
//!
//! This module defines the unified trait interface that ALL rule functions
//! must implement, whether they are built-in (field manipulation, string
//! and conversion primitives) or supplied by the embedding host, plus the
//! process-wide registry that function-call AST nodes resolve against.
//!
//! ## Overview
//!
//! The [`RuleFunction`] trait provides a consistent contract for every
//! callable exposed to rule authors:
//!
//! - **Declaration**: each function carries a [`FunctionDescriptor`] naming
//!   its parameters (name, type, required/optional) and whether it mutates
//!   the message under evaluation
//! - **Invocation**: arguments arrive pre-bound and pre-validated as
//!   [`ResolvedArgs`]; the function body only deals with typed extraction
//! - **Dispatch**: the registry performs name resolution, arity checking,
//!   and required/type validation before the function body runs
//!
//! ## Why One Unified Trait?
//!
//! Separate traits per function family (string functions, message functions,
//! conversions) would force the registry into per-family dispatch and make
//! host-supplied functions second-class. One trait, one dispatch path, and
//! the descriptor carries everything the registry needs to validate a call.
//!
//! ## Registration Lifecycle
//!
//! Registration completes before the interpreter accepts messages: the
//! registry is assembled through [`FunctionRegistry::builder`] and is
//! immutable afterwards. Extending the function set means building a new
//! registry during a fresh process start.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::entities::evaluation_context::EvaluationContext;
use crate::entities::message::MessageRef;
use crate::value_objects::value::{RuleValue, TypeTag};
use crate::PipelineError;

/// Declared parameter of a rule function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    name: String,
    param_type: TypeTag,
    required: bool,
}

impl ParameterDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> TypeTag {
        self.param_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Static declaration of a rule function: its name, parameter list, and
/// whether invoking it mutates the message under evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    name: String,
    params: Vec<ParameterDescriptor>,
    mutating: bool,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            mutating: false,
        }
    }

    /// Marks the function as mutating (it writes to the message or to the
    /// evaluation context rather than being a pure value transform).
    pub fn mutating(mut self) -> Self {
        self.mutating = true;
        self
    }

    /// Declares a required parameter.
    pub fn param(mut self, name: impl Into<String>, param_type: TypeTag) -> Self {
        self.params.push(ParameterDescriptor {
            name: name.into(),
            param_type,
            required: true,
        });
        self
    }

    /// Declares an optional parameter.
    pub fn optional_param(mut self, name: impl Into<String>, param_type: TypeTag) -> Self {
        self.params.push(ParameterDescriptor {
            name: name.into(),
            param_type,
            required: false,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParameterDescriptor] {
        &self.params
    }

    pub fn is_mutating(&self) -> bool {
        self.mutating
    }
}

impl fmt::Display for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                if p.required {
                    format!("{}: {}", p.name, p.param_type)
                } else {
                    format!("[{}: {}]", p.name, p.param_type)
                }
            })
            .collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

/// Arguments after binding and validation, keyed by declared parameter name.
///
/// The registry builds this from the call site's positional and named
/// arguments; function bodies use the typed accessors and can rely on
/// required parameters being present and type-compatible.
#[derive(Debug, Clone, Default)]
pub struct ResolvedArgs {
    values: HashMap<String, RuleValue>,
}

impl ResolvedArgs {
    pub fn new(values: HashMap<String, RuleValue>) -> Self {
        Self { values }
    }

    /// Returns the argument value, or `Null` if the optional parameter was
    /// not supplied.
    pub fn get(&self, name: &str) -> RuleValue {
        self.values.get(name).cloned().unwrap_or(RuleValue::Null)
    }

    pub fn opt(&self, name: &str) -> Option<&RuleValue> {
        self.values.get(name)
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| !v.is_null())
    }

    /// Returns the argument coerced through its canonical string form.
    pub fn string(&self, name: &str) -> String {
        self.get(name).to_string()
    }

    /// Returns the argument as an integral value.
    pub fn long(&self, name: &str) -> Result<i64, PipelineError> {
        self.get(name)
            .as_long()
            .ok_or_else(|| PipelineError::type_mismatch(format!("argument '{}' must be a long", name)))
    }

    /// Returns the argument as a double, promoting an integral value.
    pub fn double(&self, name: &str) -> Result<f64, PipelineError> {
        self.get(name)
            .as_double()
            .ok_or_else(|| PipelineError::type_mismatch(format!("argument '{}' must be numeric", name)))
    }

    pub fn boolean(&self, name: &str) -> Result<bool, PipelineError> {
        self.get(name)
            .as_bool()
            .ok_or_else(|| PipelineError::type_mismatch(format!("argument '{}' must be a boolean", name)))
    }

    /// Returns the argument as a message handle.
    pub fn message(&self, name: &str) -> Result<MessageRef, PipelineError> {
        match self.get(name) {
            RuleValue::Message(message) => Ok(message),
            _ => Err(PipelineError::type_mismatch(format!(
                "argument '{}' must be a message",
                name
            ))),
        }
    }
}

/// A native callable exposed to rule authors.
pub trait RuleFunction: Send + Sync {
    /// The function's static declaration: name, parameters, mutability.
    fn descriptor(&self) -> &FunctionDescriptor;

    /// Invokes the function with bound, validated arguments.
    ///
    /// Implementations may mutate the message under evaluation (through the
    /// context) only if the descriptor declares the function mutating.
    fn invoke(&self, args: &ResolvedArgs, ctx: &mut EvaluationContext) -> Result<RuleValue, PipelineError>;
}

/// Process-wide mapping from function name to native callable.
///
/// Immutable after construction; function-call AST nodes resolve against it
/// on every evaluation. Argument binding is positional-first (declaration
/// order), then named.
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn RuleFunction>>,
}

impl FunctionRegistry {
    pub fn builder() -> FunctionRegistryBuilder {
        FunctionRegistryBuilder {
            functions: HashMap::new(),
        }
    }

    /// Creates an empty registry (no functions available to rules).
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn RuleFunction>> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Resolves, binds, validates, and invokes a function.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::UnknownFunction`] if the name is not registered
    /// - [`PipelineError::ArityMismatch`] if there are more positional
    ///   arguments than declared parameters, or a named argument does not
    ///   match any declared parameter
    /// - [`PipelineError::TypeMismatch`] if a required parameter is absent
    ///   (or bound to `Null`), or a bound value has an incompatible type
    pub fn invoke(
        &self,
        name: &str,
        positional: Vec<RuleValue>,
        named: HashMap<String, RuleValue>,
        ctx: &mut EvaluationContext,
    ) -> Result<RuleValue, PipelineError> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| PipelineError::UnknownFunction(name.to_string()))?;
        let descriptor = function.descriptor();
        let args = Self::bind(descriptor, positional, named)?;
        function.invoke(&args, ctx)
    }

    fn bind(
        descriptor: &FunctionDescriptor,
        positional: Vec<RuleValue>,
        mut named: HashMap<String, RuleValue>,
    ) -> Result<ResolvedArgs, PipelineError> {
        let params = descriptor.params();
        if positional.len() > params.len() {
            return Err(PipelineError::ArityMismatch(format!(
                "{} takes at most {} arguments, got {}",
                descriptor.name(),
                params.len(),
                positional.len()
            )));
        }

        let mut values: HashMap<String, RuleValue> = HashMap::with_capacity(params.len());
        let mut positional = positional.into_iter();
        for param in params {
            let bound = match positional.next() {
                Some(value) => Some(value),
                None => named.remove(param.name()),
            };
            match bound {
                Some(value) => {
                    Self::check_type(descriptor, param, &value)?;
                    let _ = values.insert(param.name().to_string(), value);
                }
                None if param.is_required() => {
                    return Err(PipelineError::type_mismatch(format!(
                        "{}: required argument '{}' is absent",
                        descriptor.name(),
                        param.name()
                    )));
                }
                None => {}
            }
        }

        if let Some(unknown) = named.keys().next() {
            return Err(PipelineError::ArityMismatch(format!(
                "{} has no parameter named '{}'",
                descriptor.name(),
                unknown
            )));
        }

        Ok(ResolvedArgs::new(values))
    }

    fn check_type(
        descriptor: &FunctionDescriptor,
        param: &ParameterDescriptor,
        value: &RuleValue,
    ) -> Result<(), PipelineError> {
        if value.is_null() {
            if param.is_required() {
                return Err(PipelineError::type_mismatch(format!(
                    "{}: required argument '{}' is null",
                    descriptor.name(),
                    param.name()
                )));
            }
            return Ok(());
        }
        let compatible = match param.param_type() {
            TypeTag::Unknown => true,
            // integral values are accepted where a double is declared
            TypeTag::Double => value.is_numeric(),
            expected => value.type_tag() == expected,
        };
        if compatible {
            Ok(())
        } else {
            Err(PipelineError::type_mismatch(format!(
                "{}: argument '{}' expects {}, got {}",
                descriptor.name(),
                param.name(),
                param.param_type(),
                value.type_tag()
            )))
        }
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder assembling the registry before the interpreter starts.
pub struct FunctionRegistryBuilder {
    functions: HashMap<String, Arc<dyn RuleFunction>>,
}

impl FunctionRegistryBuilder {
    /// Registers a function under its descriptor name. Re-registering a name
    /// replaces the previous callable.
    pub fn register(mut self, function: Arc<dyn RuleFunction>) -> Self {
        let name = function.descriptor().name().to_string();
        let _ = self.functions.insert(name, function);
        self
    }

    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry {
            functions: self.functions,
        }
    }
}
