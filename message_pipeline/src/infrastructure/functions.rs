// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Built-in Rule Function Library
//!
//! The native functions exposed to rule authors, grouped by concern:
//!
//! - [`messages`]: field manipulation, stream routing, message lifecycle
//!   (the mutating functions)
//! - [`strings`]: text primitives
//! - [`conversions`]: tolerant type conversions with defaults
//!
//! [`builtin_registry`] assembles the complete set; hosts that expose
//! additional functions start from the same builder and register theirs on
//! top before the interpreter starts.

use std::sync::Arc;

use message_pipeline_domain::entities::evaluation_context::EvaluationContext;
use message_pipeline_domain::services::function_registry::{
    FunctionDescriptor, FunctionRegistry, FunctionRegistryBuilder, ResolvedArgs, RuleFunction,
};
use message_pipeline_domain::value_objects::value::RuleValue;
use message_pipeline_domain::PipelineError;

pub mod conversions;
pub mod messages;
pub mod strings;

type NativeBody = dyn Fn(&ResolvedArgs, &mut EvaluationContext) -> Result<RuleValue, PipelineError> + Send + Sync;

/// A built-in function: a descriptor plus a native body.
pub struct NativeFunction {
    descriptor: FunctionDescriptor,
    body: Box<NativeBody>,
}

impl NativeFunction {
    pub fn new<F>(descriptor: FunctionDescriptor, body: F) -> Arc<Self>
    where
        F: Fn(&ResolvedArgs, &mut EvaluationContext) -> Result<RuleValue, PipelineError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            descriptor,
            body: Box::new(body),
        })
    }
}

impl RuleFunction for NativeFunction {
    fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    fn invoke(&self, args: &ResolvedArgs, ctx: &mut EvaluationContext) -> Result<RuleValue, PipelineError> {
        (self.body)(args, ctx)
    }
}

/// Registers the complete built-in library into a fresh builder.
///
/// Hosts extending the function set call this, register their own
/// functions, and build.
pub fn register_builtins(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    let builder = messages::register(builder);
    let builder = strings::register(builder);
    conversions::register(builder)
}

/// The complete built-in function registry.
pub fn builtin_registry() -> Arc<FunctionRegistry> {
    Arc::new(register_builtins(FunctionRegistry::builder()).build())
}
