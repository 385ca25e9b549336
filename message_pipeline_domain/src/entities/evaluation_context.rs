// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Evaluation Context
//!
//! Per-(message, stage) scratchpad for rule evaluation. The context
//! isolates rule-local state: variable bindings set by `let` statements,
//! messages created by rule actions, and the handle to the message under
//! evaluation.
//!
//! A fresh context is created for every (message, stage) pair and discarded
//! after the stage completes, so bindings never leak across stages. Created
//! messages are drained into the interpreter's work set after each stage.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::message::MessageRef;
use crate::services::function_registry::FunctionRegistry;
use crate::value_objects::value::RuleValue;

/// Rule-local evaluation scratchpad.
///
/// Holds the message under evaluation, lexically scoped variable bindings,
/// the messages created so far in this stage, and the function registry
/// that call expressions resolve against.
pub struct EvaluationContext {
    message: MessageRef,
    bindings: HashMap<String, RuleValue>,
    created_messages: Vec<MessageRef>,
    functions: Arc<FunctionRegistry>,
}

impl EvaluationContext {
    /// Reserved variable name bound to the message under evaluation.
    pub const MESSAGE_VAR: &'static str = "$message";

    pub fn new(message: MessageRef, functions: Arc<FunctionRegistry>) -> Self {
        Self {
            message,
            bindings: HashMap::new(),
            created_messages: Vec::new(),
            functions,
        }
    }

    /// The message under evaluation.
    pub fn message(&self) -> &MessageRef {
        &self.message
    }

    /// The function registry call expressions resolve against.
    pub fn functions(&self) -> Arc<FunctionRegistry> {
        Arc::clone(&self.functions)
    }

    /// Binds a variable for the remainder of this context's lifetime.
    pub fn set_var(&mut self, name: impl Into<String>, value: RuleValue) {
        let _ = self.bindings.insert(name.into(), value);
    }

    /// Looks up a variable binding; absent bindings yield `Null`.
    ///
    /// The reserved name [`Self::MESSAGE_VAR`] always resolves to the
    /// message under evaluation and cannot be shadowed.
    pub fn var(&self, name: &str) -> RuleValue {
        if name == Self::MESSAGE_VAR {
            return RuleValue::Message(Arc::clone(&self.message));
        }
        self.bindings.get(name).cloned().unwrap_or(RuleValue::Null)
    }

    /// Records a message created by a rule action. It enters the
    /// interpreter's work set when the stage completes, never the current
    /// pass.
    pub fn create_message(&mut self, message: MessageRef) {
        self.created_messages.push(message);
    }

    pub fn created_messages(&self) -> &[MessageRef] {
        &self.created_messages
    }

    /// Drains the created messages, leaving the context empty.
    pub fn drain_created_messages(&mut self) -> Vec<MessageRef> {
        std::mem::take(&mut self.created_messages)
    }
}
