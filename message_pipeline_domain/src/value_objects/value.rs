// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Rule Value Model
//!
//! This module provides the tagged value union that rule expressions
//! evaluate to and that message fields are stored as. Every expression in
//! the AST produces a [`RuleValue`]; every function in the registry consumes
//! and returns them.
//!
//! ## Overview
//!
//! The value space is deliberately small:
//!
//! - **Long** (`i64`) and **Double** (`f64`) carry the integral/floating
//!   distinction that drives arithmetic and comparison coercion
//! - **Boolean** and **String** are the predicate and text workhorses
//! - **Map** and **List** hold structured field data
//! - **Message** is a handle to a live message (the one under evaluation or
//!   one created by a rule)
//! - **Null** is the absent value: missing variables, missing fields, and
//!   out-of-range lookups all evaluate to `Null` rather than failing
//!
//! ## Equality
//!
//! `RuleValue` has two equality notions. Structural equality (`PartialEq`)
//! is strict per tag and is what snapshot comparison and tests use; message
//! handles compare by pointer identity. The comparison operator `==` in the
//! rule language uses [`RuleValue::loose_eq`], which promotes mixed numerics
//! and yields `false` (never an error) across unrelated tags.
//!
//! ## Canonical String Form
//!
//! `Display` renders the canonical string form used by string concatenation
//! and the `to_string` conversion function: longs and doubles in their Rust
//! form, `Null` as the empty string, maps and lists as JSON, messages as
//! their id.

use serde_json::json;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::Arc;

use crate::entities::message::MessageRef;

/// Static type tag of a value or an expression.
///
/// `Unknown` only appears as the static type of expressions whose result
/// tag cannot be determined before evaluation (variable references, field
/// access, function calls).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Long,
    Double,
    Boolean,
    String,
    Map,
    List,
    Message,
    Null,
    Unknown,
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Long => "long",
            TypeTag::Double => "double",
            TypeTag::Boolean => "boolean",
            TypeTag::String => "string",
            TypeTag::Map => "map",
            TypeTag::List => "list",
            TypeTag::Message => "message",
            TypeTag::Null => "null",
            TypeTag::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Tagged value union for rule evaluation and message fields.
#[derive(Debug, Clone)]
pub enum RuleValue {
    Long(i64),
    Double(f64),
    Boolean(bool),
    String(String),
    Map(HashMap<String, RuleValue>),
    List(Vec<RuleValue>),
    Message(MessageRef),
    Null,
}

impl RuleValue {
    /// Returns the runtime type tag of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            RuleValue::Long(_) => TypeTag::Long,
            RuleValue::Double(_) => TypeTag::Double,
            RuleValue::Boolean(_) => TypeTag::Boolean,
            RuleValue::String(_) => TypeTag::String,
            RuleValue::Map(_) => TypeTag::Map,
            RuleValue::List(_) => TypeTag::List,
            RuleValue::Message(_) => TypeTag::Message,
            RuleValue::Null => TypeTag::Null,
        }
    }

    /// Truthiness: `Null` and `Boolean(false)` are false, everything else is
    /// true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, RuleValue::Null | RuleValue::Boolean(false))
    }

    /// Checks whether the value is numeric (integral or floating).
    pub fn is_numeric(&self) -> bool {
        matches!(self, RuleValue::Long(_) | RuleValue::Double(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RuleValue::Null)
    }

    /// Returns the integral value, if this is a `Long`.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            RuleValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a double, promoting an integral value.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            RuleValue::Long(v) => Some(*v as f64),
            RuleValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RuleValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RuleValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Loose equality used by the rule-language `==` operator.
    ///
    /// Mixed numerics are promoted to double before comparison; a numeric
    /// compared against a non-numeric is `false` without error; otherwise
    /// equal tags compare structurally.
    pub fn loose_eq(&self, other: &RuleValue) -> bool {
        match (self, other) {
            (RuleValue::Long(a), RuleValue::Double(b)) => (*a as f64) == *b,
            (RuleValue::Double(a), RuleValue::Long(b)) => *a == (*b as f64),
            (a, b) if a.is_numeric() != b.is_numeric() => false,
            (a, b) => a == b,
        }
    }

    /// Converts this value into the JSON data model.
    ///
    /// Message handles render as their id string; this conversion is lossy
    /// for them by design (a message is not field data).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RuleValue::Long(v) => json!(v),
            RuleValue::Double(v) => json!(v),
            RuleValue::Boolean(v) => json!(v),
            RuleValue::String(v) => json!(v),
            RuleValue::Map(map) => {
                serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            RuleValue::List(items) => serde_json::Value::Array(items.iter().map(RuleValue::to_json).collect()),
            RuleValue::Message(message) => json!(message.lock().id().to_string()),
            RuleValue::Null => serde_json::Value::Null,
        }
    }

    /// Builds a value from the JSON data model.
    ///
    /// Integral JSON numbers become `Long`, everything else numeric becomes
    /// `Double`.
    pub fn from_json(value: serde_json::Value) -> RuleValue {
        match value {
            serde_json::Value::Null => RuleValue::Null,
            serde_json::Value::Bool(v) => RuleValue::Boolean(v),
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    RuleValue::Long(v)
                } else {
                    RuleValue::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(v) => RuleValue::String(v),
            serde_json::Value::Array(items) => RuleValue::List(items.into_iter().map(RuleValue::from_json).collect()),
            serde_json::Value::Object(map) => {
                RuleValue::Map(map.into_iter().map(|(k, v)| (k, RuleValue::from_json(v))).collect())
            }
        }
    }
}

impl PartialEq for RuleValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuleValue::Long(a), RuleValue::Long(b)) => a == b,
            (RuleValue::Double(a), RuleValue::Double(b)) => a == b,
            (RuleValue::Boolean(a), RuleValue::Boolean(b)) => a == b,
            (RuleValue::String(a), RuleValue::String(b)) => a == b,
            (RuleValue::Map(a), RuleValue::Map(b)) => a == b,
            (RuleValue::List(a), RuleValue::List(b)) => a == b,
            (RuleValue::Message(a), RuleValue::Message(b)) => Arc::ptr_eq(a, b),
            (RuleValue::Null, RuleValue::Null) => true,
            _ => false,
        }
    }
}

impl Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleValue::Long(v) => write!(f, "{}", v),
            RuleValue::Double(v) => write!(f, "{}", v),
            RuleValue::Boolean(v) => write!(f, "{}", v),
            RuleValue::String(v) => write!(f, "{}", v),
            RuleValue::Map(_) | RuleValue::List(_) => write!(f, "{}", self.to_json()),
            RuleValue::Message(message) => write!(f, "{}", message.lock().id()),
            RuleValue::Null => Ok(()),
        }
    }
}

impl From<i64> for RuleValue {
    fn from(v: i64) -> Self {
        RuleValue::Long(v)
    }
}

impl From<f64> for RuleValue {
    fn from(v: f64) -> Self {
        RuleValue::Double(v)
    }
}

impl From<bool> for RuleValue {
    fn from(v: bool) -> Self {
        RuleValue::Boolean(v)
    }
}

impl From<&str> for RuleValue {
    fn from(v: &str) -> Self {
        RuleValue::String(v.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(v: String) -> Self {
        RuleValue::String(v)
    }
}

impl From<Vec<RuleValue>> for RuleValue {
    fn from(v: Vec<RuleValue>) -> Self {
        RuleValue::List(v)
    }
}

impl From<HashMap<String, RuleValue>> for RuleValue {
    fn from(v: HashMap<String, RuleValue>) -> Self {
        RuleValue::Map(v)
    }
}
