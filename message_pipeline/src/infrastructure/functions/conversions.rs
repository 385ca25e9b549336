// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Conversion Functions
//!
//! Tolerant type conversions. Rule authors feed these whatever a field
//! lookup produced; conversions never fail: an inconvertible or absent
//! value yields the caller-supplied default (or the type's zero value).
//! This is why `value` is declared optional: a missing field evaluates to
//! `Null`, and `to_long(missing)` should produce the default rather than a
//! type error.

use message_pipeline_domain::services::function_registry::{FunctionDescriptor, FunctionRegistryBuilder};
use message_pipeline_domain::value_objects::value::{RuleValue, TypeTag};

use super::NativeFunction;

/// Registers the conversion functions.
pub fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    builder
        .register(NativeFunction::new(
            FunctionDescriptor::new("to_long")
                .optional_param("value", TypeTag::Unknown)
                .optional_param("default", TypeTag::Long),
            |args, _ctx| {
                let default = args.opt("default").and_then(RuleValue::as_long).unwrap_or(0);
                let converted = match args.get("value") {
                    RuleValue::Long(v) => v,
                    RuleValue::Double(v) => v as i64,
                    RuleValue::Boolean(v) => i64::from(v),
                    RuleValue::String(s) => s.trim().parse().unwrap_or(default),
                    _ => default,
                };
                Ok(RuleValue::Long(converted))
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("to_double")
                .optional_param("value", TypeTag::Unknown)
                .optional_param("default", TypeTag::Double),
            |args, _ctx| {
                let default = args.opt("default").and_then(RuleValue::as_double).unwrap_or(0.0);
                let converted = match args.get("value") {
                    RuleValue::Long(v) => v as f64,
                    RuleValue::Double(v) => v,
                    RuleValue::Boolean(v) => f64::from(u8::from(v)),
                    RuleValue::String(s) => s.trim().parse().unwrap_or(default),
                    _ => default,
                };
                Ok(RuleValue::Double(converted))
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("to_bool")
                .optional_param("value", TypeTag::Unknown)
                .optional_param("default", TypeTag::Boolean),
            |args, _ctx| {
                let default = args.opt("default").and_then(RuleValue::as_bool).unwrap_or(false);
                let converted = match args.get("value") {
                    RuleValue::Boolean(v) => v,
                    RuleValue::Long(v) => v != 0,
                    RuleValue::Double(v) => v != 0.0,
                    RuleValue::String(s) => {
                        if s.eq_ignore_ascii_case("true") {
                            true
                        } else if s.eq_ignore_ascii_case("false") {
                            false
                        } else {
                            default
                        }
                    }
                    _ => default,
                };
                Ok(RuleValue::Boolean(converted))
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("to_string")
                .optional_param("value", TypeTag::Unknown)
                .optional_param("default", TypeTag::String),
            |args, _ctx| {
                let converted = match args.get("value") {
                    RuleValue::Null => args.string("default"),
                    value => value.to_string(),
                };
                Ok(RuleValue::String(converted))
            },
        ))
}
