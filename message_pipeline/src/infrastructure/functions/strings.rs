// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # String Functions
//!
//! Pure text primitives of the built-in library. `substring` indexes by
//! character (not byte) and clamps out-of-range indices instead of
//! failing; `regex_match` reports an evaluation error for an invalid
//! pattern, which the interpreter contains at the rule boundary.

use regex::Regex;

use message_pipeline_domain::services::function_registry::{FunctionDescriptor, FunctionRegistryBuilder};
use message_pipeline_domain::value_objects::value::{RuleValue, TypeTag};
use message_pipeline_domain::PipelineError;

use super::NativeFunction;

/// Registers the string functions.
pub fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    builder
        .register(NativeFunction::new(
            FunctionDescriptor::new("uppercase").param("value", TypeTag::String),
            |args, _ctx| Ok(RuleValue::String(args.string("value").to_uppercase())),
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("lowercase").param("value", TypeTag::String),
            |args, _ctx| Ok(RuleValue::String(args.string("value").to_lowercase())),
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("trim").param("value", TypeTag::String),
            |args, _ctx| Ok(RuleValue::String(args.string("value").trim().to_string())),
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("contains")
                .param("value", TypeTag::String)
                .param("search", TypeTag::String),
            |args, _ctx| Ok(RuleValue::Boolean(args.string("value").contains(&args.string("search")))),
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("starts_with")
                .param("value", TypeTag::String)
                .param("prefix", TypeTag::String),
            |args, _ctx| {
                Ok(RuleValue::Boolean(
                    args.string("value").starts_with(&args.string("prefix")),
                ))
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("substring")
                .param("value", TypeTag::String)
                .param("start", TypeTag::Long)
                .optional_param("end", TypeTag::Long),
            |args, _ctx| {
                let chars: Vec<char> = args.string("value").chars().collect();
                let len = chars.len() as i64;
                let clamp = |index: i64| index.clamp(0, len) as usize;
                let start = clamp(args.long("start")?);
                let end = clamp(args.opt("end").and_then(RuleValue::as_long).unwrap_or(len));
                if start >= end {
                    return Ok(RuleValue::String(String::new()));
                }
                Ok(RuleValue::String(chars[start..end].iter().collect()))
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("concat")
                .param("first", TypeTag::String)
                .param("second", TypeTag::String),
            |args, _ctx| Ok(RuleValue::String(format!("{}{}", args.string("first"), args.string("second")))),
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("regex_match")
                .param("pattern", TypeTag::String)
                .param("value", TypeTag::String),
            |args, _ctx| {
                let pattern = args.string("pattern");
                let regex = Regex::new(&pattern)
                    .map_err(|e| PipelineError::evaluation_failed(format!("invalid pattern '{}': {}", pattern, e)))?;
                Ok(RuleValue::Boolean(regex.is_match(&args.string("value"))))
            },
        ))
}
