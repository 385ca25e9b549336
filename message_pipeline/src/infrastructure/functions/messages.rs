// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Message Functions
//!
//! The mutating half of the built-in library: field manipulation, stream
//! routing, and message lifecycle (drop, create, clone). Every function
//! here operates on the message under evaluation through the context.

use std::sync::Arc;

use message_pipeline_domain::entities::message::Message;
use message_pipeline_domain::services::function_registry::{FunctionDescriptor, FunctionRegistryBuilder};
use message_pipeline_domain::value_objects::ids::StreamId;
use message_pipeline_domain::value_objects::value::{RuleValue, TypeTag};

use super::NativeFunction;

/// Registers the message functions.
pub fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    builder
        .register(NativeFunction::new(
            FunctionDescriptor::new("set_field")
                .mutating()
                .param("field", TypeTag::String)
                .param("value", TypeTag::Unknown),
            |args, ctx| {
                ctx.message().lock().set_field(args.string("field"), args.get("value"));
                Ok(RuleValue::Null)
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("set_fields").mutating().param("fields", TypeTag::Map),
            |args, ctx| {
                if let RuleValue::Map(fields) = args.get("fields") {
                    let mut message = ctx.message().lock();
                    for (name, value) in fields {
                        message.set_field(name, value);
                    }
                }
                Ok(RuleValue::Null)
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("remove_field").mutating().param("field", TypeTag::String),
            |args, ctx| {
                let _ = ctx.message().lock().remove_field(&args.string("field"));
                Ok(RuleValue::Null)
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("has_field").param("field", TypeTag::String),
            |args, ctx| {
                let present = ctx.message().lock().has_field(&args.string("field"));
                Ok(RuleValue::Boolean(present))
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("rename_field")
                .mutating()
                .param("old_field", TypeTag::String)
                .param("new_field", TypeTag::String),
            |args, ctx| {
                let mut message = ctx.message().lock();
                if let Some(value) = message.remove_field(&args.string("old_field")) {
                    message.set_field(args.string("new_field"), value);
                }
                Ok(RuleValue::Null)
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("drop_message").mutating(),
            |_args, ctx| {
                ctx.message().lock().set_filter_out(true);
                Ok(RuleValue::Null)
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("create_message")
                .mutating()
                .optional_param("fields", TypeTag::Map),
            |args, ctx| {
                let message = match args.get("fields") {
                    RuleValue::Map(fields) => Message::with_fields(fields),
                    _ => Message::new(),
                };
                let handle = message.into_ref();
                ctx.create_message(Arc::clone(&handle));
                Ok(RuleValue::Message(handle))
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("clone_message").mutating(),
            |_args, ctx| {
                let clone = {
                    let original = ctx.message().lock();
                    let mut clone = Message::with_fields(original.fields().clone());
                    for stream in original.streams() {
                        let _ = clone.add_stream(stream.clone());
                    }
                    clone
                };
                let handle = clone.into_ref();
                ctx.create_message(Arc::clone(&handle));
                Ok(RuleValue::Message(handle))
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("route_to_stream").mutating().param("stream", TypeTag::String),
            |args, ctx| {
                let _ = ctx.message().lock().add_stream(StreamId::new(args.string("stream")));
                Ok(RuleValue::Null)
            },
        ))
        .register(NativeFunction::new(
            FunctionDescriptor::new("remove_from_stream").mutating().param("stream", TypeTag::String),
            |args, ctx| {
                let _ = ctx.message().lock().remove_stream(&StreamId::new(args.string("stream")));
                Ok(RuleValue::Null)
            },
        ))
}

#[cfg(test)]
mod tests {
    use super::super::builtin_registry;
    use message_pipeline_domain::ast::expression::Expression;
    use message_pipeline_domain::ast::statement::Statement;
    use message_pipeline_domain::entities::evaluation_context::EvaluationContext;
    use message_pipeline_domain::entities::message::Message;
    use message_pipeline_domain::value_objects::ids::StreamId;
    use message_pipeline_domain::value_objects::value::RuleValue;

    fn context() -> EvaluationContext {
        EvaluationContext::new(Message::new().into_ref(), builtin_registry())
    }

    fn run(ctx: &mut EvaluationContext, name: &str, args: Vec<Expression>) {
        Statement::call(name, args).evaluate(ctx).unwrap();
    }

    #[test]
    fn test_set_and_remove_field() {
        let mut ctx = context();
        run(&mut ctx, "set_field", vec![Expression::constant("level"), Expression::constant(3i64)]);
        assert_eq!(ctx.message().lock().field("level"), RuleValue::Long(3));

        run(&mut ctx, "remove_field", vec![Expression::constant("level")]);
        assert!(!ctx.message().lock().has_field("level"));
    }

    #[test]
    fn test_rename_field() {
        let mut ctx = context();
        run(&mut ctx, "set_field", vec![Expression::constant("src"), Expression::constant("syslog")]);
        run(
            &mut ctx,
            "rename_field",
            vec![Expression::constant("src"), Expression::constant("source")],
        );
        let message = ctx.message().lock();
        assert!(!message.has_field("src"));
        assert_eq!(message.field("source"), RuleValue::from("syslog"));
    }

    #[test]
    fn test_rename_absent_field_is_a_no_op() {
        let mut ctx = context();
        run(
            &mut ctx,
            "rename_field",
            vec![Expression::constant("ghost"), Expression::constant("renamed")],
        );
        assert!(!ctx.message().lock().has_field("renamed"));
    }

    #[test]
    fn test_drop_message_sets_filter_out() {
        let mut ctx = context();
        assert!(!ctx.message().lock().filter_out());
        run(&mut ctx, "drop_message", vec![]);
        assert!(ctx.message().lock().filter_out());
    }

    #[test]
    fn test_route_to_and_remove_from_stream() {
        let mut ctx = context();
        run(&mut ctx, "route_to_stream", vec![Expression::constant("alerts")]);
        assert!(ctx.message().lock().streams().contains(&StreamId::from("alerts")));

        run(&mut ctx, "remove_from_stream", vec![Expression::constant("alerts")]);
        assert!(ctx.message().lock().streams().is_empty());
    }

    #[test]
    fn test_create_message_enters_created_set() {
        let mut ctx = context();
        run(&mut ctx, "create_message", vec![]);
        assert_eq!(ctx.created_messages().len(), 1);
    }

    #[test]
    fn test_clone_message_copies_fields_with_fresh_identity() {
        let mut ctx = context();
        ctx.message().lock().set_field("x", RuleValue::Long(1));
        run(&mut ctx, "clone_message", vec![]);

        let created = ctx.created_messages();
        assert_eq!(created.len(), 1);
        let clone = created[0].lock();
        assert_eq!(clone.field("x"), RuleValue::Long(1));
        assert_ne!(clone.id(), ctx.message().lock().id());
    }
}
