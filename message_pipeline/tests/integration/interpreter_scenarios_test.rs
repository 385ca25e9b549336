// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Interpreter Scenario Tests
//!
//! End-to-end scenarios driving `process()` against hand-assembled program
//! snapshots: stream selection, stage gating, drops, fixed-point
//! re-processing, and termination. Pipelines here are built directly from
//! AST nodes; the reload path has its own test module.

use std::collections::HashMap;
use std::sync::Arc;

use message_pipeline::infrastructure::adapters::memory_sources::RecordingJournal;
use message_pipeline::infrastructure::functions::builtin_registry;
use message_pipeline::infrastructure::metrics::service::MetricsService;
use message_pipeline::infrastructure::state::store::PipelineStateStore;
use message_pipeline::PipelineInterpreter;
use message_pipeline_domain::ast::expression::{BinaryOp, Expression};
use message_pipeline_domain::ast::statement::Statement;
use message_pipeline_domain::entities::evaluation_context::EvaluationContext;
use message_pipeline_domain::entities::pipeline::{Pipeline, Stage};
use message_pipeline_domain::entities::rule::Rule;
use message_pipeline_domain::services::processor::MessageProcessor;
use message_pipeline_domain::value_objects::ids::{PipelineId, StreamId};
use message_pipeline_domain::{Message, ProgramSnapshot, RuleValue};

/// `$message.<name>` field access.
fn field(name: &str) -> Expression {
    Expression::FieldAccess {
        target: Box::new(Expression::var(EvaluationContext::MESSAGE_VAR)),
        field: name.to_string(),
    }
}

/// `set_field(name, to_long($message.<name>) + 1)`: a per-pass counter
/// that makes the number of pipeline executions observable.
fn incr_field(name: &str) -> Statement {
    Statement::call(
        "set_field",
        vec![
            Expression::constant(name),
            Expression::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expression::call("to_long", vec![field(name)])),
                right: Box::new(Expression::constant(1i64)),
            },
        ],
    )
}

fn rule(name: &str, when: Expression, then: Vec<Statement>) -> Rule {
    Rule::new(None, name, when, then).unwrap()
}

/// Builds a linked pipeline from (stage number, match_all, rules) triples.
fn pipeline(id: &str, stages: Vec<(i32, bool, Vec<Rule>)>) -> Arc<Pipeline> {
    let mut rule_map: HashMap<String, Arc<Rule>> = HashMap::new();
    let mut built_stages = Vec::new();
    for (number, match_all, rules) in stages {
        let refs = rules.iter().map(|r| r.name().to_string()).collect();
        for r in rules {
            let _ = rule_map.insert(r.name().to_string(), Arc::new(r));
        }
        built_stages.push(Stage::new(number, match_all, refs));
    }
    let mut pipeline = Pipeline::new(PipelineId::from(id), id, built_stages).unwrap();
    pipeline.link(|name| {
        rule_map
            .get(name)
            .cloned()
            .unwrap_or_else(|| Arc::new(Rule::always_false(format!("Unresolved rule {}", name))))
    });
    Arc::new(pipeline)
}

fn snapshot(assignments: Vec<(&str, Vec<Arc<Pipeline>>)>) -> ProgramSnapshot {
    let mut pipelines_by_id = HashMap::new();
    let mut stream_assignments: HashMap<StreamId, Vec<Arc<Pipeline>>> = HashMap::new();
    for (stream, assigned) in assignments {
        for p in &assigned {
            let _ = pipelines_by_id.insert(p.id().clone(), Arc::clone(p));
        }
        stream_assignments.insert(StreamId::from(stream), assigned);
    }
    ProgramSnapshot::new(pipelines_by_id, stream_assignments)
}

struct Harness {
    interpreter: PipelineInterpreter,
    journal: Arc<RecordingJournal>,
    metrics: Arc<MetricsService>,
}

fn harness(program: ProgramSnapshot) -> Harness {
    let store = Arc::new(PipelineStateStore::new());
    store.publish(Arc::new(program));
    let journal = Arc::new(RecordingJournal::new());
    let metrics = Arc::new(MetricsService::new().unwrap());
    let interpreter = PipelineInterpreter::new(
        store,
        builtin_registry(),
        Arc::clone(&journal) as Arc<dyn message_pipeline_domain::services::journal::Journal>,
        Arc::clone(&metrics),
    );
    Harness {
        interpreter,
        journal,
        metrics,
    }
}

fn message_with_stream(stream: &str) -> Message {
    let mut message = Message::new();
    let _ = message.add_stream(StreamId::from(stream));
    message
}

#[test]
fn test_empty_program_passes_messages_unchanged() {
    let h = harness(ProgramSnapshot::empty());
    let mut message = Message::new();
    message.set_field("source", RuleValue::from("syslog"));
    let id = message.id();

    let out = h.interpreter.process(vec![message]);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id(), id);
    assert_eq!(out[0].field("source"), RuleValue::from("syslog"));
    assert_eq!(h.metrics.filtered_out_count(), 0);
}

#[test]
fn test_default_stream_routing_runs_exactly_once() {
    let p1 = pipeline(
        "p1",
        vec![(0, false, vec![rule("count", Expression::constant(true), vec![incr_field("count")])])],
    );
    let h = harness(snapshot(vec![("default", vec![p1])]));

    let out = h.interpreter.process(vec![Message::new()]);

    assert_eq!(out.len(), 1);
    // ran once: the default-stream pass is blacklisted after its first run
    assert_eq!(out[0].field("count"), RuleValue::Long(1));
}

#[test]
fn test_match_all_gating_blocks_the_next_stage() {
    let p1 = pipeline(
        "p1",
        vec![
            (
                10,
                true,
                vec![
                    rule("never", Expression::constant(false), vec![]),
                    rule(
                        "sets-stage10",
                        Expression::constant(true),
                        vec![Statement::call(
                            "set_field",
                            vec![Expression::constant("stage10"), Expression::constant("ran")],
                        )],
                    ),
                ],
            ),
            (
                20,
                false,
                vec![rule(
                    "sets-stage20",
                    Expression::constant(true),
                    vec![Statement::call(
                        "set_field",
                        vec![Expression::constant("stage20"), Expression::constant("ran")],
                    )],
                )],
            ),
        ],
    );
    let h = harness(snapshot(vec![("default", vec![p1])]));

    let out = h.interpreter.process(vec![Message::new()]);

    // the matched rule's action ran even though the stage quorum failed
    assert_eq!(out[0].field("stage10"), RuleValue::from("ran"));
    // but the pipeline did not advance past the failed match_all stage
    assert!(!out[0].has_field("stage20"));
}

#[test]
fn test_any_match_quorum_advances() {
    let p1 = pipeline(
        "p1",
        vec![
            (
                10,
                false,
                vec![
                    rule("never", Expression::constant(false), vec![]),
                    rule("always", Expression::constant(true), vec![]),
                ],
            ),
            (20, false, vec![rule("count", Expression::constant(true), vec![incr_field("stage20_runs")])]),
        ],
    );
    let h = harness(snapshot(vec![("default", vec![p1])]));

    let out = h.interpreter.process(vec![Message::new()]);
    assert_eq!(out[0].field("stage20_runs"), RuleValue::Long(1));
}

#[test]
fn test_match_quorum_on_a_stage_without_rules() {
    // match_all over zero rules is vacuously satisfied, "any" is not
    let vacuous = pipeline(
        "vacuous",
        vec![
            (0, true, vec![]),
            (10, false, vec![rule("count", Expression::constant(true), vec![incr_field("advanced")])]),
        ],
    );
    let h = harness(snapshot(vec![("default", vec![vacuous])]));
    let out = h.interpreter.process(vec![Message::new()]);
    assert_eq!(out[0].field("advanced"), RuleValue::Long(1));

    let blocked = pipeline(
        "blocked",
        vec![
            (0, false, vec![]),
            (10, false, vec![rule("count", Expression::constant(true), vec![incr_field("advanced")])]),
        ],
    );
    let h = harness(snapshot(vec![("default", vec![blocked])]));
    let out = h.interpreter.process(vec![Message::new()]);
    assert!(!out[0].has_field("advanced"));
}

#[test]
fn test_dropped_message_commits_journal_offset() {
    let p1 = pipeline(
        "p1",
        vec![(
            0,
            false,
            vec![rule("drop-all", Expression::constant(true), vec![Statement::call("drop_message", vec![])])],
        )],
    );
    let h = harness(snapshot(vec![("default", vec![p1])]));

    let mut message = Message::new();
    message.set_journal_offset(42);

    let out = h.interpreter.process(vec![message]);

    assert!(out.is_empty());
    assert_eq!(h.metrics.filtered_out_count(), 1);
    assert_eq!(h.journal.committed(), vec![42]);
}

#[test]
fn test_added_stream_triggers_reprocessing() {
    let p1 = pipeline(
        "p1",
        vec![(
            0,
            false,
            vec![rule(
                "route",
                Expression::constant(true),
                vec![
                    Statement::call("route_to_stream", vec![Expression::constant("s2")]),
                    incr_field("default_runs"),
                ],
            )],
        )],
    );
    let p2 = pipeline(
        "p2",
        vec![(0, false, vec![rule("count-s2", Expression::constant(true), vec![incr_field("s2_runs")])])],
    );
    let h = harness(snapshot(vec![("default", vec![p1]), ("s2", vec![p2])]));

    let out = h.interpreter.process(vec![Message::new()]);

    assert_eq!(out.len(), 1);
    // the default pass ran once, then the added stream got its own pass
    assert_eq!(out[0].field("default_runs"), RuleValue::Long(1));
    assert_eq!(out[0].field("s2_runs"), RuleValue::Long(1));
    assert!(out[0].streams().contains(&StreamId::from("s2")));
}

#[test]
fn test_created_messages_are_processed_in_a_subsequent_pass() {
    let fields = RuleValue::Map(HashMap::from([("child".to_string(), RuleValue::Boolean(true))]));
    let p1 = pipeline(
        "p1",
        vec![(
            0,
            false,
            vec![
                rule(
                    "spawn",
                    Expression::call("has_field", vec![Expression::constant("seed")]),
                    vec![Statement::call("create_message", vec![Expression::constant(fields)])],
                ),
                rule(
                    "mark",
                    Expression::constant(true),
                    vec![Statement::call(
                        "set_field",
                        vec![Expression::constant("visited"), Expression::constant(true)],
                    )],
                ),
            ],
        )],
    );
    let h = harness(snapshot(vec![("default", vec![p1])]));

    let mut seed = Message::new();
    seed.set_field("seed", RuleValue::Boolean(true));

    let mut out = h.interpreter.process(vec![seed]);
    out.sort_by_key(|m| !m.has_field("seed"));

    assert_eq!(out.len(), 2);
    // the created message went through its own pass against the same program
    assert!(out.iter().all(|m| m.field("visited") == RuleValue::Boolean(true)));
    assert_eq!(out[1].field("child"), RuleValue::Boolean(true));
    // and spawned no grandchildren
}

#[test]
fn test_removed_stream_is_not_blacklisted_and_can_rerun() {
    let p1 = pipeline(
        "p1",
        vec![(
            0,
            false,
            vec![rule(
                "swap-streams",
                Expression::constant(true),
                vec![
                    Statement::call("remove_from_stream", vec![Expression::constant("s1")]),
                    Statement::call("route_to_stream", vec![Expression::constant("s2")]),
                    incr_field("p1_runs"),
                ],
            )],
        )],
    );
    let p2 = pipeline(
        "p2",
        vec![(
            0,
            false,
            vec![rule(
                "readd",
                Expression::constant(true),
                vec![
                    Statement::call("route_to_stream", vec![Expression::constant("s1")]),
                    incr_field("p2_runs"),
                ],
            )],
        )],
    );
    let h = harness(snapshot(vec![("s1", vec![p1]), ("s2", vec![p2])]));

    let out = h.interpreter.process(vec![message_with_stream("s1")]);

    assert_eq!(out.len(), 1);
    // s1 was removed before the pass ended, so it was never blacklisted and
    // its pipeline ran again when p2 re-added the stream
    assert_eq!(out[0].field("p1_runs"), RuleValue::Long(2));
    assert_eq!(out[0].field("p2_runs"), RuleValue::Long(1));
    assert_eq!(out[0].streams().len(), 1);
    assert!(out[0].streams().contains(&StreamId::from("s2")));
}

#[test]
fn test_terminates_under_cyclic_routing() {
    let p1 = pipeline(
        "p1",
        vec![(
            0,
            false,
            vec![rule(
                "to-s1",
                Expression::constant(true),
                vec![Statement::call("route_to_stream", vec![Expression::constant("s1")]), incr_field("p1_runs")],
            )],
        )],
    );
    let p2 = pipeline(
        "p2",
        vec![(
            0,
            false,
            vec![rule(
                "back-to-s1",
                Expression::constant(true),
                vec![Statement::call("route_to_stream", vec![Expression::constant("s1")]), incr_field("p2_runs")],
            )],
        )],
    );
    let h = harness(snapshot(vec![("default", vec![p1]), ("s1", vec![p2])]));

    // default routes to s1; s1's pipeline keeps "re-adding" s1, which is
    // never new again, so the loop reaches its fixed point
    let out = h.interpreter.process(vec![Message::new()]);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].field("p1_runs"), RuleValue::Long(1));
    assert_eq!(out[0].field("p2_runs"), RuleValue::Long(1));
}

#[test]
fn test_pipeline_assigned_to_two_streams_runs_once_per_pass() {
    let shared = pipeline(
        "shared",
        vec![(0, false, vec![rule("count", Expression::constant(true), vec![incr_field("runs")])])],
    );
    let h = harness(snapshot(vec![("s1", vec![Arc::clone(&shared)]), ("s2", vec![shared])]));

    let mut message = Message::new();
    let _ = message.add_stream(StreamId::from("s1"));
    let _ = message.add_stream(StreamId::from("s2"));

    let out = h.interpreter.process(vec![message]);

    // union selection deduplicates by pipeline id
    assert_eq!(out[0].field("runs"), RuleValue::Long(1));
}

#[test]
fn test_variable_bindings_do_not_leak_across_stages() {
    let p1 = pipeline(
        "p1",
        vec![
            (
                0,
                false,
                vec![rule(
                    "binds",
                    Expression::constant(true),
                    vec![
                        Statement::let_var("x", Expression::constant(1i64)),
                        Statement::call(
                            "set_field",
                            vec![
                                Expression::constant("x_in_stage0"),
                                Expression::call("to_long", vec![Expression::var("x")]),
                            ],
                        ),
                    ],
                )],
            ),
            (
                10,
                false,
                vec![rule(
                    "reads",
                    Expression::constant(true),
                    vec![Statement::call(
                        "set_field",
                        vec![
                            Expression::constant("x_in_stage10"),
                            Expression::call("to_long", vec![Expression::var("x")]),
                        ],
                    )],
                )],
            ),
        ],
    );
    let h = harness(snapshot(vec![("default", vec![p1])]));

    let out = h.interpreter.process(vec![Message::new()]);

    assert_eq!(out[0].field("x_in_stage0"), RuleValue::Long(1));
    // a fresh context per (message, stage): the binding is gone
    assert_eq!(out[0].field("x_in_stage10"), RuleValue::Long(0));
}

#[test]
fn test_statement_failure_aborts_only_the_failing_rule() {
    let divide_by_zero = Expression::Binary {
        op: BinaryOp::Divide,
        left: Box::new(Expression::constant(1i64)),
        right: Box::new(Expression::constant(0i64)),
    };
    let p1 = pipeline(
        "p1",
        vec![(
            0,
            false,
            vec![
                rule(
                    "fails-midway",
                    Expression::constant(true),
                    vec![
                        Statement::call(
                            "set_field",
                            vec![Expression::constant("before_failure"), Expression::constant(true)],
                        ),
                        Statement::let_var("boom", divide_by_zero),
                        Statement::call(
                            "set_field",
                            vec![Expression::constant("after_failure"), Expression::constant(true)],
                        ),
                    ],
                ),
                rule(
                    "unaffected",
                    Expression::constant(true),
                    vec![Statement::call(
                        "set_field",
                        vec![Expression::constant("other_rule_ran"), Expression::constant(true)],
                    )],
                ),
            ],
        )],
    );
    let h = harness(snapshot(vec![("default", vec![p1])]));

    let out = h.interpreter.process(vec![Message::new()]);

    assert_eq!(out[0].field("before_failure"), RuleValue::Boolean(true));
    // statements after the failure were skipped for this rule only
    assert!(!out[0].has_field("after_failure"));
    assert_eq!(out[0].field("other_rule_ran"), RuleValue::Boolean(true));
    assert_eq!(h.metrics.rule_evaluation_error_count(), 1);
}

#[test]
fn test_message_without_matching_assignment_passes_through() {
    let p1 = pipeline(
        "p1",
        vec![(0, false, vec![rule("count", Expression::constant(true), vec![incr_field("count")])])],
    );
    let h = harness(snapshot(vec![("other-stream", vec![p1])]));

    let out = h.interpreter.process(vec![message_with_stream("unassigned")]);

    assert_eq!(out.len(), 1);
    assert!(!out[0].has_field("count"));
}
