// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Reload and Engine Tests
//!
//! End-to-end tests of the assembled engine: initial load, parse-failure
//! isolation, event-triggered reloads, hot-swap between batches, and
//! reload failure handling.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use message_pipeline::infrastructure::adapters::event_bus::InProcessEventBus;
use message_pipeline::infrastructure::adapters::memory_sources::{
    MemoryPipelineSource, MemoryRuleSource, MemoryStreamAssignments, RecordingJournal,
};
use message_pipeline::infrastructure::adapters::static_parser::StaticAstParser;
use message_pipeline::{EngineDependencies, PipelineEngine, ProcessorConfig};
use message_pipeline_domain::ast::expression::Expression;
use message_pipeline_domain::ast::statement::Statement;
use message_pipeline_domain::entities::pipeline::{Pipeline, Stage};
use message_pipeline_domain::entities::rule::Rule;
use message_pipeline_domain::events::change_events::RulesChangedEvent;
use message_pipeline_domain::repositories::pipeline_source::{PipelineSource, PipelineSourceService};
use message_pipeline_domain::repositories::rule_source::{RuleSource, RuleSourceService};
use message_pipeline_domain::repositories::stream_assignment::StreamAssignment;
use message_pipeline_domain::services::processor::MessageProcessor;
use message_pipeline_domain::value_objects::ids::{PipelineId, RuleId, StreamId};
use message_pipeline_domain::{Message, PipelineError, RuleValue};

/// A rule tagging messages with `processed_by = <tag>`.
fn tag_rule(name: &str, tag: &str) -> Rule {
    Rule::new(
        None,
        name,
        Expression::constant(true),
        vec![Statement::call(
            "set_field",
            vec![Expression::constant("processed_by"), Expression::constant(tag)],
        )],
    )
    .unwrap()
}

fn one_stage_pipeline(id: &str, rule_name: &str) -> Pipeline {
    Pipeline::new(
        PipelineId::from(id),
        id,
        vec![Stage::new(0, false, vec![rule_name.to_string()])],
    )
    .unwrap()
}

struct Fixture {
    rules: Arc<MemoryRuleSource>,
    pipelines: Arc<MemoryPipelineSource>,
    assignments: Arc<MemoryStreamAssignments>,
    journal: Arc<RecordingJournal>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            rules: Arc::new(MemoryRuleSource::new()),
            pipelines: Arc::new(MemoryPipelineSource::new()),
            assignments: Arc::new(MemoryStreamAssignments::new()),
            journal: Arc::new(RecordingJournal::new()),
        }
    }

    fn dependencies(&self, parser: StaticAstParser) -> EngineDependencies {
        EngineDependencies {
            rules: Arc::clone(&self.rules) as Arc<dyn RuleSourceService>,
            pipelines: Arc::clone(&self.pipelines) as Arc<dyn PipelineSourceService>,
            assignments: Arc::clone(&self.assignments)
                as Arc<dyn message_pipeline_domain::repositories::stream_assignment::StreamAssignmentService>,
            parser: Arc::new(parser),
            journal: Arc::clone(&self.journal) as Arc<dyn message_pipeline_domain::services::journal::Journal>,
            functions: None,
        }
    }
}

#[tokio::test]
async fn test_engine_start_performs_the_initial_load() {
    let fixture = Fixture::new();
    fixture.rules.replace(vec![RuleSource::new("r1", "rule source")]);
    fixture.pipelines.replace(vec![PipelineSource::new("p1", "pipeline source")]);
    fixture
        .assignments
        .replace(vec![StreamAssignment::new("default", vec![PipelineId::from("p1")])]);

    let mut parser = StaticAstParser::new();
    parser.add_rule("r1", tag_rule("tag", "p1"));
    parser.add_pipeline("p1", one_stage_pipeline("p1", "tag"));

    let engine = PipelineEngine::start(fixture.dependencies(parser), ProcessorConfig::default())
        .await
        .unwrap();

    let out = engine.processor().process(vec![Message::new()]);
    assert_eq!(out[0].field("processed_by"), RuleValue::from("p1"));
    assert_eq!(engine.metrics().reload_count(), 1);
}

#[tokio::test]
async fn test_parse_failure_is_isolated_to_the_broken_pipeline() {
    let fixture = Fixture::new();
    fixture.rules.replace(vec![RuleSource::new("r1", "src")]);
    fixture.pipelines.replace(vec![
        PipelineSource::new("p_ok", "src"),
        PipelineSource::new("p_broken", "src"),
    ]);
    fixture.assignments.replace(vec![
        StreamAssignment::new("working", vec![PipelineId::from("p_ok")]),
        StreamAssignment::new("broken", vec![PipelineId::from("p_broken")]),
    ]);

    // p_broken is not registered: its source "fails to parse" and degrades
    // to an empty sentinel
    let mut parser = StaticAstParser::new();
    parser.add_rule("r1", tag_rule("tag", "ok"));
    parser.add_pipeline("p_ok", one_stage_pipeline("p_ok", "tag"));

    let engine = PipelineEngine::start(fixture.dependencies(parser), ProcessorConfig::default())
        .await
        .unwrap();

    let mut to_broken = Message::new();
    let _ = to_broken.add_stream(StreamId::from("broken"));
    let mut to_working = Message::new();
    let _ = to_working.add_stream(StreamId::from("working"));

    let mut out = engine.processor().process(vec![to_broken, to_working]);
    out.sort_by_key(|m| m.has_field("processed_by"));

    assert_eq!(out.len(), 2);
    // routed to the broken pipeline: passed through unchanged
    assert!(!out[0].has_field("processed_by"));
    // routed to the working pipeline: processed normally
    assert_eq!(out[1].field("processed_by"), RuleValue::from("ok"));
}

#[tokio::test]
async fn test_event_triggers_a_reload() {
    let fixture = Fixture::new();
    let mut parser = StaticAstParser::new();
    parser.add_rule("r1", tag_rule("tag", "p1"));
    parser.add_pipeline("p1", one_stage_pipeline("p1", "tag"));

    let engine = PipelineEngine::start(fixture.dependencies(parser), ProcessorConfig::default())
        .await
        .unwrap();
    assert_eq!(engine.store().snapshot().pipeline_count(), 0);

    // the configuration appears in the source-of-truth, then the bus announces it
    fixture.rules.replace(vec![RuleSource::new("r1", "src")]);
    fixture.pipelines.replace(vec![PipelineSource::new("p1", "src")]);
    fixture
        .assignments
        .replace(vec![StreamAssignment::new("default", vec![PipelineId::from("p1")])]);

    let bus = InProcessEventBus::new();
    bus.subscribe(engine.change_subscriber());
    bus.publish_rules_changed(RulesChangedEvent::new(vec![RuleId::from("r1")], vec![]));

    // the reload runs on its own worker task
    for _ in 0..200 {
        if engine.store().snapshot().pipeline_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(engine.store().snapshot().pipeline_count(), 1);

    let out = engine.processor().process(vec![Message::new()]);
    assert_eq!(out[0].field("processed_by"), RuleValue::from("p1"));
}

#[tokio::test]
async fn test_hot_swap_between_batches() {
    let fixture = Fixture::new();
    let mut parser = StaticAstParser::new();
    parser.add_rule("r1", tag_rule("tag", "v1"));
    parser.add_pipeline("p1", one_stage_pipeline("p1", "tag"));

    let engine = PipelineEngine::start(fixture.dependencies(parser), ProcessorConfig::default())
        .await
        .unwrap();

    // batch 1: empty program
    let out = engine.processor().process(vec![Message::new()]);
    assert!(!out[0].has_field("processed_by"));

    // configuration change + explicit reload
    fixture.rules.replace(vec![RuleSource::new("r1", "src")]);
    fixture.pipelines.replace(vec![PipelineSource::new("p1", "src")]);
    fixture
        .assignments
        .replace(vec![StreamAssignment::new("default", vec![PipelineId::from("p1")])]);
    engine.change_subscriber().reload().await;

    // batch 2: the new program applies end to end
    let out = engine.processor().process(vec![Message::new()]);
    assert_eq!(out[0].field("processed_by"), RuleValue::from("v1"));
}

/// A rule source that can be flipped into an unreachable state.
struct FlakyRuleSource {
    sources: Vec<RuleSource>,
    failing: std::sync::atomic::AtomicBool,
}

impl FlakyRuleSource {
    fn new(sources: Vec<RuleSource>) -> Self {
        Self {
            sources,
            failing: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn set_failing(&self) {
        self.failing.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl RuleSourceService for FlakyRuleSource {
    async fn load_all(&self) -> Result<Vec<RuleSource>, PipelineError> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PipelineError::internal_error("source-of-truth unreachable"));
        }
        Ok(self.sources.clone())
    }
}

#[tokio::test]
async fn test_failed_reload_keeps_the_previous_snapshot() {
    let fixture = Fixture::new();
    fixture.pipelines.replace(vec![PipelineSource::new("p1", "src")]);
    fixture
        .assignments
        .replace(vec![StreamAssignment::new("default", vec![PipelineId::from("p1")])]);

    let mut parser = StaticAstParser::new();
    parser.add_rule("r1", tag_rule("tag", "p1"));
    parser.add_pipeline("p1", one_stage_pipeline("p1", "tag"));

    let rules = Arc::new(FlakyRuleSource::new(vec![RuleSource::new("r1", "src")]));
    let deps = EngineDependencies {
        rules: Arc::clone(&rules) as Arc<dyn RuleSourceService>,
        pipelines: Arc::clone(&fixture.pipelines) as Arc<dyn PipelineSourceService>,
        assignments: Arc::clone(&fixture.assignments)
            as Arc<dyn message_pipeline_domain::repositories::stream_assignment::StreamAssignmentService>,
        parser: Arc::new(parser),
        journal: Arc::clone(&fixture.journal) as Arc<dyn message_pipeline_domain::services::journal::Journal>,
        functions: None,
    };
    let engine = PipelineEngine::start(deps, ProcessorConfig::default()).await.unwrap();
    assert_eq!(engine.store().snapshot().pipeline_count(), 1);
    assert_eq!(engine.metrics().reload_count(), 1);

    // the source-of-truth becomes unreachable: the reload fails and the
    // previous snapshot stays published
    rules.set_failing();
    engine.change_subscriber().reload().await;

    assert_eq!(engine.metrics().reload_failure_count(), 1);
    assert_eq!(engine.metrics().reload_count(), 1);
    let after = engine.store().snapshot();
    assert_eq!(after.pipeline_count(), 1);

    let out = engine.processor().process(vec![Message::new()]);
    assert_eq!(out[0].field("processed_by"), RuleValue::from("p1"));
}
