// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Interpreter
//!
//! The per-message scheduling loop: for every inbound message, determine
//! which pipelines apply (from the message's current stream memberships),
//! execute them stage-slice by stage-slice, and mutate or drop the message
//! accordingly.
//!
//! ## Overview
//!
//! `process()` drives three pieces of state per batch:
//!
//! - **`to_process`**: the working queue of messages awaiting a pass
//! - **`fully_processed`**: messages that reached a fixed point
//! - **blacklist**: the set of `(message id, stream id)` pairs already
//!   processed in this call, which is what prevents re-processing the same
//!   combination as a message gains or loses streams mid-flight
//!
//! A message with no streams runs the pipelines of the reserved `"default"`
//! stream. When a pass adds a stream the message did not have before, the
//! message is re-queued so the newly routed pipelines get their turn; the
//! blacklist guarantees the loop terminates because it only ever grows and
//! is bounded by `|messages| × |distinct stream ids|`.
//!
//! ## Stage-sliced execution
//!
//! The selected pipelines advance in lock-step through ascending stage
//! numbers. A pipeline advances past a stage iff the stage's match quorum
//! was satisfied: with `match_all`, every rule must have matched; otherwise
//! at least one. Actions of matched rules run either way; the quorum only
//! gates advancement, not the matched rules' effects.
//!
//! Each (message, stage) pair evaluates against a fresh context, so `let`
//! bindings never leak across stages. Messages created by rule actions
//! join the work queue after the stage completes and are evaluated in a
//! subsequent pass, never the current one.
//!
//! ## Snapshot discipline
//!
//! The program snapshot is captured once at the top of `process()` and
//! used for the whole call: a concurrent reload is either observed for the
//! entire batch or not at all, and nothing inside a published snapshot
//! ever mutates.
//!
//! ## Failure containment
//!
//! Every evaluation failure is caught at the rule boundary and logged with
//! the rule name and message id: a predicate failure demotes the rule to
//! non-matching, a statement failure aborts that rule's remaining
//! statements only. The processing contract is total: for every input
//! message some output is produced, unless a rule dropped it.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use message_pipeline_domain::aggregates::program_snapshot::ProgramSnapshot;
use message_pipeline_domain::entities::evaluation_context::EvaluationContext;
use message_pipeline_domain::entities::message::{Message, MessageRef};
use message_pipeline_domain::entities::pipeline::Pipeline;
use message_pipeline_domain::entities::rule::Rule;
use message_pipeline_domain::services::function_registry::FunctionRegistry;
use message_pipeline_domain::services::journal::Journal;
use message_pipeline_domain::services::processor::{MessageProcessor, ProcessorDescriptor};
use message_pipeline_domain::services::stage_iterator::{StageIterator, StageSliceEntry};
use message_pipeline_domain::value_objects::ids::{MessageId, PipelineId, StreamId};
use message_pipeline_domain::RuleValue;

use crate::infrastructure::metrics::service::MetricsService;
use crate::infrastructure::state::store::PipelineStateStore;

/// The message-processing pipeline interpreter.
///
/// Invoked concurrently from multiple host worker threads; each `process`
/// call runs a batch to completion on its calling thread. The only shared
/// mutable state on the hot path is the snapshot cell inside the state
/// store.
pub struct PipelineInterpreter {
    descriptor: ProcessorDescriptor,
    state: Arc<PipelineStateStore>,
    functions: Arc<FunctionRegistry>,
    journal: Arc<dyn Journal>,
    metrics: Arc<MetricsService>,
}

impl PipelineInterpreter {
    pub fn new(
        state: Arc<PipelineStateStore>,
        functions: Arc<FunctionRegistry>,
        journal: Arc<dyn Journal>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            descriptor: ProcessorDescriptor::new("message-pipeline-interpreter", "Message Pipeline Interpreter"),
            state,
            functions,
            journal,
            metrics,
        }
    }

    /// Selects the pipelines to run for one pass of `message`.
    ///
    /// A message without streams runs the default stream's pipelines, and
    /// is blacklisted for `"default"` right here, because the subtractive
    /// post-pass bookkeeping only sees named streams. Named streams are
    /// filtered against the blacklist and their assigned pipelines
    /// unioned.
    fn select_pipelines(
        &self,
        snapshot: &ProgramSnapshot,
        msg_id: MessageId,
        initial_streams: &HashSet<StreamId>,
        blacklist: &mut HashSet<(MessageId, StreamId)>,
    ) -> Vec<Arc<Pipeline>> {
        if initial_streams.is_empty() {
            let default = StreamId::default_stream();
            if blacklist.contains(&(msg_id, default.clone())) {
                return Vec::new();
            }
            let _ = blacklist.insert((msg_id, default.clone()));
            return snapshot.pipelines_for_stream(&default).to_vec();
        }

        let mut seen: HashSet<PipelineId> = HashSet::new();
        let mut selected = Vec::new();
        for stream in initial_streams {
            if blacklist.contains(&(msg_id, stream.clone())) {
                continue;
            }
            for pipeline in snapshot.pipelines_for_stream(stream) {
                if seen.insert(pipeline.id().clone()) {
                    selected.push(Arc::clone(pipeline));
                }
            }
        }
        selected
    }

    /// Runs one (stage, pipeline) pair against the message and reports
    /// whether the stage's match quorum was satisfied.
    fn evaluate_stage(
        &self,
        entry: &StageSliceEntry,
        message: &MessageRef,
        msg_id: MessageId,
        to_process: &mut VecDeque<MessageRef>,
    ) -> bool {
        let stage = entry.stage();
        let pipeline = entry.pipeline();
        let mut ctx = EvaluationContext::new(Arc::clone(message), Arc::clone(&self.functions));

        // rule selection phase: collect the rules whose predicate returned
        // Boolean(true); a failing predicate demotes its rule to non-match
        let mut matched: Vec<Arc<Rule>> = Vec::new();
        for rule in stage.rules() {
            match rule.when().evaluate(&mut ctx) {
                Ok(RuleValue::Boolean(true)) => matched.push(Arc::clone(rule)),
                Ok(_) => {}
                Err(err) => {
                    self.metrics.increment_rule_evaluation_errors();
                    warn!(
                        rule = rule.name(),
                        pipeline = pipeline.name(),
                        message_id = %msg_id,
                        "predicate evaluation failed, treating rule as non-matching: {}",
                        err
                    );
                }
            }
        }

        // action phase: matched rules act in declaration order against the
        // same context; a failing statement aborts that rule only
        for rule in &matched {
            for statement in rule.then() {
                if let Err(err) = statement.evaluate(&mut ctx) {
                    self.metrics.increment_rule_evaluation_errors();
                    warn!(
                        rule = rule.name(),
                        pipeline = pipeline.name(),
                        message_id = %msg_id,
                        "statement evaluation failed, aborting remaining statements of this rule: {}",
                        err
                    );
                    break;
                }
            }
        }

        // messages created by the actions enter the work set for a later
        // pass, never the current one
        for created in ctx.drain_created_messages() {
            to_process.push_back(created);
        }

        if stage.match_all() {
            matched.len() == stage.rules().len()
        } else {
            !matched.is_empty()
        }
    }

    /// Advances the selected pipelines through their stage slices.
    ///
    /// `proceeding` starts with every selected pipeline; a pipeline whose
    /// stage fails its match quorum is removed and its later stages are
    /// skipped. Execution order within a slice is unspecified.
    fn run_stages(
        &self,
        message: &MessageRef,
        msg_id: MessageId,
        pipelines: Vec<Arc<Pipeline>>,
        to_process: &mut VecDeque<MessageRef>,
    ) {
        if pipelines.is_empty() {
            return;
        }
        let mut proceeding: HashSet<PipelineId> = pipelines.iter().map(|p| p.id().clone()).collect();
        for slice in StageIterator::new(pipelines) {
            for entry in &slice {
                let pipeline = entry.pipeline();
                if !proceeding.contains(pipeline.id()) {
                    debug!(
                        pipeline = pipeline.name(),
                        message_id = %msg_id,
                        stage = entry.stage().stage(),
                        "previous stage result prevents further processing of this pipeline"
                    );
                    continue;
                }
                if !self.evaluate_stage(entry, message, msg_id, to_process) {
                    let _ = proceeding.remove(pipeline.id());
                }
            }
        }
    }

    /// Recovers an owned message from its shared handle.
    ///
    /// After a pass completes the interpreter normally holds the only
    /// reference; if a rule stashed a handle to this message inside
    /// another message's fields, fall back to cloning the current state.
    fn into_message(handle: MessageRef) -> Message {
        match Arc::try_unwrap(handle) {
            Ok(inner) => inner.into_inner(),
            Err(shared) => shared.lock().clone(),
        }
    }
}

impl MessageProcessor for PipelineInterpreter {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    fn process(&self, messages: Vec<Message>) -> Vec<Message> {
        let started = Instant::now();
        // captured once: a concurrent reload is observed for the whole
        // batch or not at all
        let snapshot = self.state.snapshot();

        let mut to_process: VecDeque<MessageRef> = messages.into_iter().map(Message::into_ref).collect();
        let mut fully_processed: Vec<MessageRef> = Vec::new();
        let mut blacklist: HashSet<(MessageId, StreamId)> = HashSet::new();

        while let Some(message) = to_process.pop_front() {
            let (msg_id, initial_streams) = {
                let message = message.lock();
                (message.id(), message.streams().clone())
            };

            let selected = self.select_pipelines(&snapshot, msg_id, &initial_streams, &mut blacklist);
            self.run_stages(&message, msg_id, selected, &mut to_process);

            // subtractive blacklist update: streams surviving the pass are
            // done, streams that appeared during it force another pass
            let current_streams = message.lock().streams().clone();
            let mut added_streams = false;
            for stream in &current_streams {
                if initial_streams.contains(stream) {
                    let _ = blacklist.insert((msg_id, stream.clone()));
                } else {
                    added_streams = true;
                }
            }

            if message.lock().filter_out() {
                self.metrics.increment_filtered_out();
                if let Some(offset) = message.lock().journal_offset() {
                    self.journal.mark_offset_committed(offset);
                }
                debug!(message_id = %msg_id, "message dropped by pipeline rule");
                continue;
            }

            if added_streams {
                to_process.push_back(message);
            } else {
                fully_processed.push(message);
            }
        }

        self.metrics.add_messages_processed(fully_processed.len() as u64);
        self.metrics.observe_batch_duration(started.elapsed());

        fully_processed.into_iter().map(Self::into_message).collect()
    }
}
