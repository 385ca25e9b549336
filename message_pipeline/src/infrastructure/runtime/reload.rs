// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Reload Controller
//!
//! Rebuilds the program snapshot when the cluster event bus reports that
//! rules, pipelines, or stream assignments changed, and publishes the new
//! image with a single atomic store, without ever blocking `process()`
//! callers.
//!
//! ## Overview
//!
//! Reloads are serialized on a dedicated single-worker tokio task and
//! debounced through a bounded trigger channel: while one reload runs, at
//! most one more can be pending; further triggers collapse into it. The
//! event payloads are informational only (logged): every reload loads the
//! complete source set and rebuilds from scratch, which is what makes
//! reloads idempotent.
//!
//! ## Degradation, not failure
//!
//! A rule source that fails to parse becomes an always-false sentinel; a
//! pipeline source that fails to parse becomes an empty sentinel; a stage
//! reference that does not resolve becomes an always-false sentinel; an
//! assignment naming an unknown pipeline is dropped. None of these abort
//! the reload. Only a failing source-of-truth load aborts, in which case
//! the previous snapshot stays published and the failure is logged at
//! error level.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use message_pipeline_domain::aggregates::program_snapshot::ProgramSnapshot;
use message_pipeline_domain::entities::pipeline::Pipeline;
use message_pipeline_domain::entities::rule::Rule;
use message_pipeline_domain::events::change_events::{
    PipelineChangeSubscriber, PipelinesChangedEvent, RulesChangedEvent, StreamAssignmentChangedEvent,
};
use message_pipeline_domain::repositories::pipeline_source::PipelineSourceService;
use message_pipeline_domain::repositories::rule_source::RuleSourceService;
use message_pipeline_domain::repositories::stream_assignment::StreamAssignmentService;
use message_pipeline_domain::services::rule_parser::RuleLanguageParser;
use message_pipeline_domain::value_objects::ids::StreamId;
use message_pipeline_domain::PipelineError;

use crate::infrastructure::metrics::service::MetricsService;
use crate::infrastructure::state::store::PipelineStateStore;

/// Serialized, debounced rebuild-and-publish of the program snapshot.
///
/// Implements [`PipelineChangeSubscriber`]: the bus invokes the handlers on
/// its own thread, each handler logs the payload and schedules a reload.
pub struct ReloadController {
    rules: Arc<dyn RuleSourceService>,
    pipelines: Arc<dyn PipelineSourceService>,
    assignments: Arc<dyn StreamAssignmentService>,
    parser: Arc<dyn RuleLanguageParser>,
    store: Arc<PipelineStateStore>,
    metrics: Arc<MetricsService>,
    trigger: mpsc::Sender<()>,
}

impl ReloadController {
    /// Creates the controller and spawns its reload worker.
    ///
    /// `queue_depth` bounds the trigger channel: with the default of 1, one
    /// reload can be pending while one runs, and everything else collapses.
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        rules: Arc<dyn RuleSourceService>,
        pipelines: Arc<dyn PipelineSourceService>,
        assignments: Arc<dyn StreamAssignmentService>,
        parser: Arc<dyn RuleLanguageParser>,
        store: Arc<PipelineStateStore>,
        metrics: Arc<MetricsService>,
        queue_depth: usize,
    ) -> Arc<Self> {
        let (trigger, mut pending) = mpsc::channel(queue_depth.max(1));
        let controller = Arc::new(Self {
            rules,
            pipelines,
            assignments,
            parser,
            store,
            metrics,
            trigger,
        });

        let worker = Arc::clone(&controller);
        drop(tokio::spawn(async move {
            while pending.recv().await.is_some() {
                worker.reload().await;
            }
        }));

        controller
    }

    /// Schedules a reload; collapses into an already-pending one.
    pub fn trigger_reload(&self) {
        match self.trigger.try_send(()) {
            Ok(()) => debug!("reload scheduled"),
            Err(mpsc::error::TrySendError::Full(())) => debug!("reload already pending, collapsing trigger"),
            Err(mpsc::error::TrySendError::Closed(())) => warn!("reload worker has shut down, trigger ignored"),
        }
    }

    /// Runs one reload to completion and publishes the result.
    ///
    /// Exposed so hosts can perform the initial synchronous load before
    /// accepting messages.
    pub async fn reload(&self) {
        match self.build_snapshot().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.metrics.record_program_size(snapshot.pipeline_count(), snapshot.rule_count());
                info!(
                    pipelines = snapshot.pipeline_count(),
                    rules = snapshot.rule_count(),
                    streams = snapshot.stream_assignments().len(),
                    "publishing new program snapshot"
                );
                self.store.publish(snapshot);
                self.metrics.increment_reloads();
            }
            Err(err) => {
                self.metrics.increment_reload_failures();
                error!("reload failed, keeping previous snapshot: {}", err);
            }
        }
    }

    async fn build_snapshot(&self) -> Result<ProgramSnapshot, PipelineError> {
        // 1. rules: parse failures degrade to always-false sentinels
        let mut rules_by_name: HashMap<String, Arc<Rule>> = HashMap::new();
        for source in self.rules.load_all().await? {
            let rule = match self.parser.parse_rule(&source.id, &source.source) {
                Ok(rule) => rule,
                Err(err) => {
                    warn!(rule_id = %source.id, "failed to parse rule: {}", err);
                    Rule::always_false(format!("Failed to parse rule {}", source.id))
                }
            };
            if rules_by_name.contains_key(rule.name()) {
                warn!(rule = rule.name(), rule_id = %source.id, "duplicate rule name, last definition wins");
            }
            let _ = rules_by_name.insert(rule.name().to_string(), Arc::new(rule));
        }

        // 2 + 3. pipelines: parse failures degrade to empty sentinels,
        // unresolved rule references to always-false sentinels
        let mut pipelines_by_id: HashMap<_, Arc<Pipeline>> = HashMap::new();
        for source in self.pipelines.load_all().await? {
            let mut pipeline = match self.parser.parse_pipeline(&source.id, &source.source) {
                Ok(pipeline) => pipeline,
                Err(err) => {
                    warn!(pipeline_id = %source.id, "failed to parse pipeline: {}", err);
                    Pipeline::empty(source.id.clone(), format!("Failed to parse pipeline {}", source.id))
                }
            };
            pipeline.link(|name| {
                rules_by_name.get(name).cloned().unwrap_or_else(|| {
                    warn!(rule = name, pipeline_id = %source.id, "stage references unknown rule");
                    Arc::new(Rule::always_false(format!("Unresolved rule {}", name)))
                })
            });
            let _ = pipelines_by_id.insert(pipeline.id().clone(), Arc::new(pipeline));
        }

        // 4. assignments: entries naming unknown pipelines are dropped
        let mut stream_assignments: HashMap<StreamId, Vec<Arc<Pipeline>>> = HashMap::new();
        for assignment in self.assignments.load_all().await? {
            for pipeline_id in assignment.pipeline_ids {
                match pipelines_by_id.get(&pipeline_id) {
                    Some(pipeline) => stream_assignments
                        .entry(assignment.stream_id.clone())
                        .or_default()
                        .push(Arc::clone(pipeline)),
                    None => warn!(
                        stream = %assignment.stream_id,
                        pipeline_id = %pipeline_id,
                        "dropping assignment to unknown pipeline"
                    ),
                }
            }
        }

        Ok(ProgramSnapshot::new(pipelines_by_id, stream_assignments))
    }
}

impl PipelineChangeSubscriber for ReloadController {
    fn on_rules_changed(&self, event: RulesChangedEvent) {
        info!(updated = ?event.updated, deleted = ?event.deleted, "rules changed");
        self.trigger_reload();
    }

    fn on_pipelines_changed(&self, event: PipelinesChangedEvent) {
        info!(updated = ?event.updated, deleted = ?event.deleted, "pipelines changed");
        self.trigger_reload();
    }

    fn on_assignments_changed(&self, event: StreamAssignmentChangedEvent) {
        info!(stream = %event.stream_id, pipelines = ?event.pipeline_ids, "stream assignment changed");
        self.trigger_reload();
    }
}
