// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Engine
//!
//! The assembly facade an embedding host uses to wire the interpreter:
//! state store, metrics, built-in (or host-extended) function registry,
//! reload controller, and the interpreter itself, from one set of
//! dependencies and one configuration.
//!
//! `PipelineEngine::start` performs the initial synchronous load so the
//! interpreter never processes a message against an unconfigured program,
//! then hands out the processor (for host registration) and the change
//! subscriber (for event bus subscription).

use std::sync::Arc;

use message_pipeline_domain::repositories::pipeline_source::PipelineSourceService;
use message_pipeline_domain::repositories::rule_source::RuleSourceService;
use message_pipeline_domain::repositories::stream_assignment::StreamAssignmentService;
use message_pipeline_domain::services::function_registry::FunctionRegistry;
use message_pipeline_domain::services::journal::Journal;
use message_pipeline_domain::services::rule_parser::RuleLanguageParser;
use message_pipeline_domain::PipelineError;

use crate::application::services::interpreter::PipelineInterpreter;
use crate::infrastructure::config::ProcessorConfig;
use crate::infrastructure::functions::builtin_registry;
use crate::infrastructure::metrics::service::MetricsService;
use crate::infrastructure::runtime::reload::ReloadController;
use crate::infrastructure::state::store::PipelineStateStore;

/// Everything the engine consumes from the host.
pub struct EngineDependencies {
    pub rules: Arc<dyn RuleSourceService>,
    pub pipelines: Arc<dyn PipelineSourceService>,
    pub assignments: Arc<dyn StreamAssignmentService>,
    pub parser: Arc<dyn RuleLanguageParser>,
    pub journal: Arc<dyn Journal>,
    /// Host-extended function registry; `None` uses the built-in library.
    pub functions: Option<Arc<FunctionRegistry>>,
}

/// Fully wired interpreter plus its reload machinery.
pub struct PipelineEngine {
    interpreter: Arc<PipelineInterpreter>,
    reload: Arc<ReloadController>,
    store: Arc<PipelineStateStore>,
    metrics: Arc<MetricsService>,
}

impl PipelineEngine {
    /// Wires the engine and performs the initial load.
    ///
    /// Must be called from within a tokio runtime (the reload worker is
    /// spawned here).
    pub async fn start(deps: EngineDependencies, config: ProcessorConfig) -> Result<Self, PipelineError> {
        let metrics = Arc::new(MetricsService::new()?);
        let store = Arc::new(PipelineStateStore::new());
        let functions = deps.functions.unwrap_or_else(builtin_registry);

        let reload = ReloadController::spawn(
            deps.rules,
            deps.pipelines,
            deps.assignments,
            deps.parser,
            Arc::clone(&store),
            Arc::clone(&metrics),
            config.reload_queue_depth,
        );
        reload.reload().await;

        let interpreter = Arc::new(PipelineInterpreter::new(
            Arc::clone(&store),
            functions,
            deps.journal,
            Arc::clone(&metrics),
        ));

        Ok(Self {
            interpreter,
            reload,
            store,
            metrics,
        })
    }

    /// The processor the host registers and feeds batches to.
    pub fn processor(&self) -> Arc<PipelineInterpreter> {
        Arc::clone(&self.interpreter)
    }

    /// The subscriber the host connects to its event bus.
    pub fn change_subscriber(&self) -> Arc<ReloadController> {
        Arc::clone(&self.reload)
    }

    pub fn store(&self) -> Arc<PipelineStateStore> {
        Arc::clone(&self.store)
    }

    pub fn metrics(&self) -> Arc<MetricsService> {
        Arc::clone(&self.metrics)
    }
}
