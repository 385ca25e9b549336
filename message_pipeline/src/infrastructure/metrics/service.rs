// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Service
//!
//! Prometheus metrics for the interpreter and the reload controller,
//! collected in a dedicated registry under the `message_pipeline`
//! namespace.
//!
//! # Metric Categories
//!
//! - **Processing**: messages processed, messages filtered out by rules,
//!   batch processing duration
//! - **Evaluation health**: rule evaluation errors (contained failures)
//! - **Program state**: loaded pipelines/rules gauges, reload counters
//!
//! The filtered-out counter is part of the interpreter's external
//! contract: hosts alert on it to detect runaway drop rules.

use prometheus::{Gauge, Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;
use tracing::debug;

use message_pipeline_domain::PipelineError;

const NAMESPACE: &str = "message_pipeline";

/// Prometheus-backed metrics for the interpreter.
#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,

    // Processing metrics
    messages_processed_total: IntCounter,
    filtered_out_messages_total: IntCounter,
    process_batch_duration: Histogram,

    // Evaluation health
    rule_evaluation_errors_total: IntCounter,

    // Program state
    snapshot_reloads_total: IntCounter,
    snapshot_reload_failures_total: IntCounter,
    loaded_pipelines: Gauge,
    loaded_rules: Gauge,
}

impl MetricsService {
    /// Create a new MetricsService with a dedicated Prometheus registry.
    pub fn new() -> Result<Self, PipelineError> {
        let registry = Registry::new();

        let messages_processed_total = IntCounter::with_opts(
            Opts::new("messages_processed_total", "Total messages fully processed").namespace(NAMESPACE),
        )
        .map_err(|e| PipelineError::metrics_error(format!("Failed to create messages_processed_total metric: {}", e)))?;

        let filtered_out_messages_total = IntCounter::with_opts(
            Opts::new("filtered_out_messages_total", "Total messages dropped by pipeline rules").namespace(NAMESPACE),
        )
        .map_err(|e| {
            PipelineError::metrics_error(format!("Failed to create filtered_out_messages_total metric: {}", e))
        })?;

        let process_batch_duration = Histogram::with_opts(
            HistogramOpts::new("process_batch_duration_seconds", "Time spent processing one message batch")
                .namespace(NAMESPACE)
                .buckets(vec![0.0001, 0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )
        .map_err(|e| PipelineError::metrics_error(format!("Failed to create process_batch_duration metric: {}", e)))?;

        let rule_evaluation_errors_total = IntCounter::with_opts(
            Opts::new(
                "rule_evaluation_errors_total",
                "Total evaluation failures contained at the rule boundary",
            )
            .namespace(NAMESPACE),
        )
        .map_err(|e| {
            PipelineError::metrics_error(format!("Failed to create rule_evaluation_errors_total metric: {}", e))
        })?;

        let snapshot_reloads_total = IntCounter::with_opts(
            Opts::new("snapshot_reloads_total", "Total successful program snapshot reloads").namespace(NAMESPACE),
        )
        .map_err(|e| PipelineError::metrics_error(format!("Failed to create snapshot_reloads_total metric: {}", e)))?;

        let snapshot_reload_failures_total = IntCounter::with_opts(
            Opts::new(
                "snapshot_reload_failures_total",
                "Total reloads that failed and kept the previous snapshot",
            )
            .namespace(NAMESPACE),
        )
        .map_err(|e| {
            PipelineError::metrics_error(format!("Failed to create snapshot_reload_failures_total metric: {}", e))
        })?;

        let loaded_pipelines = Gauge::with_opts(
            Opts::new("loaded_pipelines", "Pipelines in the current program snapshot").namespace(NAMESPACE),
        )
        .map_err(|e| PipelineError::metrics_error(format!("Failed to create loaded_pipelines metric: {}", e)))?;

        let loaded_rules = Gauge::with_opts(
            Opts::new("loaded_rules", "Distinct rules resolved in the current program snapshot").namespace(NAMESPACE),
        )
        .map_err(|e| PipelineError::metrics_error(format!("Failed to create loaded_rules metric: {}", e)))?;

        // Register all metrics
        registry
            .register(Box::new(messages_processed_total.clone()))
            .map_err(|e| PipelineError::metrics_error(format!("Failed to register messages_processed_total: {}", e)))?;
        registry
            .register(Box::new(filtered_out_messages_total.clone()))
            .map_err(|e| {
                PipelineError::metrics_error(format!("Failed to register filtered_out_messages_total: {}", e))
            })?;
        registry
            .register(Box::new(process_batch_duration.clone()))
            .map_err(|e| PipelineError::metrics_error(format!("Failed to register process_batch_duration: {}", e)))?;
        registry
            .register(Box::new(rule_evaluation_errors_total.clone()))
            .map_err(|e| {
                PipelineError::metrics_error(format!("Failed to register rule_evaluation_errors_total: {}", e))
            })?;
        registry
            .register(Box::new(snapshot_reloads_total.clone()))
            .map_err(|e| PipelineError::metrics_error(format!("Failed to register snapshot_reloads_total: {}", e)))?;
        registry
            .register(Box::new(snapshot_reload_failures_total.clone()))
            .map_err(|e| {
                PipelineError::metrics_error(format!("Failed to register snapshot_reload_failures_total: {}", e))
            })?;
        registry
            .register(Box::new(loaded_pipelines.clone()))
            .map_err(|e| PipelineError::metrics_error(format!("Failed to register loaded_pipelines: {}", e)))?;
        registry
            .register(Box::new(loaded_rules.clone()))
            .map_err(|e| PipelineError::metrics_error(format!("Failed to register loaded_rules: {}", e)))?;

        debug!("MetricsService initialized with Prometheus registry");

        Ok(Self {
            registry: Arc::new(registry),
            messages_processed_total,
            filtered_out_messages_total,
            process_batch_duration,
            rule_evaluation_errors_total,
            snapshot_reloads_total,
            snapshot_reload_failures_total,
            loaded_pipelines,
            loaded_rules,
        })
    }

    pub fn add_messages_processed(&self, count: u64) {
        self.messages_processed_total.inc_by(count);
    }

    /// Increment the dropped-message meter.
    pub fn increment_filtered_out(&self) {
        self.filtered_out_messages_total.inc();
    }

    pub fn filtered_out_count(&self) -> u64 {
        self.filtered_out_messages_total.get()
    }

    pub fn observe_batch_duration(&self, duration: std::time::Duration) {
        self.process_batch_duration.observe(duration.as_secs_f64());
    }

    pub fn increment_rule_evaluation_errors(&self) {
        self.rule_evaluation_errors_total.inc();
    }

    pub fn rule_evaluation_error_count(&self) -> u64 {
        self.rule_evaluation_errors_total.get()
    }

    pub fn increment_reloads(&self) {
        self.snapshot_reloads_total.inc();
    }

    pub fn reload_count(&self) -> u64 {
        self.snapshot_reloads_total.get()
    }

    pub fn increment_reload_failures(&self) {
        self.snapshot_reload_failures_total.inc();
    }

    pub fn reload_failure_count(&self) -> u64 {
        self.snapshot_reload_failures_total.get()
    }

    /// Record the size of a freshly published snapshot.
    pub fn record_program_size(&self, pipelines: usize, rules: usize) {
        self.loaded_pipelines.set(pipelines as f64);
        self.loaded_rules.set(rules as f64);
    }

    /// Export all metrics in Prometheus text format.
    pub fn export(&self) -> Result<String, PipelineError> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| PipelineError::metrics_error(format!("Failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer).map_err(|e| PipelineError::metrics_error(format!("Invalid UTF-8 in metrics: {}", e)))
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }
}
