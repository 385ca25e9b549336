// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Processor Configuration
//!
//! Configuration of the interpreter's ambient behavior, loaded from an
//! optional TOML file with environment-variable overrides
//! (`MESSAGE_PIPELINE_*`). Every field has a working default so an
//! embedding host can run without any configuration at all.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use message_pipeline_domain::PipelineError;

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "MESSAGE_PIPELINE";

/// Ambient configuration of the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Log filter directive handed to the tracing subscriber
    /// (e.g. `"info"` or `"message_pipeline=debug"`).
    pub log_level: String,

    /// Bound of the reload trigger channel: how many reloads may be
    /// pending while one runs. Further triggers collapse.
    pub reload_queue_depth: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            reload_queue_depth: 1,
        }
    }
}

impl ProcessorConfig {
    /// Loads configuration from `message_pipeline.toml` (if present) and
    /// `MESSAGE_PIPELINE_*` environment overrides.
    pub fn load() -> Result<Self, PipelineError> {
        Self::load_from("message_pipeline")
    }

    /// Loads configuration from the named file base (without extension).
    pub fn load_from(base_name: &str) -> Result<Self, PipelineError> {
        Config::builder()
            .add_source(File::with_name(base_name).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| PipelineError::invalid_config(format!("failed to read configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| PipelineError::invalid_config(format!("invalid configuration: {}", e)))
    }
}
