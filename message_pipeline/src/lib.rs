// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Message Pipeline
//!
//! The message-processing pipeline interpreter: a stateful engine embedded
//! in a log/event processing host that, for every inbound message,
//! determines which user-authored pipelines apply, executes them stage by
//! stage, and mutates or drops the message accordingly.
//!
//! ## Architecture
//!
//! This crate is the application + infrastructure layer over
//! `message-pipeline-domain`:
//!
//! - **Application**: [`application::services::interpreter`] (the
//!   per-message scheduling loop) and
//!   [`application::services::engine`] (the host assembly facade)
//! - **Infrastructure**: the hot-swappable snapshot store, the reload
//!   controller, the built-in rule function library, Prometheus metrics,
//!   configuration, logging, and in-memory adapters for the consumed
//!   ports
//!
//! ## Embedding
//!
//! ```rust,ignore
//! use message_pipeline::application::services::engine::{EngineDependencies, PipelineEngine};
//! use message_pipeline::infrastructure::config::ProcessorConfig;
//!
//! let engine = PipelineEngine::start(deps, ProcessorConfig::load()?).await?;
//! host.register_processor(engine.processor());
//! event_bus.subscribe(engine.change_subscriber());
//! ```

pub mod application;
pub mod infrastructure;

pub use application::services::engine::{EngineDependencies, PipelineEngine};
pub use application::services::interpreter::PipelineInterpreter;
pub use infrastructure::config::ProcessorConfig;
pub use infrastructure::functions::builtin_registry;
pub use infrastructure::metrics::service::MetricsService;
pub use infrastructure::runtime::reload::ReloadController;
pub use infrastructure::state::store::PipelineStateStore;
