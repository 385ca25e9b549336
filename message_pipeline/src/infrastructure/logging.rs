// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Initialization
//!
//! Tracing subscriber setup for hosts that do not install their own. The
//! interpreter itself only emits `tracing` events; whether and how they
//! are rendered is the host's choice, so initialization is explicit and
//! idempotent rather than automatic.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::infrastructure::config::ProcessorConfig;

/// Installs a global tracing subscriber at the configured level.
///
/// An unrecognized level falls back to `info`. Safe to call more than
/// once: a global subscriber can only be installed once per process, so
/// subsequent calls are no-ops.
pub fn init_logging(config: &ProcessorConfig) {
    let level = Level::from_str(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_target(true).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
