// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Aggregates
//!
//! Consistency boundaries published and consumed as a whole.

pub mod program_snapshot;

pub use program_snapshot::ProgramSnapshot;
