// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline and Stage Entities
//!
//! A pipeline is an ordered sequence of stages, keyed by ascending stage
//! number. A stage is a set of rules evaluated together with a match-quorum
//! policy (`match_all` versus "any match") that decides whether the
//! pipeline advances past the stage.
//!
//! ## Overview
//!
//! Stage numbers within a pipeline are strictly increasing but need not be
//! contiguous; only the relative order matters to the stage-slice
//! iteration. Duplicate stage numbers are an authoring error and are
//! rejected when the pipeline is constructed (i.e. at parse time).
//!
//! Stages reference rules by name. The reload's link step resolves every
//! reference against the current rule map and fills [`Stage::rules`];
//! unresolved references become always-false sentinels so a typo in one
//! stage never takes down the pipeline.
//!
//! ## Sentinel
//!
//! [`Pipeline::empty`] is the sentinel substituted for a pipeline source
//! that fails to parse: it keeps the id (so stream assignments still
//! resolve) but has no stages, so messages routed to it pass through
//! unchanged.

use std::sync::Arc;

use crate::entities::rule::Rule;
use crate::value_objects::ids::PipelineId;
use crate::PipelineError;

/// A set of rules evaluated together, with a match-quorum policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    stage: i32,
    match_all: bool,
    rule_references: Vec<String>,
    rules: Vec<Arc<Rule>>,
}

impl Stage {
    /// Creates an unlinked stage; [`Stage::rules`] is empty until the
    /// reload's link step resolves the references.
    pub fn new(stage: i32, match_all: bool, rule_references: Vec<String>) -> Self {
        Self {
            stage,
            match_all,
            rule_references,
            rules: Vec::new(),
        }
    }

    /// The stage number this stage sorts by.
    pub fn stage(&self) -> i32 {
        self.stage
    }

    /// Match-quorum policy: `true` requires every rule to match for the
    /// pipeline to advance, `false` requires at least one.
    pub fn match_all(&self) -> bool {
        self.match_all
    }

    pub fn rule_references(&self) -> &[String] {
        &self.rule_references
    }

    /// The resolved rules, in declaration order. Empty before linking.
    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    /// Resolves the rule references through `resolver`, filling
    /// [`Stage::rules`]. The resolver substitutes sentinels for names it
    /// cannot resolve, so linking itself never fails.
    pub fn link<F>(&mut self, resolver: &F)
    where
        F: Fn(&str) -> Arc<Rule>,
    {
        self.rules = self.rule_references.iter().map(|name| resolver(name)).collect();
    }
}

/// An ordered sequence of stages, keyed by ascending stage number.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    id: PipelineId,
    name: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Creates a pipeline, sorting stages ascending and rejecting
    /// duplicate stage numbers.
    pub fn new(id: PipelineId, name: impl Into<String>, mut stages: Vec<Stage>) -> Result<Self, PipelineError> {
        let name = name.into();
        stages.sort_by_key(Stage::stage);
        if let Some(window) = stages.windows(2).find(|w| w[0].stage() == w[1].stage()) {
            return Err(PipelineError::validation_error(format!(
                "pipeline '{}': duplicate stage number {}",
                name,
                window[0].stage()
            )));
        }
        Ok(Self { id, name, stages })
    }

    /// Sentinel pipeline substituted for a source that failed to parse:
    /// keeps the id, carries no stages. `reason` becomes the name for log
    /// attribution.
    pub fn empty(id: PipelineId, reason: impl Into<String>) -> Self {
        Self {
            id,
            name: reason.into(),
            stages: Vec::new(),
        }
    }

    pub fn id(&self) -> &PipelineId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stages in ascending stage-number order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Links every stage's rule references through `resolver`.
    pub fn link<F>(&mut self, resolver: F)
    where
        F: Fn(&str) -> Arc<Rule>,
    {
        for stage in &mut self.stages {
            stage.link(&resolver);
        }
    }
}
