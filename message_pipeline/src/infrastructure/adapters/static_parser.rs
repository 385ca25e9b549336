// /////////////////////////////////////////////////////////////////////////////
// Message Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Static AST Parser Adapter
//!
//! A [`RuleLanguageParser`] for embedding hosts that assemble rule and
//! pipeline ASTs programmatically rather than shipping the surface-syntax
//! parser. Sources are resolved by id against pre-registered ASTs; an
//! unregistered id reports a parse error, which exercises the reload
//! controller's sentinel substitution exactly like a real syntax error
//! would.

use parking_lot::RwLock;
use std::collections::HashMap;

use message_pipeline_domain::entities::pipeline::Pipeline;
use message_pipeline_domain::entities::rule::Rule;
use message_pipeline_domain::error::SourceParseError;
use message_pipeline_domain::services::rule_parser::RuleLanguageParser;
use message_pipeline_domain::value_objects::ids::{PipelineId, RuleId};

/// Id-indexed parser over pre-registered ASTs.
#[derive(Default)]
pub struct StaticAstParser {
    rules: RwLock<HashMap<String, Rule>>,
    pipelines: RwLock<HashMap<String, Pipeline>>,
}

impl StaticAstParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the AST returned for rule source `id`.
    pub fn add_rule(&mut self, id: impl Into<String>, rule: Rule) {
        let _ = self.rules.get_mut().insert(id.into(), rule);
    }

    /// Registers the AST returned for pipeline source `id`.
    pub fn add_pipeline(&mut self, id: impl Into<String>, pipeline: Pipeline) {
        let _ = self.pipelines.get_mut().insert(id.into(), pipeline);
    }
}

impl RuleLanguageParser for StaticAstParser {
    fn parse_rule(&self, id: &RuleId, _source: &str) -> Result<Rule, SourceParseError> {
        self.rules
            .read()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| SourceParseError::new(1, 1, format!("no rule registered for id {}", id)))
    }

    fn parse_pipeline(&self, id: &PipelineId, _source: &str) -> Result<Pipeline, SourceParseError> {
        self.pipelines
            .read()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| SourceParseError::new(1, 1, format!("no pipeline registered for id {}", id)))
    }
}
