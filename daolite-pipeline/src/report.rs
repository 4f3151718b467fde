// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The result of executing a pipeline.

use std::fmt;

use daolite_engine::timing::TimingArray;
use daolite_engine::types::{LatencyError, LatencyResult};
use daolite_stages::StageKind;
use serde::Serialize;

/// The timing of one component.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageReport {
    pub name: String,
    pub kind: StageKind,
    pub resource: String,
    pub timing: TimingArray,
}

impl StageReport {
    /// Time from this stage's first start to its last finish.
    #[must_use]
    pub fn latency(&self) -> f64 {
        self.timing.span()
    }
}

/// The timing of every component in execution order, plus the end-to-end
/// figures derived from them. All times are in microseconds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutionReport {
    stages: Vec<StageReport>,
    global_start: f64,
    global_finish: f64,
    total_latency: f64,
}

impl ExecutionReport {
    /// Stages with an empty timing array do not contribute to the global
    /// start and finish.
    #[must_use]
    pub fn new(stages: Vec<StageReport>) -> Self {
        let global_start = stages
            .iter()
            .filter_map(|s| s.timing.first_start())
            .reduce(f64::min)
            .unwrap_or(0.0);
        let global_finish = stages
            .iter()
            .filter_map(|s| s.timing.last_finish())
            .reduce(f64::max)
            .unwrap_or(0.0);
        Self {
            stages,
            global_start,
            global_finish,
            total_latency: global_finish - global_start,
        }
    }

    /// Component names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn timings(&self, name: &str) -> Option<&TimingArray> {
        self.stage(name).map(|s| &s.timing)
    }

    #[must_use]
    pub fn stage_latency(&self, name: &str) -> Option<f64> {
        self.stage(name).map(StageReport::latency)
    }

    #[must_use]
    pub fn global_start(&self) -> f64 {
        self.global_start
    }

    #[must_use]
    pub fn global_finish(&self) -> f64 {
        self.global_finish
    }

    #[must_use]
    pub fn total_latency(&self) -> f64 {
        self.total_latency
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageReport> {
        self.stages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// A displayable view listing the start and finish of every group.
    #[must_use]
    pub fn details(&self) -> Details<'_> {
        Details(self)
    }

    pub fn to_yaml(&self) -> LatencyResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LatencyError::Parse(format!("serde_yaml::to_string failed: {e}")))
    }
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::len).fold(header.len(), usize::max)
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name_w = column_width("stage", self.stages.iter().map(|s| s.name.as_str()));
        let res_w = column_width("resource", self.stages.iter().map(|s| s.resource.as_str()));

        writeln!(
            f,
            "{:<name_w$}  {:<14}  {:<res_w$}  {:>6}  {:>12}  {:>12}  {:>12}",
            "stage", "kind", "resource", "groups", "start", "finish", "latency"
        )?;
        for s in &self.stages {
            writeln!(
                f,
                "{:<name_w$}  {:<14}  {:<res_w$}  {:>6}  {:>12.3}  {:>12.3}  {:>12.3}",
                s.name,
                s.kind.to_string(),
                s.resource,
                s.timing.len(),
                s.timing.first_start().unwrap_or(0.0),
                s.timing.last_finish().unwrap_or(0.0),
                s.latency()
            )?;
        }
        write!(f, "total latency: {:.3} us", self.total_latency)
    }
}

/// See [`ExecutionReport::details`].
pub struct Details<'a>(&'a ExecutionReport);

impl fmt::Display for Details<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for s in &self.0.stages {
            writeln!(f, "{} ({}):", s.name, s.kind)?;
            for (i, row) in s.timing.iter().enumerate() {
                writeln!(f, "  {i:>4}: {:>12.3} -> {:>12.3}", row.start, row.finish)?;
            }
        }
        Ok(())
    }
}
