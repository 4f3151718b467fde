// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::sync::Arc;

use daolite_hardware::ComputeResource;
use daolite_stages::{Stage, StageKind};

/// A named stage of the pipeline, the resource it runs on and the names of
/// the components it waits for.
#[derive(Clone, Debug)]
pub struct Component {
    name: String,
    stage: Stage,
    resource: Arc<ComputeResource>,
    dependencies: Vec<String>,
}

impl Component {
    #[must_use]
    pub fn new(name: &str, stage: impl Into<Stage>, resource: Arc<ComputeResource>) -> Self {
        Self {
            name: name.to_string(),
            stage: stage.into(),
            resource,
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency. Naming the same dependency twice has no effect.
    #[must_use]
    pub fn with_dependency(mut self, name: &str) -> Self {
        self.add_dependency(name);
        self
    }

    #[must_use]
    pub fn with_dependencies<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self.add_dependency(name);
        }
        self
    }

    pub fn add_dependency(&mut self, name: &str) {
        if !self.dependencies.iter().any(|d| d == name) {
            self.dependencies.push(name.to_string());
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> StageKind {
        self.stage.kind()
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    #[must_use]
    pub fn resource(&self) -> &Arc<ComputeResource> {
        &self.resource
    }

    /// Names of the components this one waits for, in the order given.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}
