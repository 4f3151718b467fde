// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Types that map directly to the contents of a pipeline description file.
//!
//! Descriptions are YAML (JSON is accepted too as it is parsed by the same
//! reader). Dependencies can be given on each component, as a list of
//! `connections` between components or both.
//!
//! Fields outside these sections are ignored so that files saved by the
//! pipeline designer (with `containers`, `transfers` and layout positions)
//! load as they are. Stage parameters are still checked by name.
//!
//! ```yaml
//! components:
//!   - name: camera
//!     kind: camera
//!     params: { n_pixels: 16384, group: 4 }
//!   - name: control
//!     kind: control
//!     resource: amd_epyc_7763
//!     params: { n_acts: 5000 }
//! connections:
//!   - { start: camera, end: control }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use daolite_engine::invalid_config;
use daolite_engine::types::{LatencyError, LatencyResult};
use daolite_hardware::ResourceWarning;
use daolite_hardware::registry::HardwareRegistry;
use daolite_hardware::types::ResourceSection;
use daolite_stages::{ParamMap, Stage, StageKind};
use daolite_track::entity::Entity;
use daolite_track::{debug, warn};
use serde::Deserialize;

use crate::{Component, PipelineGraph};

#[derive(Debug, Deserialize)]
pub struct PipelineDescription {
    /// Resources only visible to this pipeline.
    #[serde(default)]
    pub resources: Vec<ResourceSection>,
    pub components: Vec<ComponentSection>,
    #[serde(default)]
    pub connections: Vec<ConnectionSection>,
}

#[derive(Debug, Deserialize)]
pub struct ComponentSection {
    pub name: String,
    #[serde(alias = "type")]
    pub kind: StageKind,
    pub resource: Option<String>,
    #[serde(default)]
    pub params: ParamMap,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// `end` depends on `start`.
#[derive(Debug, Deserialize)]
pub struct ConnectionSection {
    pub start: String,
    pub end: String,
}

/// A resource fallback that happened while building a graph.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoadWarning {
    pub component: String,
    pub warning: ResourceWarning,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Component '{}': {}", self.component, self.warning)
    }
}

pub struct LoadedPipeline {
    pub graph: PipelineGraph,
    pub warnings: Vec<LoadWarning>,
}

impl PipelineDescription {
    pub fn from_file(pipeline_path: &Path) -> LatencyResult<Self> {
        let s = std::fs::read_to_string(pipeline_path).map_err(|e| {
            LatencyError::Parse(format!("Unable to read {}: {e}", pipeline_path.display()))
        })?;
        Self::from_string(&s)
    }

    pub fn from_string(pipeline_str: &str) -> LatencyResult<Self> {
        serde_yaml::from_str(pipeline_str)
            .map_err(|e| LatencyError::Parse(format!("serde_yaml::from_str failed: {e}")))
    }

    /// Check names are unique and connections refer to known components.
    pub fn validate(&self) -> LatencyResult {
        let mut errors = Vec::new();

        let mut resource_names = HashSet::new();
        for resource in &self.resources {
            if !resource_names.insert(resource.name.as_str()) {
                errors.push(format!("Duplicate resource name '{}'", resource.name));
            }
        }

        let mut names = HashSet::new();
        for component in &self.components {
            if !names.insert(component.name.as_str()) {
                errors.push(format!("Duplicate component name '{}'", component.name));
            }
        }

        for connection in &self.connections {
            for end in [&connection.start, &connection.end] {
                if !names.contains(end.as_str()) {
                    errors.push(format!("Connection refers to unknown component '{end}'"));
                }
            }
        }

        if !errors.is_empty() {
            return invalid_config!("Failed to validate pipeline:\n{}", errors.join("\n"));
        }
        Ok(())
    }

    /// Build a [`PipelineGraph`] under `parent`.
    ///
    /// Components name their resource from `registry` (extended by the
    /// description's own resources). A component without a resource uses
    /// `default_resource`, and an unknown name falls back to the registry's
    /// default resource with a warning.
    pub fn build_graph(
        &self,
        parent: &Rc<Entity>,
        registry: &HardwareRegistry,
        default_resource: Option<&str>,
    ) -> LatencyResult<LoadedPipeline> {
        self.validate()?;

        let mut local_registry;
        let registry = if self.resources.is_empty() {
            registry
        } else {
            local_registry = registry.clone();
            for section in &self.resources {
                local_registry.add(section.build()?);
            }
            &local_registry
        };

        let mut graph = PipelineGraph::new(parent);
        let mut warnings = Vec::new();
        for section in &self.components {
            let stage = Stage::from_params(section.kind, &section.name, &section.params)?;

            let resolved = registry.resolve(section.resource.as_deref().or(default_resource));
            if let Some(warning) = resolved.warning {
                let warning = LoadWarning {
                    component: section.name.clone(),
                    warning,
                };
                warn!(graph.entity() ; "{warning}");
                warnings.push(warning);
            }

            let dependencies = section.dependencies.iter().map(String::as_str).chain(
                self.connections
                    .iter()
                    .filter(|c| c.end == section.name)
                    .map(|c| c.start.as_str()),
            );
            let component = Component::new(&section.name, stage, resolved.resource)
                .with_dependencies(dependencies);
            debug!(graph.entity() ; "loaded {} on {}", section.name, component.resource().name());
            graph.add_component(component)?;
        }

        Ok(LoadedPipeline { graph, warnings })
    }
}
