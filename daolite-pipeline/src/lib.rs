// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Latency models of adaptive optics real-time control pipelines.
//!
//! A [`PipelineGraph`] holds named [`Component`]s, each a stage with its
//! parameters, the [`ComputeResource`](daolite_hardware::ComputeResource) it
//! runs on and the components it depends on. The
//! [`Executor`](executor::Executor) orders the components so every
//! dependency is computed first, runs each stage's timing model and collects
//! the results in an [`ExecutionReport`](report::ExecutionReport).
//!
//! Graphs can be built in code or loaded from a YAML/JSON
//! [`PipelineDescription`](types::PipelineDescription).
//!
//! # Example
//!
//! ```rust
//! use daolite_engine::test_helpers::start_test;
//! use daolite_hardware::test_helpers::reference_resource;
//! use daolite_pipeline::executor::Executor;
//! use daolite_pipeline::{Component, PipelineGraph};
//! use daolite_stages::{CameraParams, ControlParams};
//!
//! let top = start_test(file!());
//! let resource = reference_resource();
//! let mut graph = PipelineGraph::new(&top);
//! graph
//!     .add_component(Component::new("camera", CameraParams::new(4096).with_group(4), resource.clone()))
//!     .unwrap();
//! graph
//!     .add_component(Component::new("control", ControlParams::new(100), resource).with_dependency("camera"))
//!     .unwrap();
//!
//! let report = Executor::new(&top).run(&graph).unwrap();
//! assert_eq!(report.stage_names(), vec!["camera", "control"]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use daolite_engine::invalid_config;
use daolite_engine::types::{LatencyError, LatencyResult};
use daolite_track::entity::Entity;
use daolite_track::trace;

pub mod component;
pub mod config;
pub mod executor;
pub mod report;
pub mod types;

pub use component::Component;

/// A component together with the entity its log messages are emitted from.
pub(crate) struct Node {
    pub(crate) entity: Rc<Entity>,
    pub(crate) component: Component,
}

/// The components of a pipeline and their dependencies.
///
/// Components are kept in the order they were added, which is the order
/// the executor uses to break ties.
///
/// A graph shares its entities with the tracker, so it stays on the thread
/// that built it. [`Component`]s and reports are `Send + Sync`; runs on
/// several threads each build their own graph from them.
pub struct PipelineGraph {
    entity: Rc<Entity>,
    nodes: Vec<Node>,
    idx_by_name: HashMap<String, usize>,
}

impl PipelineGraph {
    #[must_use]
    pub fn new(parent: &Rc<Entity>) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, "pipeline")),
            nodes: Vec::new(),
            idx_by_name: HashMap::new(),
        }
    }

    #[must_use]
    pub fn entity(&self) -> &Rc<Entity> {
        &self.entity
    }

    /// Add a component. Its name must not already be in use.
    ///
    /// Dependencies are not checked until the graph is executed so
    /// components can be added in any order.
    pub fn add_component(&mut self, component: Component) -> LatencyResult {
        if self.idx_by_name.contains_key(component.name()) {
            return invalid_config!("Duplicate component name '{}'", component.name());
        }
        let entity = Rc::new(Entity::new(&self.entity, component.name()));
        trace!(self.entity ; "add {} ({})", component.name(), component.kind());
        self.idx_by_name
            .insert(component.name().to_string(), self.nodes.len());
        self.nodes.push(Node { entity, component });
        Ok(())
    }

    /// Remove a component and return it.
    ///
    /// Components that depend on it are left unchanged, so executing the
    /// graph will report them as having a missing dependency.
    pub fn remove_component(&mut self, name: &str) -> LatencyResult<Component> {
        let Some(idx) = self.idx_by_name.remove(name) else {
            return invalid_config!("No component named '{name}' to remove");
        };
        let node = self.nodes.remove(idx);
        for (i, moved) in self.nodes.iter().enumerate().skip(idx) {
            self.idx_by_name.insert(moved.component.name().to_string(), i);
        }
        trace!(self.entity ; "remove {name}");
        Ok(node.component)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Component> {
        self.idx_by_name
            .get(name)
            .map(|idx| &self.nodes[*idx].component)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.idx_by_name.contains_key(name)
    }

    /// The components in the order they were added.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.nodes.iter().map(|n| &n.component)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.idx_by_name.get(name).copied()
    }

    /// Check that every dependency names a component in the graph.
    pub fn check_dependencies(&self) -> LatencyResult {
        for node in &self.nodes {
            for dependency in node.component.dependencies() {
                if !self.contains(dependency) {
                    return Err(LatencyError::MissingDependency {
                        component: node.component.name().to_string(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for PipelineGraph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for node in &self.nodes {
            let c = &node.component;
            write!(f, "{} ({}) on {}", c.name(), c.kind(), c.resource().name())?;
            if !c.dependencies().is_empty() {
                write!(f, " <- {}", c.dependencies().join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
