// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Run the stage timing models of a [`PipelineGraph`] in dependency order.
//!
//! Components are ordered with Kahn's algorithm. When several components are
//! ready at once the one added to the graph first goes first, so the order
//! (and therefore the report) is fully deterministic. If not every component
//! can be ordered the graph contains a cycle and nothing is computed.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use daolite_engine::invalid_config;
use daolite_engine::timing::TimingArray;
use daolite_engine::types::{LatencyError, LatencyResult};
use daolite_stages::StageTiming;
use daolite_track::entity::Entity;
use daolite_track::{debug, error, info, trace};

use crate::PipelineGraph;
use crate::report::{ExecutionReport, StageReport};

/// Progress of a single component through an execution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeState {
    /// Waiting for dependencies.
    Pending,
    /// All dependencies have been computed.
    Ready,
    Computed,
    Failed,
}

pub struct Executor {
    entity: Rc<Entity>,
    states: RefCell<Vec<(String, NodeState)>>,
}

impl Executor {
    #[must_use]
    pub fn new(parent: &Rc<Entity>) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, "executor")),
            states: RefCell::new(Vec::new()),
        }
    }

    /// The state each component was left in by the last call to
    /// [`run`](Self::run), in graph order.
    #[must_use]
    pub fn states(&self) -> Vec<(String, NodeState)> {
        self.states.borrow().clone()
    }

    /// Order the components of `graph` so that every component comes after
    /// all of its dependencies.
    ///
    /// Returns indices into the graph's components.
    pub fn order(&self, graph: &PipelineGraph) -> LatencyResult<Vec<usize>> {
        graph.check_dependencies()?;

        let nodes = graph.nodes();
        let mut waiting_on: Vec<usize> = nodes
            .iter()
            .map(|n| n.component.dependencies().len())
            .collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            for dependency in node.component.dependencies() {
                if let Some(d) = graph.index_of(dependency) {
                    dependents[d].push(i);
                }
            }
        }

        let mut ready: BTreeSet<usize> = waiting_on
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(nodes.len());
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &d in &dependents[i] {
                waiting_on[d] -= 1;
                if waiting_on[d] == 0 {
                    ready.insert(d);
                }
            }
        }

        if order.len() < nodes.len() {
            let components: Vec<String> = nodes
                .iter()
                .zip(&waiting_on)
                .filter(|(_, count)| **count > 0)
                .map(|(n, _)| n.component.name().to_string())
                .collect();
            return Err(LatencyError::GraphCycle { components });
        }

        Ok(order)
    }

    /// Compute the timing of every component of `graph`.
    ///
    /// Fails without producing a report if the graph is empty, a dependency
    /// is missing, the dependencies contain a cycle or any stage has an
    /// invalid configuration.
    pub fn run(&self, graph: &PipelineGraph) -> LatencyResult<ExecutionReport> {
        let mut states = vec![NodeState::Pending; graph.len()];
        let result = self.run_with_states(graph, &mut states);
        if let Err(e) = &result {
            error!(self.entity ; "{e}");
        }
        *self.states.borrow_mut() = graph
            .components()
            .zip(states)
            .map(|(c, state)| (c.name().to_string(), state))
            .collect();
        result
    }

    fn run_with_states(
        &self,
        graph: &PipelineGraph,
        states: &mut [NodeState],
    ) -> LatencyResult<ExecutionReport> {
        if graph.is_empty() {
            return invalid_config!("Pipeline has no components");
        }

        let order = match self.order(graph) {
            Ok(order) => order,
            Err(e) => {
                match &e {
                    LatencyError::GraphCycle { components } => {
                        for name in components {
                            if let Some(i) = graph.index_of(name) {
                                states[i] = NodeState::Failed;
                            }
                        }
                    }
                    LatencyError::MissingDependency { component, .. } => {
                        if let Some(i) = graph.index_of(component) {
                            states[i] = NodeState::Failed;
                        }
                    }
                    _ => {}
                }
                return Err(e);
            }
        };

        let nodes = graph.nodes();
        let mut timings: Vec<Option<TimingArray>> = vec![None; nodes.len()];

        for &i in &order {
            let node = &nodes[i];
            let component = &node.component;

            let mut inputs = Vec::with_capacity(component.dependencies().len());
            for dependency in component.dependencies() {
                let Some(timing) = graph.index_of(dependency).and_then(|d| timings[d].as_ref())
                else {
                    states[i] = NodeState::Failed;
                    return Err(LatencyError::MissingDependency {
                        component: component.name().to_string(),
                        dependency: dependency.clone(),
                    });
                };
                inputs.push(timing);
            }
            states[i] = NodeState::Ready;

            let upstream = match inputs.as_slice() {
                [] => None,
                [only] => Some((*only).clone()),
                _ => Some(TimingArray::combine(&inputs)),
            };

            let timing = match component
                .stage()
                .timing(component.resource(), upstream.as_ref())
            {
                Ok(timing) => timing,
                Err(e) => {
                    states[i] = NodeState::Failed;
                    error!(node.entity ; "{e}");
                    return Err(e);
                }
            };

            debug!(node.entity ; "{} on {}: {} groups, {:.3} to {:.3} us",
                component.kind(),
                component.resource().name(),
                timing.len(),
                timing.first_start().unwrap_or(0.0),
                timing.last_finish().unwrap_or(0.0));
            for (g, row) in timing.iter().enumerate() {
                trace!(node.entity ; "group {g}: {:.3} -> {:.3}", row.start, row.finish);
            }

            timings[i] = Some(timing);
            states[i] = NodeState::Computed;
        }

        let stages = order
            .iter()
            .filter_map(|&i| {
                let component = &nodes[i].component;
                timings[i].take().map(|timing| StageReport {
                    name: component.name().to_string(),
                    kind: component.kind(),
                    resource: component.resource().name().to_string(),
                    timing,
                })
            })
            .collect();
        let report = ExecutionReport::new(stages);
        info!(self.entity ; "total latency {:.3} us", report.total_latency());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use daolite_engine::test_helpers::start_test;
    use daolite_hardware::test_helpers::reference_resource;
    use daolite_stages::ControlParams;

    use super::*;
    use crate::Component;

    fn control(name: &str, deps: &[&str]) -> Component {
        Component::new(name, ControlParams::new(10), reference_resource())
            .with_dependencies(deps.iter().copied())
    }

    #[test]
    fn ties_broken_by_declaration_order() {
        let top = start_test(file!());
        let mut graph = PipelineGraph::new(&top);
        graph.add_component(control("d", &["b", "c"])).unwrap();
        graph.add_component(control("c", &["a"])).unwrap();
        graph.add_component(control("b", &["a"])).unwrap();
        graph.add_component(control("a", &[])).unwrap();
        graph.add_component(control("e", &[])).unwrap();

        let executor = Executor::new(&top);
        let order = executor.order(&graph).unwrap();
        let names: Vec<&str> = order
            .iter()
            .map(|&i| graph.nodes()[i].component.name())
            .collect();
        assert_eq!(names, vec!["a", "c", "b", "d", "e"]);
    }

    #[test]
    fn cycle_names_unresolved_components() {
        let top = start_test(file!());
        let mut graph = PipelineGraph::new(&top);
        graph.add_component(control("head", &[])).unwrap();
        graph.add_component(control("x", &["head", "z"])).unwrap();
        graph.add_component(control("y", &["x"])).unwrap();
        graph.add_component(control("z", &["y"])).unwrap();
        graph.add_component(control("tail", &["z"])).unwrap();

        let err = Executor::new(&top).order(&graph).unwrap_err();
        assert_eq!(
            err,
            LatencyError::GraphCycle {
                components: vec![
                    "x".to_string(),
                    "y".to_string(),
                    "z".to_string(),
                    "tail".to_string()
                ]
            }
        );
    }

    #[test]
    fn states_after_failure() {
        let top = start_test(file!());
        let mut graph = PipelineGraph::new(&top);
        graph.add_component(control("a", &[])).unwrap();
        graph.add_component(control("b", &["a", "ghost"])).unwrap();
        graph.add_component(control("c", &["b"])).unwrap();

        let executor = Executor::new(&top);
        assert!(executor.run(&graph).is_err());
        assert_eq!(
            executor.states(),
            vec![
                ("a".to_string(), NodeState::Pending),
                ("b".to_string(), NodeState::Failed),
                ("c".to_string(), NodeState::Pending),
            ]
        );

        graph.remove_component("b").unwrap();
        graph.remove_component("c").unwrap();
        executor.run(&graph).unwrap();
        assert_eq!(
            executor.states(),
            vec![("a".to_string(), NodeState::Computed)]
        );
    }
}
