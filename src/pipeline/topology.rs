//! Step dependency analysis.
//!
//! Provides:
//! - Dangling dependency and reference detection
//! - Cycle detection
//! - Reachability between steps

use crate::core::error::{PipelineError, PipelineResult};
use crate::pipeline::structure::Step;
use indexmap::IndexMap;
use petgraph::algo::{has_path_connecting, tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Directed graph of steps; an edge runs from a step to each step that
/// depends on it, either explicitly or by consuming one of its outputs.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph, rejecting edges to steps that do not exist.
    pub fn build(steps: &IndexMap<String, Step>) -> PipelineResult<Self> {
        let mut graph = DiGraph::with_capacity(steps.len(), steps.len());
        let mut indices = HashMap::with_capacity(steps.len());

        for name in steps.keys() {
            indices.insert(name.clone(), graph.add_node(name.clone()));
        }

        for (name, step) in steps {
            let downstream = indices[name];

            for dependency in &step.depends_on {
                let upstream = indices.get(dependency).ok_or_else(|| {
                    PipelineError::UnknownDependency {
                        step: name.clone(),
                        dependency: dependency.clone(),
                    }
                })?;
                graph.update_edge(*upstream, downstream, ());
            }

            for (input, reference) in step.output_references() {
                let upstream = indices.get(&reference.step_name).ok_or_else(|| {
                    PipelineError::UnknownReference {
                        step: name.clone(),
                        input: input.name.clone(),
                        referenced: reference.step_name.clone(),
                    }
                })?;
                graph.update_edge(*upstream, downstream, ());
            }
        }

        Ok(Self { graph, indices })
    }

    /// Fail if any group of steps depends on itself.
    pub fn check_acyclic(&self) -> PipelineResult<()> {
        if toposort(&self.graph, None).is_ok() {
            return Ok(());
        }

        let mut steps: Vec<String> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || self.graph.contains_edge(component[0], component[0])
            })
            .flatten()
            .map(|index| self.graph[index].clone())
            .collect();
        steps.sort();

        Err(PipelineError::CycleDetected { steps })
    }

    /// Whether `downstream` transitively depends on `upstream`.
    pub fn has_path(&self, upstream: &str, downstream: &str) -> bool {
        match (self.indices.get(upstream), self.indices.get(downstream)) {
            (Some(&from), Some(&to)) if from != to => {
                has_path_connecting(&self.graph, from, to, None)
            }
            _ => false,
        }
    }
}
