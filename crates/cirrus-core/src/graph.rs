//! Dependency graph layering
//!
//! Arranges a [`SpecSet`] into topological layers via Kahn's
//! algorithm. Each layer holds resources whose dependencies all live
//! in strictly earlier layers, so members of one layer can be
//! provisioned concurrently. Teardown walks the layers in reverse.

use crate::error::{GraphError, Result};
use crate::model::SpecSet;
use std::collections::{BTreeMap, BTreeSet};

/// Read-only layered view of a spec set
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    layers: Vec<Vec<String>>,
    /// Direct dependents per id (reverse edges)
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Compute topological layers, failing with [`GraphError::CycleDetected`]
    /// when the spec set is not acyclic. Ids within a layer are sorted
    /// lexicographically for deterministic output.
    pub fn build(specs: &SpecSet) -> Result<Self> {
        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for spec in specs.iter() {
            in_degree.entry(&spec.id).or_insert(0);
            dependents.entry(spec.id.clone()).or_default();
            for dep in &spec.depends_on {
                *in_degree.entry(&spec.id).or_insert(0) += 1;
                dependents
                    .entry(dep.clone())
                    .or_default()
                    .insert(spec.id.clone());
            }
        }

        let mut layers = Vec::new();
        let mut remaining: BTreeSet<&str> = in_degree.keys().copied().collect();

        while !remaining.is_empty() {
            // BTreeSet iteration keeps the layer lexicographic.
            let layer: Vec<String> = remaining
                .iter()
                .filter(|id| in_degree[*id] == 0)
                .map(|id| id.to_string())
                .collect();

            if layer.is_empty() {
                let ids: Vec<String> = remaining.iter().map(|id| id.to_string()).collect();
                return Err(GraphError::CycleDetected { ids });
            }

            for id in &layer {
                remaining.remove(id.as_str());
                for dependent in &dependents[id] {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                    }
                }
            }
            layers.push(layer);
        }

        tracing::debug!(
            layers = layers.len(),
            resources = specs.len(),
            "Built dependency graph"
        );
        Ok(Self { layers, dependents })
    }

    /// Layers in provisioning order
    pub fn layers(&self) -> &[Vec<String>] {
        &self.layers
    }

    /// Layers in teardown order
    pub fn reverse_layers(&self) -> impl Iterator<Item = &Vec<String>> {
        self.layers.iter().rev()
    }

    /// Transitive dependents of a resource, used to propagate an
    /// upstream failure without attempting the downstream creates.
    pub fn dependents_of(&self, id: &str) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        let mut stack: Vec<&str> = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(direct) = self.dependents.get(current) {
                for dependent in direct {
                    if result.insert(dependent.clone()) {
                        stack.push(dependent);
                    }
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourceKind, ResourceSpec};

    fn vmss_specs() -> SpecSet {
        SpecSet::new([
            ResourceSpec::new("network", ResourceKind::Network, "eastus"),
            ResourceSpec::new("lb", ResourceKind::LoadBalancer, "eastus")
                .with_dependency("network"),
            ResourceSpec::new("scaleset", ResourceKind::ScaleSet, "eastus")
                .with_dependency("network")
                .with_dependency("lb"),
        ])
        .unwrap()
    }

    #[test]
    fn test_layers_for_vmss_topology() {
        let graph = DependencyGraph::build(&vmss_specs()).unwrap();
        assert_eq!(
            graph.layers(),
            &[
                vec!["network".to_string()],
                vec!["lb".to_string()],
                vec!["scaleset".to_string()],
            ]
        );
    }

    #[test]
    fn test_layer_union_covers_input_exactly_once() {
        let specs = SpecSet::new([
            ResourceSpec::new("a", ResourceKind::Network, "eastus"),
            ResourceSpec::new("b", ResourceKind::PublicIp, "eastus"),
            ResourceSpec::new("c", ResourceKind::LoadBalancer, "eastus")
                .with_dependency("a")
                .with_dependency("b"),
            ResourceSpec::new("d", ResourceKind::ScaleSet, "eastus").with_dependency("c"),
        ])
        .unwrap();
        let graph = DependencyGraph::build(&specs).unwrap();

        let mut seen = std::collections::BTreeSet::new();
        for layer in graph.layers() {
            for id in layer {
                assert!(seen.insert(id.clone()), "id {id} appears in two layers");
            }
        }
        let all: std::collections::BTreeSet<String> = specs.ids().cloned().collect();
        assert_eq!(seen, all);
    }

    #[test]
    fn test_dependency_in_strictly_earlier_layer() {
        let specs = vmss_specs();
        let graph = DependencyGraph::build(&specs).unwrap();
        let layer_of = |id: &str| {
            graph
                .layers()
                .iter()
                .position(|l| l.iter().any(|i| i == id))
                .unwrap()
        };
        for spec in specs.iter() {
            for dep in &spec.depends_on {
                assert!(layer_of(dep) < layer_of(&spec.id));
            }
        }
    }

    #[test]
    fn test_independent_siblings_share_a_layer() {
        let specs = SpecSet::new([
            ResourceSpec::new("net", ResourceKind::Network, "eastus"),
            ResourceSpec::new("ip", ResourceKind::PublicIp, "eastus"),
        ])
        .unwrap();
        let graph = DependencyGraph::build(&specs).unwrap();
        assert_eq!(graph.layers(), &[vec!["ip".to_string(), "net".to_string()]]);
    }

    #[test]
    fn test_cycle_detected() {
        let specs = SpecSet::new([
            ResourceSpec::new("a", ResourceKind::Network, "eastus").with_dependency("b"),
            ResourceSpec::new("b", ResourceKind::PublicIp, "eastus").with_dependency("a"),
            ResourceSpec::new("c", ResourceKind::Dns, "eastus"),
        ])
        .unwrap();
        match DependencyGraph::build(&specs) {
            Err(GraphError::CycleDetected { ids }) => {
                assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_transitive_dependents() {
        let graph = DependencyGraph::build(&vmss_specs()).unwrap();
        let downstream = graph.dependents_of("network");
        assert!(downstream.contains("lb"));
        assert!(downstream.contains("scaleset"));
        assert!(graph.dependents_of("scaleset").is_empty());
    }
}
