// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for the dependency graph and sorter
//!
//! These tests verify critical invariants:
//! 1. No dangling edges - every edge endpoint is a node
//! 2. Acyclic graphs always yield a complete order, dependents first
//! 3. Cyclic graphs always fail, never with a partial order
//! 4. Determinism - same inputs produce the same graph and order

use proptest::prelude::*;
use sodeps::error::Error;
use sodeps::extract::Extraction;
use sodeps::graph::DependencyGraph;
use sodeps::scanner::Inventory;
use sodeps::types::SymlinkRelation;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

// =============================================================================
// Test Helpers
// =============================================================================

fn name(i: usize) -> String {
    format!("lib{i:02}.so")
}

fn graph_from(n: usize, edges: &[(usize, usize)]) -> DependencyGraph {
    DependencyGraph::from_edges(
        (0..n).map(name),
        edges.iter().map(|&(a, b)| (name(a), name(b))),
    )
}

fn positions(order: &[String]) -> HashMap<&str, usize> {
    order
        .iter()
        .enumerate()
        .map(|(i, lib)| (lib.as_str(), i))
        .collect()
}

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..12).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..30)))
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_no_dangling_edges(
        (n, edges) in graph_strategy(),
        externals in prop::collection::vec("lib[a-z]{1,4}\\.so\\.[0-9]", 0..5),
        links in prop::collection::vec((0usize..16, 0usize..16), 0..6),
    ) {
        let libraries: Vec<String> = (0..n).map(name).collect();
        let symlinks = links
            .iter()
            .map(|&(a, b)| SymlinkRelation { link: name(a), target: name(b) })
            .collect();
        let inventory = Inventory::from_parts(PathBuf::from("/lib"), libraries, symlinks);

        let mut dependencies: HashMap<String, Vec<String>> = HashMap::new();
        for &(a, b) in &edges {
            dependencies.entry(name(a)).or_default().push(name(b));
        }
        for (i, ext) in externals.iter().enumerate() {
            dependencies.entry(name(i % n)).or_default().push(ext.clone());
        }
        let extraction = Extraction {
            dependencies: dependencies
                .into_iter()
                .map(|(lib, deps)| {
                    let deps = sodeps::extract::filter_dependencies(deps, &inventory);
                    (lib, deps)
                })
                .collect(),
            diagnostics: vec![],
        };

        let graph = DependencyGraph::build(&inventory, &extraction);
        let nodes: HashSet<&str> = graph.nodes().collect();

        prop_assert_eq!(nodes.len(), n);
        for edge in graph.edges() {
            prop_assert!(nodes.contains(edge.from.as_str()));
            prop_assert!(nodes.contains(edge.to.as_str()));
        }
    }

    #[test]
    fn prop_acyclic_graphs_sort_completely((n, raw) in graph_strategy()) {
        // Orient every edge from lower to higher index: no cycles possible
        let edges: Vec<_> = raw
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        let graph = graph_from(n, &edges);

        let order = graph.topological_order().unwrap();

        prop_assert_eq!(order.len(), n);
        let pos = positions(&order);
        prop_assert_eq!(pos.len(), n);
        for edge in graph.edges() {
            prop_assert!(pos[edge.from.as_str()] < pos[edge.to.as_str()]);
        }
    }

    #[test]
    fn prop_sort_succeeds_or_reports_cycle((n, edges) in graph_strategy()) {
        let graph = graph_from(n, &edges);

        match graph.topological_order() {
            Ok(order) => {
                prop_assert_eq!(order.len(), n);
                let pos = positions(&order);
                for edge in graph.edges() {
                    prop_assert!(pos[edge.from.as_str()] < pos[edge.to.as_str()]);
                }
            }
            Err(Error::CycleDetected { unresolved, cycles }) => {
                prop_assert!(!unresolved.is_empty());
                prop_assert!(!cycles.is_empty());
                let blocked: HashSet<&String> = unresolved.iter().collect();
                for member in cycles.iter().flatten() {
                    prop_assert!(blocked.contains(member));
                }
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn prop_deterministic((n, edges) in graph_strategy()) {
        let first = graph_from(n, &edges);
        let second = graph_from(n, &edges);

        prop_assert_eq!(first.edges(), second.edges());
        prop_assert_eq!(
            first.topological_order().ok(),
            second.topological_order().ok()
        );
    }
}

// =============================================================================
// Fixed cases
// =============================================================================

#[test]
fn test_long_chain() {
    let edges: Vec<_> = (0..50).map(|i| (i, i + 1)).collect();
    let graph = graph_from(51, &edges);

    let order = graph.topological_order().unwrap();

    let expected: Vec<String> = (0..51).map(name).collect();
    assert_eq!(order, expected);
}

#[test]
fn test_cycle_never_yields_partial_order() {
    let graph = graph_from(3, &[(0, 1), (1, 2), (2, 0)]);

    assert!(matches!(
        graph.topological_order(),
        Err(Error::CycleDetected { .. })
    ));
}
