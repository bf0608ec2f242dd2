// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Topological sort (Kahn) with cycle reporting
//!
//! In-degree counts incoming edges, so a library is released once nothing
//! depends on it any more: for an edge `a -> b`, `a` is emitted before `b`.
//! Ties are broken first-in first-out, seeded in node order, which makes
//! the output a pure function of the graph.

use crate::error::Error;
use crate::graph::DependencyGraph;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::VecDeque;
use tracing::debug;

/// Order every node of `graph`, dependents before their dependencies.
///
/// # Errors
///
/// Returns [`Error::CycleDetected`] with the nodes that never reached
/// in-degree zero; no partial order is returned.
pub fn topological_sort(graph: &DependencyGraph) -> Result<Vec<String>, Error> {
    let g = graph.inner();

    let mut in_degree = vec![0usize; g.node_count()];
    for edge in g.edge_references() {
        in_degree[edge.target().index()] += 1;
    }

    let mut frontier: VecDeque<NodeIndex> = g
        .node_indices()
        .filter(|idx| in_degree[idx.index()] == 0)
        .collect();
    let mut order = Vec::with_capacity(g.node_count());

    while let Some(node) = frontier.pop_front() {
        order.push(g[node].clone());
        for dep in graph.successors(node) {
            in_degree[dep.index()] -= 1;
            if in_degree[dep.index()] == 0 {
                frontier.push_back(dep);
            }
        }
    }

    if order.len() != g.node_count() {
        let unresolved: Vec<String> = g
            .node_indices()
            .filter(|idx| in_degree[idx.index()] > 0)
            .map(|idx| g[idx].clone())
            .collect();
        debug!("{} of {} nodes unresolved", unresolved.len(), g.node_count());
        return Err(Error::CycleDetected {
            unresolved,
            cycles: find_cycles(graph),
        });
    }

    Ok(order)
}

/// Strongly connected components that contain a cycle, members in node order
#[must_use]
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let g = graph.inner();

    let mut components: Vec<Vec<NodeIndex>> = tarjan_scc(g)
        .into_iter()
        .filter(|scc| scc.len() > 1 || g.contains_edge(scc[0], scc[0]))
        .map(|mut scc| {
            scc.sort();
            scc
        })
        .collect();
    components.sort();

    components
        .into_iter()
        .map(|scc| scc.into_iter().map(|idx| g[idx].clone()).collect())
        .collect()
}
