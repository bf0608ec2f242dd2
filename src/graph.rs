// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Graph data structures for the library dependency graph

use crate::error::Error;
use crate::extract::Extraction;
use crate::scanner::Inventory;
use crate::sort;
use crate::types::{Edge, EdgeOrigin};
use anyhow::{Context, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

/// Directed graph over library names; an edge `a -> b` means `a` needs `b`
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// The underlying directed graph
    graph: DiGraph<String, EdgeOrigin>,
    /// Map from library name to node index
    node_indices: HashMap<String, NodeIndex>,
    /// Edges in insertion order
    edges: Vec<Edge>,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of the graph
#[derive(Debug, Serialize)]
pub struct GraphExport<'a> {
    /// Node names in node order
    pub nodes: Vec<&'a str>,
    /// Edges in insertion order
    pub edges: &'a [Edge],
}

impl DependencyGraph {
    /// Create a new empty graph
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Build the graph for a scanned directory.
    ///
    /// Every inventoried library becomes a node before any edge is added.
    /// Symlink edges come first, then `NEEDED` edges in inventory order.
    #[must_use]
    pub fn build(inventory: &Inventory, extraction: &Extraction) -> Self {
        let mut graph = Self::new();

        for library in inventory.libraries() {
            graph.add_node(library);
        }

        for link in inventory.library_symlinks() {
            graph.add_edge(&link.link, &link.target, EdgeOrigin::Symlink);
        }

        for library in inventory.libraries() {
            for dep in extraction.dependencies_of(library) {
                graph.add_edge(library, dep, EdgeOrigin::Needed);
            }
        }

        graph
    }

    /// Build a graph from explicit nodes and `(dependent, dependency)` pairs.
    ///
    /// Edge endpoints that are not listed in `nodes` are added as nodes.
    pub fn from_edges<N, E, S>(nodes: N, edges: E) -> Self
    where
        N: IntoIterator<Item = S>,
        E: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node.as_ref());
        }
        for (from, to) in edges {
            graph.add_node(from.as_ref());
            graph.add_node(to.as_ref());
            graph.add_edge(from.as_ref(), to.as_ref(), EdgeOrigin::Needed);
        }
        graph
    }

    /// Add a node if it is not already present
    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.node_indices.insert(name.to_string(), idx);
        idx
    }

    /// Add an edge between two existing nodes.
    ///
    /// Returns `false` when an endpoint is unknown or the pair already exists.
    pub fn add_edge(&mut self, from: &str, to: &str, origin: EdgeOrigin) -> bool {
        let (Some(&from_idx), Some(&to_idx)) =
            (self.node_indices.get(from), self.node_indices.get(to))
        else {
            trace!("dropping edge {} -> {}: endpoint not in graph", from, to);
            return false;
        };

        if self.graph.find_edge(from_idx, to_idx).is_some() {
            return false;
        }

        self.graph.add_edge(from_idx, to_idx, origin);
        self.edges.push(Edge::new(from, to, origin));
        true
    }

    /// Node names in node order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(move |idx| self.graph[idx].as_str())
    }

    /// All edges in insertion order
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Whether `name` is a node
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.node_indices.contains_key(name)
    }

    /// Direct dependencies of a library, in insertion order
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.from == name)
            .map(|e| e.to.as_str())
            .collect()
    }

    /// Libraries that directly depend on `name`, in insertion order
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.to == name)
            .map(|e| e.from.as_str())
            .collect()
    }

    /// Get node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Topological order, dependents before their dependencies
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] if the graph has a cycle.
    pub fn topological_order(&self) -> Result<Vec<String>, Error> {
        sort::topological_sort(self)
    }

    /// Successors of a node in edge insertion order
    pub(crate) fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        // petgraph walks adjacency lists newest first
        let mut out: Vec<_> = self.graph.neighbors(idx).collect();
        out.reverse();
        out
    }

    pub(crate) fn inner(&self) -> &DiGraph<String, EdgeOrigin> {
        &self.graph
    }

    /// Serializable view used by JSON exports
    #[must_use]
    pub fn export(&self) -> GraphExport<'_> {
        GraphExport {
            nodes: self.nodes().collect(),
            edges: &self.edges,
        }
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph dependencies {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for name in self.nodes() {
            dot.push_str(&format!("  \"{}\";\n", escape(name)));
        }

        if !self.edges.is_empty() {
            dot.push('\n');
        }

        for edge in &self.edges {
            let style = match edge.origin {
                EdgeOrigin::Symlink => " [style=dashed]",
                EdgeOrigin::Needed => "",
            };
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\"{};\n",
                escape(&edge.from),
                escape(&edge.to),
                style
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.export()).context("Failed to serialize graph to JSON")
    }
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
