// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! End-to-end analysis: scan, extract, build

use crate::error::Error;
use crate::extract;
use crate::graph::DependencyGraph;
use crate::inspect::NeededInspector;
use crate::scanner::{self, Inventory};
use crate::types::Diagnostic;
use std::path::Path;
use tracing::info;

/// Result of analysing one directory
#[derive(Debug, Clone)]
pub struct Analysis {
    /// What the scan found
    pub inventory: Inventory,
    /// The finished dependency graph
    pub graph: DependencyGraph,
    /// Libraries whose metadata could not be read
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    /// Topological order of the analysed libraries
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] if the graph has a cycle.
    pub fn order(&self) -> Result<Vec<String>, Error> {
        self.graph.topological_order()
    }
}

/// Scan `dir` and build its dependency graph.
///
/// # Errors
///
/// Returns [`Error::DirectoryAccess`] if the directory cannot be listed.
/// Per-library inspection failures end up in [`Analysis::diagnostics`].
pub fn analyze(
    dir: &Path,
    inspector: &dyn NeededInspector,
    parallel: bool,
) -> Result<Analysis, Error> {
    info!("Scanning: {}", dir.display());
    let inventory = scanner::scan_directory(dir)?;

    let extraction = extract::extract_all(&inventory, inspector, parallel);
    let graph = DependencyGraph::build(&inventory, &extraction);

    info!(
        "Built dependency graph: {} libraries, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(Analysis {
        inventory,
        graph,
        diagnostics: extraction.diagnostics,
    })
}
