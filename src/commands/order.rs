// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Order command - prints the topological order of a library directory

use super::export::{self, ExportFormat};
use super::{InspectArgs, Output};
use crate::config::Config;
use crate::error::Error;
use crate::graph::GraphExport;
use crate::pipeline::{self, Analysis};
use crate::types::Diagnostic;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Graph rendering requested alongside the order
#[derive(Debug, Clone, Default)]
pub struct GraphArgs {
    /// Render the graph after sorting
    pub enabled: bool,
    /// Base name override (extension is added)
    pub output: Option<String>,
    /// Rendering format
    pub format: ExportFormat,
}

/// JSON report
#[derive(Debug, Serialize)]
struct OrderReport<'a> {
    directory: &'a Path,
    order: Option<&'a [String]>,
    unresolved: &'a [String],
    cycles: &'a [Vec<String>],
    graph: GraphExport<'a>,
    diagnostics: &'a [Diagnostic],
}

/// Run the order command
pub fn run(
    dir: &Path,
    inspect: InspectArgs,
    graph: &GraphArgs,
    config: &Config,
    out: Output,
) -> Result<()> {
    let inspector = inspect
        .inspector
        .unwrap_or(config.inspector)
        .build(&config.readelf);
    let analysis = pipeline::analyze(dir, inspector.as_ref(), config.parallel && !inspect.sequential)
        .with_context(|| format!("Failed to analyze {}", dir.display()))?;

    for diag in &analysis.diagnostics {
        eprintln!("{} {}", out.warning_label(), diag);
    }

    info!("Performing topological sort of dependencies...");
    let sorted = analysis.order();

    if graph.enabled {
        // The graph is still worth rendering when it has a cycle
        render_graph(&analysis, graph, config, out);
    }

    let (order, unresolved, cycles) = match &sorted {
        Ok(order) => (Some(order.as_slice()), &[][..], &[][..]),
        Err(Error::CycleDetected { unresolved, cycles }) => {
            (None, unresolved.as_slice(), cycles.as_slice())
        }
        Err(other) => return Err(anyhow!("{other}")),
    };

    if out.json {
        let report = OrderReport {
            directory: dir,
            order,
            unresolved,
            cycles,
            graph: analysis.graph.export(),
            diagnostics: &analysis.diagnostics,
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else if let Some(order) = order {
        for lib in order {
            println!("{lib}");
        }
    } else {
        eprintln!("{} cycle detected in the dependency graph", out.error_label());
        eprintln!("  unresolved: {}", unresolved.join(", "));
        for cycle in cycles {
            eprintln!("  cycle: {}", cycle.join(" -> "));
        }
    }

    sorted.map(|_| ()).map_err(anyhow::Error::from)
}

fn render_graph(analysis: &Analysis, args: &GraphArgs, config: &Config, out: Output) {
    let base = args.output.as_deref().unwrap_or(config.graph_output.as_str());
    let dest: PathBuf = export::default_destination(base, args.format);

    match export::write_graph(&analysis.graph, args.format, &dest, &config.dot) {
        Ok(()) => eprintln!("Dependency graph saved as {}", dest.display()),
        Err(err) => {
            warn!("Graph export failed: {:#}", err);
            eprintln!("{} graph export failed: {:#}", out.warning_label(), err);
        }
    }
}
