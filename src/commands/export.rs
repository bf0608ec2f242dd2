// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - writes the dependency graph to various formats

use super::{InspectArgs, Output};
use crate::config::Config;
use crate::graph::DependencyGraph;
use crate::pipeline;
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Graphviz DOT source
    #[default]
    Dot,
    /// JSON nodes and edges
    Json,
    /// PNG rendered by Graphviz `dot`
    Png,
}

impl ExportFormat {
    /// Get file extension for format
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Json => "json",
            Self::Png => "png",
        }
    }
}

/// Run the export command
pub fn run(
    dir: &Path,
    format: ExportFormat,
    output: Option<PathBuf>,
    inspect: InspectArgs,
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

    match output {
        Some(path) => {
            write_graph(&analysis.graph, format, &path, &config.dot)?;
            println!("Exported to {}", path.display());
        }
        None if format == ExportFormat::Png => {
            let path = default_destination(&config.graph_output, format);
            write_graph(&analysis.graph, format, &path, &config.dot)?;
            println!("Exported to {}", path.display());
        }
        None => {
            let content = render_text(&analysis.graph, format)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}

/// `<base>.<ext>`, the way Graphviz names rendered files
#[must_use]
pub fn default_destination(base: &str, format: ExportFormat) -> PathBuf {
    PathBuf::from(format!("{base}.{}", format.extension()))
}

/// Render a text format (DOT or JSON)
pub fn render_text(graph: &DependencyGraph, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Dot => Ok(graph.to_dot()),
        ExportFormat::Json => graph.to_json(),
        ExportFormat::Png => bail!("PNG is a binary format; use --output"),
    }
}

/// Write the graph to `dest`, invoking `dot_program` for PNG
pub fn write_graph(
    graph: &DependencyGraph,
    format: ExportFormat,
    dest: &Path,
    dot_program: &Path,
) -> Result<()> {
    info!("Exporting {:?} to {}", format, dest.display());

    if format != ExportFormat::Png {
        let content = render_text(graph, format)?;
        return fs::write(dest, content)
            .with_context(|| format!("Failed to write to {}", dest.display()));
    }

    let mut child = Command::new(dot_program)
        .arg("-Tpng")
        .arg("-o")
        .arg(dest)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to run {}", dot_program.display()))?;

    child
        .stdin
        .take()
        .context("Graphviz stdin unavailable")?
        .write_all(graph.to_dot().as_bytes())
        .context("Failed to send graph to Graphviz")?;

    let result = child.wait_with_output().context("Graphviz did not finish")?;
    if !result.status.success() {
        bail!(
            "{} exited with {}: {}",
            dot_program.display(),
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        );
    }

    Ok(())
}
