// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layers, lowest priority first: built-in defaults, a TOML file, then
//! `SODEPS_*` environment variables. Command-line flags are applied on top
//! by the caller.

use crate::inspect::InspectorKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which backend lists `NEEDED` entries
    pub inspector: InspectorKind,
    /// `readelf` program to run
    pub readelf: PathBuf,
    /// Graphviz `dot` program used for PNG rendering
    pub dot: PathBuf,
    /// Inspect libraries in parallel
    pub parallel: bool,
    /// Base name for rendered graphs
    pub graph_output: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inspector: InspectorKind::Readelf,
            readelf: PathBuf::from("readelf"),
            dot: PathBuf::from("dot"),
            parallel: true,
            graph_output: "dependency_graph".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Platform config file location, if one can be determined
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "hyperpolymath", "sodeps")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration.
///
/// An explicit `path` must exist; the platform default is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let defaults = ::config::Config::try_from(&Config::default())
        .context("Failed to build default configuration")?;

    let mut builder = ::config::Config::builder().add_source(defaults);

    match path {
        Some(path) => {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        None => {
            if let Some(path) = default_path() {
                builder = builder.add_source(::config::File::from(path).required(false));
            }
        }
    }

    builder
        .add_source(::config::Environment::with_prefix("SODEPS").try_parsing(true))
        .build()
        .context("Failed to load configuration")?
        .try_deserialize()
        .context("Invalid configuration")
}
