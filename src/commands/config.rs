// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - shows the effective configuration

use super::Output;
use crate::config::{self, Config};
use anyhow::{Context, Result};

/// Print the merged configuration
pub fn run(config: &Config, out: Output) -> Result<()> {
    if out.json {
        let json = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        println!("{json}");
        return Ok(());
    }

    if let Some(path) = config::default_path() {
        println!("# default config file: {}", path.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
