// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Metadata inspection - lists the raw `NEEDED` entries of one library

use crate::elf;
use crate::error::InspectError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::trace;

/// Source of declared runtime dependencies for a single file
pub trait NeededInspector: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Raw `NEEDED` entries of `path`, unfiltered, in declaration order
    ///
    /// # Errors
    ///
    /// Returns an [`InspectError`] if the file cannot be inspected.
    fn needed(&self, path: &Path) -> Result<Vec<String>, InspectError>;
}

/// Available inspector backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InspectorKind {
    /// Run `readelf -d`
    #[default]
    Readelf,
    /// Parse the ELF dynamic section in-process
    Elf,
}

impl InspectorKind {
    /// Construct the inspector; `readelf` is the program used by [`Readelf`]
    #[must_use]
    pub fn build(self, readelf: &Path) -> Box<dyn NeededInspector> {
        match self {
            Self::Readelf => Box::new(Readelf::new(readelf)),
            Self::Elf => Box::new(ElfReader),
        }
    }
}

// =============================================================================
// readelf
// =============================================================================

/// Inspector backed by the binutils `readelf` tool
#[derive(Debug, Clone)]
pub struct Readelf {
    program: PathBuf,
}

impl Default for Readelf {
    fn default() -> Self {
        Self::new("readelf")
    }
}

impl Readelf {
    /// Use `program` instead of the `readelf` on `PATH`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl NeededInspector for Readelf {
    fn name(&self) -> &str {
        "readelf"
    }

    fn needed(&self, path: &Path) -> Result<Vec<String>, InspectError> {
        let program = self.program.display().to_string();
        let output = Command::new(&self.program)
            .arg("-d")
            .arg(path)
            .output()
            .map_err(|source| InspectError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(InspectError::ToolFailed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let needed = parse_readelf_output(&String::from_utf8_lossy(&output.stdout));
        trace!("{}: {:?}", path.display(), needed);
        Ok(needed)
    }
}

/// Extract names from `readelf -d` lines such as
/// `0x0000000000000001 (NEEDED)  Shared library: [libc.so.6]`
#[must_use]
pub fn parse_readelf_output(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.contains("NEEDED"))
        .filter_map(|line| {
            let (_, rest) = line.split_once('[')?;
            let name = rest.split_once(']').map_or(rest, |(name, _)| name);
            Some(name.to_string())
        })
        .collect()
}

// =============================================================================
// In-process ELF
// =============================================================================

/// Inspector that reads the dynamic section directly
#[derive(Debug, Clone, Copy, Default)]
pub struct ElfReader;

impl NeededInspector for ElfReader {
    fn name(&self) -> &str {
        "elf"
    }

    fn needed(&self, path: &Path) -> Result<Vec<String>, InspectError> {
        let bytes = fs::read(path).map_err(|source| InspectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(elf::parse_needed(&bytes)?)
    }
}
