// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types

use crate::elf::ElfError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// The scanned directory could not be listed
    #[error("cannot list directory {}: {source}", path.display())]
    DirectoryAccess {
        /// Directory that was being scanned
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// No topological order exists
    #[error(
        "cycle detected in the dependency graph ({} unresolved: {})",
        unresolved.len(),
        unresolved.join(", ")
    )]
    CycleDetected {
        /// Libraries that never reached in-degree zero, in node order
        unresolved: Vec<String>,
        /// Strongly connected components among the unresolved libraries
        cycles: Vec<Vec<String>>,
    },
}

/// Failure to read the declared dependencies of a single library.
///
/// Always recovered: the library is treated as having no dependencies.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The inspection tool could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that was invoked
        program: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The inspection tool ran but reported failure
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        /// Program that was invoked
        program: String,
        /// Exit status as displayed by the OS
        status: String,
        /// Trimmed standard error output
        stderr: String,
    },

    /// The library file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The library is not a well-formed ELF object
    #[error("malformed ELF: {0}")]
    Elf(#[from] ElfError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_unresolved() {
        let err = Error::CycleDetected {
            unresolved: vec!["liba.so".into(), "libb.so".into()],
            cycles: vec![],
        };

        let msg = err.to_string();
        assert!(msg.contains("2 unresolved"));
        assert!(msg.contains("liba.so, libb.so"));
    }

    #[test]
    fn test_tool_failure_message() {
        let err = InspectError::ToolFailed {
            program: "readelf".into(),
            status: "exit status: 1".into(),
            stderr: "Not an ELF file".into(),
        };

        assert_eq!(err.to_string(), "readelf exited with exit status: 1: Not an ELF file");
    }
}
