// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Sodeps library - load order for a directory of shared libraries
//!
//! This crate scans a directory for shared objects, discovers which of them
//! depend on each other (through symlinks and `DT_NEEDED` entries), and
//! computes a deterministic topological order with cycle detection.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod elf;
pub mod error;
pub mod extract;
pub mod graph;
pub mod inspect;
pub mod pipeline;
pub mod scanner;
pub mod sort;

/// Core data types shared by every stage of the pipeline
pub mod types {
    use serde::{Deserialize, Serialize};
    use sha2::{Digest, Sha256};

    // =========================================================================
    // Symlinks
    // =========================================================================

    /// A symbolic link found in the scanned directory and its immediate target
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SymlinkRelation {
        /// File name of the link itself
        pub link: String,
        /// Target exactly as stored in the link (not resolved further)
        pub target: String,
    }

    // =========================================================================
    // Edges
    // =========================================================================

    /// Where a dependency edge came from
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum EdgeOrigin {
        /// The dependent is a symlink pointing at the dependency
        Symlink,
        /// The dependent lists the dependency in its dynamic section
        Needed,
    }

    impl EdgeOrigin {
        /// Short code used in exports
        #[must_use]
        pub fn code(&self) -> &'static str {
            match self {
                Self::Symlink => "symlink",
                Self::Needed => "needed",
            }
        }
    }

    /// Directed edge: `from` requires `to` to be available first
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Edge {
        /// Content-hash ID: edge:<hash of (from, to)>
        pub id: String,
        /// Dependent library
        pub from: String,
        /// Dependency library
        pub to: String,
        /// How the edge was discovered
        pub origin: EdgeOrigin,
    }

    impl Edge {
        /// Create an edge with its deterministic ID
        #[must_use]
        pub fn new(from: &str, to: &str, origin: EdgeOrigin) -> Self {
            Self {
                id: Self::generate_id(from, to),
                from: from.to_string(),
                to: to.to_string(),
                origin,
            }
        }

        /// Generate a deterministic ID for an edge
        #[must_use]
        pub fn generate_id(from: &str, to: &str) -> String {
            let mut hasher = Sha256::new();
            hasher.update(from.as_bytes());
            hasher.update([0u8]);
            hasher.update(to.as_bytes());
            let hash = hex::encode(hasher.finalize());
            format!("edge:{}", &hash[..8])
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// A recovered, per-library problem (the run continued without it)
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Diagnostic {
        /// Library the problem belongs to
        pub library: String,
        /// Human-readable description
        pub message: String,
    }

    impl std::fmt::Display for Diagnostic {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}: {}", self.library, self.message)
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{Error, InspectError};
    pub use crate::graph::DependencyGraph;
    pub use crate::inspect::NeededInspector;
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
