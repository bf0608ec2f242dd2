// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Dependency extraction - declared dependencies restricted to the inventory

use crate::error::InspectError;
use crate::inspect::NeededInspector;
use crate::scanner::Inventory;
use crate::types::Diagnostic;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Filtered dependencies of every library, plus recovered failures
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Library name -> inventoried libraries it declares as `NEEDED`
    pub dependencies: BTreeMap<String, Vec<String>>,
    /// One entry per library whose metadata could not be read
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// Filtered dependencies of `library` (empty if unknown)
    #[must_use]
    pub fn dependencies_of(&self, library: &str) -> &[String] {
        self.dependencies.get(library).map_or(&[], Vec::as_slice)
    }
}

/// Keep only names that exactly match an inventoried library, first occurrence wins
#[must_use]
pub fn filter_dependencies(raw: Vec<String>, inventory: &Inventory) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter(|name| inventory.contains(name))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Inspect one library and filter its dependencies
///
/// # Errors
///
/// Propagates the inspector's failure for this library.
pub fn extract_one(
    library: &str,
    inventory: &Inventory,
    inspector: &dyn NeededInspector,
) -> Result<Vec<String>, InspectError> {
    let raw = inspector.needed(&inventory.path_of(library))?;
    let deps = filter_dependencies(raw, inventory);
    debug!("{} needs {:?}", library, deps);
    Ok(deps)
}

/// Inspect every inventoried library.
///
/// Failures are recorded as diagnostics and the library gets no
/// dependencies. Results are merged in inventory order whether or not the
/// inspections ran in parallel.
pub fn extract_all(
    inventory: &Inventory,
    inspector: &dyn NeededInspector,
    parallel: bool,
) -> Extraction {
    info!(
        "Inspecting {} libraries with {}",
        inventory.len(),
        inspector.name()
    );

    let inspect = |name: &String| (name.clone(), extract_one(name, inventory, inspector));

    let results: Vec<_> = if parallel {
        inventory.libraries().par_iter().map(inspect).collect()
    } else {
        inventory.libraries().iter().map(inspect).collect()
    };

    let mut extraction = Extraction::default();
    for (name, result) in results {
        let deps = match result {
            Ok(deps) => deps,
            Err(err) => {
                warn!("Error reading dependencies for {}: {}", name, err);
                extraction.diagnostics.push(Diagnostic {
                    library: name.clone(),
                    message: err.to_string(),
                });
                Vec::new()
            }
        };
        extraction.dependencies.insert(name, deps);
    }

    extraction
}
