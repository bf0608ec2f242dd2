// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Directory inventory - finds shared libraries and the symlinks between them

use crate::error::Error;
use crate::types::SymlinkRelation;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Whether a file name looks like a shared library (`*.so` or `*.so.*`)
#[must_use]
pub fn is_shared_library(name: &str) -> bool {
    name.ends_with(".so") || name.contains(".so.")
}

/// Shared libraries of one directory, in lexicographic order
#[derive(Debug, Clone)]
pub struct Inventory {
    root: PathBuf,
    libraries: Vec<String>,
    known: HashSet<String>,
    symlinks: Vec<SymlinkRelation>,
}

impl Inventory {
    /// Build an inventory from already-known names.
    ///
    /// Library names are sorted and de-duplicated so the result matches what
    /// [`scan_directory`] would produce.
    #[must_use]
    pub fn from_parts(root: PathBuf, libraries: Vec<String>, symlinks: Vec<SymlinkRelation>) -> Self {
        let mut libraries = libraries;
        libraries.sort();
        libraries.dedup();
        let known = libraries.iter().cloned().collect();
        Self {
            root,
            libraries,
            known,
            symlinks,
        }
    }

    /// Directory that was scanned
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Library names in scan order
    #[must_use]
    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }

    /// Every symlink seen, whether or not its target is a library
    #[must_use]
    pub fn symlinks(&self) -> &[SymlinkRelation] {
        &self.symlinks
    }

    /// Symlinks whose link name and target are both inventoried libraries
    pub fn library_symlinks(&self) -> impl Iterator<Item = &SymlinkRelation> {
        self.symlinks
            .iter()
            .filter(|s| self.contains(&s.link) && self.contains(&s.target))
    }

    /// Whether `name` is an inventoried library
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    /// Full path of an inventoried library
    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Number of libraries
    #[must_use]
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    /// Check if no libraries were found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}

/// Scan one directory (non-recursively).
///
/// # Errors
///
/// Returns [`Error::DirectoryAccess`] if `dir` is not a listable directory.
pub fn scan_directory(dir: &Path) -> Result<Inventory, Error> {
    let meta = fs::metadata(dir).map_err(|source| access_error(dir, source))?;
    if !meta.is_dir() {
        return Err(access_error(
            dir,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut libraries = Vec::new();
    let mut symlinks = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|err| {
            let source = err
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("filesystem loop"));
            access_error(dir, source)
        })?;

        let Some(name) = entry.file_name().to_str() else {
            warn!("Skipping non UTF-8 file name {:?}", entry.file_name());
            continue;
        };

        if entry.path_is_symlink() {
            match fs::read_link(entry.path()) {
                Ok(target) => {
                    let target = target.to_string_lossy().into_owned();
                    debug!("symlink {} -> {}", name, target);
                    symlinks.push(SymlinkRelation {
                        link: name.to_string(),
                        target,
                    });
                }
                Err(err) => warn!("Failed to read symlink {}: {}", name, err),
            }
        }

        if entry.file_type().is_dir() {
            continue;
        }

        if is_shared_library(name) {
            libraries.push(name.to_string());
        }
    }

    debug!(
        "scanned {}: {} libraries, {} symlinks",
        dir.display(),
        libraries.len(),
        symlinks.len()
    );

    Ok(Inventory::from_parts(dir.to_path_buf(), libraries, symlinks))
}

fn access_error(dir: &Path, source: io::Error) -> Error {
    Error::DirectoryAccess {
        path: dir.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    #[test]
    fn test_is_shared_library() {
        assert!(is_shared_library("libfoo.so"));
        assert!(is_shared_library("libfoo.so.1"));
        assert!(is_shared_library("libfoo.so.1.2.3"));
        assert!(!is_shared_library("libfoo.a"));
        assert!(!is_shared_library("libfoo.sox"));
        assert!(!is_shared_library("README"));
    }

    #[test]
    fn test_scan_classifies_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["libz.so", "liba.so.2", "notes.txt", "libm.a"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let inv = scan_directory(dir.path()).unwrap();

        assert_eq!(inv.libraries(), ["liba.so.2", "libz.so"]);
        assert!(inv.contains("libz.so"));
        assert!(!inv.contains("notes.txt"));
        assert_eq!(inv.path_of("libz.so"), dir.path().join("libz.so"));
    }

    #[test]
    fn test_scan_records_immediate_symlink_targets() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("liba.so.1.0"), b"").unwrap();
        symlink("liba.so.1.0", dir.path().join("liba.so.1")).unwrap();
        symlink("liba.so.1", dir.path().join("liba.so")).unwrap();
        symlink("/usr/lib/libc.so.6", dir.path().join("libc.so.6")).unwrap();

        let inv = scan_directory(dir.path()).unwrap();

        assert_eq!(inv.len(), 4);
        let links: Vec<_> = inv
            .symlinks()
            .iter()
            .map(|s| (s.link.as_str(), s.target.as_str()))
            .collect();
        assert_eq!(
            links,
            [
                ("liba.so", "liba.so.1"),
                ("liba.so.1", "liba.so.1.0"),
                ("libc.so.6", "/usr/lib/libc.so.6"),
            ]
        );

        // Only same-directory library targets become edges
        assert_eq!(inv.library_symlinks().count(), 2);
    }

    #[test]
    fn test_scan_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("plugins.so.d")).unwrap();
        fs::write(dir.path().join("libx.so"), b"").unwrap();

        let inv = scan_directory(dir.path()).unwrap();

        assert_eq!(inv.libraries(), ["libx.so"]);
    }

    #[test]
    fn test_scan_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = scan_directory(&missing).unwrap_err();

        assert!(matches!(err, Error::DirectoryAccess { .. }));
    }

    #[test]
    fn test_scan_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("libx.so");
        fs::write(&file, b"").unwrap();

        assert!(matches!(
            scan_directory(&file),
            Err(Error::DirectoryAccess { .. })
        ));
    }
}
