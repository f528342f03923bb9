//! Discovery of secondary top-level types.
//!
//! A top-level type whose name differs from its file's name cannot be found
//! on the classpath by path. Sibling files of the compiled units that
//! declare such types are added to the session as extra units.
//!
//! Scanning a directory holds a process-wide lock on that directory; a
//! scan that finds the directory already locked is skipped.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use jbridge_common::SharedNames;
use jbridge_parser::{NodeData, ParseOptions, parse_unit};
use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::source::{SourceEncoding, normalize_path, read_source};

static SCANNING: OnceLock<Mutex<FxHashSet<PathBuf>>> = OnceLock::new();

fn scanning() -> &'static Mutex<FxHashSet<PathBuf>> {
    SCANNING.get_or_init(|| Mutex::new(FxHashSet::default()))
}

/// Exclusive claim on one directory, released on drop.
struct ScopeGuard {
    dir: PathBuf,
}

impl ScopeGuard {
    fn acquire(dir: &Path) -> Option<ScopeGuard> {
        let mut held = scanning().lock().ok()?;
        if !held.insert(dir.to_path_buf()) {
            return None;
        }
        Some(ScopeGuard { dir: dir.to_path_buf() })
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Ok(mut held) = scanning().lock() {
            held.remove(&self.dir);
        }
    }
}

/// A sibling file declaring at least one secondary type.
#[derive(Clone, Debug)]
pub struct DiscoveredSource {
    pub path: PathBuf,
    pub text: Arc<str>,
    /// The secondary type names.
    pub types: Vec<String>,
}

/// Sibling files of `files` that declare secondary top-level types.
/// Files whose normalized path is in `known` are not considered.
pub fn discover_secondary_types<'a>(
    files: impl IntoIterator<Item = &'a Path>,
    known: &FxHashSet<String>,
    names: &SharedNames,
) -> Vec<DiscoveredSource> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for file in files {
        let Some(dir) = file.parent() else {
            continue;
        };
        if !dirs.iter().any(|d| d == dir) {
            dirs.push(dir.to_path_buf());
        }
    }

    let mut found = Vec::new();
    for dir in dirs {
        let Some(_guard) = ScopeGuard::acquire(&dir) else {
            debug!(dir = %dir.display(), "directory scan in progress elsewhere, skipped");
            continue;
        };
        let walk_root = if dir.as_os_str().is_empty() { Path::new(".") } else { dir.as_path() };
        for entry in WalkDir::new(walk_root).max_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "sibling scan failed");
                    break;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "java") {
                continue;
            }
            if known.contains(&normalize_path(path)) {
                continue;
            }
            if let Some(source) = secondary_types_in(path, names) {
                trace!(path = %path.display(), types = ?source.types, "secondary types found");
                found.push(source);
            }
        }
    }
    found
}

fn secondary_types_in(path: &Path, names: &SharedNames) -> Option<DiscoveredSource> {
    let stem = path.file_stem()?.to_string_lossy().into_owned();
    let text = match read_source(path, SourceEncoding::Auto) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "sibling unreadable");
            return None;
        }
    };
    let tree = parse_unit(text.clone(), names.clone(), ParseOptions { ignore_bodies: true });
    let Some(NodeData::CompilationUnit { types, .. }) = tree.arena.data(tree.root) else {
        return None;
    };
    let types: Vec<String> = types
        .iter()
        .filter_map(|&ty| match tree.arena.data(ty) {
            Some(NodeData::ClassDecl { name, .. }) => Some(tree.name_text(*name).to_string()),
            _ => None,
        })
        .filter(|name| *name != stem)
        .collect();
    if types.is_empty() {
        return None;
    }
    Some(DiscoveredSource {
        path: path.to_path_buf(),
        text,
        types,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use jbridge_common::NameTable;

    use super::*;

    #[test]
    fn test_only_secondary_declarations_are_discovered() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("A.java");
        fs::write(&a, "class A { Helper h; }").unwrap();
        fs::write(dir.path().join("B.java"), "class B {}").unwrap();
        fs::write(dir.path().join("Util.java"), "class Util {}\nclass Helper {}").unwrap();
        fs::write(dir.path().join("notes.txt"), "class Nope {}").unwrap();

        let known: FxHashSet<String> = [normalize_path(&a)].into_iter().collect();
        let found = discover_secondary_types([a.as_path()], &known, &NameTable::shared());
        assert_eq!(found.len(), 1);
        assert!(found[0].path.ends_with("Util.java"));
        assert_eq!(found[0].types, vec!["Helper".to_string()]);
    }

    #[test]
    fn test_locked_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("A.java");
        fs::write(&a, "class A {}").unwrap();
        fs::write(dir.path().join("Util.java"), "class Util {}\nclass Helper {}").unwrap();

        let guard = ScopeGuard::acquire(dir.path()).unwrap();
        let found = discover_secondary_types([a.as_path()], &FxHashSet::default(), &NameTable::shared());
        assert!(found.is_empty());
        drop(guard);
        let found = discover_secondary_types([a.as_path()], &FxHashSet::default(), &NameTable::shared());
        assert_eq!(found.len(), 1);
    }
}
